use std::path::Path;

use thiserror::Error;

use crate::command_adapter;
use crate::command_runner::{CommandOutput, CommandRunner};
use crate::paths::TrackedPath;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LfsError {
    #[error("git-lfs command failed: git {command} (exit {status}) {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },
    #[error("failed to execute git-lfs command: {0}")]
    Execute(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockAction {
    Lock,
    Unlock,
}

impl LockAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lock => "lock",
            Self::Unlock => "unlock",
        }
    }
}

/// Raw `git lfs locks` lines, one lock per line.
pub fn list_locks(repo_root: &Path, runner: &dyn CommandRunner) -> Result<Vec<String>, LfsError> {
    let output = run_lfs_checked(runner, &["lfs", "locks"], repo_root)?;
    Ok(output.stdout.lines().map(str::to_string).collect())
}

pub fn run_action(
    repo_root: &Path,
    action: LockAction,
    path: &TrackedPath,
    runner: &dyn CommandRunner,
) -> Result<(), LfsError> {
    let rendered = path.to_string();
    run_lfs_checked(runner, &["lfs", action.as_str(), rendered.as_str()], repo_root)?;
    Ok(())
}

pub fn version(runner: &dyn CommandRunner) -> Result<String, LfsError> {
    let output = command_adapter::run_program(runner, "git", &["lfs", "version"], None)
        .map_err(LfsError::Execute)?;
    let output = command_adapter::ensure_success(&["lfs", "version"], output)
        .map_err(failure_to_error)?;
    Ok(output.stdout.trim().to_string())
}

fn run_lfs_checked(
    runner: &dyn CommandRunner,
    args: &[&str],
    repo_root: &Path,
) -> Result<CommandOutput, LfsError> {
    let output = command_adapter::run_program(runner, "git", args, Some(repo_root))
        .map_err(LfsError::Execute)?;
    command_adapter::ensure_success(args, output).map_err(failure_to_error)
}

fn failure_to_error(failure: command_adapter::CommandFailure) -> LfsError {
    LfsError::CommandFailed {
        command: failure.command,
        status: failure.status,
        stderr: failure.stderr,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::paths::PathNormalizer;
    use crate::test_support::{RecordingRunner, output};

    use super::*;

    fn path(raw: &str) -> TrackedPath {
        PathNormalizer::new().normalize(raw).expect("valid path")
    }

    #[test]
    fn list_locks_returns_raw_lines() {
        let runner = RecordingRunner::from_outputs(vec![output(
            "Content/Foo.uasset\tjsett\tID:12\nContent/Bar.umap\tana\tID:13\n",
            "",
            0,
        )]);

        let lines = list_locks(Path::new("/repo"), &runner).expect("locks");

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Content/Foo.uasset\tjsett\tID:12");
        let calls = runner.calls();
        assert_eq!(calls[0].program, "git");
        assert_eq!(calls[0].args, vec!["lfs", "locks"]);
        assert_eq!(calls[0].cwd.as_deref(), Some(Path::new("/repo")));
    }

    #[test]
    fn list_locks_fails_on_non_zero_exit() {
        let runner =
            RecordingRunner::from_outputs(vec![output("", "batch request: missing protocol", 2)]);
        let error = list_locks(Path::new("/repo"), &runner).expect_err("should fail");
        assert!(matches!(error, LfsError::CommandFailed { status: 2, .. }));
    }

    #[test]
    fn lock_and_unlock_pass_the_canonical_path() {
        let runner = RecordingRunner::from_outputs(vec![output("", "", 0), output("", "", 0)]);
        let target = path("Content\\Hero Mesh.uasset");

        run_action(Path::new("/repo"), LockAction::Lock, &target, &runner).expect("lock");
        run_action(Path::new("/repo"), LockAction::Unlock, &target, &runner).expect("unlock");

        let calls = runner.calls();
        assert_eq!(calls[0].args, vec!["lfs", "lock", "Content/Hero Mesh.uasset"]);
        assert_eq!(calls[1].args, vec!["lfs", "unlock", "Content/Hero Mesh.uasset"]);
    }

    #[test]
    fn lock_failure_carries_exit_status() {
        let runner = RecordingRunner::from_outputs(vec![output(
            "",
            "Lock exists",
            2,
        )]);
        let error = run_action(Path::new("/repo"), LockAction::Lock, &path("a.uasset"), &runner)
            .expect_err("lock should fail");
        assert_eq!(
            error,
            LfsError::CommandFailed {
                command: "lfs lock a.uasset".to_string(),
                status: 2,
                stderr: "Lock exists".to_string(),
            }
        );
    }

    #[test]
    fn runner_errors_map_to_execute() {
        let runner = RecordingRunner::from_outputs(Vec::new());
        let error = version(&runner).expect_err("missing output");
        assert!(matches!(error, LfsError::Execute(_)));
    }
}
