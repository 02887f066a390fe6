use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::command_adapter;
use crate::command_runner::{CommandOutput, CommandRunner};

pub const ATTRIBUTES_FILE: &str = ".gitattributes";

const CHECK_IGNORE_ARGS: [&str; 4] = ["check-ignore", "--no-index", "--stdin", "-z"];

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git command failed: git {command} (exit {status}) {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },
    #[error("failed to execute git command: {0}")]
    Execute(String),
    #[error("failed to parse git output: {0}")]
    Parse(String),
    #[error("failed to read attributes at {path}: {source}")]
    Attributes {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn repo_root(cwd: &Path, runner: &dyn CommandRunner) -> Result<PathBuf, GitError> {
    let output = run_git_checked(runner, &["rev-parse", "--show-toplevel"], Some(cwd))?;
    output
        .stdout
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| GitError::Parse("git rev-parse returned empty repo root".to_string()))
}

/// Index entries in listing order, exactly as git renders them.
pub fn tracked_files(repo_root: &Path, runner: &dyn CommandRunner) -> Result<Vec<String>, GitError> {
    let output = run_git_checked(runner, &["ls-files", "-z"], Some(repo_root))?;
    Ok(split_nul(&output.stdout))
}

/// Subset of `candidates` matched by the repository's ignore rules.
///
/// Runs with `--no-index` so tracked files are still tested against the
/// rules. Candidates go over stdin NUL-separated, so any file name survives
/// and the argument list stays short.
pub fn ignored_paths(
    repo_root: &Path,
    candidates: &[String],
    runner: &dyn CommandRunner,
) -> Result<BTreeSet<String>, GitError> {
    if candidates.is_empty() {
        return Ok(BTreeSet::new());
    }

    let mut input = String::new();
    for candidate in candidates {
        input.push_str(candidate);
        input.push('\0');
    }

    let output = command_adapter::run_program_with_input(
        runner,
        "git",
        &CHECK_IGNORE_ARGS,
        Some(repo_root),
        Some(&input),
    )
    .map_err(GitError::Execute)?;
    // Exit 1 means nothing matched.
    let output = command_adapter::ensure_status(&CHECK_IGNORE_ARGS, output, &[0, 1])
        .map_err(|failure| GitError::CommandFailed {
            command: failure.command,
            status: failure.status,
            stderr: failure.stderr,
        })?;

    Ok(split_nul(&output.stdout).into_iter().collect())
}

pub fn read_attributes(repo_root: &Path) -> Result<String, GitError> {
    let path = repo_root.join(ATTRIBUTES_FILE);
    std::fs::read_to_string(&path).map_err(|source| GitError::Attributes { path, source })
}

fn split_nul(raw: &str) -> Vec<String> {
    raw.split('\0')
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn run_git_checked(
    runner: &dyn CommandRunner,
    args: &[&str],
    cwd: Option<&Path>,
) -> Result<CommandOutput, GitError> {
    let output = run_git(runner, args, cwd)?;
    command_adapter::ensure_success(args, output).map_err(|failure| GitError::CommandFailed {
        command: failure.command,
        status: failure.status,
        stderr: failure.stderr,
    })
}

fn run_git(
    runner: &dyn CommandRunner,
    args: &[&str],
    cwd: Option<&Path>,
) -> Result<CommandOutput, GitError> {
    command_adapter::run_program(runner, "git", args, cwd).map_err(GitError::Execute)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::process::Command;

    use crate::command_runner::SystemCommandRunner;
    use crate::test_support::{RecordingRunner, output};

    use super::*;

    #[test]
    fn repo_root_reads_first_line() {
        let runner = RecordingRunner::from_outputs(vec![output("/work/Athyl\n", "", 0)]);
        let root = repo_root(Path::new("/work/Athyl/Content"), &runner).expect("root");
        assert_eq!(root, PathBuf::from("/work/Athyl"));
    }

    #[test]
    fn tracked_files_splits_nul_separated_listing() {
        let runner = RecordingRunner::from_outputs(vec![output(
            "Content/Hero Mesh.uasset\0Content/Maps/Level.umap\0README.md\0",
            "",
            0,
        )]);

        let files = tracked_files(Path::new("/repo"), &runner).expect("files");

        assert_eq!(
            files,
            vec!["Content/Hero Mesh.uasset", "Content/Maps/Level.umap", "README.md"]
        );
        let calls = runner.calls();
        assert_eq!(calls[0].args, vec!["ls-files", "-z"]);
        assert_eq!(calls[0].cwd.as_deref(), Some(Path::new("/repo")));
    }

    #[test]
    fn tracked_files_reports_command_failure() {
        let runner = RecordingRunner::from_outputs(vec![output(
            "",
            "fatal: not a git repository",
            128,
        )]);

        let error = tracked_files(Path::new("/repo"), &runner).expect_err("should fail");
        assert!(matches!(error, GitError::CommandFailed { status: 128, .. }));
    }

    #[test]
    fn ignored_paths_accepts_no_match_exit_code() {
        let runner = RecordingRunner::from_outputs(vec![
            output("Saved/a.uasset\0", "", 0),
        ]);
        let candidates = vec!["Saved/a.uasset".to_string(), "Content/b.uasset".to_string()];

        let ignored = ignored_paths(Path::new("/repo"), &candidates, &runner).expect("ignored");
        assert_eq!(ignored.len(), 1);
        assert!(ignored.contains("Saved/a.uasset"));

        let runner = RecordingRunner::from_outputs(vec![output("", "", 1)]);
        let ignored = ignored_paths(Path::new("/repo"), &candidates, &runner).expect("none");
        assert!(ignored.is_empty());
    }

    #[test]
    fn ignored_paths_feeds_candidates_over_stdin() {
        let runner = RecordingRunner::from_outputs(vec![output("", "", 1)]);
        let candidates = vec!["Saved/a.uasset".to_string(), "Content/Hero Mesh.uasset".to_string()];

        ignored_paths(Path::new("/repo"), &candidates, &runner).expect("ignored");

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args, vec!["check-ignore", "--no-index", "--stdin", "-z"]);
        assert_eq!(
            calls[0].input.as_deref(),
            Some("Saved/a.uasset\0Content/Hero Mesh.uasset\0")
        );
    }

    #[test]
    fn ignored_paths_matches_rules_in_a_real_repository() {
        let temp = tempfile::tempdir().expect("temp dir");
        let repo = temp.path();
        let init = Command::new("git")
            .args(["init", "-q"])
            .current_dir(repo)
            .output()
            .expect("git init should execute");
        assert!(init.status.success());
        fs::write(repo.join(".gitignore"), "Saved/**\n").expect("write gitignore");

        let candidates = vec![
            "Saved/Cache.uasset".to_string(),
            "Content/Hero Mesh.uasset".to_string(),
        ];
        let ignored = ignored_paths(repo, &candidates, &SystemCommandRunner::new())
            .expect("check-ignore");

        assert_eq!(ignored.into_iter().collect::<Vec<_>>(), vec!["Saved/Cache.uasset"]);
    }

    #[test]
    fn ignored_paths_skips_git_when_no_candidates() {
        let runner = RecordingRunner::from_outputs(Vec::new());
        let ignored = ignored_paths(Path::new("/repo"), &[], &runner).expect("empty");
        assert!(ignored.is_empty());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn ignored_paths_surfaces_fatal_errors() {
        let runner = RecordingRunner::from_outputs(vec![output("", "fatal: bad pathspec", 128)]);
        let error = ignored_paths(Path::new("/repo"), &["a.uasset".to_string()], &runner)
            .expect_err("should fail");
        assert!(error.to_string().contains("check-ignore"));
    }

    #[test]
    fn read_attributes_reports_missing_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        let error = read_attributes(temp.path()).expect_err("missing attributes");
        assert!(matches!(error, GitError::Attributes { .. }));

        fs::write(temp.path().join(ATTRIBUTES_FILE), "*.uasset filter=lfs\n")
            .expect("write attributes");
        let attributes = read_attributes(temp.path()).expect("attributes");
        assert!(attributes.contains("filter=lfs"));
    }
}
