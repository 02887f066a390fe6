use std::env;
use std::fmt;
use std::path::Path;

use crate::command_runner::{CommandRunner, SystemCommandRunner};
use crate::config::{LocktreeConfig, load_config, resolve_config_path};
use crate::filter::parse_lfs_extensions;
use crate::git::{ATTRIBUTES_FILE, read_attributes};
use crate::lfs;

const REPOSITORY_CHECKS: &[&str] = &[
    "repository root exists",
    "lfs attributes readable",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Pass,
    Fail,
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorCheck {
    pub name: String,
    pub state: CheckState,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorReport {
    pub checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    pub fn has_failures(&self) -> bool {
        self.checks
            .iter()
            .any(|check| check.state == CheckState::Fail)
    }

    pub fn summary(&self) -> String {
        let passed = self
            .checks
            .iter()
            .filter(|check| check.state == CheckState::Pass)
            .count();
        let failed = self.checks.len().saturating_sub(passed);
        format!("{passed} passed, {failed} failed")
    }
}

pub fn run_doctor() -> DoctorReport {
    let runner = SystemCommandRunner::new();
    run_doctor_with_runner(&runner)
}

pub fn run_doctor_with_runner(runner: &dyn CommandRunner) -> DoctorReport {
    let mut checks = Vec::new();

    checks.push(match env::consts::OS {
        "macos" => pass_check("os is supported", "detected macOS"),
        "linux" => pass_check("os is supported", "detected Linux"),
        "windows" => pass_check("os is supported", "detected Windows"),
        detected => fail_check(
            "os is supported",
            format!("detected {detected}, expected Windows, macOS or Linux"),
        ),
    });

    checks.push(if is_executable_in_path(git_executable()) {
        pass_check("git is installed", "git executable found in PATH")
    } else {
        fail_check("git is installed", "git executable not found in PATH")
    });

    checks.push(match lfs::version(runner) {
        Ok(version) => pass_check("git-lfs is installed", version),
        Err(error) => fail_check("git-lfs is installed", error.to_string()),
    });

    match resolve_config_path() {
        Ok(config_path) => {
            if config_path.exists() {
                checks.push(pass_check(
                    "config file exists",
                    format!("found at {}", config_path.display()),
                ));

                match load_config(&config_path) {
                    Ok(config) => {
                        checks.push(pass_check("config parses and validates", "config is valid"));
                        checks.extend(check_repository(&config));
                    }
                    Err(error) => {
                        checks.push(fail_check("config parses and validates", error.to_string()));
                        push_skipped_checks(&mut checks, REPOSITORY_CHECKS, "config is invalid");
                    }
                }
            } else {
                checks.push(fail_check(
                    "config file exists",
                    format!("expected at {}", config_path.display()),
                ));
                checks.push(skipped_check(
                    "config parses and validates",
                    "config file is missing",
                ));
                push_skipped_checks(&mut checks, REPOSITORY_CHECKS, "config file is missing");
            }
        }
        Err(error) => {
            checks.push(fail_check("config path resolves", error.to_string()));
            push_skipped_checks(
                &mut checks,
                &["config file exists", "config parses and validates"],
                "config path could not be resolved",
            );
            push_skipped_checks(
                &mut checks,
                REPOSITORY_CHECKS,
                "config path could not be resolved",
            );
        }
    }

    DoctorReport { checks }
}

fn check_repository(config: &LocktreeConfig) -> Vec<DoctorCheck> {
    let root = config.repository.path.as_path();
    if !root.is_dir() {
        return vec![
            fail_check(
                "repository root exists",
                format!("no directory at {}", root.display()),
            ),
            skipped_check("lfs attributes readable", "repository root is missing"),
        ];
    }

    let root_check = pass_check(
        "repository root exists",
        format!("{} at {}", config.repository.name, root.display()),
    );

    let attributes_check = match read_attributes(root) {
        Ok(raw) => {
            let extensions = parse_lfs_extensions(&raw);
            if extensions.is_empty() {
                fail_check(
                    "lfs attributes readable",
                    format!("{ATTRIBUTES_FILE} has no `*.ext filter=lfs` rules"),
                )
            } else {
                let listed: Vec<&str> = extensions.iter().map(String::as_str).collect();
                pass_check(
                    "lfs attributes readable",
                    format!("lfs extensions: {}", listed.join(" ")),
                )
            }
        }
        Err(error) => fail_check("lfs attributes readable", error.to_string()),
    };

    vec![root_check, attributes_check]
}

fn pass_check(name: &str, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        state: CheckState::Pass,
        details: details.into(),
    }
}

fn fail_check(name: &str, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        state: CheckState::Fail,
        details: details.into(),
    }
}

fn skipped_check(name: &str, reason: &str) -> DoctorCheck {
    fail_check(name, format!("skipped because {reason}"))
}

fn push_skipped_checks(checks: &mut Vec<DoctorCheck>, names: &[&str], reason: &str) {
    checks.extend(
        names
            .iter()
            .copied()
            .map(|name| skipped_check(name, reason)),
    );
}

fn git_executable() -> &'static str {
    if cfg!(windows) { "git.exe" } else { "git" }
}

fn is_executable_in_path(program: &str) -> bool {
    let program_path = Path::new(program);

    if program_path.is_absolute() || program.contains('/') {
        return is_executable_file(program_path);
    }

    let Some(path_value) = env::var_os("PATH") else {
        return false;
    };

    env::split_paths(&path_value)
        .map(|directory| directory.join(program))
        .any(|candidate| is_executable_file(&candidate))
}

fn is_executable_file(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match path.metadata() {
            Ok(metadata) => metadata.permissions().mode() & 0o111 != 0,
            Err(_) => false,
        }
    }

    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use crate::config::{FilterConfig, RepositoryConfig};

    use super::*;

    fn config_for(path: PathBuf) -> LocktreeConfig {
        LocktreeConfig {
            version: 1,
            repository: RepositoryConfig {
                path,
                name: "Athyl".to_string(),
            },
            filter: FilterConfig::default(),
        }
    }

    #[test]
    fn check_state_display_is_uppercase_label() {
        assert_eq!(CheckState::Pass.to_string(), "PASS");
        assert_eq!(CheckState::Fail.to_string(), "FAIL");
    }

    #[test]
    fn doctor_summary_counts_pass_and_fail() {
        let report = DoctorReport {
            checks: vec![
                pass_check("a", "ok"),
                fail_check("b", "no"),
                pass_check("c", "ok"),
            ],
        };

        assert_eq!(report.summary(), "2 passed, 1 failed");
        assert!(report.has_failures());
    }

    #[test]
    fn repository_checks_fail_for_missing_root() {
        let temp = tempfile::tempdir().expect("temp dir");
        let checks = check_repository(&config_for(temp.path().join("missing")));

        assert_eq!(checks.len(), 2);
        assert!(checks.iter().all(|check| check.state == CheckState::Fail));
        assert!(checks[1].details.contains("skipped because"));
    }

    #[test]
    fn repository_checks_list_lfs_extensions() {
        let temp = tempfile::tempdir().expect("temp dir");
        fs::write(
            temp.path().join(ATTRIBUTES_FILE),
            "*.uasset filter=lfs diff=lfs merge=lfs -text\n*.umap filter=lfs diff=lfs merge=lfs -text\n",
        )
        .expect("write attributes");

        let checks = check_repository(&config_for(temp.path().to_path_buf()));

        assert!(checks.iter().all(|check| check.state == CheckState::Pass));
        assert_eq!(checks[1].details, "lfs extensions: .uasset .umap");
    }

    #[test]
    fn repository_checks_flag_attributes_without_lfs_rules() {
        let temp = tempfile::tempdir().expect("temp dir");
        fs::write(temp.path().join(ATTRIBUTES_FILE), "*.txt text\n").expect("write attributes");

        let checks = check_repository(&config_for(temp.path().to_path_buf()));
        assert_eq!(checks[1].state, CheckState::Fail);
        assert!(checks[1].details.contains("no `*.ext filter=lfs` rules"));
    }
}
