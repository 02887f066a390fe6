mod controller;
mod session;
mod status;

use anyhow::{Context, Result, anyhow, bail};
use locktree_core::command_runner::CommandRunner;
use locktree_core::config::{LocktreeConfig, load_config, resolve_config_path};
use locktree_core::doctor::{DoctorReport, run_doctor_with_runner};
use locktree_core::lfs::LockAction;

pub use controller::{ControlError, LockController, LockOutcome, PendingRequest};
pub use session::{LoadError, Repository};
pub use status::{StatusReport, StatusRow};

pub struct App<'a> {
    pub runner: &'a dyn CommandRunner,
}

impl<'a> App<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    pub fn doctor(&self) -> Result<DoctorReport> {
        Ok(run_doctor_with_runner(self.runner))
    }

    pub fn ensure_config_ready(&self) -> Result<LocktreeConfig> {
        let config_path = resolve_config_path().context("failed to resolve config path")?;

        if !config_path.exists() {
            bail!(
                "missing config at {}\nCreate ~/.config/locktree/config.toml and see README.md for setup instructions.",
                config_path.display()
            );
        }

        load_config(&config_path).map_err(|error| {
            anyhow!(
                "invalid config at {}: {error}\nFix the config and retry. See README.md for setup instructions.",
                config_path.display()
            )
        })
    }

    pub fn ensure_repository_ready(&self, config: &LocktreeConfig) -> Result<Repository> {
        let repository = Repository::from(config);

        if !repository.root.is_dir() {
            bail!(
                "repository root {} does not exist or is not a directory",
                repository.root.display()
            );
        }

        let top_level = locktree_core::git::repo_root(&repository.root, self.runner)
            .with_context(|| {
                format!(
                    "failed to resolve git repository root from {}",
                    repository.root.display()
                )
            })?;

        // Lock listings are relative to the top level, so the tree must be too.
        let configured = std::fs::canonicalize(&repository.root)
            .with_context(|| format!("failed to canonicalize {}", repository.root.display()))?;
        let resolved = std::fs::canonicalize(&top_level)
            .with_context(|| format!("failed to canonicalize {}", top_level.display()))?;
        if configured != resolved {
            bail!(
                "repository root {} is not the top level of its git repository ({})\nSet repository.path to {} in the config.",
                repository.root.display(),
                top_level.display(),
                top_level.display()
            );
        }

        Ok(repository)
    }

    pub fn open(&self, repository: Repository) -> Result<LockController> {
        let name = repository.name.clone();
        LockController::load(repository, self.runner)
            .with_context(|| format!("failed to load lock tree for '{name}'"))
    }

    pub fn lock(&self, controller: &mut LockController, raw_path: &str) -> Result<LockOutcome> {
        self.apply(controller, LockAction::Lock, raw_path)
    }

    pub fn unlock(&self, controller: &mut LockController, raw_path: &str) -> Result<LockOutcome> {
        self.apply(controller, LockAction::Unlock, raw_path)
    }

    fn apply(
        &self,
        controller: &mut LockController,
        action: LockAction,
        raw_path: &str,
    ) -> Result<LockOutcome> {
        let path = controller
            .resolve(raw_path)
            .with_context(|| format!("failed to resolve '{raw_path}'"))?;

        controller
            .execute(action, &path, self.runner)
            .with_context(|| format!("failed to {} '{path}'", action.as_str()))
    }
}
