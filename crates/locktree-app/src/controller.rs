use locktree_core::command_runner::CommandRunner;
use locktree_core::filter::FilterEngine;
use locktree_core::lfs::{self, LfsError, LockAction};
use locktree_core::locks::LockRegistry;
use locktree_core::paths::{PathError, PathNormalizer, TrackedPath};
use locktree_core::tree::LockTree;
use thiserror::Error;

use crate::session::{LoadError, Repository, Snapshot, load_snapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub action: LockAction,
    pub path: TrackedPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    Applied,
    /// The registry already matched the requested state; nothing was run.
    Skipped,
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("a {} request for {} is still running", .0.action.as_str(), .0.path)]
    Busy(PendingRequest),
    #[error("'{path}' is not a file in the lock tree")]
    NotAFile { path: TrackedPath },
    #[error("no lock request is outstanding")]
    NoPendingRequest,
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Service(#[from] LfsError),
    #[error(transparent)]
    Repository(#[from] LoadError),
}

/// Owns the lock registry and the tree and serializes every lock change.
///
/// A change is split into [`begin`](Self::begin), which checks preconditions
/// and marks the controller busy, and [`finish`](Self::finish), which clears
/// the busy marker and applies the service result. Only one change may be
/// outstanding at a time.
#[derive(Debug, Clone)]
pub struct LockController {
    repository: Repository,
    normalizer: PathNormalizer,
    filter: FilterEngine,
    registry: LockRegistry,
    tree: LockTree,
    tracked_count: usize,
    loaded_at: Option<String>,
    pending: Option<PendingRequest>,
}

impl LockController {
    pub fn load(repository: Repository, runner: &dyn CommandRunner) -> Result<Self, LoadError> {
        let normalizer = PathNormalizer::with_repo_root(&repository.root);
        let snapshot = load_snapshot(&repository, &normalizer, runner)?;
        Ok(Self::from_snapshot(repository, normalizer, snapshot))
    }

    fn from_snapshot(
        repository: Repository,
        normalizer: PathNormalizer,
        snapshot: Snapshot,
    ) -> Self {
        Self {
            repository,
            normalizer,
            filter: snapshot.filter,
            registry: snapshot.registry,
            tree: snapshot.tree,
            tracked_count: snapshot.tracked_count,
            loaded_at: snapshot.loaded_at,
            pending: None,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn filter(&self) -> &FilterEngine {
        &self.filter
    }

    pub fn registry(&self) -> &LockRegistry {
        &self.registry
    }

    pub fn tree(&self) -> &LockTree {
        &self.tree
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked_count
    }

    pub fn loaded_at(&self) -> Option<&str> {
        self.loaded_at.as_deref()
    }

    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn resolve(&self, raw: &str) -> Result<TrackedPath, ControlError> {
        Ok(self.normalizer.normalize(raw)?)
    }

    pub fn is_locked(&self, path: &TrackedPath) -> bool {
        self.registry.contains(path)
    }

    /// Lock when unlocked, unlock when locked.
    pub fn toggle_action(&self, path: &TrackedPath) -> LockAction {
        if self.registry.contains(path) {
            LockAction::Unlock
        } else {
            LockAction::Lock
        }
    }

    pub fn begin(
        &mut self,
        action: LockAction,
        path: &TrackedPath,
    ) -> Result<Option<PendingRequest>, ControlError> {
        if let Some(pending) = &self.pending {
            return Err(ControlError::Busy(pending.clone()));
        }

        let is_file = self
            .tree
            .find(path)
            .is_some_and(|id| self.tree.node(id).is_file());
        if !is_file {
            return Err(ControlError::NotAFile { path: path.clone() });
        }

        let already_applied = match action {
            LockAction::Lock => self.registry.contains(path),
            LockAction::Unlock => !self.registry.contains(path),
        };
        if already_applied {
            return Ok(None);
        }

        let request = PendingRequest {
            action,
            path: path.clone(),
        };
        self.pending = Some(request.clone());
        Ok(Some(request))
    }

    /// Clears the outstanding request, then applies `result` to the
    /// registry and the tree. A service failure mutates nothing.
    pub fn finish(&mut self, result: Result<(), LfsError>) -> Result<LockOutcome, ControlError> {
        let request = self.pending.take().ok_or(ControlError::NoPendingRequest)?;
        result?;

        match request.action {
            LockAction::Lock => {
                self.registry.add(request.path.clone());
                self.tree.set_locked(&request.path, true);
            }
            LockAction::Unlock => {
                self.registry.remove(&request.path);
                self.tree.set_locked(&request.path, false);
            }
        }

        Ok(LockOutcome::Applied)
    }

    pub fn execute(
        &mut self,
        action: LockAction,
        path: &TrackedPath,
        runner: &dyn CommandRunner,
    ) -> Result<LockOutcome, ControlError> {
        let Some(request) = self.begin(action, path)? else {
            return Ok(LockOutcome::Skipped);
        };

        let result = lfs::run_action(&self.repository.root, request.action, &request.path, runner);
        self.finish(result)
    }

    pub fn lock(
        &mut self,
        path: &TrackedPath,
        runner: &dyn CommandRunner,
    ) -> Result<LockOutcome, ControlError> {
        self.execute(LockAction::Lock, path, runner)
    }

    pub fn unlock(
        &mut self,
        path: &TrackedPath,
        runner: &dyn CommandRunner,
    ) -> Result<LockOutcome, ControlError> {
        self.execute(LockAction::Unlock, path, runner)
    }

    /// Rebuilds the registry and the tree from scratch. On failure the
    /// previous state stays in place.
    pub fn refresh(&mut self, runner: &dyn CommandRunner) -> Result<(), ControlError> {
        if let Some(pending) = &self.pending {
            return Err(ControlError::Busy(pending.clone()));
        }

        let snapshot = load_snapshot(&self.repository, &self.normalizer, runner)?;
        *self = Self::from_snapshot(
            self.repository.clone(),
            self.normalizer.clone(),
            snapshot,
        );
        Ok(())
    }
}
