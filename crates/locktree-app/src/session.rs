use std::collections::BTreeSet;
use std::path::PathBuf;

use locktree_core::command_runner::CommandRunner;
use locktree_core::config::LocktreeConfig;
use locktree_core::filter::FilterEngine;
use locktree_core::git::{self, GitError};
use locktree_core::locks::{LockRegistry, RefreshError};
use locktree_core::paths::{PathError, PathNormalizer, TrackedPath};
use locktree_core::tree::LockTree;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub root: PathBuf,
    pub name: String,
    pub always_include: Vec<String>,
}

impl From<&LocktreeConfig> for Repository {
    fn from(config: &LocktreeConfig) -> Self {
        Self {
            root: config.repository.path.clone(),
            name: config.repository.name.trim().to_string(),
            always_include: config.filter.always_include.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("repository root {path} is not a directory")]
    MissingRoot { path: PathBuf },
    #[error("failed to read lfs attributes: {0}")]
    Attributes(#[source] GitError),
    #[error("failed to list tracked files: {0}")]
    Listing(#[source] GitError),
    #[error("failed to evaluate ignore rules: {0}")]
    Ignore(#[source] GitError),
    #[error("tracked file has an unusable path: {0}")]
    Path(#[from] PathError),
    #[error("failed to list locks: {0}")]
    Locks(#[source] RefreshError),
    #[error("failed to timestamp the refresh: {0}")]
    Timestamp(#[source] time::error::Format),
}

/// Everything derived from one pass over the repository.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    pub(crate) filter: FilterEngine,
    pub(crate) registry: LockRegistry,
    pub(crate) tree: LockTree,
    pub(crate) tracked_count: usize,
    pub(crate) loaded_at: Option<String>,
}

pub(crate) fn load_snapshot(
    repository: &Repository,
    normalizer: &PathNormalizer,
    runner: &dyn CommandRunner,
) -> Result<Snapshot, LoadError> {
    let root = repository.root.as_path();
    if !root.is_dir() {
        return Err(LoadError::MissingRoot {
            path: root.to_path_buf(),
        });
    }

    let attributes = git::read_attributes(root).map_err(LoadError::Attributes)?;
    let filter = FilterEngine::from_attributes(&attributes, repository.always_include.clone());

    let listing = git::tracked_files(root, runner).map_err(LoadError::Listing)?;
    let tracked = listing
        .iter()
        .map(|raw| normalizer.normalize(raw))
        .collect::<Result<Vec<TrackedPath>, PathError>>()?;

    let candidates: Vec<String> = tracked
        .iter()
        .filter(|path| !filter.is_always_included(path) && filter.has_allowed_extension(path))
        .map(TrackedPath::to_string)
        .collect();
    let ignored: BTreeSet<String> =
        git::ignored_paths(root, &candidates, runner).map_err(LoadError::Ignore)?;

    let included: Vec<TrackedPath> = tracked
        .into_iter()
        .filter(|path| filter.is_included(path, |path| ignored.contains(&path.to_string())))
        .collect();

    let mut registry = LockRegistry::new();
    registry
        .refresh(root, runner, normalizer)
        .map_err(LoadError::Locks)?;

    let tree = LockTree::build(&repository.name, &included, &registry);
    let loaded_at = locktree_core::time::now_utc_rfc3339().map_err(LoadError::Timestamp)?;

    Ok(Snapshot {
        filter,
        registry,
        tree,
        tracked_count: listing.len(),
        loaded_at: Some(loaded_at),
    })
}
