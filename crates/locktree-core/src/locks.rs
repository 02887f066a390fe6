use std::collections::BTreeSet;
use std::path::Path;

use thiserror::Error;

use crate::command_runner::CommandRunner;
use crate::lfs::{self, LfsError};
use crate::paths::{PathError, PathNormalizer, TrackedPath};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Service(#[from] LfsError),
    #[error("unreadable lock line {line_number}: {source}")]
    Line {
        line_number: usize,
        #[source]
        source: PathError,
    },
}

/// Paths currently locked by anyone, as reported by `git lfs locks`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockRegistry {
    locked: BTreeSet<TrackedPath>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &TrackedPath) -> bool {
        self.locked.contains(path)
    }

    /// Returns `true` when the path was not locked before.
    pub fn add(&mut self, path: TrackedPath) -> bool {
        self.locked.insert(path)
    }

    /// Returns `true` when the path was locked before.
    pub fn remove(&mut self, path: &TrackedPath) -> bool {
        self.locked.remove(path)
    }

    pub fn len(&self) -> usize {
        self.locked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locked.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedPath> {
        self.locked.iter()
    }

    pub fn refresh(
        &mut self,
        repo_root: &Path,
        runner: &dyn CommandRunner,
        normalizer: &PathNormalizer,
    ) -> Result<(), RefreshError> {
        let lines = lfs::list_locks(repo_root, runner)?;
        self.replace_from_lines(&lines, normalizer)
    }

    /// Swaps in the parsed set only once every line parsed.
    pub fn replace_from_lines<S: AsRef<str>>(
        &mut self,
        lines: &[S],
        normalizer: &PathNormalizer,
    ) -> Result<(), RefreshError> {
        let mut parsed = BTreeSet::new();

        for (index, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }

            let raw_path = line.split('\t').next().unwrap_or_default();
            let path = normalizer
                .normalize(raw_path)
                .map_err(|source| RefreshError::Line {
                    line_number: index + 1,
                    source,
                })?;
            parsed.insert(path);
        }

        self.locked = parsed;
        Ok(())
    }
}

impl FromIterator<TrackedPath> for LockRegistry {
    fn from_iter<T: IntoIterator<Item = TrackedPath>>(iter: T) -> Self {
        Self {
            locked: iter.into_iter().collect(),
        }
    }
}
