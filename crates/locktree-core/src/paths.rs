use std::fmt;
use std::path::Path;

use thiserror::Error;

const QUOTES: &[char] = &['\'', '"'];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path '{raw}' is empty after normalization")]
    Invalid { raw: String },
}

/// Repository-relative file path stored as segments joined by `/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackedPath {
    segments: Vec<String>,
}

impl TrackedPath {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn file_name(&self) -> &str {
        self.segments
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Extension of the final segment including the leading dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        let index = name.rfind('.')?;
        Some(&name[index..])
    }

    /// Every prefix from the top-level segment down to the full path.
    pub fn prefixes(&self) -> impl Iterator<Item = TrackedPath> + '_ {
        (1..=self.segments.len()).map(|end| Self {
            segments: self.segments[..end].to_vec(),
        })
    }
}

impl fmt::Display for TrackedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Canonicalizes paths coming from `git ls-files`, `git lfs locks` and user input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathNormalizer {
    root_prefix: Option<String>,
}

impl PathNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repo_root(repo_root: &Path) -> Self {
        let unified = unify_separators(&repo_root.to_string_lossy());
        let trimmed = unified.trim_end_matches('/');

        Self {
            root_prefix: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        }
    }

    pub fn normalize(&self, raw: &str) -> Result<TrackedPath, PathError> {
        let unquoted = raw.trim().trim_matches(QUOTES).trim();
        let unified = unify_separators(unquoted);

        let mut relative = unified.as_str();
        if let Some(prefix) = self.root_prefix.as_deref()
            && let Some(rest) = relative.strip_prefix(prefix)
            && (rest.is_empty() || rest.starts_with('/'))
        {
            relative = rest;
        }

        let segments: Vec<String> = relative
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .map(str::to_string)
            .collect();

        if segments.is_empty() {
            return Err(PathError::Invalid {
                raw: raw.to_string(),
            });
        }

        Ok(TrackedPath { segments })
    }
}

fn unify_separators(value: &str) -> String {
    value.replace('\\', "/")
}
