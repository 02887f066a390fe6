use std::collections::BTreeSet;

use crate::paths::TrackedPath;

pub const DEFAULT_ALWAYS_INCLUDE: &[&str] = &["RawContent"];

const LFS_FILTER_MARKER: &str = "filter=lfs";
const WILDCARD_EXTENSION: &str = "*.";

/// Decides which tracked files show up in the lock tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterEngine {
    extensions: BTreeSet<String>,
    always_include: Vec<String>,
}

impl FilterEngine {
    pub fn new<I, S>(extensions: I, always_include: Vec<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|value| value.as_ref().to_lowercase())
                .collect(),
            always_include,
        }
    }

    pub fn from_attributes(attributes: &str, always_include: Vec<String>) -> Self {
        Self::new(parse_lfs_extensions(attributes), always_include)
    }

    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    pub fn always_include(&self) -> &[String] {
        &self.always_include
    }

    pub fn is_always_included(&self, path: &TrackedPath) -> bool {
        let rendered = path.to_string();
        self.always_include
            .iter()
            .any(|marker| rendered.contains(marker.as_str()))
    }

    pub fn has_allowed_extension(&self, path: &TrackedPath) -> bool {
        path.extension()
            .is_some_and(|extension| self.extensions.contains(&extension.to_lowercase()))
    }

    pub fn is_included<F>(&self, path: &TrackedPath, is_ignored: F) -> bool
    where
        F: Fn(&TrackedPath) -> bool,
    {
        self.is_always_included(path) || (self.has_allowed_extension(path) && !is_ignored(path))
    }
}

/// Extensions of every `*.ext ... filter=lfs` rule in a `.gitattributes` body.
pub fn parse_lfs_extensions(attributes: &str) -> BTreeSet<String> {
    attributes
        .lines()
        .filter_map(extension_from_rule)
        .collect()
}

fn extension_from_rule(line: &str) -> Option<String> {
    let line = line.trim();
    if line.starts_with('#') || !line.to_lowercase().contains(LFS_FILTER_MARKER) {
        return None;
    }

    let start = line.find(WILDCARD_EXTENSION)? + 1;
    let token = line[start..].split_whitespace().next()?;
    if token.len() < 2 {
        return None;
    }

    Some(token.to_lowercase())
}
