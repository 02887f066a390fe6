use std::path::PathBuf;

use locktree_core::tree::LockStatus;

use crate::controller::LockController;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub name: String,
    pub root: PathBuf,
    pub loaded_at: Option<String>,
    pub tracked_count: usize,
    pub rows: Vec<StatusRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub path: String,
    pub locked: bool,
}

impl StatusReport {
    pub fn locked_count(&self) -> usize {
        self.rows.iter().filter(|row| row.locked).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} files shown ({} locked) of {} tracked",
            self.rows.len(),
            self.locked_count(),
            self.tracked_count
        )
    }
}

impl LockController {
    /// Included files in tree order.
    pub fn status_report(&self) -> StatusReport {
        let tree = self.tree();
        let rows = tree
            .walk()
            .into_iter()
            .map(|(_, id)| id)
            .filter(|id| tree.node(*id).is_file())
            .filter_map(|id| {
                let path = tree.node(id).path()?;
                Some(StatusRow {
                    path: path.to_string(),
                    locked: tree.status(id) == LockStatus::Locked,
                })
            })
            .collect();

        StatusReport {
            name: self.repository().name.clone(),
            root: self.repository().root.clone(),
            loaded_at: self.loaded_at().map(str::to_string),
            tracked_count: self.tracked_count(),
            rows,
        }
    }
}
