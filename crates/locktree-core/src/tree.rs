//! Directory tree projected from the tracked file listing.
//!
//! Nodes live in an arena owned by [`LockTree`]. Only [`LockTree::build`]
//! creates nodes; afterwards the sole mutation is flipping a file's lock
//! flag. Every directory keeps a count of locked files below it, patched
//! along the parent chain whenever a flag flips.

use std::collections::HashMap;

use crate::locks::LockRegistry;
use crate::paths::TrackedPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Directory,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    Unlocked,
    Locked,
    /// Directory with at least one locked file below it.
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    name: String,
    path: Option<TrackedPath>,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    locked: bool,
    locked_below: usize,
}

impl TreeNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&TrackedPath> {
        self.path.as_ref()
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTree {
    nodes: Vec<TreeNode>,
    index: HashMap<TrackedPath, NodeId>,
}

impl LockTree {
    const ROOT: NodeId = NodeId(0);

    pub fn build<'a, I>(root_name: &str, paths: I, locks: &LockRegistry) -> Self
    where
        I: IntoIterator<Item = &'a TrackedPath>,
    {
        let mut tree = Self {
            nodes: vec![TreeNode {
                name: root_name.to_string(),
                path: None,
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
                locked: false,
                locked_below: 0,
            }],
            index: HashMap::new(),
        };

        for path in paths {
            tree.insert(path, locks);
        }

        tree
    }

    fn insert(&mut self, path: &TrackedPath, locks: &LockRegistry) {
        let mut parent = Self::ROOT;
        let depth = path.depth();

        for (level, prefix) in path.prefixes().enumerate() {
            let is_leaf = level + 1 == depth;

            let id = match self.index.get(&prefix) {
                Some(existing) => *existing,
                None => {
                    let id = NodeId(self.nodes.len());
                    self.nodes.push(TreeNode {
                        name: prefix.file_name().to_string(),
                        kind: if is_leaf {
                            NodeKind::File
                        } else {
                            NodeKind::Directory
                        },
                        path: Some(prefix.clone()),
                        parent: Some(parent),
                        children: Vec::new(),
                        locked: false,
                        locked_below: 0,
                    });
                    self.nodes[parent.0].children.push(id);
                    self.index.insert(prefix, id);
                    id
                }
            };

            if is_leaf && self.nodes[id.0].kind == NodeKind::File {
                self.apply_lock(id, locks.contains(path));
            }

            parent = id;
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn find(&self, path: &TrackedPath) -> Option<NodeId> {
        self.index.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn status(&self, id: NodeId) -> LockStatus {
        let node = self.node(id);
        match node.kind {
            NodeKind::File if node.locked => LockStatus::Locked,
            NodeKind::File => LockStatus::Unlocked,
            NodeKind::Root | NodeKind::Directory if node.locked_below > 0 => LockStatus::Mixed,
            NodeKind::Root | NodeKind::Directory => LockStatus::Unlocked,
        }
    }

    /// Locked files anywhere below `id`. Zero for files.
    pub fn locked_below(&self, id: NodeId) -> usize {
        self.node(id).locked_below
    }

    /// Patches a single file after a lock change. Returns `false` when the
    /// path is not a file in this tree.
    pub fn set_locked(&mut self, path: &TrackedPath, locked: bool) -> bool {
        let Some(id) = self.find(path) else {
            return false;
        };

        if self.nodes[id.0].kind != NodeKind::File {
            return false;
        }

        self.apply_lock(id, locked);
        true
    }

    fn apply_lock(&mut self, file: NodeId, locked: bool) {
        if self.nodes[file.0].locked == locked {
            return;
        }
        self.nodes[file.0].locked = locked;

        let mut ancestor = self.nodes[file.0].parent;
        while let Some(id) = ancestor {
            let node = &mut self.nodes[id.0];
            if locked {
                node.locked_below += 1;
            } else {
                node.locked_below -= 1;
            }
            ancestor = node.parent;
        }
    }

    pub fn file_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_file()).count()
    }

    pub fn locked_files(&self) -> impl Iterator<Item = &TrackedPath> {
        self.nodes
            .iter()
            .filter(|node| node.is_file() && node.locked)
            .filter_map(|node| node.path.as_ref())
    }

    /// Depth-first, pre-order walk in child insertion order. The root is
    /// reported at depth 0.
    pub fn walk(&self) -> Vec<(usize, NodeId)> {
        let mut visited = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(0usize, Self::ROOT)];

        while let Some((depth, id)) = stack.pop() {
            visited.push((depth, id));
            for child in self.node(id).children.iter().rev() {
                stack.push((depth + 1, *child));
            }
        }

        visited
    }
}
