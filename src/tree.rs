//! ASCII directory tree of the files in a merge.
//!
//! Relative paths are split on `/` and inserted into an arena-backed trie.
//! Node `0` is the unnamed root; every other node owns its name and an
//! ordered map of child ids, so rendering walks children in sorted order
//! without any extra sorting pass.

use crate::selection::FileSet;
use std::collections::BTreeMap;
use std::path::Path;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

pub type NodeId = usize;

/// One name in the tree. A node with children always renders as a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub name: String,
    pub children: BTreeMap<String, NodeId>,
    pub is_leaf: bool,
}

impl TreeNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            children: BTreeMap::new(),
            is_leaf: false,
        }
    }

    pub fn is_dir(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Trie of relative paths, stored as a flat arena.
#[derive(Debug, Clone)]
pub struct FileTree {
    nodes: Vec<TreeNode>,
}

impl Default for FileTree {
    fn default() -> Self {
        Self {
            nodes: vec![TreeNode::new("")],
        }
    }
}

impl FileTree {
    pub const ROOT: NodeId = 0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the tree for every file in `files`, labelled by `relative`.
    pub fn from_files<F>(files: &FileSet, relative: F) -> Self
    where
        F: Fn(&Path) -> String,
    {
        let mut tree = Self::new();
        for path in files.iter() {
            tree.insert(&relative(path));
        }
        tree
    }

    /// Inserts a `/`-separated path, marking its last segment as a file.
    pub fn insert(&mut self, relative_path: &str) {
        let mut current = Self::ROOT;
        let mut segments = relative_path.split('/').filter(|s| !s.is_empty()).peekable();

        while let Some(segment) = segments.next() {
            current = match self.nodes[current].children.get(segment) {
                Some(&id) => id,
                None => {
                    let id = self.nodes.len();
                    self.nodes.push(TreeNode::new(segment));
                    self.nodes[current].children.insert(segment.to_string(), id);
                    id
                }
            };
            if segments.peek().is_none() {
                self.nodes[current].is_leaf = true;
            }
        }
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[Self::ROOT].children.is_empty()
    }

    /// Renders the tree, one line per node, without a trailing newline.
    ///
    /// Each top-level name gets its own unindented line and its subtree is
    /// drawn below it with box-drawing connectors.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        for &top in self.nodes[Self::ROOT].children.values() {
            lines.push(self.label(top));
            self.render_children(top, "", &mut lines);
        }
        lines.join("\n")
    }

    fn render_children(&self, id: NodeId, prefix: &str, lines: &mut Vec<String>) {
        let children = &self.nodes[id].children;
        let count = children.len();

        for (index, &child) in children.values().enumerate() {
            let last = index + 1 == count;
            let connector = if last { LAST_BRANCH } else { BRANCH };
            lines.push(format!("{prefix}{connector}{}", self.label(child)));

            if self.nodes[child].is_dir() {
                let continuation = if last { SPACE } else { PIPE };
                self.render_children(child, &format!("{prefix}{continuation}"), lines);
            }
        }
    }

    fn label(&self, id: NodeId) -> String {
        let node = &self.nodes[id];
        if node.is_dir() {
            format!("{}/", node.name)
        } else {
            node.name.clone()
        }
    }
}

/// Renders the directory tree for `files`.
pub fn render_tree<F>(files: &FileSet, relative: F) -> String
where
    F: Fn(&Path) -> String,
{
    FileTree::from_files(files, relative).render()
}
