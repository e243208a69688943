use crate::error::{MergeError, MergeResult};
use crate::ignore_filter::IgnoreFilter;
use crate::selection::{PathRef, resolve_selection};
use crate::tree::render_tree;
use crate::utils::relative_path;
use crate::writer::serialize_contents;
use log::info;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Text placed between the tree summary and the file blocks.
pub const TREE_CONTENT_SEPARATOR: &str = "\n\n\n";

/// Default file name suggested for the merged document.
pub const DEFAULT_OUTPUT_NAME: &str = "merged_output.txt";

/// What went wrong with a single entry that was left out of the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    UnreadableDirectory,
    UnreadableFile,
    NotText,
    IgnoreRules,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            IssueKind::UnreadableDirectory => "unreadable directory",
            IssueKind::UnreadableFile => "unreadable file",
            IssueKind::NotText => "not valid UTF-8 text",
            IssueKind::IgnoreRules => "ignore rules not applied",
        };
        f.write_str(text)
    }
}

/// A recoverable, per-entry failure. The merge carries on without the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeIssue {
    pub path: PathBuf,
    pub kind: IssueKind,
    pub message: String,
}

impl MergeIssue {
    pub fn new(path: PathBuf, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for MergeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.path.display(), self.kind, self.message)
    }
}

#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Base directory for relative paths and ignore rules. Required.
    pub workspace_root: Option<PathBuf>,
    pub respect_gitignore: bool,
    /// Selections shorter than this are rejected before any I/O.
    pub min_selections: usize,
    /// Files never merged regardless of the rules, e.g. the output itself.
    pub excluded_paths: HashSet<PathBuf>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            workspace_root: None,
            respect_gitignore: true,
            min_selections: 0,
            excluded_paths: HashSet::new(),
        }
    }
}

impl MergeOptions {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: Some(root.into()),
            ..Self::default()
        }
    }
}

/// The tree summary followed by every file block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedDocument {
    pub tree: String,
    pub content: String,
    /// Number of files whose contents made it into the document.
    pub file_count: usize,
    pub issues: Vec<MergeIssue>,
}

impl MergedDocument {
    /// The full document text.
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MergedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{TREE_CONTENT_SEPARATOR}{}", self.tree, self.content)
    }
}

/// Rejects selections shorter than `required` entries.
pub fn check_selection_count(given: usize, required: usize) -> MergeResult<()> {
    if given < required {
        return Err(MergeError::TooFewSelections { required, given });
    }
    Ok(())
}

/// Merges `selection` into one document.
///
/// Fails only when the selection is too short or no workspace root is
/// known. Everything else that goes wrong is collected in
/// [`MergedDocument::issues`].
pub async fn merge(selection: &[PathRef], options: &MergeOptions) -> MergeResult<MergedDocument> {
    check_selection_count(selection.len(), options.min_selections)?;

    let root = options
        .workspace_root
        .as_deref()
        .ok_or(MergeError::NoWorkspace)?;

    let mut issues = Vec::new();

    let mut filter = IgnoreFilter::build(root, options.respect_gitignore)
        .with_excluded(options.excluded_paths.iter().cloned());
    issues.extend(filter.take_issue());

    let files = resolve_selection(selection, |p| filter.is_included(p), &mut issues);
    info!("Merging {} files from {}", files.len(), root.display());

    let relative = |p: &std::path::Path| relative_path(Some(root), p);
    let tree = render_tree(&files, relative);

    let issues_before = issues.len();
    let content = serialize_contents(&files, relative, &mut issues).await;
    let skipped = issues.len() - issues_before;

    Ok(MergedDocument {
        tree,
        content,
        file_count: files.len() - skipped,
        issues,
    })
}
