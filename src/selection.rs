use crate::merge::{IssueKind, MergeIssue};
use ignore::WalkBuilder;
use log::{debug, warn};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

/// Whether a selected path names a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
}

/// One entry of the user's selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRef {
    pub path: PathBuf,
    pub kind: PathKind,
}

impl PathRef {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: PathKind::File,
        }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: PathKind::Directory,
        }
    }

    /// Stats `path` to decide its kind.
    pub fn stat(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let kind = if std::fs::metadata(&path)?.is_dir() {
            PathKind::Directory
        } else {
            PathKind::File
        };
        Ok(Self { path, kind })
    }
}

/// Deduplicated absolute file paths slated for a merge. Never holds directories.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileSet {
    paths: HashSet<PathBuf>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the path was already present.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        self.paths.insert(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }

    /// Pairs every path with its display key and sorts by that key.
    ///
    /// Keys are compared one `/` segment at a time, the order a depth-first
    /// walk of the rendered tree visits its leaves in.
    pub fn sorted_by_key<F>(&self, key: F) -> Vec<(String, &Path)>
    where
        F: Fn(&Path) -> String,
    {
        let mut entries: Vec<_> = self
            .paths
            .iter()
            .map(|p| (key(p), p.as_path()))
            .collect();
        entries.sort_by(|a, b| {
            a.0.split('/')
                .cmp(b.0.split('/'))
                .then_with(|| a.1.cmp(b.1))
        });
        entries
    }
}

impl FromIterator<PathBuf> for FileSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

/// Expands `selection` into a [`FileSet`].
///
/// Files are tested against `include` directly; directories are walked and
/// every descendant file is tested before insertion. A directory that cannot
/// be read is recorded in `issues` and skipped.
pub fn resolve_selection<F>(
    selection: &[PathRef],
    include: F,
    issues: &mut Vec<MergeIssue>,
) -> FileSet
where
    F: Fn(&Path) -> bool,
{
    let mut files = FileSet::new();

    for entry in selection {
        match entry.kind {
            PathKind::File => {
                if include(&entry.path) {
                    files.insert(entry.path.clone());
                } else {
                    debug!("Filtered out: {}", entry.path.display());
                }
            }
            PathKind::Directory => collect_directory(&entry.path, &include, &mut files, issues),
        }
    }

    debug!(
        "Resolved {} selected entries into {} files",
        selection.len(),
        files.len()
    );
    files
}

fn collect_directory<F>(dir: &Path, include: &F, files: &mut FileSet, issues: &mut Vec<MergeIssue>)
where
    F: Fn(&Path) -> bool,
{
    // Filtering is ours to do, so the walker's own rules stay off.
    let walker = WalkBuilder::new(dir).standard_filters(false).build();

    for result in walker {
        match result {
            Ok(entry) => {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                if include(path) {
                    files.insert(path.to_path_buf());
                } else {
                    debug!("Filtered out: {}", path.display());
                }
            }
            Err(err) => {
                warn!("Error walking path: {err}");
                let path = walk_error_path(&err).unwrap_or_else(|| dir.to_path_buf());
                issues.push(MergeIssue::new(
                    path,
                    IssueKind::UnreadableDirectory,
                    err.to_string(),
                ));
            }
        }
    }
}

fn walk_error_path(err: &ignore::Error) -> Option<PathBuf> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.clone()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            walk_error_path(err)
        }
        _ => None,
    }
}
