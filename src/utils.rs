use std::io;
use std::path::{Component, Path, PathBuf};

/// Maps an absolute file path to its display path inside the workspace.
///
/// The result starts with the workspace root's own folder name and always uses
/// `/` separators, e.g. `/home/me/proj/src/a.ts` under `/home/me/proj` becomes
/// `proj/src/a.ts`. Without a root, for a path outside of it, or for one that
/// climbs back out through `..`, only the file's base name is returned.
pub fn relative_path(root: Option<&Path>, path: &Path) -> String {
    let Some(root) = root else {
        return base_name(path);
    };

    let Ok(rel) = path.strip_prefix(root) else {
        return base_name(path);
    };
    if rel.components().any(|c| c == Component::ParentDir) {
        return base_name(path);
    }

    let mut segments: Vec<String> = Vec::new();
    if let Some(root_name) = root.file_name() {
        segments.push(root_name.to_string_lossy().into_owned());
    }
    segments.extend(rel.components().filter_map(|c| match c {
        Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
        _ => None,
    }));

    if segments.is_empty() {
        base_name(path)
    } else {
        segments.join("/")
    }
}

/// Resolves `.`, `..` and symlinks so paths compare and display consistently.
pub fn normalize_path(path: &Path) -> io::Result<PathBuf> {
    std::fs::canonicalize(path)
}

/// Like [`normalize_path`], but for a file that may not exist yet: its parent
/// directory is resolved instead. Falls back to the path unchanged.
pub fn normalize_output_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = normalize_path(path) {
        return resolved;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => normalize_path(parent)
            .map(|dir| dir.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
