use crate::merge::{IssueKind, MergeIssue};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use log::{debug, trace, warn};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Name of the ignore-rule file read from the workspace root.
pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// Decides which files may enter a merge.
///
/// Built fresh for every merge from the rules currently on disk. Rules that
/// cannot be loaded are skipped rather than failing the merge.
#[derive(Debug)]
pub struct IgnoreFilter {
    root: PathBuf,
    rules: Option<Gitignore>,
    skip_git_dir: bool,
    excluded: HashSet<PathBuf>,
    issue: Option<MergeIssue>,
}

impl IgnoreFilter {
    /// A filter that admits every path.
    pub fn accept_all(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            rules: None,
            skip_git_dir: false,
            excluded: HashSet::new(),
            issue: None,
        }
    }

    /// Loads `.gitignore` from `root` when `enabled` is set.
    ///
    /// A missing rule file is silently treated as an empty rule set. Lines
    /// that fail to parse are recorded as an issue and left out while the
    /// valid ones keep applying. If the rules cannot be compiled at all the
    /// filter accepts every path.
    pub fn build(root: &Path, enabled: bool) -> Self {
        let mut filter = Self::accept_all(root);
        if !enabled {
            debug!("Ignore rules disabled; accepting all paths");
            return filter;
        }

        filter.skip_git_dir = true;

        let rule_file = root.join(IGNORE_FILE_NAME);
        if !rule_file.is_file() {
            debug!("No ignore file at {}", rule_file.display());
            return filter;
        }

        let mut builder = GitignoreBuilder::new(root);
        // Lines that fail to parse are dropped; the rest still apply.
        if let Some(err) = builder.add(&rule_file) {
            warn!(
                "Skipping invalid rules in {} ({err})",
                rule_file.display()
            );
            filter.issue = Some(MergeIssue::new(
                rule_file.clone(),
                IssueKind::IgnoreRules,
                err.to_string(),
            ));
        }

        match builder.build() {
            Ok(rules) => {
                debug!(
                    "Loaded {} ignore rules from {}",
                    rules.num_ignores() + rules.num_whitelists(),
                    rule_file.display()
                );
                filter.rules = Some(rules);
            }
            Err(err) => {
                warn!(
                    "Could not compile rules from {} ({err}); merging without them",
                    rule_file.display()
                );
                filter.issue = Some(MergeIssue::new(
                    rule_file,
                    IssueKind::IgnoreRules,
                    err.to_string(),
                ));
            }
        }

        filter
    }

    /// Additionally rejects these exact paths, e.g. the document being written.
    pub fn with_excluded<I>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.excluded.extend(paths);
        self
    }

    /// Returns `true` when the file at `path` should be merged.
    pub fn is_included(&self, path: &Path) -> bool {
        if self.excluded.contains(path) {
            trace!("Excluded explicitly: {}", path.display());
            return false;
        }

        // Paths outside the root cannot be matched against its rules.
        let Ok(rel) = path.strip_prefix(&self.root) else {
            return true;
        };

        if self.skip_git_dir
            && rel
                .components()
                .any(|c| c == Component::Normal(OsStr::new(".git")))
        {
            trace!("Skipping git metadata: {}", rel.display());
            return false;
        }

        let Some(rules) = &self.rules else {
            return true;
        };

        let ignored = rules.matched_path_or_any_parents(rel, false).is_ignore();
        if ignored {
            trace!("Ignored by rule: {}", rel.display());
        }
        !ignored
    }

    /// The problem met while loading the rules, if any.
    pub fn take_issue(&mut self) -> Option<MergeIssue> {
        self.issue.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn disabled_filter_accepts_everything() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(IGNORE_FILE_NAME), "*.log\n").unwrap();

        let filter = IgnoreFilter::build(dir.path(), false);
        assert!(filter.is_included(&dir.path().join("a.log")));
        assert!(filter.is_included(&dir.path().join(".git").join("HEAD")));
    }

    #[test]
    fn missing_rule_file_is_not_an_issue() {
        let dir = tempdir().unwrap();
        let mut filter = IgnoreFilter::build(dir.path(), true);
        assert!(filter.is_included(&dir.path().join("a.log")));
        assert!(filter.take_issue().is_none());
    }

    #[test]
    fn glob_rules_exclude_matching_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(IGNORE_FILE_NAME), "*.log\n").unwrap();

        let filter = IgnoreFilter::build(dir.path(), true);
        assert!(!filter.is_included(&dir.path().join("a.log")));
        assert!(!filter.is_included(&dir.path().join("nested").join("b.log")));
        assert!(filter.is_included(&dir.path().join("a.txt")));
    }

    #[test]
    fn directory_rules_exclude_descendants() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(IGNORE_FILE_NAME), "build/\n").unwrap();

        let filter = IgnoreFilter::build(dir.path(), true);
        assert!(!filter.is_included(&dir.path().join("build").join("out.js")));
        assert!(filter.is_included(&dir.path().join("src").join("build.rs")));
    }

    #[test]
    fn later_negation_re_includes() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(IGNORE_FILE_NAME),
            "*.log\n!keep.log\n",
        )
        .unwrap();

        let filter = IgnoreFilter::build(dir.path(), true);
        assert!(!filter.is_included(&dir.path().join("drop.log")));
        assert!(filter.is_included(&dir.path().join("keep.log")));
    }

    #[test]
    fn invalid_lines_are_reported_and_valid_ones_kept() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(IGNORE_FILE_NAME), "secret.env\n{a\n").unwrap();

        let mut filter = IgnoreFilter::build(dir.path(), true);
        let issue = filter.take_issue().unwrap();
        assert_eq!(issue.kind, IssueKind::IgnoreRules);
        assert!(!filter.is_included(&dir.path().join("secret.env")));
        assert!(filter.is_included(&dir.path().join("a.txt")));
    }

    #[test]
    fn git_metadata_is_skipped_when_enabled() {
        let dir = tempdir().unwrap();
        let filter = IgnoreFilter::build(dir.path(), true);
        assert!(!filter.is_included(&dir.path().join(".git").join("config")));
        assert!(filter.is_included(&dir.path().join(".gitignore")));
    }

    #[test]
    fn paths_outside_root_are_accepted() {
        let dir = tempdir().unwrap();
        let other = tempdir().unwrap();
        fs::write(dir.path().join(IGNORE_FILE_NAME), "*.log\n").unwrap();

        let filter = IgnoreFilter::build(dir.path(), true);
        assert!(filter.is_included(&other.path().join("a.log")));
    }

    #[test]
    fn explicit_exclusions_apply() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("merged_output.txt");
        let filter = IgnoreFilter::build(dir.path(), false).with_excluded([out.clone()]);
        assert!(!filter.is_included(&out));
        assert!(filter.is_included(&dir.path().join("a.txt")));
    }
}
