use crate::merge::{IssueKind, MergeIssue};
use crate::selection::FileSet;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Separator line framing every file header and footer.
pub const SEPARATOR: &str = "==================================================";
pub const START_FILE_PREFIX: &str = "<--- Start-File: ";
pub const END_FILE_PREFIX: &str = "<--- End-File: ";
pub const MARKER_SUFFIX: &str = " --->";

/// Upper bound on files being read at the same time.
const MAX_CONCURRENT_READS: usize = 32;

/// Formats the delimited block for one file.
pub fn file_block(relative_path: &str, content: &str) -> String {
    format!(
        "\n{SEPARATOR}\n{START_FILE_PREFIX}{relative_path}{MARKER_SUFFIX}\n{SEPARATOR}\n\n\
         {content}\n\n\
         {SEPARATOR}\n{END_FILE_PREFIX}{relative_path}{MARKER_SUFFIX}\n{SEPARATOR}\n"
    )
}

/// Reads every file in `files` and concatenates their blocks in
/// relative-path order.
///
/// Reads overlap, but the output order never depends on which read finishes
/// first. Files that cannot be read or are not valid UTF-8 are left out and
/// recorded in `issues`.
pub async fn serialize_contents<F>(
    files: &FileSet,
    relative: F,
    issues: &mut Vec<MergeIssue>,
) -> String
where
    F: Fn(&Path) -> String,
{
    let ordered: Vec<(String, PathBuf)> = files
        .sorted_by_key(&relative)
        .into_iter()
        .map(|(rel, path)| (rel, path.to_path_buf()))
        .collect();

    let permits = Arc::new(Semaphore::new(MAX_CONCURRENT_READS));
    let mut reads = JoinSet::new();
    for (index, (_, path)) in ordered.iter().enumerate() {
        let path = path.clone();
        let permits = Arc::clone(&permits);
        reads.spawn(async move {
            let _permit = permits.acquire_owned().await;
            (index, fs::read(&path).await)
        });
    }

    let mut contents: Vec<Option<std::io::Result<Vec<u8>>>> =
        ordered.iter().map(|_| None).collect();
    while let Some(joined) = reads.join_next().await {
        match joined {
            Ok((index, result)) => contents[index] = Some(result),
            Err(err) => warn!("File read task failed: {err}"),
        }
    }

    let mut out = String::new();
    for ((rel, path), result) in ordered.into_iter().zip(contents) {
        let bytes = match result {
            Some(Ok(bytes)) => bytes,
            Some(Err(err)) => {
                warn!("Skipping {}: {err}", path.display());
                issues.push(MergeIssue::new(path, IssueKind::UnreadableFile, err.to_string()));
                continue;
            }
            None => {
                issues.push(MergeIssue::new(
                    path,
                    IssueKind::UnreadableFile,
                    "read task did not complete",
                ));
                continue;
            }
        };

        match String::from_utf8(bytes) {
            Ok(text) => {
                debug!("Writing file: {rel}");
                out.push_str(&file_block(&rel, &text));
            }
            Err(err) => {
                warn!("Skipping {}: not valid UTF-8 text", path.display());
                issues.push(MergeIssue::new(path, IssueKind::NotText, err.to_string()));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::relative_path;
    use std::fs as std_fs;
    use tempfile::tempdir;

    #[test]
    fn block_matches_exact_layout() {
        let block = file_block("proj/a.txt", "hello");
        let sep = "=".repeat(50);
        let expected = format!(
            "\n{sep}\n<--- Start-File: proj/a.txt --->\n{sep}\n\nhello\n\n{sep}\n<--- End-File: proj/a.txt --->\n{sep}\n"
        );
        assert_eq!(block, expected);
        assert_eq!(SEPARATOR.len(), 50);
    }

    #[tokio::test]
    async fn blocks_follow_relative_path_order() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        std_fs::write(root.join("b.txt"), "bee").unwrap();
        std_fs::write(root.join("a.txt"), "ay").unwrap();

        let files: FileSet = [root.join("b.txt"), root.join("a.txt")].into_iter().collect();
        let mut issues = Vec::new();
        let out = serialize_contents(&files, |p| relative_path(Some(root.as_path()), p), &mut issues).await;

        let a = out.find("/a.txt --->").unwrap();
        let b = out.find("/b.txt --->").unwrap();
        assert!(a < b);
        assert!(issues.is_empty());
    }

    #[tokio::test]
    async fn nested_files_come_before_dotted_siblings() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        std_fs::create_dir_all(root.join("p").join("a")).unwrap();
        std_fs::write(root.join("p").join("a.txt"), "file").unwrap();
        std_fs::write(root.join("p").join("a").join("x"), "nested").unwrap();

        let files: FileSet = [root.join("p").join("a.txt"), root.join("p").join("a").join("x")]
            .into_iter()
            .collect();
        let mut issues = Vec::new();
        let out = serialize_contents(&files, |p| relative_path(Some(root.as_path()), p), &mut issues).await;

        let nested = out.find("/p/a/x --->").unwrap();
        let dotted = out.find("/p/a.txt --->").unwrap();
        assert!(nested < dotted);
    }

    #[tokio::test]
    async fn non_utf8_files_are_skipped_and_reported() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        std_fs::write(root.join("blob.bin"), b"\xFF\xFE\x00\x9F").unwrap();
        std_fs::write(root.join("ok.txt"), "fine").unwrap();

        let files: FileSet = [root.join("blob.bin"), root.join("ok.txt")].into_iter().collect();
        let mut issues = Vec::new();
        let out = serialize_contents(&files, |p| relative_path(Some(root.as_path()), p), &mut issues).await;

        assert!(out.contains("fine"));
        assert!(!out.contains("blob.bin"));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::NotText);
    }

    #[tokio::test]
    async fn missing_files_are_skipped_and_reported() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let files: FileSet = [root.join("vanished.txt")].into_iter().collect();

        let mut issues = Vec::new();
        let out = serialize_contents(&files, |p| relative_path(Some(root.as_path()), p), &mut issues).await;

        assert!(out.is_empty());
        assert_eq!(issues[0].kind, IssueKind::UnreadableFile);
    }

    #[tokio::test]
    async fn content_is_embedded_verbatim() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let text = "line one\r\n\ttabbed <--- not a marker\n\n";
        std_fs::write(root.join("raw.txt"), text).unwrap();

        let files: FileSet = [root.join("raw.txt")].into_iter().collect();
        let mut issues = Vec::new();
        let out = serialize_contents(&files, |p| relative_path(Some(root.as_path()), p), &mut issues).await;

        let rel = relative_path(Some(root.as_path()), &root.join("raw.txt"));
        assert_eq!(out, file_block(&rel, text));
    }
}
