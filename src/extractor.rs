//! Splits a merged document back into the files it was built from.
//!
//! Only available with the `restore` feature.

use crate::writer::{END_FILE_PREFIX, MARKER_SUFFIX, SEPARATOR};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

static START_FILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^<--- Start-File: (.+) --->$").expect("start marker pattern is valid")
});

/// A file recovered from a merged document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub relative_path: String,
    pub content: String,
}

/// Finds every complete file block in `document`, in document order.
///
/// Malformed blocks are skipped with a warning.
pub fn parse_merged_document(document: &str) -> Vec<ExtractedFile> {
    let header_tail = format!("\n{SEPARATOR}\n\n");
    let mut files = Vec::new();
    let mut cursor = 0;

    while let Some(caps) = START_FILE_RE.captures_at(document, cursor) {
        let (Some(whole), Some(path)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let relative_path = path.as_str();

        let after_header = &document[whole.end()..];
        if !after_header.starts_with(&header_tail) {
            warn!("Malformed header for {relative_path}, skipping");
            cursor = whole.end();
            continue;
        }
        let content_start = whole.end() + header_tail.len();

        let footer =
            format!("\n\n{SEPARATOR}\n{END_FILE_PREFIX}{relative_path}{MARKER_SUFFIX}\n{SEPARATOR}\n");
        let Some(offset) = document[content_start..].find(&footer) else {
            warn!("No end marker for {relative_path}, stopping");
            break;
        };
        let content_end = content_start + offset;

        debug!("Found block for {relative_path}");
        files.push(ExtractedFile {
            relative_path: relative_path.to_string(),
            content: document[content_start..content_end].to_string(),
        });
        cursor = content_end + footer.len();
    }

    files
}

/// Rejects absolute paths and anything that climbs out of the target.
fn safe_relative(relative_path: &str) -> Option<PathBuf> {
    let path = Path::new(relative_path);
    let safe = path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    (safe && path.components().next().is_some()).then(|| path.to_path_buf())
}

/// Restores every file in the merged document at `input` below `output_dir`
/// (the current directory when `None`). Returns the written paths.
pub async fn extract_from_merged(input: &Path, output_dir: Option<&Path>) -> Result<Vec<PathBuf>> {
    let document = fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read merged document: {}", input.display()))?;

    let base = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let mut written = Vec::new();
    for file in parse_merged_document(&document) {
        let Some(rel) = safe_relative(&file.relative_path) else {
            warn!("Refusing to restore unsafe path: {}", file.relative_path);
            continue;
        };
        let target = base.join(rel);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(&target, file.content.as_bytes())
            .await
            .with_context(|| format!("Failed to write restored file: {}", target.display()))?;

        debug!("Restored: {}", target.display());
        written.push(target);
    }

    info!("Restored {} files into {}", written.len(), base.display());
    Ok(written)
}
