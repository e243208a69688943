//! # filemerge Library
//!
//! This crate can be used to:
//!
//! - Merge a selection of files and directories into one text document made of
//!   a directory tree summary followed by one delimited block per file
//! - Restore the original files from such a document (feature `restore`)
//!
//! ## Usage
//!
//! ### To merge files:
//!
//! ```rust,no_run
//! use filemerge::{MergeOptions, PathRef, merge};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let root = std::env::current_dir()?;
//!     let selection = vec![PathRef::directory(root.join("src"))];
//!
//!     let document = merge(&selection, &MergeOptions::with_root(&root)).await?;
//!     print!("{document}");
//!     Ok(())
//! }
//! ```
//!
//! ### To run the whole command-line flow:
//!
//! ```rust,no_run
//! use filemerge::{Config, run_filemerge};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::new(std::env::current_dir()?);
//!     run_filemerge(config).await
//! }
//! ```
//!
//! Every file block has this exact shape, which other tools may rely on:
//!
//! ```text
//!
//! ==================================================
//! <--- Start-File: proj/src/a.ts --->
//! ==================================================
//!
//! <file contents>
//!
//! ==================================================
//! <--- End-File: proj/src/a.ts --->
//! ==================================================
//! ```

pub mod cli;
pub mod error;
#[cfg(feature = "restore")]
pub mod extractor;
pub mod ignore_filter;
pub mod merge;
pub mod output;
pub mod selection;
pub mod tree;
pub mod utils;
pub mod writer;

pub use cli::Config;
pub use error::{MergeError, MergeResult};
#[cfg(feature = "restore")]
pub use extractor::{ExtractedFile, extract_from_merged, parse_merged_document};
pub use ignore_filter::IgnoreFilter;
pub use merge::{IssueKind, MergeIssue, MergeOptions, MergedDocument, merge};
pub use output::{OutputSink, deliver};
pub use selection::{FileSet, PathKind, PathRef, resolve_selection};
pub use tree::{FileTree, TreeNode, render_tree};
pub use utils::relative_path;
pub use writer::{file_block, serialize_contents};

use anyhow::{Context, Result};
use log::{info, warn};
use std::collections::HashSet;

/// Merge the configured selection and deliver the document.
pub async fn run_filemerge(config: Config) -> Result<()> {
    #[cfg(feature = "restore")]
    if let Some(input) = &config.restore_input {
        extract_from_merged(input, config.restore_path.as_deref()).await?;
        return Ok(());
    }

    let requested = if config.selection.is_empty() {
        vec![config.project_root.clone()]
    } else {
        config.selection.clone()
    };

    // Validate before touching the filesystem.
    merge::check_selection_count(requested.len(), config.min_selections)?;

    let project_root = utils::normalize_path(&config.project_root).with_context(|| {
        format!(
            "Workspace root is not accessible: {}",
            config.project_root.display()
        )
    })?;

    let mut selection = Vec::with_capacity(requested.len());
    for path in requested {
        match utils::normalize_path(&path).and_then(PathRef::stat) {
            Ok(entry) => selection.push(entry),
            Err(err) => warn!("Skipping {}: {err}", path.display()),
        }
    }

    let excluded_paths: HashSet<_> = match &config.output {
        OutputSink::File(path) => HashSet::from([utils::normalize_output_path(path)]),
        _ => HashSet::new(),
    };

    let options = MergeOptions {
        workspace_root: Some(project_root),
        respect_gitignore: config.respect_gitignore,
        min_selections: 0,
        excluded_paths,
    };

    let document = merge(&selection, &options)
        .await
        .context("Failed to merge selection")?;

    deliver(&document.text(), &config.output)
        .await
        .context("Failed to deliver merged document")?;

    info!(
        "Merged {} files ({} entries skipped)",
        document.file_count,
        document.issues.len()
    );

    Ok(())
}
