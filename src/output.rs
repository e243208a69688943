use crate::error::{MergeError, MergeResult};
use log::{debug, info};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};

/// Where a finished document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    File(PathBuf),
    Clipboard,
    Stdout,
}

/// Hands `document` to `sink`.
pub async fn deliver(document: &str, sink: &OutputSink) -> MergeResult<()> {
    match sink {
        OutputSink::File(path) => write_file(document, path).await,
        OutputSink::Stdout => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(document.as_bytes()).await?;
            stdout.flush().await?;
            Ok(())
        }
        OutputSink::Clipboard => copy_to_clipboard(document),
    }
}

async fn write_file(document: &str, path: &Path) -> MergeResult<()> {
    let write_err = |source: std::io::Error| MergeError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let file = File::create(path).await.map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(document.as_bytes())
        .await
        .map_err(write_err)?;
    writer.flush().await.map_err(write_err)?;

    info!("Wrote merged document to {}", path.display());
    Ok(())
}

#[cfg(feature = "clipboard")]
fn copy_to_clipboard(document: &str) -> MergeResult<()> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| MergeError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(document)
        .map_err(|e| MergeError::Clipboard(e.to_string()))?;
    debug!("Copied {} bytes to the clipboard", document.len());
    info!("Merged document copied to clipboard");
    Ok(())
}

#[cfg(not(feature = "clipboard"))]
fn copy_to_clipboard(_document: &str) -> MergeResult<()> {
    debug!("Clipboard support not compiled in");
    Err(MergeError::NoOutputDestination)
}
