//! Replacing the checkout's notebook with the locally edited copy.

use crate::config::SetupConfig;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum NotebookError {
    #[error("Failed to copy '{source_path}' to '{destination}': {source}")]
    Copy {
        source_path: String,
        destination: String,
        #[source]
        source: std::io::Error,
    },
}

/// Overwrite the notebook inside the checkout with the local edited copy.
///
/// Neither file is inspected; the destination is replaced unconditionally.
pub async fn replace_notebook(config: &SetupConfig) -> Result<PathBuf, NotebookError> {
    let source = config.resolve(&config.notebook.source);
    let destination = config.resolve(&config.notebook.destination);

    let bytes = tokio::fs::copy(&source, &destination)
        .await
        .map_err(|e| NotebookError::Copy {
            source_path: source.display().to_string(),
            destination: destination.display().to_string(),
            source: e,
        })?;

    debug!(bytes, destination = %destination.display(), "notebook replaced");
    Ok(destination)
}
