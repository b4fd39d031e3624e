//! Fetching the S4 Slicer repository with the Git client.

use crate::config::SetupConfig;
use crate::process::{CommandRunner, Invocation, ProcessError};
use thiserror::Error;
use tracing::{debug, warn};

/// Text Git prints when the clone target is already there
const DESTINATION_EXISTS_MARKER: &str = "already exists";

/// How a clone attempt that did not fail outright ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneOutcome {
    /// Fresh checkout created
    Cloned,
    /// Git refused because the target directory is already present
    DestinationExists,
}

#[derive(Error, Debug)]
pub enum CloneError {
    /// Target already present and reuse is disabled
    #[error("Directory '{dir}' already exists. Please remove it or choose a different location.")]
    DestinationExists { dir: String },

    /// Git failed for any other reason
    #[error("Failed to clone '{url}' into '{dir}' (exit code {code:?}): {stderr}")]
    Failed {
        url: String,
        dir: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to run git: {0}")]
    Process(#[from] ProcessError),
}

/// Run `git clone <url> <dir>` and classify the result
pub async fn clone_repository(
    runner: &dyn CommandRunner,
    config: &SetupConfig,
) -> Result<CloneOutcome, CloneError> {
    let url = &config.repository.url;
    let dir = config.repository.dir.to_string_lossy().into_owned();

    let invocation = Invocation::new(&config.git.program)
        .args(["clone", url.as_str(), dir.as_str()])
        .with_cwd(&config.work_dir)
        .with_timeout(config.timeouts.clone_timeout())
        .with_echo(true);

    let output = runner.run(&invocation).await?;
    if output.success {
        debug!(%url, %dir, "clone finished");
        return Ok(CloneOutcome::Cloned);
    }

    if output.stderr.contains(DESTINATION_EXISTS_MARKER)
        || output.stdout.contains(DESTINATION_EXISTS_MARKER)
    {
        warn!(%dir, "clone target already exists");
        return Ok(CloneOutcome::DestinationExists);
    }

    Err(CloneError::Failed {
        url: url.clone(),
        dir,
        code: output.code,
        stderr: output.stderr.trim().to_string(),
    })
}
