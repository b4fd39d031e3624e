//! Isolated Python environment creation via `python -m venv`.

use crate::config::SetupConfig;
use crate::process::{CommandRunner, Invocation, ProcessError};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum VenvError {
    /// `python -m venv` ran but reported failure
    #[error("Failed to create virtual environment '{dir}' (exit code {code:?}): {stderr}")]
    CreationFailed {
        dir: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to run the Python interpreter: {0}")]
    Process(#[from] ProcessError),
}

/// Create the isolated environment with `python -m venv`.
///
/// An existing directory is handed to `venv` unchanged; whatever it does with
/// it is the result.
pub async fn create_virtual_env(
    runner: &dyn CommandRunner,
    config: &SetupConfig,
) -> Result<PathBuf, VenvError> {
    let dir = config.venv.dir.to_string_lossy().into_owned();

    let mut invocation = Invocation::new(&config.python.program)
        .args(config.python.launcher_args.iter().cloned())
        .args(["-m", "venv"]);
    if !config.venv.with_pip {
        invocation = invocation.arg("--without-pip");
    }
    let invocation = invocation
        .arg(dir.clone())
        .with_cwd(&config.work_dir)
        .with_timeout(config.timeouts.venv_timeout());

    let output = runner.run(&invocation).await?;
    if !output.success {
        return Err(VenvError::CreationFailed {
            dir,
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        });
    }

    let path = config.resolve(&config.venv.dir);
    debug!(path = %path.display(), "virtual environment ready");
    Ok(path)
}
