//! Setup orchestrator.
//!
//! Runs the five setup steps in order: interpreter check, Git check,
//! environment creation, repository clone and notebook replacement. Each step
//! returns a typed result; the caller decides the exit status from the
//! returned [`SetupError`].

use crate::clone::{clone_repository, CloneError, CloneOutcome};
use crate::config::{ConfigError, SetupConfig};
use crate::notebook::{replace_notebook, NotebookError};
use crate::preflight::{check_git, check_python, PreflightError, PythonVersion};
use crate::process::CommandRunner;
use crate::status::{Reporter, Status};
use crate::venv::{create_virtual_env, VenvError};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

pub const COMPLETION_MESSAGE: &str =
    "Setup complete. Please activate the virtual environment and install dependencies as needed.";

#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Preflight(#[from] PreflightError),

    #[error(transparent)]
    Venv(#[from] VenvError),

    #[error(transparent)]
    Clone(#[from] CloneError),

    #[error(transparent)]
    Notebook(#[from] NotebookError),
}

impl SetupError {
    /// Whether a diagnostic was already shown to the operator
    pub fn is_reported(&self) -> bool {
        matches!(
            self,
            SetupError::Preflight(_) | SetupError::Clone(CloneError::DestinationExists { .. })
        )
    }
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub python_version: PythonVersion,
    pub git_version: String,
    pub venv_path: PathBuf,
    pub clone: CloneOutcome,
    pub notebook_path: PathBuf,
}

pub struct Pipeline<R: CommandRunner> {
    config: SetupConfig,
    runner: R,
}

impl<R: CommandRunner> Pipeline<R> {
    pub fn new(config: SetupConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub async fn run(&self, reporter: &mut dyn Reporter) -> Result<PipelineReport, SetupError> {
        self.config.validate()?;
        let config = &self.config;
        let runner: &dyn CommandRunner = &self.runner;

        info!(work_dir = %config.work_dir.display(), "starting setup");

        let python_version = check_python(runner, config)
            .await
            .inspect_err(|e| reporter.report(Status::attention(e.to_string())))?;
        reporter.report(Status::done(format!(
            "Python version {} is sufficient.",
            python_version
        )));

        let git_version = check_git(runner, config)
            .await
            .inspect_err(|e| reporter.report(Status::attention(e.to_string())))?;
        reporter.report(Status::done("Git is installed."));

        let venv_path = create_virtual_env(runner, config).await?;
        reporter.report(Status::done(format!(
            "Virtual environment '{}' created.",
            config.venv.dir.display()
        )));

        let clone = clone_repository(runner, config).await?;
        match clone {
            CloneOutcome::Cloned => reporter.report(Status::done(format!(
                "Cloned repository from {} to {}.",
                config.repository.url,
                config.repository.dir.display()
            ))),
            CloneOutcome::DestinationExists => {
                let error = CloneError::DestinationExists {
                    dir: config.repository.dir.display().to_string(),
                };
                reporter.report(Status::attention(error.to_string()));
                if !config.repository.reuse_existing {
                    return Err(error.into());
                }
                info!("continuing with the existing checkout");
            }
        }

        let notebook_path = replace_notebook(config).await?;
        reporter.report(Status::done(format!(
            "Replaced {}.",
            config.notebook.destination.display()
        )));

        reporter.report(Status::Complete(COMPLETION_MESSAGE.to_string()));

        Ok(PipelineReport {
            python_version,
            git_version,
            venv_path,
            clone,
            notebook_path,
        })
    }
}
