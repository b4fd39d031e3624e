pub mod clone;
pub mod config;
pub mod notebook;
pub mod pipeline;
pub mod preflight;
pub mod process;
pub mod status;
pub mod venv;

pub use clone::{clone_repository, CloneError, CloneOutcome};
pub use config::{
    ConfigError, GitConfig, NotebookConfig, PythonConfig, RepositoryConfig, SetupConfig,
    TimeoutConfig, VenvConfig,
};
pub use notebook::{replace_notebook, NotebookError};
pub use pipeline::{Pipeline, PipelineReport, SetupError, COMPLETION_MESSAGE};
pub use preflight::{check_git, check_python, PreflightError, PythonVersion};
pub use process::{
    CommandRunner, Invocation, ProcessError, ProcessOutput, ProcessResult, SystemRunner,
};
pub use status::{ConsoleReporter, Reporter, Status};
pub use venv::{create_virtual_env, VenvError};
