//! Preflight checks for the Python interpreter and the Git client.
//!
//! Both checks are prerequisites for every later step. A failure here is
//! reported with a remediation URL and ends the run; nothing is retried.

use crate::config::SetupConfig;
use crate::process::{CommandRunner, Invocation, ProcessError};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PreflightError {
    /// Interpreter missing, unparseable or too old
    #[error("Python {required} is required. Please install it from {url}.")]
    PythonRequired {
        required: PythonVersion,
        found: Option<PythonVersion>,
        url: String,
    },

    /// Git could not be run
    #[error("Git is not installed. Please install Git for Windows from {url}.")]
    GitMissing { url: String },
}

/// Interpreter version as reported by `python --version`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("version pattern compiles")
    })
}

impl PythonVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            patch: None,
        }
    }

    /// Extract the first `major.minor[.patch]` found in `text`
    pub fn parse(text: &str) -> Option<Self> {
        let caps = version_pattern().captures(text)?;
        Some(Self {
            major: caps.get(1)?.as_str().parse().ok()?,
            minor: caps.get(2)?.as_str().parse().ok()?,
            patch: caps.get(3).and_then(|m| m.as_str().parse().ok()),
        })
    }

    /// Same major version and at least the minimum minor version
    pub fn satisfies(&self, minimum: &PythonVersion) -> bool {
        self.major == minimum.major && self.minor >= minimum.minor
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Ask the configured interpreter for its version and compare it with the minimum
pub async fn check_python(
    runner: &dyn CommandRunner,
    config: &SetupConfig,
) -> Result<PythonVersion, PreflightError> {
    let python = &config.python;
    let required = PythonVersion::new(python.min_major, python.min_minor);

    let invocation = Invocation::new(&python.program)
        .args(python.launcher_args.iter().cloned())
        .arg("--version")
        .with_cwd(&config.work_dir)
        .with_timeout(config.timeouts.probe_timeout());

    let found = match runner.run(&invocation).await {
        Ok(output) if output.success => PythonVersion::parse(output.text()),
        Ok(output) => {
            warn!(code = ?output.code, stderr = %output.stderr.trim(), "interpreter probe failed");
            None
        }
        Err(e) => {
            warn!("interpreter probe failed: {}", e);
            None
        }
    };

    match found {
        Some(version) if version.satisfies(&required) => {
            debug!(%version, "interpreter accepted");
            Ok(version)
        }
        found => Err(PreflightError::PythonRequired {
            required,
            found,
            url: python.download_url.clone(),
        }),
    }
}

/// Confirm the Git client runs; returns its version line
pub async fn check_git(
    runner: &dyn CommandRunner,
    config: &SetupConfig,
) -> Result<String, PreflightError> {
    let invocation = Invocation::new(&config.git.program)
        .arg("--version")
        .with_cwd(&config.work_dir)
        .with_timeout(config.timeouts.probe_timeout());

    let missing = || PreflightError::GitMissing {
        url: config.git.download_url.clone(),
    };

    match runner.run(&invocation).await {
        Ok(output) if output.success => Ok(output.text().to_string()),
        Ok(output) => {
            warn!(code = ?output.code, stderr = %output.stderr.trim(), "git probe failed");
            Err(missing())
        }
        Err(ProcessError::NotFound { program }) => {
            warn!("'{}' not found on PATH", program);
            Err(missing())
        }
        Err(e) => {
            warn!("git probe failed: {}", e);
            Err(missing())
        }
    }
}
