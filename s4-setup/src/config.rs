//! Setup configuration.
//!
//! Defaults reproduce the stock install: Python 3.12+, `.venv`, and the
//! upstream S4 Slicer repository cloned into `S4_Slicer`. A TOML file may
//! override any subset of the fields.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Everything the setup run needs to know; defaults reproduce the stock S4 Slicer install
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    /// Directory every relative path and child process is anchored to
    pub work_dir: PathBuf,
    pub python: PythonConfig,
    pub git: GitConfig,
    pub venv: VenvConfig,
    pub repository: RepositoryConfig,
    pub notebook: NotebookConfig,
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    pub program: String,
    /// Extra leading arguments, e.g. `-3.12` for the Windows `py` launcher
    pub launcher_args: Vec<String>,
    pub min_major: u32,
    pub min_minor: u32,
    pub download_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub program: String,
    pub download_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VenvConfig {
    pub dir: PathBuf,
    pub with_pip: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub url: String,
    pub dir: PathBuf,
    /// Continue with an already present checkout instead of stopping
    pub reuse_existing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotebookConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub probe_secs: u64,
    pub venv_secs: u64,
    pub clone_secs: u64,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            python: PythonConfig::default(),
            git: GitConfig::default(),
            venv: VenvConfig::default(),
            repository: RepositoryConfig::default(),
            notebook: NotebookConfig::default(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl Default for PythonConfig {
    fn default() -> Self {
        let program = if cfg!(windows) { "python" } else { "python3" };
        Self {
            program: program.to_string(),
            launcher_args: Vec::new(),
            min_major: 3,
            min_minor: 12,
            download_url: "https://www.python.org/downloads/windows".to_string(),
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            download_url: "https://git-scm.com/download/win".to_string(),
        }
    }
}

impl Default for VenvConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".venv"),
            with_pip: true,
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            url: "https://github.com/jyjblrd/S4_Slicer.git".to_string(),
            dir: PathBuf::from("S4_Slicer"),
            reuse_existing: true,
        }
    }
}

impl Default for NotebookConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("main.ipynb"),
            destination: Path::new("S4_Slicer").join("main.ipynb"),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            probe_secs: 30,
            venv_secs: 600,
            clone_secs: 1800,
        }
    }
}

impl TimeoutConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_secs)
    }

    pub fn venv_timeout(&self) -> Duration {
        Duration::from_secs(self.venv_secs)
    }

    pub fn clone_timeout(&self) -> Duration {
        Duration::from_secs(self.clone_secs)
    }
}

impl SetupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a TOML file; keys that are absent keep their defaults
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn with_python_program(mut self, program: impl Into<String>) -> Self {
        self.python.program = program.into();
        self
    }

    pub fn with_git_program(mut self, program: impl Into<String>) -> Self {
        self.git.program = program.into();
        self
    }

    pub fn with_repository(mut self, url: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.repository.url = url.into();
        self.repository.dir = dir.into();
        self
    }

    pub fn with_reuse_existing_clone(mut self, reuse: bool) -> Self {
        self.repository.reuse_existing = reuse;
        self
    }

    /// Resolve a configured path against the working directory
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.work_dir.join(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.work_dir.is_dir() {
            return Err(ConfigError::Invalid(format!(
                "Working directory '{}' does not exist",
                self.work_dir.display()
            )));
        }

        if self.python.program.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "Python program cannot be empty".to_string(),
            ));
        }

        if self.git.program.trim().is_empty() {
            return Err(ConfigError::Invalid("Git program cannot be empty".to_string()));
        }

        let url = &self.repository.url;
        if !url.starts_with("https://") && !url.starts_with("http://") && !url.starts_with("git@")
        {
            return Err(ConfigError::Invalid(format!(
                "Repository URL must start with https://, http:// or git@: {}",
                url
            )));
        }

        for (name, path) in [
            ("venv.dir", &self.venv.dir),
            ("repository.dir", &self.repository.dir),
            ("notebook.source", &self.notebook.source),
            ("notebook.destination", &self.notebook.destination),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!("{} cannot be empty", name)));
            }
        }

        if self.timeouts.probe_secs == 0
            || self.timeouts.venv_secs == 0
            || self.timeouts.clone_secs == 0
        {
            return Err(ConfigError::Invalid(
                "Timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SetupConfig::default();
        assert_eq!(config.python.min_major, 3);
        assert_eq!(config.python.min_minor, 12);
        assert_eq!(config.git.program, "git");
        assert_eq!(config.venv.dir, PathBuf::from(".venv"));
        assert!(config.venv.with_pip);
        assert_eq!(
            config.repository.url,
            "https://github.com/jyjblrd/S4_Slicer.git"
        );
        assert_eq!(config.repository.dir, PathBuf::from("S4_Slicer"));
        assert_eq!(
            config.notebook.destination,
            Path::new("S4_Slicer").join("main.ipynb")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = SetupConfig::new()
            .with_work_dir(dir.path())
            .with_python_program("py")
            .with_repository("git@github.com:me/fork.git", "fork")
            .with_reuse_existing_clone(false);

        assert_eq!(config.resolve("fork"), dir.path().join("fork"));
        assert_eq!(config.python.program, "py");
        assert!(!config.repository.reuse_existing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SetupConfig::default();

        config.python.program = " ".to_string();
        assert!(config.validate().is_err());

        config = SetupConfig::default();
        config.repository.url = "ftp://example.com/repo".to_string();
        assert!(config.validate().is_err());

        config = SetupConfig::default();
        config.venv.dir = PathBuf::new();
        assert!(config.validate().is_err());

        config = SetupConfig::default();
        config.timeouts.clone_secs = 0;
        assert!(config.validate().is_err());

        config = SetupConfig::default().with_work_dir("/nonexistent/s4-setup-work-dir");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(msg)) if msg.contains("does not exist")
        ));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[python]\nprogram = \"py\"\nlauncher_args = [\"-3.12\"]\n\n[timeouts]\nclone_secs = 60"
        )
        .unwrap();

        let config = SetupConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.python.program, "py");
        assert_eq!(config.python.launcher_args, vec!["-3.12".to_string()]);
        assert_eq!(config.python.min_minor, 12);
        assert_eq!(config.timeouts.clone_timeout(), Duration::from_secs(60));
        assert_eq!(config.timeouts.probe_secs, 30);
        assert_eq!(config.git, GitConfig::default());
    }

    #[test]
    fn test_missing_config_file() {
        let result = SetupConfig::from_toml_file("/nonexistent/s4-setup.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_malformed_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[python\nprogram = ").unwrap();
        let result = SetupConfig::from_toml_file(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
