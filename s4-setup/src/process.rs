//! External program execution.
//!
//! Every setup step that shells out goes through [`CommandRunner`], so the
//! steps can be exercised against a scripted toolchain in tests.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Errors raised while spawning or waiting on an external program
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Program could not be found on the search path
    #[error("Program '{program}' was not found")]
    NotFound { program: String },

    /// Program exists but could not be started
    #[error("Failed to start '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Program did not finish in time and was killed
    #[error("Command timed out after {timeout:?}: {command}")]
    Timeout { command: String, timeout: Duration },

    /// IO error while collecting output
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ProcessResult<T> = Result<T, ProcessError>;

/// A single external program call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory for the child, inherited when `None`
    pub cwd: Option<PathBuf>,
    pub timeout: Duration,
    /// Mirror the child's output to our stderr while capturing it
    pub echo: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout: Duration::from_secs(30),
            echo: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Command line as a user would type it, for logs and error messages
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the child was terminated by a signal
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whichever stream carries text, stdout first
    pub fn text(&self) -> &str {
        let stdout = self.stdout.trim();
        if stdout.is_empty() {
            self.stderr.trim()
        } else {
            stdout
        }
    }
}

/// Seam between the setup steps and the operating system
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> ProcessResult<ProcessOutput>;
}

/// Drain a child pipe into a string, optionally echoing each line to stderr
async fn drain<R>(stream: Option<R>, echo: bool) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return Ok(String::new());
    };

    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    let mut text = String::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        let chunk = String::from_utf8_lossy(&line);
        if echo {
            eprint!("{}", chunk);
        }
        text.push_str(&chunk);
    }
    Ok(text)
}

/// Runs programs with tokio, killing them when the timeout elapses
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> ProcessResult<ProcessOutput> {
        debug!(command = %invocation.display(), cwd = ?invocation.cwd, "running");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| {
            let cwd_missing = invocation.cwd.as_ref().is_some_and(|dir| !dir.is_dir());
            if e.kind() == std::io::ErrorKind::NotFound && !cwd_missing {
                ProcessError::NotFound {
                    program: invocation.program.clone(),
                }
            } else {
                ProcessError::SpawnFailed {
                    program: invocation.program.clone(),
                    source: e,
                }
            }
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let finish = async {
            let (stdout, stderr) = tokio::join!(
                drain(stdout, invocation.echo),
                drain(stderr, invocation.echo)
            );
            let status = child.wait().await?;
            Ok::<_, std::io::Error>(ProcessOutput {
                code: status.code(),
                success: status.success(),
                stdout: stdout?,
                stderr: stderr?,
            })
        };

        // On timeout `child` is dropped on return, which kills it
        match timeout(invocation.timeout, finish).await {
            Ok(Ok(output)) => {
                debug!(
                    command = %invocation.display(),
                    code = ?output.code,
                    stderr = %output.stderr.trim(),
                    "finished"
                );
                Ok(output)
            }
            Ok(Err(e)) => Err(ProcessError::Io(e)),
            Err(_) => Err(ProcessError::Timeout {
                command: invocation.display(),
                timeout: invocation.timeout,
            }),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_display() {
        let inv = Invocation::new("git").args(["clone", "https://example.com/r.git", "r"]);
        assert_eq!(inv.display(), "git clone https://example.com/r.git r");
        assert_eq!(Invocation::new("python").display(), "python");
    }

    #[test]
    fn test_output_text_prefers_stdout() {
        let mut output = ProcessOutput::success("Python 3.12.1\n");
        assert_eq!(output.text(), "Python 3.12.1");

        output.stdout.clear();
        output.stderr = "Python 2.7.18\n".to_string();
        assert_eq!(output.text(), "Python 2.7.18");
    }

    #[test]
    fn test_failure_output() {
        let output = ProcessOutput::failure(128, "fatal: boom");
        assert!(!output.success);
        assert_eq!(output.code, Some(128));
    }

    #[tokio::test]
    async fn test_missing_program_is_not_found() {
        let runner = SystemRunner::new();
        let inv = Invocation::new("s4-setup-definitely-not-a-real-program").arg("--version");
        let result = runner.run(&inv).await;
        assert!(matches!(result, Err(ProcessError::NotFound { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_program_is_killed_on_timeout() {
        let runner = SystemRunner::new();
        let inv = Invocation::new("sleep")
            .arg("5")
            .with_timeout(Duration::from_millis(300));

        let started = std::time::Instant::now();
        let result = runner.run(&inv).await;

        assert!(started.elapsed() < Duration::from_secs(3));
        match result {
            Err(ProcessError::Timeout { command, timeout }) => {
                assert_eq!(command, "sleep 5");
                assert_eq!(timeout, Duration::from_millis(300));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_output_in_working_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), b"").unwrap();

        let runner = SystemRunner::new();
        let inv = Invocation::new("sh")
            .args(["-c", "ls; echo 'fatal: nope' >&2; exit 3"])
            .with_cwd(dir.path());

        let output = runner.run(&inv).await.unwrap();

        assert_eq!(output.code, Some(3));
        assert!(!output.success);
        assert_eq!(output.stdout.trim(), "marker.txt");
        assert_eq!(output.stderr.trim(), "fatal: nope");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_echoed_output_is_still_captured() {
        let runner = SystemRunner::new();
        let inv = Invocation::new("sh")
            .args(["-c", "echo \"Cloning into 'S4_Slicer'...\" >&2"])
            .with_echo(true);

        let output = runner.run(&inv).await.unwrap();

        assert!(output.success);
        assert_eq!(output.stderr, "Cloning into 'S4_Slicer'...\n");
    }

    #[tokio::test]
    async fn test_missing_working_directory_is_spawn_failure() {
        let runner = SystemRunner::new();
        let inv = Invocation::new("s4-setup-definitely-not-a-real-program")
            .with_cwd("/nonexistent/s4-setup-work-dir");
        let result = runner.run(&inv).await;
        assert!(matches!(result, Err(ProcessError::SpawnFailed { .. })));
    }

    #[test]
    fn test_timeout_error_display() {
        let error = ProcessError::Timeout {
            command: "git clone x y".to_string(),
            timeout: Duration::from_secs(5),
        };
        assert_eq!(
            error.to_string(),
            "Command timed out after 5s: git clone x y"
        );
    }
}
