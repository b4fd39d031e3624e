//! Operator-facing status lines.
//!
//! Progress is reported as short prefixed lines: `[-]` for a finished step,
//! `[!]` for a problem that needs the operator's attention. The final
//! completion message carries no prefix.

use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// A step finished
    Done(String),
    /// Something the operator has to fix
    Attention(String),
    /// Final summary line
    Complete(String),
}

impl Status {
    pub fn done(message: impl Into<String>) -> Self {
        Status::Done(message.into())
    }

    pub fn attention(message: impl Into<String>) -> Self {
        Status::Attention(message.into())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Done(msg) => write!(f, "[-] {}", msg),
            Status::Attention(msg) => write!(f, "[!] {}", msg),
            Status::Complete(msg) => write!(f, "{}", msg),
        }
    }
}

/// Sink for status lines emitted while the setup runs
pub trait Reporter {
    fn report(&mut self, status: Status);
}

/// Prints every status line to stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&mut self, status: Status) {
        match &status {
            Status::Attention(msg) => warn!("{}", msg),
            Status::Done(msg) | Status::Complete(msg) => info!("{}", msg),
        }
        println!("{}", status);
    }
}

impl Reporter for Vec<Status> {
    fn report(&mut self, status: Status) {
        self.push(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_prefixes() {
        assert_eq!(Status::done("Git is installed.").to_string(), "[-] Git is installed.");
        assert_eq!(
            Status::attention("Git is not installed.").to_string(),
            "[!] Git is not installed."
        );
        assert_eq!(
            Status::Complete("Setup complete.".to_string()).to_string(),
            "Setup complete."
        );
    }

    #[test]
    fn test_vec_collects_in_order() {
        let mut lines: Vec<Status> = Vec::new();
        lines.report(Status::done("one"));
        lines.report(Status::attention("two"));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], Status::attention("two"));
    }
}
