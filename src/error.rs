//! Error types for rd-init

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for rd-init operations
///
/// Every variant carries enough context (document, entry, path) to tell the
/// operator what went wrong from a single log line. Nothing in the crate
/// recovers from these; they travel straight up to the orchestrator.
#[derive(Error, Debug)]
pub enum RdInitError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {document}: {source}")]
    Parse {
        document: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("{context}: {source}")]
    Os {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command '{program}' failed: {message}")]
    Command { program: String, message: String },

    #[error("user/group error: {0}")]
    UserGroup(String),

    #[error("control plane error: {0}")]
    ControlPlane(String),

    #[error("step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: Box<RdInitError>,
    },
}

impl RdInitError {
    /// Create an OS error with context
    pub fn os(context: impl Into<String>, source: impl Into<std::io::Error>) -> Self {
        Self::Os {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a command error
    pub fn command(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            program: program.into(),
            message: message.into(),
        }
    }

    /// Wrap an error with the orchestrator step it happened in
    pub fn step(step: impl Into<String>, source: RdInitError) -> Self {
        Self::Step {
            step: step.into(),
            source: Box::new(source),
        }
    }
}
