//! Backend failure taxonomy
//!
//! Every variant is recoverable: the caller logs it and moves on to the next
//! candidate in its fallback chain.

use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{program} is not installed")]
    NotFound { program: &'static str },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Failed {
        program: &'static str,
        status: ExitStatus,
    },

    #[error("{program} timed out after {limit:?}")]
    TimedOut {
        program: &'static str,
        limit: Duration,
    },

    #[error("{0}")]
    Unavailable(&'static str),
}

impl BackendError {
    /// Map a spawn error, distinguishing a missing executable
    pub fn spawn(program: &'static str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            BackendError::NotFound { program }
        } else {
            BackendError::Spawn { program, source }
        }
    }
}
