use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single external command invocation
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error while running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("{program} produced more than {limit} bytes of output")]
    OutputLimit { program: String, limit: usize },

    #[error("{program} exited with {status}")]
    Exit { program: String, status: ExitStatus },

    #[error("{program} cannot read image data")]
    Unsupported { program: String },
}

/// Terminal failure of a clipboard image retrieval
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("No clipboard tool available. {hint}")]
    NoToolAvailable { hint: &'static str },

    #[error("No image found in clipboard.")]
    NoImagePresent,

    #[error("Clipboard image data was empty.")]
    EmptyContent,

    #[error("Gave up looking for a clipboard image after {budget:?}.")]
    DeadlineExceeded { budget: Duration },

    #[error("Failed to save clipboard image: {0}")]
    Io(String),

    #[error("{backend} failed: {source}")]
    BackendExecution {
        backend: &'static str,
        #[source]
        source: RunError,
    },
}

impl RetrievalError {
    pub(crate) fn io(context: &str, err: std::io::Error) -> Self {
        RetrievalError::Io(format!("{}: {}", context, err))
    }
}

/// Result of a save attempt: the written file, or why nothing was written
pub type RetrievalOutcome = Result<PathBuf, RetrievalError>;
