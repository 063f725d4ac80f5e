use thiserror::Error;

/// Failure classification attached to fallback replies and surfaced in logs.
///
/// Every `CompletionError` maps onto exactly one of these kinds, so callers
/// can tell a missing credential from a dead network from a malformed
/// response without parsing message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No credential, or a placeholder credential
    Configuration,
    /// Network failure or a non-2xx status from the remote service
    Transport,
    /// The remote service answered with an unexpected shape
    Protocol,
    /// A malformed record reached the formatter
    Data,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::Configuration => "configuration",
            FailureKind::Transport => "transport",
            FailureKind::Protocol => "protocol",
            FailureKind::Data => "data",
        };
        write!(f, "{}", name)
    }
}

/// Completion call errors
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Configuration Error: {0}")]
    Configuration(String),

    #[error("Transport Error: {0}")]
    Transport(String),

    #[error("Protocol Error: {0}")]
    Protocol(String),

    #[error("Data Error: {0}")]
    Data(String),

    #[error("HTTP Error: {status_code} - {message}")]
    Http { status_code: u16, message: String },

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl CompletionError {
    /// Total mapping from an error to its failure kind.
    pub fn kind(&self) -> FailureKind {
        match self {
            CompletionError::Configuration(_) => FailureKind::Configuration,
            CompletionError::Transport(_) => FailureKind::Transport,
            CompletionError::Http { .. } => FailureKind::Transport,
            CompletionError::ReqwestError(_) => FailureKind::Transport,
            CompletionError::IoError(_) => FailureKind::Transport,
            CompletionError::Protocol(_) => FailureKind::Protocol,
            CompletionError::SerdeError(_) => FailureKind::Protocol,
            CompletionError::Data(_) => FailureKind::Data,
        }
    }
}

/// Result type for completion operations
pub type CompletionResult<T> = Result<T, CompletionError>;
