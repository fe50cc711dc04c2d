use thiserror::Error;

/// issuesum error types
#[derive(Error, Debug)]
pub enum IssueSumError {
    /// Transport-level HTTP failure (connect, timeout, TLS)
    #[error("http error: {0}")]
    Http(String),

    /// Jira answered with a non-success status
    #[error("api error: status {status}: {body}")]
    Api { status: u16, body: String },

    /// Failed to decode a response body
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration or request validation error
    #[error("config error: {0}")]
    Config(String),

    /// Fetch was cancelled by the caller
    #[error("cancelled")]
    Cancelled,
}

/// Result type alias for issuesum
pub type Result<T> = std::result::Result<T, IssueSumError>;
