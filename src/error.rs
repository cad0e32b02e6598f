use thiserror::Error;

/// Everything that can go wrong between pressing start and showing a label.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Channel id missing; the loop never starts.
    #[error("invalid channel configuration: {0}")]
    Validation(String),

    /// Connection, TLS, timeout, read failure or non-2xx status.
    #[error("{0}")]
    Network(String),

    /// Body was not a JSON object.
    #[error("malformed feed response: {0}")]
    Parse(String),

    /// The poller thread could not be spawned.
    #[error("poller worker unavailable: {0}")]
    Worker(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
