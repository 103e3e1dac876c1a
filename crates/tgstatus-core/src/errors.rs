use std::time::Duration;

/// Core error type for tgstatus.
///
/// Adapter crates should map their specific errors into this type so the status
/// manager can tell retryable transport failures from rejected edits.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The edit carried exactly the content the message already has.
    #[error("message is not modified")]
    NotModified,

    #[error("rate limited, retry after {0:?}")]
    RateLimited(Duration),

    #[error("network error: {0}")]
    Network(String),

    /// The bot may not touch the chat right now (kicked, blocked, missing admin rights).
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// Transient failures leave the current message untouched; the next tick retries.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::RateLimited(_) | Error::Network(_) | Error::Forbidden(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
