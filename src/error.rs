//! Error taxonomy. Fetch failures are always recoverable: they surface in
//! the view state with a retry affordance and never tear the controller
//! down. Export/share failures are caught and reported as notices.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Transport-level failure (connect, timeout, malformed body).
    #[error("network error: {0}")]
    Network(String),
    /// Envelope arrived with `success: false`.
    #[error("server error: {0}")]
    Server(String),
    #[error("not found")]
    NotFound,
}

impl FetchError {
    /// Transport failures are worth retrying; a server verdict is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Network(_))
    }

    /// Message to surface in the view's error affordance.
    pub fn display_message(&self) -> String {
        match self {
            FetchError::Network(msg) => msg.clone(),
            FetchError::Server(msg) => msg.clone(),
            FetchError::NotFound => "not found".to_string(),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    /// Best-effort formats report this instead of panicking.
    #[error("export as {0} is not available")]
    NotAvailable(&'static str),
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("share failed: {0}")]
    Share(String),
    #[error("clipboard unavailable")]
    ClipboardUnavailable,
}
