// Error types for caption retrieval

use thiserror::Error;

/// Errors that cross the library boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptionError {
    /// Input did not resolve to a video identifier
    #[error("Invalid video identifier or URL: {0}")]
    InvalidIdentifier(String),

    /// Every probe strategy came back empty
    #[error("{}", not_found_message(.video_id, .blocked))]
    NotFound { video_id: String, blocked: bool },

    /// Anything outside the taxonomy above
    #[error("Internal error: {0}")]
    Internal(String),
}

fn not_found_message(video_id: &str, blocked: &bool) -> String {
    if *blocked {
        format!(
            "No captions found for {}. YouTube appears to be blocking access \
             (rate limit or bot check); try again later or use a proxy.",
            video_id
        )
    } else {
        format!(
            "No captions found for {}. The video may have no captions, \
             or YouTube may be blocking access.",
            video_id
        )
    }
}

impl CaptionError {
    /// HTTP status suggested for this failure
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidIdentifier(_) => 400,
            Self::NotFound { .. } => 404,
            Self::Internal(_) => 500,
        }
    }
}

/// A single outbound request failed. Never surfaced to callers directly:
/// retries and strategy fallback absorb it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Upstream answered with a non-2xx status
    #[error("HTTP status {0}")]
    Status(u16),

    /// Request exceeded the per-call timeout
    #[error("request timed out")]
    Timeout,

    /// Connection, TLS, body or client construction failure
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Timeout;
        }

        if let Some(status) = e.status() {
            return Self::Status(status.as_u16());
        }

        Self::Transport(e.to_string())
    }
}
