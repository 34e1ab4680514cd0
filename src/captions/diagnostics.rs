// Blocking diagnostics - identifies why YouTube refused a request
//
// Used to tell "this video has no captions" apart from "YouTube is
// throttling us" when every strategy comes back empty.

use super::errors::FetchError;

/// Reasons why YouTube might block a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingReason {
    /// HTTP 403 Forbidden
    Http403Forbidden,

    /// HTTP 429 Too Many Requests
    RateLimited,

    /// reCAPTCHA / "confirm you're not a bot" page
    BotDetection,

    /// EU consent interstitial instead of the watch page
    ConsentWall,
}

impl BlockingReason {
    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::RateLimited => "Rate limited (HTTP 429)",
            Self::BotDetection => "Bot detection triggered",
            Self::ConsentWall => "Consent page served instead of content",
        }
    }

    /// Whether a proxy or waiting is likely to help
    pub fn is_blocking(&self) -> bool {
        !matches!(self, Self::ConsentWall)
    }
}

/// Classify a failed request
pub fn diagnose_fetch(error: &FetchError) -> Option<BlockingReason> {
    match error {
        FetchError::Status(403) => Some(BlockingReason::Http403Forbidden),
        FetchError::Status(429) => Some(BlockingReason::RateLimited),
        FetchError::Transport(msg) => diagnose_page(msg),
        _ => None,
    }
}

/// Classify a 2xx body that is not what we asked for
pub fn diagnose_page(body: &str) -> Option<BlockingReason> {
    let lower = body.to_lowercase();

    if lower.contains("g-recaptcha")
        || lower.contains("unusual traffic")
        || lower.contains("confirm you're not a bot")
        || lower.contains("confirm you’re not a bot")
    {
        return Some(BlockingReason::BotDetection);
    }

    if lower.contains("action=\"https://consent.youtube.com/s\"") {
        return Some(BlockingReason::ConsentWall);
    }

    None
}
