// Common data models for caption retrieval

use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-negative offset in seconds, kept in its textual form.
///
/// Event-stream captions arrive as integer milliseconds and are rendered with
/// exactly two decimals. XML captions already carry decimal seconds, which are
/// validated and passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(String);

impl Timestamp {
    /// Milliseconds to seconds, rounded half up to two decimals
    pub fn from_millis(ms: u64) -> Self {
        let centis = ms.saturating_add(5) / 10;
        Self(format!("{}.{:02}", centis / 100, centis % 100))
    }

    /// Accept a plain non-negative decimal such as `"0.5"`, `"12"` or `"3.250"`
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (int_part, frac_part) = match raw.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (raw, None),
        };

        let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        let valid = match frac_part {
            Some(f) => digits(int_part) && digits(f) && !(int_part.is_empty() && f.is_empty()),
            None => !int_part.is_empty() && digits(int_part),
        };

        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

}

impl TryFrom<String> for Timestamp {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw).ok_or_else(|| format!("invalid timestamp: {:?}", raw))
    }
}

impl From<Timestamp> for String {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One timed caption line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionSegment {
    pub text: String,
    pub start: Timestamp,
    pub duration: Timestamp,
}

/// Segments in source order
pub type Transcript = Vec<CaptionSegment>;

/// A caption track advertised by the watch page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrackDescriptor {
    /// BCP-47-ish code, e.g. "en", "en-US", "fr"
    pub language_code: String,
    /// Human-readable name ("English (auto-generated)")
    pub display_name: String,
    /// Speech-recognition track (`kind == "asr"`)
    pub is_auto_generated: bool,
    /// Signed timedtext URL
    pub source_url: String,
}

/// Success body returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptResponse {
    pub transcript: Transcript,
}

impl From<Transcript> for TranscriptResponse {
    fn from(transcript: Transcript) -> Self {
        Self { transcript }
    }
}
