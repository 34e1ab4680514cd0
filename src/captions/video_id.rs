// Video identifier extraction
//
// Accepts either a bare 11-character id or one of the common URL shapes:
// - https://youtu.be/<id>
// - https://www.youtube.com/watch?v=<id>
// - https://www.youtube.com/embed/<id> (also /shorts/<id>, /v/<id>)

use regex::Regex;
use serde::Serialize;
use std::fmt;

use super::errors::CaptionError;

lazy_static::lazy_static! {
    static ref BARE_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap();
    static ref SHORT_LINK_RE: Regex =
        Regex::new(r"youtu\.be/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)").unwrap();
    static ref QUERY_RE: Regex =
        Regex::new(r"[?&]v=([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)").unwrap();
    static ref EMBED_RE: Regex =
        Regex::new(r"/(?:embed|shorts|v)/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)").unwrap();
}

/// Validated video identifier; the only lookup key for upstream requests
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Resolve a bare id or URL, first matching shape wins
    pub fn parse(input: &str) -> Result<Self, CaptionError> {
        let input = input.trim();

        if BARE_RE.is_match(input) {
            return Ok(Self(input.to_string()));
        }

        for re in [&*SHORT_LINK_RE, &*QUERY_RE, &*EMBED_RE] {
            if let Some(id) = re.captures(input).and_then(|caps| caps.get(1)) {
                return Ok(Self(id.as_str().to_string()));
            }
        }

        Err(CaptionError::InvalidIdentifier(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    #[test]
    fn test_bare_id() {
        assert_eq!(VideoId::parse(ID).unwrap().as_str(), ID);
        assert_eq!(VideoId::parse("  _NuH3D4SN-c ").unwrap().as_str(), "_NuH3D4SN-c");
    }

    #[test]
    fn test_all_url_shapes() {
        let urls = [
            format!("https://youtu.be/{}", ID),
            format!("https://youtu.be/{}?si=VSFea_rMwtaiR8Q7", ID),
            format!("https://www.youtube.com/watch?v={}", ID),
            format!("https://www.youtube.com/watch?feature=share&v={}&t=42s", ID),
            format!("https://m.youtube.com/watch?v={}#comments", ID),
            format!("https://www.youtube.com/embed/{}?autoplay=1", ID),
            format!("https://www.youtube.com/shorts/{}", ID),
            format!("youtube.com/v/{}", ID),
        ];

        for url in &urls {
            assert_eq!(VideoId::parse(url).unwrap().as_str(), ID, "url: {}", url);
        }
    }

    #[test]
    fn test_identifier_characters() {
        let id = "a-B_c9-Z_0x";
        assert_eq!(
            VideoId::parse(&format!("https://youtu.be/{}", id)).unwrap().as_str(),
            id
        );
    }

    #[test]
    fn test_invalid_inputs() {
        let inputs = [
            "",
            "not-a-valid-id",
            "short",
            "https://example.com",
            "https://www.youtube.com/watch?v=tooShort",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQXX",
            "https://www.youtube.com/watch?list=PL123",
            "dQw4w9WgXc!",
        ];

        for input in inputs {
            assert_eq!(
                VideoId::parse(input),
                Err(CaptionError::InvalidIdentifier(input.to_string())),
                "input: {}",
                input
            );
        }
    }

    #[test]
    fn test_short_link_takes_priority_over_query() {
        let url = "https://youtu.be/AAAAAAAAAAA?v=BBBBBBBBBBB";
        assert_eq!(VideoId::parse(url).unwrap().as_str(), "AAAAAAAAAAA");
    }
}
