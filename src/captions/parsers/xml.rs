use log::debug;
use regex::Regex;

use super::clean_text;
use crate::captions::models::{CaptionSegment, Timestamp, Transcript};

lazy_static::lazy_static! {
    // Attribute list may not end in '/', so self-closing <text .../> never opens a body
    static ref TEXT_RE: Regex = Regex::new(r"(?s)<text\b([^>]*[^/>])?>(.*?)</text>").unwrap();
    static ref ATTR_RE: Regex =
        Regex::new(r#"([A-Za-z_:][\w:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap();
}

/// Parse a `<transcript>` document. Elements missing `start`, `dur` or text
/// are skipped. Timestamps pass through as written; text has entities
/// decoded and whitespace collapsed.
pub fn parse_xml(body: &str) -> Transcript {
    if !body.contains("<transcript") {
        debug!("[Parser] XML body has no <transcript> root");
        return Vec::new();
    }

    TEXT_RE
        .captures_iter(body)
        .filter_map(|caps| {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let content = caps.get(2)?.as_str();
            if content.contains("<text") {
                // unterminated element swallowed its neighbour
                return None;
            }

            let start = attribute(attrs, "start").and_then(|v| Timestamp::parse(&v))?;
            let duration = attribute(attrs, "dur").and_then(|v| Timestamp::parse(&v))?;

            let decoded = html_escape::decode_html_entities(content);
            let text = clean_text(&decoded);
            if text.is_empty() {
                return None;
            }

            Some(CaptionSegment { text, start, duration })
        })
        .collect()
}

fn attribute(attrs: &str, name: &str) -> Option<String> {
    ATTR_RE
        .captures_iter(attrs)
        .find(|caps| &caps[1] == name)
        .and_then(|caps| caps.get(2).or_else(|| caps.get(3)))
        .map(|value| value.as_str().to_string())
        .filter(|value| !value.is_empty())
}
