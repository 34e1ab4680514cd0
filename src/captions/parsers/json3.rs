use log::debug;
use serde::Deserialize;
use serde_json::Value;

use super::clean_text;
use crate::captions::models::{CaptionSegment, Timestamp, Transcript};

#[derive(Deserialize, Debug)]
struct EventStream {
    #[serde(default)]
    events: Vec<Value>,
}

/// Parse a json3 event stream. Events are read one at a time: those without
/// fragments, without both offsets, or with blank text are skipped without
/// affecting the rest of the stream.
pub fn parse_json3(body: &str) -> Transcript {
    let stream: EventStream = match serde_json::from_str(body) {
        Ok(stream) => stream,
        Err(e) => {
            debug!("[Parser] json3 body not readable: {}", e);
            return Vec::new();
        }
    };

    stream.events.iter().filter_map(parse_event).collect()
}

fn parse_event(event: &Value) -> Option<CaptionSegment> {
    let segs = event["segs"].as_array()?;
    let start = millis(&event["tStartMs"])?;
    let duration = millis(&event["dDurationMs"])?;

    let raw: String = segs.iter().filter_map(|s| s["utf8"].as_str()).collect();
    let text = clean_text(&raw);
    if text.is_empty() {
        return None;
    }

    Some(CaptionSegment {
        text,
        start: Timestamp::from_millis(start),
        duration: Timestamp::from_millis(duration),
    })
}

/// Non-negative integer or float milliseconds, floats rounded to the nearest ms
fn millis(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|ms| ms.is_finite() && *ms >= 0.0)
            .map(|ms| ms.round() as u64)
    })
}
