// Caption format parsers
//
// Two stateless transforms into the same `Transcript` shape:
// - json3: YouTube's JSON event stream (`fmt=json3`)
// - xml:   the classic `<transcript><text start dur>` document
//
// Neither parser returns an error. Anything unreadable becomes an empty
// transcript, which the orchestrator treats as "try the next strategy".

mod json3;
mod xml;

pub use json3::parse_json3;
pub use xml::parse_xml;

/// Turn escaped and real newlines into spaces, collapse whitespace runs, trim
pub(crate) fn clean_text(raw: &str) -> String {
    raw.replace("\\n", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
