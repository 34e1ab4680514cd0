// Captions module - ordered fallback probing for YouTube captions

pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod errors;
pub mod fetch;
pub mod models;
pub mod orchestrator;
pub mod parsers;
pub mod strategies;
pub mod video_id;

pub use config::{ProbeConfig, UserAgentPool};
pub use discovery::{select_track, select_track_for, TrackDiscovery};
pub use errors::{CaptionError, FetchError};
pub use fetch::{with_retry, HttpClient, ReqwestHttpClient, RetryPolicy};
pub use models::{CaptionSegment, CaptionTrackDescriptor, Timestamp, Transcript, TranscriptResponse};
pub use orchestrator::{CaptionProber, CaptionProberBuilder};
pub use parsers::{parse_json3, parse_xml};
pub use strategies::{ProbeFailure, ProbeStrategy};
pub use video_id::VideoId;
