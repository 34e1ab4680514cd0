pub mod captions;
pub mod server;

pub use captions::{CaptionError, CaptionProber, ProbeConfig, TranscriptResponse, VideoId};

/// Resolve `identifier_or_url` and fetch its captions with `prober`
pub async fn get_captions(
    prober: &CaptionProber,
    identifier_or_url: &str,
) -> Result<TranscriptResponse, CaptionError> {
    prober.get_captions(identifier_or_url).await
}
