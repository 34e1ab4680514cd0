// Caption track discovery from the watch page
//
// Flow:
// 1. GET https://www.youtube.com/watch?v=<id> with a rotated user-agent
// 2. Locate the embedded `ytInitialPlayerResponse` JSON blob
// 3. Read captions.playerCaptionsTracklistRenderer.captionTracks[]
// 4. Pick one track: lang+auto > lang > first (lang defaults to "en")
//
// Best-effort throughout: every failure ends up as "no track".

use log::{debug, info, warn};
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

use super::config::UserAgentPool;
use super::diagnostics::diagnose_page;
use super::fetch::{fetch_text, HttpClient, RetryPolicy};
use super::models::CaptionTrackDescriptor;
use super::strategies::ProbeFailure;
use super::video_id::VideoId;

lazy_static::lazy_static! {
    static ref PLAYER_RESPONSE_RE: Regex =
        Regex::new(r#"ytInitialPlayerResponse"?\]?\s*=\s*"#).unwrap();
}

pub const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const DEFAULT_LANGUAGE: &str = "en";

pub struct TrackDiscovery {
    http: Arc<dyn HttpClient>,
    policy: RetryPolicy,
    user_agents: UserAgentPool,
    language: String,
}

impl TrackDiscovery {
    pub fn new(http: Arc<dyn HttpClient>, policy: RetryPolicy, user_agents: UserAgentPool) -> Self {
        Self {
            http,
            policy,
            user_agents,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Preferred track language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Selected track for the video, if the page advertises any
    pub async fn discover(&self, video_id: &VideoId) -> Option<CaptionTrackDescriptor> {
        self.discover_track(video_id).await.ok()
    }

    /// Same as `discover`, keeping the reason for failure
    pub(crate) async fn discover_track(
        &self,
        video_id: &VideoId,
    ) -> Result<CaptionTrackDescriptor, ProbeFailure> {
        let url = format!("{}{}", WATCH_URL, video_id);
        let user_agent = self.user_agents.pick();

        let html = fetch_text(self.http.as_ref(), self.policy, &url, user_agent)
            .await
            .map_err(|e| {
                warn!("[Discovery] watch page for {} failed: {}", video_id, e);
                ProbeFailure::Upstream(e)
            })?;

        let Some(player_response) = extract_player_response(&html) else {
            if let Some(reason) = diagnose_page(&html) {
                warn!("[Discovery] {}: {}", video_id, reason.description());
                return Err(ProbeFailure::Blocked(reason));
            }
            debug!("[Discovery] no player response in watch page for {}", video_id);
            return Err(ProbeFailure::Empty);
        };

        let tracks = extract_tracks(&player_response);
        debug!("[Discovery] {} caption track(s) for {}", tracks.len(), video_id);

        match select_track_for(&tracks, &self.language) {
            Some(track) => {
                info!(
                    "[Discovery] selected track {} ({}){}",
                    track.language_code,
                    track.display_name,
                    if track.is_auto_generated { " [auto]" } else { "" }
                );
                Ok(track.clone())
            }
            None => Err(ProbeFailure::Empty),
        }
    }
}

/// Decode the first JSON object assigned to `ytInitialPlayerResponse`
pub fn extract_player_response(html: &str) -> Option<Value> {
    PLAYER_RESPONSE_RE.find_iter(html).find_map(|m| {
        let rest = &html[m.end()..];
        let value = serde_json::Deserializer::from_str(rest)
            .into_iter::<Value>()
            .next()?
            .ok()?;
        value.is_object().then_some(value)
    })
}

/// Caption tracks listed in a player response, in page order
pub fn extract_tracks(player_response: &Value) -> Vec<CaptionTrackDescriptor> {
    let Some(tracks) = player_response
        .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    tracks
        .iter()
        .filter_map(|track| {
            let source_url = track["baseUrl"].as_str().filter(|u| !u.is_empty())?;
            let language_code = track["languageCode"].as_str().unwrap_or("").to_string();

            Some(CaptionTrackDescriptor {
                display_name: display_name(&track["name"]).unwrap_or_else(|| language_code.clone()),
                language_code,
                is_auto_generated: track["kind"].as_str() == Some("asr"),
                source_url: source_url.to_string(),
            })
        })
        .collect()
}

fn display_name(name: &Value) -> Option<String> {
    if let Some(text) = name["simpleText"].as_str() {
        return Some(text.to_string());
    }

    let runs = name["runs"].as_array()?;
    let joined: String = runs.iter().filter_map(|r| r["text"].as_str()).collect();
    (!joined.is_empty()).then_some(joined)
}

/// en + auto-generated, then any en, then the first track
pub fn select_track(tracks: &[CaptionTrackDescriptor]) -> Option<&CaptionTrackDescriptor> {
    select_track_for(tracks, DEFAULT_LANGUAGE)
}

/// Same order as `select_track` with `language` in place of "en".
/// Codes must match exactly.
pub fn select_track_for<'a>(
    tracks: &'a [CaptionTrackDescriptor],
    language: &str,
) -> Option<&'a CaptionTrackDescriptor> {
    tracks
        .iter()
        .find(|t| t.language_code == language && t.is_auto_generated)
        .or_else(|| tracks.iter().find(|t| t.language_code == language))
        .or_else(|| tracks.first())
}
