// Probe strategies
//
// Each strategy is one way of getting captions for a video. The prober runs
// them in order, cheapest first:
//   1. direct-json3          - timedtext endpoint, lang fixed, json3
//   2. track-discovery       - scrape the watch page for a track URL
//   3. endpoint-permutations - alternate hosts and query parameters
//   4. legacy-xml            - video.google.com timedtext, manual then ASR

use async_trait::async_trait;
use log::debug;
use std::fmt;
use std::sync::Arc;

use super::config::{ProbeConfig, UserAgentPool};
use super::diagnostics::{diagnose_fetch, diagnose_page, BlockingReason};
use super::discovery::TrackDiscovery;
use super::errors::FetchError;
use super::fetch::{fetch_text, HttpClient, RetryPolicy};
use super::models::Transcript;
use super::parsers::{parse_json3, parse_xml};
use super::video_id::VideoId;

pub const TIMEDTEXT_URL: &str = "https://www.youtube.com/api/timedtext";
pub const LEGACY_TIMEDTEXT_URL: &str = "https://video.google.com/timedtext";

/// Query parameter sets tried against each timedtext host, in order
const PERMUTATION_PARAMS: &[&str] = &[
    "lang={lang}&kind=asr",
    "lang={lang}-US",
    "lang={lang}-US&kind=asr",
    "lang={lang}&type=track",
    "lang={lang}",
];

/// Why a strategy produced nothing. Never surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// Request succeeded but held no usable captions
    Empty,
    /// Request failed after retries
    Upstream(FetchError),
    /// Upstream served a block page instead of content
    Blocked(BlockingReason),
}

impl ProbeFailure {
    pub fn blocking_reason(&self) -> Option<BlockingReason> {
        let reason = match self {
            Self::Empty => None,
            Self::Upstream(e) => diagnose_fetch(e),
            Self::Blocked(reason) => Some(*reason),
        };
        reason.filter(BlockingReason::is_blocking)
    }
}

/// Keep whichever failure says we were blocked, otherwise the later one
fn prefer_blocking(earlier: ProbeFailure, later: ProbeFailure) -> ProbeFailure {
    if later.blocking_reason().is_none() && earlier.blocking_reason().is_some() {
        earlier
    } else {
        later
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "no captions"),
            Self::Upstream(e) => write!(f, "{}", e),
            Self::Blocked(reason) => write!(f, "{}", reason.description()),
        }
    }
}

/// Trait for probe strategy implementations
#[async_trait]
pub trait ProbeStrategy: Send + Sync {
    /// Name of the strategy (for logging)
    fn name(&self) -> &'static str;

    /// Non-empty transcript, or the reason there is none
    async fn probe(&self, video_id: &VideoId) -> Result<Transcript, ProbeFailure>;
}

/// Wire format of a caption response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionFormat {
    Json3,
    Xml,
}

/// Shared plumbing for the built-in strategies
pub struct ProbeContext {
    pub http: Arc<dyn HttpClient>,
    pub policy: RetryPolicy,
    pub user_agents: UserAgentPool,
    pub language: String,
}

impl ProbeContext {
    pub fn new(http: Arc<dyn HttpClient>, config: &ProbeConfig) -> Self {
        Self {
            http,
            policy: RetryPolicy::from_config(config),
            user_agents: config.user_agents.clone(),
            language: config.language.clone(),
        }
    }

    /// Fetch `url` with `policy` and parse it as `format`
    async fn fetch_captions(
        &self,
        url: &str,
        format: CaptionFormat,
        policy: RetryPolicy,
    ) -> Result<Transcript, ProbeFailure> {
        let body = fetch_text(self.http.as_ref(), policy, url, self.user_agents.pick())
            .await
            .map_err(ProbeFailure::Upstream)?;

        let transcript = match format {
            CaptionFormat::Json3 => parse_json3(&body),
            CaptionFormat::Xml => parse_xml(&body),
        };

        if !transcript.is_empty() {
            return Ok(transcript);
        }

        match diagnose_page(&body) {
            Some(reason) => Err(ProbeFailure::Blocked(reason)),
            None => Err(ProbeFailure::Empty),
        }
    }

    /// Single attempt; used where the next URL in line is the retry
    fn single_shot(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: 1,
            ..self.policy
        }
    }
}

/// Append `fmt=json3` to a URL that may or may not have a query string
pub fn with_json3_format(url: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}fmt=json3", url, separator)
}

/// Strategy 1: direct timedtext request, json3
pub struct DirectJson3Strategy {
    ctx: Arc<ProbeContext>,
}

impl DirectJson3Strategy {
    pub fn new(ctx: Arc<ProbeContext>) -> Self {
        Self { ctx }
    }

    pub fn url_for(&self, video_id: &VideoId) -> String {
        format!(
            "{}?v={}&lang={}&fmt=json3",
            TIMEDTEXT_URL, video_id, self.ctx.language
        )
    }
}

#[async_trait]
impl ProbeStrategy for DirectJson3Strategy {
    fn name(&self) -> &'static str {
        "direct-json3"
    }

    async fn probe(&self, video_id: &VideoId) -> Result<Transcript, ProbeFailure> {
        let url = self.url_for(video_id);
        self.ctx
            .fetch_captions(&url, CaptionFormat::Json3, self.ctx.policy)
            .await
    }
}

/// Strategy 2: watch-page discovery, json3 then XML from the track URL
pub struct TrackDiscoveryStrategy {
    ctx: Arc<ProbeContext>,
    discovery: TrackDiscovery,
}

impl TrackDiscoveryStrategy {
    pub fn new(ctx: Arc<ProbeContext>) -> Self {
        let discovery = TrackDiscovery::new(ctx.http.clone(), ctx.policy, ctx.user_agents.clone())
            .with_language(ctx.language.clone());
        Self { ctx, discovery }
    }
}

#[async_trait]
impl ProbeStrategy for TrackDiscoveryStrategy {
    fn name(&self) -> &'static str {
        "track-discovery"
    }

    async fn probe(&self, video_id: &VideoId) -> Result<Transcript, ProbeFailure> {
        let track = self.discovery.discover_track(video_id).await?;

        let json3_url = with_json3_format(&track.source_url);
        match self
            .ctx
            .fetch_captions(&json3_url, CaptionFormat::Json3, self.ctx.policy)
            .await
        {
            Ok(transcript) => Ok(transcript),
            Err(json3_failure) => {
                debug!("[Strategy] json3 track fetch failed ({}), trying XML", json3_failure);
                self.ctx
                    .fetch_captions(&track.source_url, CaptionFormat::Xml, self.ctx.policy)
                    .await
                    .map_err(|xml_failure| prefer_blocking(json3_failure, xml_failure))
            }
        }
    }
}

/// Strategy 3: bounded list of host/parameter permutations, json3
pub struct EndpointPermutationsStrategy {
    ctx: Arc<ProbeContext>,
    hosts: Vec<String>,
}

impl EndpointPermutationsStrategy {
    pub fn new(ctx: Arc<ProbeContext>) -> Self {
        Self {
            ctx,
            hosts: vec![TIMEDTEXT_URL.to_string(), LEGACY_TIMEDTEXT_URL.to_string()],
        }
    }

    /// Every URL this strategy will try, in order. Excludes the direct
    /// strategy's URL.
    pub fn urls_for(&self, video_id: &VideoId) -> Vec<String> {
        let direct = DirectJson3Strategy::new(self.ctx.clone()).url_for(video_id);

        self.hosts
            .iter()
            .flat_map(|host| {
                PERMUTATION_PARAMS.iter().map(move |params| {
                    let params = params.replace("{lang}", &self.ctx.language);
                    format!("{}?v={}&{}&fmt=json3", host, video_id, params)
                })
            })
            .filter(|url| *url != direct)
            .collect()
    }
}

#[async_trait]
impl ProbeStrategy for EndpointPermutationsStrategy {
    fn name(&self) -> &'static str {
        "endpoint-permutations"
    }

    async fn probe(&self, video_id: &VideoId) -> Result<Transcript, ProbeFailure> {
        let mut last_failure = ProbeFailure::Empty;

        for url in self.urls_for(video_id) {
            match self
                .ctx
                .fetch_captions(&url, CaptionFormat::Json3, self.ctx.single_shot())
                .await
            {
                Ok(transcript) => return Ok(transcript),
                Err(e) => {
                    debug!("[Strategy] {} -> {}", url, e);
                    last_failure = prefer_blocking(last_failure, e);
                }
            }
        }

        Err(last_failure)
    }
}

/// Strategy 4: video.google.com timedtext as XML, manual track then ASR
pub struct LegacyXmlStrategy {
    ctx: Arc<ProbeContext>,
}

impl LegacyXmlStrategy {
    pub fn new(ctx: Arc<ProbeContext>) -> Self {
        Self { ctx }
    }

    pub fn urls_for(&self, video_id: &VideoId) -> [String; 2] {
        let manual = format!(
            "{}?type=track&v={}&lang={}",
            LEGACY_TIMEDTEXT_URL, video_id, self.ctx.language
        );
        let asr = format!("{}&kind=asr", manual);
        [manual, asr]
    }
}

#[async_trait]
impl ProbeStrategy for LegacyXmlStrategy {
    fn name(&self) -> &'static str {
        "legacy-xml"
    }

    async fn probe(&self, video_id: &VideoId) -> Result<Transcript, ProbeFailure> {
        let [manual, asr] = self.urls_for(video_id);

        match self
            .ctx
            .fetch_captions(&manual, CaptionFormat::Xml, self.ctx.single_shot())
            .await
        {
            Ok(transcript) => Ok(transcript),
            Err(manual_failure) => {
                debug!("[Strategy] manual XML track: {}, trying ASR", manual_failure);
                self.ctx
                    .fetch_captions(&asr, CaptionFormat::Xml, self.ctx.single_shot())
                    .await
                    .map_err(|asr_failure| prefer_blocking(manual_failure, asr_failure))
            }
        }
    }
}

/// The built-in strategies in probe order
pub fn default_strategies(ctx: Arc<ProbeContext>) -> Vec<Box<dyn ProbeStrategy>> {
    vec![
        Box::new(DirectJson3Strategy::new(ctx.clone())),
        Box::new(TrackDiscoveryStrategy::new(ctx.clone())),
        Box::new(EndpointPermutationsStrategy::new(ctx.clone())),
        Box::new(LegacyXmlStrategy::new(ctx)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned bodies by exact URL; anything else is a 404
    struct CannedHttp {
        routes: HashMap<String, Result<String, FetchError>>,
        requested: Mutex<Vec<String>>,
    }

    impl CannedHttp {
        fn new(routes: Vec<(String, Result<String, FetchError>)>) -> Arc<Self> {
            Arc::new(Self {
                routes: routes.into_iter().collect(),
                requested: Mutex::new(Vec::new()),
            })
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for CannedHttp {
        async fn get_text(&self, url: &str, _user_agent: &str) -> Result<String, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.routes
                .get(url)
                .cloned()
                .unwrap_or(Err(FetchError::Status(404)))
        }
    }

    const JSON3: &str = r#"{"events":[{"tStartMs":0,"dDurationMs":1000,"segs":[{"utf8":"hello"}]}]}"#;
    const XML: &str = r#"<transcript><text start="0" dur="1">hello xml</text></transcript>"#;

    fn ctx(http: Arc<CannedHttp>) -> Arc<ProbeContext> {
        let config = ProbeConfig::default()
            .with_max_attempts(1)
            .with_user_agents(UserAgentPool::fixed("test-agent"));
        Arc::new(ProbeContext::new(http, &config))
    }

    fn id() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    #[test]
    fn test_json3_format_suffix() {
        assert_eq!(with_json3_format("https://a/t?v=1"), "https://a/t?v=1&fmt=json3");
        assert_eq!(with_json3_format("https://a/t"), "https://a/t?fmt=json3");
    }

    #[tokio::test]
    async fn test_direct_strategy() {
        let url = "https://www.youtube.com/api/timedtext?v=dQw4w9WgXcQ&lang=en&fmt=json3";
        let http = CannedHttp::new(vec![(url.to_string(), Ok(JSON3.to_string()))]);
        let strategy = DirectJson3Strategy::new(ctx(http.clone()));

        let transcript = strategy.probe(&id()).await.unwrap();
        assert_eq!(transcript[0].text, "hello");
        assert_eq!(http.requested(), vec![url.to_string()]);
    }

    #[tokio::test]
    async fn test_direct_strategy_reports_rate_limit() {
        let http = CannedHttp::new(vec![(
            "https://www.youtube.com/api/timedtext?v=dQw4w9WgXcQ&lang=en&fmt=json3".to_string(),
            Err(FetchError::Status(429)),
        )]);
        let failure = DirectJson3Strategy::new(ctx(http)).probe(&id()).await.unwrap_err();
        assert_eq!(failure, ProbeFailure::Upstream(FetchError::Status(429)));
        assert_eq!(failure.blocking_reason(), Some(BlockingReason::RateLimited));
    }

    #[tokio::test]
    async fn test_discovery_falls_back_to_xml() {
        let base = "https://www.youtube.com/api/timedtext?v=dQw4w9WgXcQ&lang=en&kind=asr";
        let page = format!(
            r#"<script>var ytInitialPlayerResponse = {{"captions":{{"playerCaptionsTracklistRenderer":{{"captionTracks":[{{"baseUrl":"{}","languageCode":"en","kind":"asr"}}]}}}}}};</script>"#,
            base
        );
        let http = CannedHttp::new(vec![
            ("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(), Ok(page)),
            (format!("{}&fmt=json3", base), Ok("{}".to_string())),
            (base.to_string(), Ok(XML.to_string())),
        ]);
        let strategy = TrackDiscoveryStrategy::new(ctx(http.clone()));

        let transcript = strategy.probe(&id()).await.unwrap();
        assert_eq!(transcript[0].text, "hello xml");
        assert_eq!(http.requested().len(), 3);
    }

    #[tokio::test]
    async fn test_discovery_keeps_blocked_json3_failure() {
        let base = "https://www.youtube.com/api/timedtext?v=dQw4w9WgXcQ&lang=en";
        let page = format!(
            r#"var ytInitialPlayerResponse = {{"captions":{{"playerCaptionsTracklistRenderer":{{"captionTracks":[{{"baseUrl":"{}","languageCode":"en"}}]}}}}}};"#,
            base
        );
        let http = CannedHttp::new(vec![
            ("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(), Ok(page)),
            (format!("{}&fmt=json3", base), Err(FetchError::Status(403))),
            (base.to_string(), Ok(String::new())),
        ]);

        let failure = TrackDiscoveryStrategy::new(ctx(http)).probe(&id()).await.unwrap_err();
        assert_eq!(failure, ProbeFailure::Upstream(FetchError::Status(403)));
        assert_eq!(failure.blocking_reason(), Some(BlockingReason::Http403Forbidden));
    }

    #[test]
    fn test_prefer_blocking() {
        let blocked = ProbeFailure::Upstream(FetchError::Status(429));
        let missing = ProbeFailure::Upstream(FetchError::Status(404));

        assert_eq!(prefer_blocking(blocked.clone(), ProbeFailure::Empty), blocked);
        assert_eq!(prefer_blocking(ProbeFailure::Empty, missing.clone()), missing);
        assert_eq!(
            prefer_blocking(blocked, ProbeFailure::Blocked(BlockingReason::BotDetection)),
            ProbeFailure::Blocked(BlockingReason::BotDetection)
        );
    }

    #[tokio::test]
    async fn test_legacy_xml_keeps_rate_limit() {
        let http = CannedHttp::new(vec![(
            "https://video.google.com/timedtext?type=track&v=dQw4w9WgXcQ&lang=en".to_string(),
            Err(FetchError::Status(429)),
        )]);
        let failure = LegacyXmlStrategy::new(ctx(http)).probe(&id()).await.unwrap_err();
        assert_eq!(failure.blocking_reason(), Some(BlockingReason::RateLimited));
    }

    #[tokio::test]
    async fn test_discovery_without_tracks() {
        let http = CannedHttp::new(vec![(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            Ok(r#"var ytInitialPlayerResponse = {"playabilityStatus":{"status":"OK"}};"#.to_string()),
        )]);
        let failure = TrackDiscoveryStrategy::new(ctx(http)).probe(&id()).await.unwrap_err();
        assert_eq!(failure, ProbeFailure::Empty);
    }

    #[tokio::test]
    async fn test_discovery_detects_bot_page() {
        let http = CannedHttp::new(vec![(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            Ok(r#"<div class="g-recaptcha"></div>"#.to_string()),
        )]);
        let failure = TrackDiscoveryStrategy::new(ctx(http)).probe(&id()).await.unwrap_err();
        assert_eq!(failure, ProbeFailure::Blocked(BlockingReason::BotDetection));
    }

    #[test]
    fn test_permutations_are_bounded_and_skip_direct() {
        let http = CannedHttp::new(vec![]);
        let ctx = ctx(http);
        let urls = EndpointPermutationsStrategy::new(ctx.clone()).urls_for(&id());
        let direct = DirectJson3Strategy::new(ctx).url_for(&id());

        assert_eq!(urls.len(), 2 * PERMUTATION_PARAMS.len() - 1);
        assert!(!urls.contains(&direct));
        assert!(urls.iter().all(|u| u.ends_with("&fmt=json3")));
        assert_eq!(
            urls[0],
            "https://www.youtube.com/api/timedtext?v=dQw4w9WgXcQ&lang=en&kind=asr&fmt=json3"
        );
    }

    #[tokio::test]
    async fn test_permutations_stop_at_first_hit() {
        let http = CannedHttp::new(vec![]);
        let urls = EndpointPermutationsStrategy::new(ctx(http)).urls_for(&id());

        let http = CannedHttp::new(vec![(urls[2].clone(), Ok(JSON3.to_string()))]);
        let strategy = EndpointPermutationsStrategy::new(ctx(http.clone()));

        assert!(strategy.probe(&id()).await.is_ok());
        assert_eq!(http.requested(), urls[..3].to_vec());
    }

    #[tokio::test]
    async fn test_legacy_xml_tries_asr_after_manual() {
        let http = CannedHttp::new(vec![(
            "https://video.google.com/timedtext?type=track&v=dQw4w9WgXcQ&lang=en&kind=asr".to_string(),
            Ok(XML.to_string()),
        )]);
        let strategy = LegacyXmlStrategy::new(ctx(http.clone()));

        let transcript = strategy.probe(&id()).await.unwrap();
        assert_eq!(transcript.len(), 1);
        assert_eq!(http.requested().len(), 2);
    }
}
