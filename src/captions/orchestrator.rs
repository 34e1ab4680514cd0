// Orchestrator with fallback logic

use log::{debug, info, warn};
use std::sync::Arc;

use super::config::ProbeConfig;
use super::errors::CaptionError;
use super::fetch::{HttpClient, ReqwestHttpClient};
use super::models::{Transcript, TranscriptResponse};
use super::strategies::{default_strategies, ProbeContext, ProbeStrategy};
use super::video_id::VideoId;

/// Runs probe strategies in order until one yields captions
pub struct CaptionProber {
    strategies: Vec<Box<dyn ProbeStrategy>>,
}

impl CaptionProber {
    /// Prober with no strategies; add them with `add_strategy`
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Builder starting from the built-in strategies
    pub fn builder(config: &ProbeConfig) -> CaptionProberBuilder {
        CaptionProberBuilder::new(config)
    }

    /// Built-in strategies over a reqwest client
    pub fn from_config(config: &ProbeConfig) -> Result<Self, CaptionError> {
        Self::builder(config).build()
    }

    /// Built-in strategies over any `HttpClient`
    pub fn with_http_client(http: Arc<dyn HttpClient>, config: &ProbeConfig) -> Self {
        let ctx = Arc::new(ProbeContext::new(http, config));
        Self {
            strategies: default_strategies(ctx),
        }
    }

    pub fn add_strategy(&mut self, strategy: Box<dyn ProbeStrategy>) {
        self.strategies.push(strategy);
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// First non-empty transcript, or `NotFound` once every strategy failed
    pub async fn fetch_transcript(&self, video_id: &VideoId) -> Result<Transcript, CaptionError> {
        let mut blocked = false;

        for strategy in &self.strategies {
            debug!("[Prober] Trying strategy {} for {}", strategy.name(), video_id);

            match strategy.probe(video_id).await {
                Ok(transcript) if !transcript.is_empty() => {
                    info!(
                        "[Prober] ✓ {} segments for {} via {}",
                        transcript.len(),
                        video_id,
                        strategy.name()
                    );
                    return Ok(transcript);
                }
                Ok(_) => {
                    debug!("[Prober] ✗ {} returned an empty transcript", strategy.name());
                }
                Err(failure) => {
                    if let Some(reason) = failure.blocking_reason() {
                        warn!("[Prober] ✗ {} blocked: {}", strategy.name(), reason.description());
                        blocked = true;
                    } else {
                        debug!("[Prober] ✗ {} failed: {}", strategy.name(), failure);
                    }
                }
            }
        }

        warn!("[Prober] All strategies exhausted for {}", video_id);
        Err(CaptionError::NotFound {
            video_id: video_id.to_string(),
            blocked,
        })
    }

    /// Resolve the identifier and fetch its captions
    pub async fn get_captions(&self, identifier_or_url: &str) -> Result<TranscriptResponse, CaptionError> {
        let video_id = VideoId::parse(identifier_or_url)?;
        let transcript = self.fetch_transcript(&video_id).await?;
        Ok(TranscriptResponse::from(transcript))
    }
}

impl Default for CaptionProber {
    fn default() -> Self {
        Self::new()
    }
}

/// Assembles a prober: built-in strategies first (unless dropped), then any
/// added ones in insertion order
pub struct CaptionProberBuilder {
    config: ProbeConfig,
    http: Option<Arc<dyn HttpClient>>,
    include_defaults: bool,
    extra: Vec<Box<dyn ProbeStrategy>>,
}

impl CaptionProberBuilder {
    fn new(config: &ProbeConfig) -> Self {
        Self {
            config: config.clone(),
            http: None,
            include_defaults: true,
            extra: Vec::new(),
        }
    }

    /// Client for the built-in strategies; reqwest when unset
    pub fn http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn without_default_strategies(mut self) -> Self {
        self.include_defaults = false;
        self
    }

    pub fn add_strategy(mut self, strategy: Box<dyn ProbeStrategy>) -> Self {
        self.extra.push(strategy);
        self
    }

    pub fn build(self) -> Result<CaptionProber, CaptionError> {
        let mut prober = CaptionProber::new();

        if self.include_defaults {
            let http: Arc<dyn HttpClient> = match self.http {
                Some(http) => http,
                None => Arc::new(ReqwestHttpClient::new(&self.config).map_err(|e| {
                    CaptionError::Internal(format!("HTTP client setup failed: {}", e))
                })?),
            };
            let ctx = Arc::new(ProbeContext::new(http, &self.config));
            prober.strategies = default_strategies(ctx);
        }

        prober.strategies.extend(self.extra);
        Ok(prober)
    }
}
