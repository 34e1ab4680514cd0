// Probe configuration

use rand::seq::SliceRandom;
use std::time::Duration;

/// Browser user-agents rotated across watch-page requests
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:122.0) Gecko/20100101 Firefox/122.0",
];

/// Pool of client-identifying header values. Pin it to a single entry for
/// deterministic requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentPool {
    agents: Vec<String>,
}

impl UserAgentPool {
    /// Empty input falls back to the default pool
    pub fn new(agents: Vec<String>) -> Self {
        let agents: Vec<String> = agents.into_iter().filter(|a| !a.trim().is_empty()).collect();
        if agents.is_empty() {
            return Self::default();
        }
        Self { agents }
    }

    pub fn fixed(agent: impl Into<String>) -> Self {
        Self::new(vec![agent.into()])
    }

    pub fn pick(&self) -> &str {
        self.agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_USER_AGENTS[0])
    }

    pub fn agents(&self) -> &[String] {
        &self.agents
    }
}

impl Default for UserAgentPool {
    fn default() -> Self {
        Self {
            agents: DEFAULT_USER_AGENTS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Configuration shared by the HTTP client, retry wrapper and strategies
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Caption language requested from direct endpoints
    pub language: String,
    /// Attempts per request, including the first one
    pub max_attempts: u32,
    /// First retry delay; doubles after every failed attempt
    pub retry_base_delay: Duration,
    /// Per-request timeout
    pub timeout_seconds: u64,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// User-agents for watch-page requests
    pub user_agents: UserAgentPool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            max_attempts: 3,
            retry_base_delay: Duration::from_secs(1),
            timeout_seconds: 10,
            proxy: None,
            user_agents: UserAgentPool::default(),
        }
    }
}

impl ProbeConfig {
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_user_agents(mut self, pool: UserAgentPool) -> Self {
        self.user_agents = pool;
        self
    }
}
