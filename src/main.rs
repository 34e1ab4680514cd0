use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use caption_probe::captions::{CaptionProber, ProbeConfig, UserAgentPool};
use caption_probe::server;

#[derive(Parser)]
#[command(name = "caption-probe")]
#[command(about = "Fetch YouTube captions through ordered fallback strategies")]
struct Cli {
    #[command(flatten)]
    probe: ProbeArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ProbeArgs {
    /// Per-request timeout in seconds.
    #[arg(long, global = true, env = "CAPTION_PROBE_TIMEOUT", default_value_t = 10)]
    timeout: u64,

    /// Attempts per request, including the first.
    #[arg(long, global = true, env = "CAPTION_PROBE_RETRIES", default_value_t = 3)]
    retries: u32,

    /// First retry delay in milliseconds; doubles on each failure.
    #[arg(long, global = true, env = "CAPTION_PROBE_RETRY_DELAY_MS", default_value_t = 1000)]
    retry_delay_ms: u64,

    /// SOCKS5/HTTP proxy URL (e.g., "socks5h://127.0.0.1:1080").
    #[arg(long, global = true, env = "CAPTION_PROBE_PROXY")]
    proxy: Option<String>,

    /// Caption language requested from direct endpoints.
    #[arg(long, global = true, env = "CAPTION_PROBE_LANG", default_value = "en")]
    lang: String,

    /// User-agent to rotate through (repeatable). Defaults to a built-in pool.
    #[arg(long = "user-agent", global = true)]
    user_agents: Vec<String>,
}

impl ProbeArgs {
    fn to_config(&self) -> ProbeConfig {
        ProbeConfig::default()
            .with_language(self.lang.clone())
            .with_timeout(self.timeout)
            .with_max_attempts(self.retries)
            .with_retry_base_delay(Duration::from_millis(self.retry_delay_ms))
            .with_proxy(self.proxy.clone())
            .with_user_agents(UserAgentPool::new(self.user_agents.clone()))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the transcript JSON for a video id or URL.
    Fetch {
        /// Video id or URL (youtu.be, watch?v=, embed).
        video: String,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Serve GET /get-transcript?videoId=... over HTTP.
    Serve {
        /// Address to bind.
        #[arg(long, env = "HOST", default_value = "127.0.0.1")]
        host: String,

        /// Port to bind.
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.probe.to_config();
    let prober = CaptionProber::from_config(&config)?;

    match cli.command {
        Command::Fetch { video, pretty } => {
            let response = prober.get_captions(&video).await?;
            let json = if pretty {
                serde_json::to_string_pretty(&response)?
            } else {
                serde_json::to_string(&response)?
            };
            println!("{}", json);
        }
        Command::Serve { host, port } => {
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .with_context(|| format!("Invalid bind address {}:{}", host, port))?;
            server::serve(addr, Arc::new(prober)).await?;
        }
    }

    Ok(())
}
