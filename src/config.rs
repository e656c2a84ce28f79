use clap::Parser;
use std::time::Duration;
use crate::provider::DEFAULT_OPENAI_URL;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "chat-relay")]
#[command(about = "Rate limited relay for chat completions")]
pub struct Args {
    // Address to bind
    #[arg(long, env = "CHAT_RELAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    // Port to run the server on
    #[arg(short, long, env = "CHAT_RELAY_PORT", default_value_t = 8000)]
    pub port: u16,

    // Max accepted requests per client in any 60 second window
    #[arg(long, env = "CHAT_RELAY_RATE_LIMIT", default_value_t = 15)]
    pub rate_limit: u32,

    // Seconds between sweeps of idle clients, 0 keeps every client forever
    #[arg(long, env = "CHAT_RELAY_SWEEP_INTERVAL", default_value_t = 0)]
    pub sweep_interval: u64,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_URL)]
    pub openai_base_url: String,

    // Upstream request timeout in seconds
    #[arg(long, env = "CHAT_RELAY_UPSTREAM_TIMEOUT", default_value_t = 60)]
    pub upstream_timeout: u64,

    // Log filter, RUST_LOG takes precedence when set
    #[arg(long = "log", env = "CHAT_RELAY_LOG", default_value = "info")]
    pub log_filter: String,
}

impl Args {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn sweep_every(&self) -> Option<Duration> {
        (self.sweep_interval > 0).then(|| Duration::from_secs(self.sweep_interval))
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }
}
