mod client_id;
mod config;
mod error;
mod handlers;
mod metrics;
mod models;
mod provider;
mod rate_limit;
mod server;
mod state;

use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use crate::config::Args;
use crate::provider::OpenAiProvider;
use crate::rate_limit::{RateLimiter, sweeper};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // parse cli arguments
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_filter)),
        )
        .init();

    let provider = OpenAiProvider::new(
        &args.openai_base_url,
        args.openai_api_key.clone(),
        args.upstream_timeout(),
    )?;
    let rate_limiter = Arc::new(RateLimiter::new(args.rate_limit));

    if let Some(every) = args.sweep_every() {
        tokio::spawn(sweeper(Arc::clone(&rate_limiter), every));
    }

    tracing::info!("Forwarding completions to {}", args.openai_base_url);
    tracing::info!(
        "Rate limit: {} requests per client per {} seconds",
        rate_limiter.requests_per_minute(),
        rate_limit::WINDOW.as_secs()
    );

    let state = Arc::new(AppState {
        provider: Arc::new(provider),
        rate_limiter,
    });

    server::serve(&args.listen_addr(), state).await
}
