use std::sync::Arc;
use crate::provider::CompletionProvider;
use crate::rate_limit::RateLimiter;
// app's shared state

pub struct AppState {
    pub provider: Arc<dyn CompletionProvider>,
    pub rate_limiter: Arc<RateLimiter>, // one per process, shared with the sweeper
}
