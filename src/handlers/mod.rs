mod health;
mod metrics;
mod chat;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use chat::chat_handler;
