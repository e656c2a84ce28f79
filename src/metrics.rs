use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("chat_relay_requests_total", "Total number of completion requests")
            .expect("metric can be registered");
    pub static ref RATE_LIMITED_TOTAL: Counter =
        register_counter!("chat_relay_rate_limited_total", "Requests rejected by the rate limiter")
            .expect("metric can be registered");
    pub static ref UPSTREAM_ERRORS: Counter =
        register_counter!("chat_relay_upstream_errors_total", "Failed provider calls")
            .expect("metric can be registered");
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "chat_relay_request_latency_seconds",
        "Provider call latency in seconds"
    )
    .expect("metric can be registered");
    pub static ref TRACKED_CLIENTS: Gauge =
        register_gauge!("chat_relay_tracked_clients", "Client ids held by the rate limiter")
            .expect("metric can be registered");
}
