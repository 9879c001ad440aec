//! Adapter metrics

use crate::types::Provider;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

lazy_static::lazy_static! {
    /// Total provider requests by provider, operation, and outcome
    pub static ref PROVIDER_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "provider_requests_total",
        "Total payment-provider requests",
        &["provider", "operation", "status"]
    )
    .unwrap();

    /// Provider request latency
    pub static ref PROVIDER_REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "provider_request_duration_seconds",
        "Payment-provider request duration",
        &["provider", "operation"]
    )
    .unwrap();

    /// Webhook deliveries by provider and verification outcome
    pub static ref WEBHOOKS_TOTAL: CounterVec = register_counter_vec!(
        "provider_webhooks_total",
        "Webhook deliveries received",
        &["provider", "outcome"]
    )
    .unwrap();
}

/// Record a provider request outcome
pub fn record_request(provider: Provider, operation: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    PROVIDER_REQUESTS_TOTAL
        .with_label_values(&[&provider.to_string(), operation, status])
        .inc();
}

/// Record a webhook delivery outcome
pub fn record_webhook(provider: Provider, outcome: &str) {
    WEBHOOKS_TOTAL
        .with_label_values(&[&provider.to_string(), outcome])
        .inc();
}
