//! Prometheus metrics for the gateway

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_with_registry, Counter, CounterVec, Encoder, Histogram, Registry,
    TextEncoder,
};

/// Global metrics handle
pub static METRICS: Lazy<Metrics> = Lazy::new(|| Metrics::new().expect("metrics registration"));

/// Gateway metrics
pub struct Metrics {
    /// Registry backing the /metrics endpoint
    pub registry: Registry,

    /// Quotes served
    pub quotes_total: Counter,

    /// Transfers submitted
    pub transfers_submitted_total: Counter,

    /// Webhook deliveries by provider and outcome
    pub webhooks_total: CounterVec,

    /// Payout executions by outcome
    pub payouts_total: CounterVec,

    /// Request handling latency
    pub request_duration_seconds: Histogram,
}

impl Metrics {
    fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let quotes_total = register_counter_with_registry!(
            "kundapay_quotes_total",
            "Quotes computed",
            registry
        )?;

        let transfers_submitted_total = register_counter_with_registry!(
            "kundapay_transfers_submitted_total",
            "Transfers submitted",
            registry
        )?;

        let webhooks_total = register_counter_vec_with_registry!(
            "kundapay_webhooks_total",
            "Webhook deliveries",
            &["provider", "outcome"],
            registry
        )?;

        let payouts_total = register_counter_vec_with_registry!(
            "kundapay_payouts_total",
            "Payout executions",
            &["outcome"],
            registry
        )?;

        let request_duration_seconds = register_histogram_with_registry!(
            "kundapay_request_duration_seconds",
            "HTTP request duration in seconds",
            registry
        )?;

        Ok(Self {
            registry,
            quotes_total,
            transfers_submitted_total,
            webhooks_total,
            payouts_total,
            request_duration_seconds,
        })
    }

    /// Export in Prometheus text format
    pub fn export(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
