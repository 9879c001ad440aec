//! Stripe connector (card collection)
//!
//! Creates PaymentIntents carrying the transfer reference in metadata and
//! verifies `Stripe-Signature` webhook headers (HMAC-SHA256 over
//! `"{t}.{body}"`, with a delivery-timestamp tolerance window).

use crate::{
    connector::PaymentConnector, error::{Error, Result}, metrics, signature, types::*,
    DEFAULT_REQUEST_TIMEOUT_SECONDS, DEFAULT_WEBHOOK_TOLERANCE_SECONDS,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

/// Stripe adapter configuration
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_...`)
    pub api_key: String,
    /// Webhook signing secret (`whsec_...`)
    pub webhook_secret: String,
    /// API base URL
    pub api_base: String,
    /// Request timeout
    pub timeout_seconds: u64,
    /// Max accepted webhook delivery age
    pub webhook_tolerance_seconds: i64,
}

impl StripeConfig {
    /// Production endpoint configuration
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            webhook_secret: webhook_secret.into(),
            api_base: "https://api.stripe.com".to_string(),
            timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
            webhook_tolerance_seconds: DEFAULT_WEBHOOK_TOLERANCE_SECONDS,
        }
    }
}

/// Stripe connector
pub struct StripeConnector {
    config: StripeConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Event {
    #[serde(rename = "type")]
    event_type: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: IntentObject,
}

#[derive(Debug, Deserialize)]
struct IntentObject {
    id: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
    #[serde(default)]
    last_payment_error: Option<PaymentError>,
}

#[derive(Debug, Deserialize)]
struct PaymentError {
    message: Option<String>,
}

impl StripeConnector {
    /// Create a new Stripe connector
    pub fn new(config: StripeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Split a `Stripe-Signature` header into timestamp and v1 signatures
    fn parse_signature_header(header: &str) -> Option<(i64, Vec<&str>)> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", t)) => timestamp = t.parse().ok(),
                Some(("v1", sig)) => signatures.push(sig),
                _ => {}
            }
        }
        match (timestamp, signatures.is_empty()) {
            (Some(t), false) => Some((t, signatures)),
            _ => None,
        }
    }
}

#[async_trait]
impl PaymentConnector for StripeConnector {
    fn provider(&self) -> Provider {
        Provider::Stripe
    }

    async fn create_collection(&self, request: &CollectionRequest) -> Result<CollectionSession> {
        info!(reference = %request.reference, "Creating Stripe payment intent");

        let amount = to_minor_units(request.amount, request.currency)?;
        let mut form = vec![
            ("amount".to_string(), amount.to_string()),
            ("currency".to_string(), request.currency.code().to_lowercase()),
            ("metadata[reference]".to_string(), request.reference.clone()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        for (key, value) in &request.metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            // Stripe dedupes retried creations on this key
            .header("Idempotency-Key", &request.reference)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                Error::from_request(e, "stripe payment_intents", self.config.timeout_seconds)
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            metrics::record_request(Provider::Stripe, "create_collection", false);
            return Err(Error::Provider {
                provider: Provider::Stripe.to_string(),
                status_code: status.as_u16(),
                message,
            });
        }

        let intent: IntentResponse = response
            .json()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        metrics::record_request(Provider::Stripe, "create_collection", true);

        Ok(CollectionSession {
            provider: Provider::Stripe,
            session_id: intent.id,
            client_secret: intent.client_secret,
            redirect_url: None,
        })
    }

    fn parse_webhook(
        &self,
        raw_body: &[u8],
        signature_header: &str,
    ) -> Result<Option<PaymentEvent>> {
        let (timestamp, signatures) = Self::parse_signature_header(signature_header)
            .ok_or_else(|| Error::InvalidSignature(Provider::Stripe.to_string()))?;

        let age = (Utc::now().timestamp() - timestamp).abs();
        if age > self.config.webhook_tolerance_seconds {
            return Err(Error::InvalidSignature(Provider::Stripe.to_string()));
        }

        let mut signed_payload = timestamp.to_string().into_bytes();
        signed_payload.push(b'.');
        signed_payload.extend_from_slice(raw_body);

        let verified = signatures.iter().any(|sig| {
            signature::verify(self.config.webhook_secret.as_bytes(), &signed_payload, sig)
        });
        if !verified {
            return Err(Error::InvalidSignature(Provider::Stripe.to_string()));
        }

        let event: Event = serde_json::from_slice(raw_body)?;
        let object = event.data.object;

        // Intents without a transfer reference belong to other products
        let Some(reference) = object.metadata.get("reference").cloned() else {
            return Ok(None);
        };

        let kind = match event.event_type.as_str() {
            "payment_intent.succeeded" => PaymentEventKind::Succeeded {
                payment_id: object.id,
            },
            "payment_intent.payment_failed" => PaymentEventKind::Failed {
                reason: object
                    .last_payment_error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "payment failed".to_string()),
            },
            _ => return Ok(None),
        };

        Ok(Some(PaymentEvent {
            provider: Provider::Stripe,
            reference,
            kind,
        }))
    }
}
