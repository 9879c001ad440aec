//! Checkout.com connector (hosted payment collection)
//!
//! Creates hosted-payment sessions and verifies `Cko-Signature` webhook
//! headers (HMAC-SHA256 hex over the raw body).

use crate::{
    connector::PaymentConnector, error::{Error, Result}, metrics, signature, types::*,
    DEFAULT_REQUEST_TIMEOUT_SECONDS,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::info;

/// Checkout.com adapter configuration
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Secret API key
    pub secret_key: String,
    /// Webhook signature key
    pub webhook_secret: String,
    /// API base URL
    pub api_base: String,
    /// URL the payer returns to on success
    pub success_url: String,
    /// URL the payer returns to on failure
    pub failure_url: String,
    /// Request timeout
    pub timeout_seconds: u64,
}

impl CheckoutConfig {
    /// Production endpoint configuration
    pub fn new(
        secret_key: impl Into<String>,
        webhook_secret: impl Into<String>,
        success_url: impl Into<String>,
        failure_url: impl Into<String>,
    ) -> Self {
        Self {
            secret_key: secret_key.into(),
            webhook_secret: webhook_secret.into(),
            api_base: "https://api.checkout.com".to_string(),
            success_url: success_url.into(),
            failure_url: failure_url.into(),
            timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }
}

/// Checkout.com connector
pub struct CheckoutConnector {
    config: CheckoutConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct HostedPaymentResponse {
    id: String,
    #[serde(rename = "_links")]
    links: Links,
}

#[derive(Debug, Deserialize)]
struct Links {
    redirect: Link,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

#[derive(Debug, Deserialize)]
struct Event {
    #[serde(rename = "type")]
    event_type: String,
    data: EventPayment,
}

#[derive(Debug, Deserialize)]
struct EventPayment {
    id: String,
    reference: Option<String>,
    response_summary: Option<String>,
}

impl CheckoutConnector {
    /// Create a new Checkout.com connector
    pub fn new(config: CheckoutConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl PaymentConnector for CheckoutConnector {
    fn provider(&self) -> Provider {
        Provider::Checkout
    }

    async fn create_collection(&self, request: &CollectionRequest) -> Result<CollectionSession> {
        info!(reference = %request.reference, "Creating Checkout.com hosted payment");

        let amount = to_minor_units(request.amount, request.currency)?;
        let body = json!({
            "amount": amount,
            "currency": request.currency.code(),
            "reference": request.reference,
            "success_url": self.config.success_url,
            "failure_url": self.config.failure_url,
            "metadata": request.metadata,
        });

        let response = self
            .client
            .post(format!("{}/hosted-payments", self.config.api_base))
            .bearer_auth(&self.config.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                Error::from_request(e, "checkout hosted-payments", self.config.timeout_seconds)
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            metrics::record_request(Provider::Checkout, "create_collection", false);
            return Err(Error::Provider {
                provider: Provider::Checkout.to_string(),
                status_code: status.as_u16(),
                message,
            });
        }

        let session: HostedPaymentResponse = response
            .json()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        metrics::record_request(Provider::Checkout, "create_collection", true);

        Ok(CollectionSession {
            provider: Provider::Checkout,
            session_id: session.id,
            client_secret: None,
            redirect_url: Some(session.links.redirect.href),
        })
    }

    fn parse_webhook(
        &self,
        raw_body: &[u8],
        signature_header: &str,
    ) -> Result<Option<PaymentEvent>> {
        if !signature::verify(
            self.config.webhook_secret.as_bytes(),
            raw_body,
            signature_header,
        ) {
            return Err(Error::InvalidSignature(Provider::Checkout.to_string()));
        }

        let event: Event = serde_json::from_slice(raw_body)?;

        let Some(reference) = event.data.reference else {
            return Ok(None);
        };

        let kind = match event.event_type.as_str() {
            "payment_captured" => PaymentEventKind::Succeeded {
                payment_id: event.data.id,
            },
            "payment_declined" => PaymentEventKind::Failed {
                reason: event
                    .data
                    .response_summary
                    .unwrap_or_else(|| "payment declined".to_string()),
            },
            _ => return Ok(None),
        };

        Ok(Some(PaymentEvent {
            provider: Provider::Checkout,
            reference,
            kind,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector() -> CheckoutConnector {
        CheckoutConnector::new(CheckoutConfig::new(
            "sk_test",
            "cko_whsec",
            "https://kundapay.example/success",
            "https://kundapay.example/failure",
        ))
        .unwrap()
    }

    #[test]
    fn test_captured_event_normalizes() {
        let c = connector();
        let body = serde_json::json!({
            "type": "payment_captured",
            "data": { "id": "pay_1", "reference": "KP-AABBCCDDEEFF-42" }
        })
        .to_string()
        .into_bytes();
        let header = signature::sign(b"cko_whsec", &body);

        let event = c.parse_webhook(&body, &header).unwrap().unwrap();
        assert_eq!(event.provider, Provider::Checkout);
        assert_eq!(
            event.kind,
            PaymentEventKind::Succeeded { payment_id: "pay_1".to_string() }
        );
    }

    #[test]
    fn test_declined_event_normalizes() {
        let c = connector();
        let body = serde_json::json!({
            "type": "payment_declined",
            "data": {
                "id": "pay_2",
                "reference": "KP-AABBCCDDEEFF-42",
                "response_summary": "Insufficient Funds"
            }
        })
        .to_string()
        .into_bytes();
        let header = signature::sign(b"cko_whsec", &body);

        let event = c.parse_webhook(&body, &header).unwrap().unwrap();
        assert_eq!(
            event.kind,
            PaymentEventKind::Failed { reason: "Insufficient Funds".to_string() }
        );
    }

    #[test]
    fn test_bad_signature_rejected() {
        let c = connector();
        let body = b"{}".to_vec();
        let err = c.parse_webhook(&body, "deadbeef").unwrap_err();
        assert!(matches!(err, Error::InvalidSignature(_)));
    }

    #[test]
    fn test_event_without_reference_ignored() {
        let c = connector();
        let body = serde_json::json!({
            "type": "payment_captured",
            "data": { "id": "pay_3" }
        })
        .to_string()
        .into_bytes();
        let header = signature::sign(b"cko_whsec", &body);

        assert!(c.parse_webhook(&body, &header).unwrap().is_none());
    }
}
