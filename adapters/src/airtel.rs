//! Airtel Money connector (mobile-money payout)
//!
//! OAuth client-credentials token (cached until shortly before expiry),
//! then disbursement calls against the Airtel Money API. MSISDNs cross
//! the wire without the leading trunk zero.

use crate::{
    connector::PayoutConnector, error::{Error, Result}, metrics, types::*,
    DEFAULT_REQUEST_TIMEOUT_SECONDS,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};
use transfer_core::PayoutDetails;

/// Airtel Money adapter configuration
#[derive(Debug, Clone)]
pub struct AirtelConfig {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// API base URL
    pub api_base: String,
    /// ISO country the disbursement wallet lives in
    pub country: String,
    /// Wallet currency code
    pub currency: String,
    /// Request timeout
    pub timeout_seconds: u64,
}

impl AirtelConfig {
    /// Gabon production wallet configuration
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_base: "https://openapi.airtel.africa".to_string(),
            country: "GA".to_string(),
            currency: "XAF".to_string(),
            timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Airtel Money connector
pub struct AirtelConnector {
    config: AirtelConfig,
    client: Client,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct DisbursementResponse {
    #[serde(default)]
    data: Option<DisbursementData>,
    status: DisbursementStatus,
}

#[derive(Debug, Deserialize)]
struct DisbursementData {
    transaction: Option<DisbursementTransaction>,
}

#[derive(Debug, Deserialize)]
struct DisbursementTransaction {
    id: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DisbursementStatus {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

impl AirtelConnector {
    /// Create a new Airtel Money connector
    pub fn new(config: AirtelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Connection(e.to_string()))?;

        Ok(Self {
            config,
            client,
            token: Mutex::new(None),
        })
    }

    /// Fetch or reuse the OAuth access token
    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;

        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Utc::now() {
                return Ok(cached.access_token.clone());
            }
        }

        let response = self
            .client
            .post(format!("{}/auth/oauth2/token", self.config.api_base))
            .json(&json!({
                "client_id": self.config.client_id,
                "client_secret": self.config.client_secret,
                "grant_type": "client_credentials",
            }))
            .send()
            .await
            .map_err(|e| Error::from_request(e, "airtel oauth", self.config.timeout_seconds))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Provider {
                provider: Provider::AirtelMoney.to_string(),
                status_code: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        // Refresh a minute early so an expiring token never rides a payout
        let expires_at = Utc::now() + ChronoDuration::seconds((token.expires_in - 60).max(0));
        *guard = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });

        Ok(token.access_token)
    }

    /// Local MSISDN without the leading trunk zero, as the API expects
    fn wire_msisdn(destination: &PayoutDetails) -> Result<String> {
        match destination {
            PayoutDetails::Phone { msisdn, .. } => {
                Ok(msisdn.strip_prefix('0').unwrap_or(msisdn).to_string())
            }
            other => Err(Error::Destination(format!(
                "airtel payout requires a phone destination, got {other:?}"
            ))),
        }
    }
}

#[async_trait]
impl PayoutConnector for AirtelConnector {
    fn name(&self) -> &str {
        "airtel_money"
    }

    async fn send_payout(&self, request: &PayoutRequest) -> Result<PayoutResponse> {
        let msisdn = Self::wire_msisdn(&request.destination)?;
        let amount = to_minor_units(request.amount, request.currency)?;
        let token = self.access_token().await?;

        info!(reference = %request.reference, "Sending Airtel Money disbursement");

        let body = json!({
            "payee": { "msisdn": msisdn },
            "reference": request.reference,
            "transaction": { "amount": amount, "id": request.reference },
        });

        let response = self
            .client
            .post(format!("{}/standards/v1/disbursements", self.config.api_base))
            .bearer_auth(token)
            .header("X-Country", &self.config.country)
            .header("X-Currency", &self.config.currency)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                Error::from_request(e, "airtel disbursement", self.config.timeout_seconds)
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            metrics::record_request(Provider::AirtelMoney, "send_payout", false);
            warn!(reference = %request.reference, %status, "Airtel disbursement rejected");
            return Err(Error::Provider {
                provider: Provider::AirtelMoney.to_string(),
                status_code: status.as_u16(),
                message,
            });
        }

        let parsed: DisbursementResponse = response
            .json()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        metrics::record_request(Provider::AirtelMoney, "send_payout", parsed.status.success);

        let transaction = parsed.data.and_then(|d| d.transaction);
        let payout_status = if parsed.status.success {
            match transaction.as_ref().and_then(|t| t.status.as_deref()) {
                Some("TS") | Some("SUCCESS") => PayoutStatus::Completed,
                _ => PayoutStatus::Accepted,
            }
        } else {
            PayoutStatus::Failed
        };

        Ok(PayoutResponse {
            reference: request.reference.clone(),
            status: payout_status,
            provider_transaction_id: transaction.and_then(|t| t.id),
            message: parsed.status.message,
        })
    }

    async fn check_status(&self, reference: &str) -> Result<PayoutStatus> {
        let token = self.access_token().await?;

        let response = self
            .client
            .get(format!(
                "{}/standards/v1/disbursements/{reference}",
                self.config.api_base
            ))
            .bearer_auth(token)
            .header("X-Country", &self.config.country)
            .header("X-Currency", &self.config.currency)
            .send()
            .await
            .map_err(|e| Error::from_request(e, "airtel status", self.config.timeout_seconds))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Provider {
                provider: Provider::AirtelMoney.to_string(),
                status_code: status.as_u16(),
                message,
            });
        }

        let parsed: DisbursementResponse = response
            .json()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let wire_status = parsed
            .data
            .and_then(|d| d.transaction)
            .and_then(|t| t.status);
        Ok(match wire_status.as_deref() {
            Some("TS") | Some("SUCCESS") => PayoutStatus::Completed,
            Some("TF") | Some("FAILED") => PayoutStatus::Failed,
            _ => PayoutStatus::Accepted,
        })
    }
}
