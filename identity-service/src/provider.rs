//! Verification provider client

use crate::error::{Error, Result};
use crate::types::ApplicantDetails;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::info;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// External KYC provider operations
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register an applicant, returning the provider applicant id
    async fn create_applicant(&self, details: &ApplicantDetails) -> Result<String>;

    /// Start a document + facial-similarity check for an applicant
    async fn create_check(&self, applicant_id: &str) -> Result<String>;

    /// Short-lived token for the provider's capture SDK
    async fn sdk_token(&self, applicant_id: &str) -> Result<String>;
}

/// Onfido REST client
pub struct OnfidoClient {
    client: Client,
    api_base: String,
    api_token: String,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

impl OnfidoClient {
    /// Client against the EU API region
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        Self::with_base("https://api.eu.onfido.com/v3.6", api_token)
    }

    /// Client against an explicit base URL
    pub fn with_base(api_base: impl Into<String>, api_token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(Self {
            client,
            api_base: api_base.into(),
            api_token: api_token.into(),
        })
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}{}", self.api_base, path))
            .header("Authorization", format!("Token token={}", self.api_token))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Provider {
                status_code: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl IdentityProvider for OnfidoClient {
    async fn create_applicant(&self, details: &ApplicantDetails) -> Result<String> {
        info!("Creating identity applicant");
        let response = self
            .post(
                "/applicants",
                json!({
                    "first_name": details.first_name,
                    "last_name": details.last_name,
                    "email": details.email,
                }),
            )
            .await?;

        let body: IdResponse = response
            .json()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(body.id)
    }

    async fn create_check(&self, applicant_id: &str) -> Result<String> {
        info!(applicant_id, "Creating identity check");
        let response = self
            .post(
                "/checks",
                json!({
                    "applicant_id": applicant_id,
                    "report_names": ["document", "facial_similarity_photo"],
                }),
            )
            .await?;

        let body: IdResponse = response
            .json()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(body.id)
    }

    async fn sdk_token(&self, applicant_id: &str) -> Result<String> {
        let response = self
            .post("/sdk_token", json!({ "applicant_id": applicant_id }))
            .await?;

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(body.token)
    }
}
