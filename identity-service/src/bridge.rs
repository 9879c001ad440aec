//! The identity verification bridge
//!
//! Orchestrates applicant/check creation and webhook-driven status sync.
//! Idempotent per applicant: a verification attempt for an
//! already-verified user short-circuits without contacting the provider.

use crate::error::{Error, Result};
use crate::provider::IdentityProvider;
use crate::types::{ApplicantDetails, CheckResult, IdentityStatus, IdentityStore, UserIdentity};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Result of starting (or short-circuiting) a verification
#[derive(Debug, Clone)]
pub struct VerificationSession {
    /// Provider applicant id
    pub applicant_id: String,
    /// Check id, absent when the user was already verified
    pub check_id: Option<String>,
    /// Capture-SDK token, absent when the user was already verified
    pub sdk_token: Option<String>,
    /// True when the short-circuit fired
    pub already_verified: bool,
}

/// Result of a webhook delivery
#[derive(Debug, Clone)]
pub struct WebhookOutcome {
    /// User the check belonged to
    pub user_id: Uuid,
    /// Provider verdict
    pub result: CheckResult,
    /// Whether the user is now verified
    pub verified: bool,
}

/// Identity verification bridge
pub struct IdentityBridge {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn IdentityStore>,
    webhook_secret: String,
}

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    payload: WebhookPayload,
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    resource_type: String,
    action: String,
    object: WebhookObject,
}

#[derive(Debug, Deserialize)]
struct WebhookObject {
    id: String,
    #[serde(default)]
    result: Option<String>,
}

impl IdentityBridge {
    /// Create a bridge over a provider and a store
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn IdentityStore>,
        webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            store,
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Start a verification for a user, creating the applicant on first
    /// attempt and reusing it afterwards. Already-verified users get a
    /// success response without any provider call.
    pub async fn start_verification(
        &self,
        user_id: Uuid,
        details: &ApplicantDetails,
    ) -> Result<VerificationSession> {
        let existing = self.store.identity_of(user_id).await?;

        if let Some(identity) = &existing {
            if identity.verified {
                info!(%user_id, "User already verified, skipping provider");
                return Ok(VerificationSession {
                    applicant_id: identity.applicant_id.clone().unwrap_or_default(),
                    check_id: None,
                    sdk_token: None,
                    already_verified: true,
                });
            }
        }

        let mut identity = existing.unwrap_or_else(|| UserIdentity::new(user_id));

        let applicant_id = match identity.applicant_id.clone() {
            Some(id) => id,
            None => self.provider.create_applicant(details).await?,
        };
        let check_id = self.provider.create_check(&applicant_id).await?;
        let sdk_token = self.provider.sdk_token(&applicant_id).await?;

        identity.applicant_id = Some(applicant_id.clone());
        identity.check_id = Some(check_id.clone());
        identity.status = IdentityStatus::InProgress;
        self.store.save(&identity).await?;

        info!(%user_id, %applicant_id, %check_id, "Identity check started");
        Ok(VerificationSession {
            applicant_id,
            check_id: Some(check_id),
            sdk_token: Some(sdk_token),
            already_verified: false,
        })
    }

    /// Verify and apply a provider webhook.
    ///
    /// Authenticity is HMAC-SHA256 over the raw JSON body, compared in
    /// constant time; a mismatch changes no state. A `clear` result sets
    /// `verified` with a timestamp (terminal); anything else leaves the
    /// user unverified and queues a user-facing failure notice.
    pub async fn handle_webhook(
        &self,
        raw_body: &[u8],
        signature_hex: &str,
    ) -> Result<Option<WebhookOutcome>> {
        if !self.verify_signature(raw_body, signature_hex) {
            return Err(Error::InvalidSignature);
        }

        let envelope: WebhookEnvelope = serde_json::from_slice(raw_body)
            .map_err(|e| Error::Malformed(e.to_string()))?;
        let payload = envelope.payload;

        if payload.resource_type != "check" || payload.action != "check.completed" {
            return Ok(None);
        }

        let check_id = payload.object.id;
        let mut identity = self
            .store
            .identity_by_check(&check_id)
            .await?
            .ok_or_else(|| Error::UnknownCheck(check_id.clone()))?;

        let result = CheckResult::from_wire(payload.object.result.as_deref().unwrap_or(""));
        let verified = result == CheckResult::Clear;

        identity.status = IdentityStatus::Complete;
        identity.result = Some(result.clone());
        identity.verified = verified;
        identity.verified_at = Some(Utc::now());
        self.store.save(&identity).await?;

        if verified {
            info!(user_id = %identity.user_id, %check_id, "Identity verified");
        } else {
            warn!(user_id = %identity.user_id, %check_id, ?result, "Identity check not clear");
            // Best-effort notice, never fails the webhook
            if let Err(e) = self
                .store
                .record_failure_notice(
                    identity.user_id,
                    "Identity verification was unsuccessful, please contact support",
                )
                .await
            {
                warn!(user_id = %identity.user_id, error = %e, "Failure notice write failed");
            }
        }

        Ok(Some(WebhookOutcome {
            user_id: identity.user_id,
            result,
            verified,
        }))
    }

    fn verify_signature(&self, raw_body: &[u8], signature_hex: &str) -> bool {
        let Ok(signature) = hex::decode(signature_hex.trim()) else {
            return false;
        };
        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(raw_body);
        mac.verify_slice(&signature).is_ok()
    }
}
