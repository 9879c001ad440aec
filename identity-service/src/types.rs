//! Identity verification types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::Result;

/// Verification lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStatus {
    /// No verification attempt yet
    Unstarted,
    /// Check created, awaiting the provider's verdict
    InProgress,
    /// Webhook delivered a verdict (terminal)
    Complete,
}

/// Provider verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckResult {
    /// Documents verified, identity confirmed
    Clear,
    /// Needs human review
    Consider,
    /// Anything else the provider reports
    Other(String),
}

impl CheckResult {
    /// Parse a provider result string
    pub fn from_wire(s: &str) -> Self {
        match s {
            "clear" => CheckResult::Clear,
            "consider" => CheckResult::Consider,
            other => CheckResult::Other(other.to_string()),
        }
    }
}

/// Identity verification state carried on a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    /// User the identity belongs to
    pub user_id: Uuid,

    /// Provider applicant id, set on first attempt
    pub applicant_id: Option<String>,

    /// Provider check id of the latest check
    pub check_id: Option<String>,

    /// Verification status
    pub status: IdentityStatus,

    /// Latest verdict
    pub result: Option<CheckResult>,

    /// True once a `clear` verdict landed (terminal)
    pub verified: bool,

    /// When verification completed
    pub verified_at: Option<DateTime<Utc>>,
}

impl UserIdentity {
    /// Fresh, unverified identity
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            applicant_id: None,
            check_id: None,
            status: IdentityStatus::Unstarted,
            result: None,
            verified: false,
            verified_at: None,
        }
    }
}

/// Applicant details sent to the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantDetails {
    /// Legal first name
    pub first_name: String,
    /// Legal last name
    pub last_name: String,
    /// Contact email
    pub email: Option<String>,
}

/// Identity persistence operations
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Identity state for a user
    async fn identity_of(&self, user_id: Uuid) -> Result<Option<UserIdentity>>;

    /// Find the identity a check belongs to (webhooks only know the check)
    async fn identity_by_check(&self, check_id: &str) -> Result<Option<UserIdentity>>;

    /// Upsert identity state
    async fn save(&self, identity: &UserIdentity) -> Result<()>;

    /// Best-effort user-facing failure notice; callers swallow errors
    async fn record_failure_notice(&self, user_id: Uuid, message: &str) -> Result<()>;
}

/// In-memory identity store for tests and local runs
#[derive(Default)]
pub struct MemoryIdentityStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    identities: HashMap<Uuid, UserIdentity>,
    notices: Vec<(Uuid, String)>,
}

impl MemoryIdentityStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded failure notices, for assertions
    pub fn notices(&self) -> Vec<(Uuid, String)> {
        self.inner.read().notices.clone()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn identity_of(&self, user_id: Uuid) -> Result<Option<UserIdentity>> {
        Ok(self.inner.read().identities.get(&user_id).cloned())
    }

    async fn identity_by_check(&self, check_id: &str) -> Result<Option<UserIdentity>> {
        Ok(self
            .inner
            .read()
            .identities
            .values()
            .find(|i| i.check_id.as_deref() == Some(check_id))
            .cloned())
    }

    async fn save(&self, identity: &UserIdentity) -> Result<()> {
        self.inner
            .write()
            .identities
            .insert(identity.user_id, identity.clone());
        Ok(())
    }

    async fn record_failure_notice(&self, user_id: Uuid, message: &str) -> Result<()> {
        self.inner
            .write()
            .notices
            .push((user_id, message.to_string()));
        Ok(())
    }
}
