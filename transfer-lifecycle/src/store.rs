//! Persistence boundary
//!
//! The lifecycle treats the hosted backend as a transactional store keyed
//! by id and reference. The one primitive that matters is `transition`:
//! an atomic conditional update that re-reads status at update time, so
//! two racing webhook deliveries cannot both apply the same transition.

use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use transfer_core::{
    Beneficiary, Notification, NotificationKind, NotificationStatus, PayoutDetails, Transfer,
    TransferQuote, TransferStatus,
};
use uuid::Uuid;

/// New transfer + beneficiary, persisted together at submission
#[derive(Debug, Clone)]
pub struct NewTransfer {
    /// Owning user
    pub user_id: Uuid,
    /// Unique correlation code
    pub reference: String,
    /// Calculator output the amounts are taken from
    pub quote: TransferQuote,
    /// Declared origin of funds
    pub funds_origin: Option<String>,
    /// Declared reason
    pub transfer_reason: Option<String>,
    /// Recipient
    pub beneficiary: NewBeneficiary,
}

/// Beneficiary payload
#[derive(Debug, Clone)]
pub struct NewBeneficiary {
    /// Recipient first name
    pub first_name: String,
    /// Recipient last name
    pub last_name: String,
    /// Recipient email
    pub email: Option<String>,
    /// Method-specific destination
    pub payout_details: PayoutDetails,
}

/// Field updates applied together with a status transition
#[derive(Debug, Clone, Default)]
pub struct TransitionUpdate {
    /// Provider payment id (set on pending → paid)
    pub payment_id: Option<String>,
    /// Payment confirmation time
    pub paid_at: Option<DateTime<Utc>>,
    /// Completion time
    pub validated_at: Option<DateTime<Utc>>,
}

/// Outcome of a conditional transition
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    /// Transition applied; the updated record
    Applied(Transfer),
    /// Precondition failed; nothing was written
    Conflict {
        /// Status found at update time
        current: TransferStatus,
    },
}

/// New notification record
#[derive(Debug, Clone)]
pub struct NewNotification {
    /// Category
    pub kind: NotificationKind,
    /// Transfer the notification is about
    pub transfer_id: Uuid,
    /// Recipient; `None` is an admin broadcast
    pub recipient_id: Option<Uuid>,
    /// Message body
    pub message: String,
}

/// Transfer persistence operations
#[async_trait]
pub trait TransferStore: Send + Sync {
    /// Persist a new transfer (status pending) and its beneficiary
    async fn create_transfer(&self, new: NewTransfer) -> Result<Transfer>;

    /// Look a transfer up by its unique reference
    async fn transfer_by_reference(&self, reference: &str) -> Result<Option<Transfer>>;

    /// The beneficiary owned by a transfer
    async fn beneficiary_of(&self, transfer_id: Uuid) -> Result<Option<Beneficiary>>;

    /// Conditionally move a transfer to `to` if its status, re-read at
    /// update time, is one of `expected`. Never mutates on conflict.
    async fn transition(
        &self,
        reference: &str,
        expected: &[TransferStatus],
        to: TransferStatus,
        update: TransitionUpdate,
    ) -> Result<TransitionOutcome>;

    /// Append a notification record
    async fn record_notification(&self, new: NewNotification) -> Result<Notification>;
}

fn build_transfer(new: &NewTransfer) -> Transfer {
    let q = &new.quote;
    Transfer {
        id: Uuid::new_v4(),
        reference: new.reference.clone(),
        user_id: new.user_id,
        direction: q.direction,
        amount_sent: q.amount_sent,
        amount_received: q.amount_received,
        fees: q.fees,
        kundapay_fees: q.kundapay_fees,
        withdrawal_fees: q.withdrawal_fees,
        sender_currency: q.sender_currency,
        receiver_currency: q.receiver_currency,
        payment_method: q.payment_method,
        receiving_method: q.receiving_method,
        funds_origin: new.funds_origin.clone(),
        transfer_reason: new.transfer_reason.clone(),
        status: TransferStatus::Pending,
        payment_id: None,
        created_at: Utc::now(),
        paid_at: None,
        validated_at: None,
    }
}

fn build_beneficiary(transfer_id: Uuid, new: &NewBeneficiary) -> Beneficiary {
    Beneficiary {
        id: Uuid::new_v4(),
        transfer_id,
        first_name: new.first_name.clone(),
        last_name: new.last_name.clone(),
        email: new.email.clone(),
        payout_details: new.payout_details.clone(),
    }
}

fn apply_update(transfer: &mut Transfer, to: TransferStatus, update: &TransitionUpdate) {
    transfer.status = to;
    if let Some(payment_id) = &update.payment_id {
        transfer.payment_id = Some(payment_id.clone());
    }
    if update.paid_at.is_some() {
        transfer.paid_at = update.paid_at;
    }
    if update.validated_at.is_some() {
        transfer.validated_at = update.validated_at;
    }
}

/// In-memory store used by tests and local runs
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    transfers: HashMap<String, Transfer>,
    beneficiaries: HashMap<Uuid, Beneficiary>,
    notifications: Vec<Notification>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all notifications, for assertions
    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.read().notifications.clone()
    }
}

#[async_trait]
impl TransferStore for MemoryStore {
    async fn create_transfer(&self, new: NewTransfer) -> Result<Transfer> {
        let transfer = build_transfer(&new);
        let beneficiary = build_beneficiary(transfer.id, &new.beneficiary);

        let mut inner = self.inner.write();
        if inner.transfers.contains_key(&transfer.reference) {
            return Err(Error::Store(format!(
                "duplicate reference {}",
                transfer.reference
            )));
        }
        inner
            .beneficiaries
            .insert(transfer.id, beneficiary);
        inner
            .transfers
            .insert(transfer.reference.clone(), transfer.clone());
        Ok(transfer)
    }

    async fn transfer_by_reference(&self, reference: &str) -> Result<Option<Transfer>> {
        Ok(self.inner.read().transfers.get(reference).cloned())
    }

    async fn beneficiary_of(&self, transfer_id: Uuid) -> Result<Option<Beneficiary>> {
        Ok(self.inner.read().beneficiaries.get(&transfer_id).cloned())
    }

    async fn transition(
        &self,
        reference: &str,
        expected: &[TransferStatus],
        to: TransferStatus,
        update: TransitionUpdate,
    ) -> Result<TransitionOutcome> {
        let mut inner = self.inner.write();
        let transfer = inner
            .transfers
            .get_mut(reference)
            .ok_or_else(|| Error::NotFound(reference.to_string()))?;

        if !expected.contains(&transfer.status) {
            return Ok(TransitionOutcome::Conflict {
                current: transfer.status,
            });
        }

        apply_update(transfer, to, &update);
        Ok(TransitionOutcome::Applied(transfer.clone()))
    }

    async fn record_notification(&self, new: NewNotification) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            kind: new.kind,
            transfer_id: new.transfer_id,
            recipient_id: new.recipient_id,
            message: new.message,
            status: NotificationStatus::Unread,
            created_at: Utc::now(),
        };
        self.inner
            .write()
            .notifications
            .push(notification.clone());
        Ok(notification)
    }
}

/// Hosted-store client (PostgREST-style REST API)
///
/// The conditional transition maps to a filtered `PATCH` that the backend
/// applies atomically; an empty result set means the precondition failed
/// and nothing was written.
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    /// Connect to a hosted backend
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn authed(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        rb.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn insert<T: serde::Serialize>(&self, table: &str, row: &T) -> Result<()> {
        let response = self
            .authed(self.client.post(format!("{}/{}", self.base_url, table)))
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!("insert into {table}: {status} {body}")));
        }
        Ok(())
    }
}

#[async_trait]
impl TransferStore for RestStore {
    async fn create_transfer(&self, new: NewTransfer) -> Result<Transfer> {
        let transfer = build_transfer(&new);
        let beneficiary = build_beneficiary(transfer.id, &new.beneficiary);

        self.insert("transfers", &transfer).await?;
        self.insert("beneficiaries", &beneficiary).await?;
        Ok(transfer)
    }

    async fn transfer_by_reference(&self, reference: &str) -> Result<Option<Transfer>> {
        let response = self
            .authed(self.client.get(format!("{}/transfers", self.base_url)))
            .query(&[("reference", format!("eq.{reference}"))])
            .send()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Store(format!("transfer lookup: {status}")));
        }

        let mut rows: Vec<Transfer> = response
            .json()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    async fn beneficiary_of(&self, transfer_id: Uuid) -> Result<Option<Beneficiary>> {
        let response = self
            .authed(self.client.get(format!("{}/beneficiaries", self.base_url)))
            .query(&[("transfer_id", format!("eq.{transfer_id}"))])
            .send()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Store(format!("beneficiary lookup: {status}")));
        }

        let mut rows: Vec<Beneficiary> = response
            .json()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    async fn transition(
        &self,
        reference: &str,
        expected: &[TransferStatus],
        to: TransferStatus,
        update: TransitionUpdate,
    ) -> Result<TransitionOutcome> {
        let statuses = expected
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let mut body = json!({ "status": to });
        if let Some(payment_id) = &update.payment_id {
            body["payment_id"] = json!(payment_id);
        }
        if let Some(paid_at) = &update.paid_at {
            body["paid_at"] = json!(paid_at);
        }
        if let Some(validated_at) = &update.validated_at {
            body["validated_at"] = json!(validated_at);
        }

        let response = self
            .authed(self.client.patch(format!("{}/transfers", self.base_url)))
            .query(&[
                ("reference", format!("eq.{reference}")),
                ("status", format!("in.({statuses})")),
            ])
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!("transition: {status} {text}")));
        }

        let rows: Vec<Transfer> = response
            .json()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        if let Some(updated) = rows.into_iter().next() {
            debug!(reference, %to, "Transition applied");
            return Ok(TransitionOutcome::Applied(updated));
        }

        // Nothing matched the filter: either the precondition failed or
        // the reference is unknown. Re-read to tell the two apart.
        match self.transfer_by_reference(reference).await? {
            Some(current) => Ok(TransitionOutcome::Conflict {
                current: current.status,
            }),
            None => Err(Error::NotFound(reference.to_string())),
        }
    }

    async fn record_notification(&self, new: NewNotification) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            kind: new.kind,
            transfer_id: new.transfer_id,
            recipient_id: new.recipient_id,
            message: new.message,
            status: NotificationStatus::Unread,
            created_at: Utc::now(),
        };
        self.insert("notifications", &notification).await?;
        Ok(notification)
    }
}
