//! Lifecycle engine
//!
//! One implementation of the transfer state machine consumed by every
//! transport entry point (HTTP handlers, webhook processors), so the
//! transition rules cannot drift between deployment targets.

use crate::error::{Error, Result};
use crate::notification;
use crate::store::{NewBeneficiary, NewTransfer, TransferStore, TransitionOutcome, TransitionUpdate};
use adapters::{PaymentEvent, PaymentEventKind, PayoutConnector, PayoutRequest, PayoutStatus};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use transfer_core::{
    beneficiary::validate_payout_details, Direction, NotificationKind, PaymentMethod,
    ReceivingMethod, Transfer, TransferCalculator, TransferReference, TransferStatus,
};
use uuid::Uuid;

/// Transfer submission request
#[derive(Debug, Clone)]
pub struct SubmitTransfer {
    /// Sender
    pub user_id: Uuid,
    /// Amount entered by the user
    pub amount: Decimal,
    /// Corridor
    pub direction: Direction,
    /// Funding method
    pub payment_method: PaymentMethod,
    /// Delivery method
    pub receiving_method: ReceivingMethod,
    /// True when `amount` is the desired received amount
    pub is_receive_amount: bool,
    /// Declared origin of funds
    pub funds_origin: Option<String>,
    /// Declared reason
    pub transfer_reason: Option<String>,
    /// Recipient
    pub beneficiary: NewBeneficiary,
}

/// Outcome of a webhook-driven or admin transition
#[derive(Debug, Clone)]
pub enum TransitionReport {
    /// Transition applied
    Applied(Transfer),
    /// The transfer was already past this transition; nothing was done.
    /// Webhook deliveries are retried by providers, so this is a normal
    /// outcome, not an error.
    AlreadyApplied {
        /// Status found at update time
        current: TransferStatus,
    },
}

/// Outcome of a payout execution
#[derive(Debug, Clone)]
pub enum PayoutReport {
    /// Funds delivered; transfer completed
    Completed(Transfer),
    /// Guard rejected the execution: the transfer has already left
    /// `pending`. The provider was not contacted.
    Rejected {
        /// Status found before execution
        current: TransferStatus,
    },
}

/// The transfer lifecycle engine
pub struct LifecycleEngine {
    store: Arc<dyn TransferStore>,
    calculator: TransferCalculator,
}

impl LifecycleEngine {
    /// Create an engine over a store and pricing calculator
    pub fn new(store: Arc<dyn TransferStore>, calculator: TransferCalculator) -> Self {
        Self { store, calculator }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn TransferStore> {
        &self.store
    }

    /// The pricing calculator
    pub fn calculator(&self) -> &TransferCalculator {
        &self.calculator
    }

    /// Submit a transfer: price it, validate the payout destination, and
    /// persist it as `pending` together with its beneficiary.
    ///
    /// Amounts are always re-derived through the calculator here, so
    /// `amount_received` can never be set independently of `amount_sent`.
    pub async fn submit(&self, request: SubmitTransfer) -> Result<Transfer> {
        let quote = self.calculator.calculate(
            request.amount,
            request.direction,
            request.payment_method,
            request.receiving_method,
            request.is_receive_amount,
        )?;

        validate_payout_details(request.receiving_method, &request.beneficiary.payout_details)?;

        let reference = TransferReference::generate();
        let transfer = self
            .store
            .create_transfer(NewTransfer {
                user_id: request.user_id,
                reference: reference.into(),
                quote,
                funds_origin: request.funds_origin,
                transfer_reason: request.transfer_reason,
                beneficiary: request.beneficiary,
            })
            .await?;

        info!(
            reference = %transfer.reference,
            direction = %transfer.direction,
            amount_sent = %transfer.amount_sent,
            "Transfer submitted"
        );
        Ok(transfer)
    }

    /// Apply a verified provider webhook event.
    ///
    /// Success moves `pending → paid` (recording `payment_id` and
    /// `paid_at`); failure moves `pending|paid → failed`. Replayed
    /// deliveries observe the CAS conflict and report `AlreadyApplied`.
    pub async fn apply_payment_event(&self, event: &PaymentEvent) -> Result<TransitionReport> {
        // Unknown references 404 before any transition is attempted
        if self
            .store
            .transfer_by_reference(&event.reference)
            .await?
            .is_none()
        {
            return Err(Error::NotFound(event.reference.clone()));
        }

        match &event.kind {
            PaymentEventKind::Succeeded { payment_id } => {
                let outcome = self
                    .store
                    .transition(
                        &event.reference,
                        &[TransferStatus::Pending],
                        TransferStatus::Paid,
                        TransitionUpdate {
                            payment_id: Some(payment_id.clone()),
                            paid_at: Some(Utc::now()),
                            ..Default::default()
                        },
                    )
                    .await?;

                match outcome {
                    TransitionOutcome::Applied(updated) => {
                        info!(reference = %updated.reference, provider = %event.provider, "Payment confirmed");
                        notification::emit(
                            self.store.as_ref(),
                            NotificationKind::PaymentReceived,
                            &updated,
                        )
                        .await;
                        Ok(TransitionReport::Applied(updated))
                    }
                    TransitionOutcome::Conflict { current }
                        if matches!(
                            current,
                            TransferStatus::Paid | TransferStatus::Completed
                        ) =>
                    {
                        info!(reference = %event.reference, %current, "Replayed payment webhook, no-op");
                        Ok(TransitionReport::AlreadyApplied { current })
                    }
                    TransitionOutcome::Conflict { current } => Err(Error::InvalidTransition {
                        reference: event.reference.clone(),
                        current,
                        attempted: TransferStatus::Paid,
                    }),
                }
            }
            PaymentEventKind::Failed { reason } => {
                warn!(reference = %event.reference, %reason, "Payment failed");
                let outcome = self
                    .store
                    .transition(
                        &event.reference,
                        &[TransferStatus::Pending, TransferStatus::Paid],
                        TransferStatus::Failed,
                        TransitionUpdate::default(),
                    )
                    .await?;

                match outcome {
                    TransitionOutcome::Applied(updated) => {
                        notification::emit(
                            self.store.as_ref(),
                            NotificationKind::TransferFailed,
                            &updated,
                        )
                        .await;
                        Ok(TransitionReport::Applied(updated))
                    }
                    TransitionOutcome::Conflict {
                        current: TransferStatus::Failed,
                    } => Ok(TransitionReport::AlreadyApplied {
                        current: TransferStatus::Failed,
                    }),
                    TransitionOutcome::Conflict { current } => Err(Error::InvalidTransition {
                        reference: event.reference.clone(),
                        current,
                        attempted: TransferStatus::Failed,
                    }),
                }
            }
        }
    }

    /// Execute the automated mobile-money payout for a pending transfer.
    ///
    /// Double invocation is a no-op once the status has left `pending`:
    /// the guard re-checks before any provider contact. The destination
    /// is re-validated so a malformed number can never reach the
    /// provider. A provider failure is compensated by forcing the
    /// transfer to `failed` (funds may already be in flight, so this is
    /// not a rollback); a timeout leaves the status untouched.
    pub async fn execute_payout(
        &self,
        reference: &str,
        connector: &dyn PayoutConnector,
    ) -> Result<PayoutReport> {
        let transfer = self
            .store
            .transfer_by_reference(reference)
            .await?
            .ok_or_else(|| Error::NotFound(reference.to_string()))?;

        if transfer.status != TransferStatus::Pending {
            info!(reference, current = %transfer.status, "Payout rejected by status guard");
            return Ok(PayoutReport::Rejected {
                current: transfer.status,
            });
        }

        let beneficiary = self
            .store
            .beneficiary_of(transfer.id)
            .await?
            .ok_or_else(|| Error::Store(format!("beneficiary missing for {reference}")))?;

        validate_payout_details(transfer.receiving_method, &beneficiary.payout_details)?;

        let request = PayoutRequest {
            reference: reference.to_string(),
            amount: transfer.amount_received,
            currency: transfer.receiver_currency,
            destination: beneficiary.payout_details.clone(),
        };

        match connector.send_payout(&request).await {
            Ok(response) if response.status != PayoutStatus::Failed => {
                let outcome = self
                    .store
                    .transition(
                        reference,
                        &[TransferStatus::Pending],
                        TransferStatus::Completed,
                        TransitionUpdate {
                            validated_at: Some(Utc::now()),
                            ..Default::default()
                        },
                    )
                    .await?;

                match outcome {
                    TransitionOutcome::Applied(updated) => {
                        info!(reference, connector = connector.name(), "Payout completed");
                        notification::emit(
                            self.store.as_ref(),
                            NotificationKind::TransferCompleted,
                            &updated,
                        )
                        .await;
                        Ok(PayoutReport::Completed(updated))
                    }
                    // A concurrent execution won the CAS
                    TransitionOutcome::Conflict { current } => {
                        Ok(PayoutReport::Rejected { current })
                    }
                }
            }
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "payout rejected by provider".to_string());
                self.fail_after_payout_error(reference, message).await
            }
            Err(e) if e.is_ambiguous() => {
                warn!(reference, error = %e, "Payout outcome ambiguous, leaving status untouched");
                Err(Error::Ambiguous {
                    reference: reference.to_string(),
                })
            }
            Err(e) => self.fail_after_payout_error(reference, e.to_string()).await,
        }
    }

    /// Manual admin completion (`pending → completed`)
    pub async fn complete(&self, reference: &str) -> Result<TransitionReport> {
        let outcome = self
            .store
            .transition(
                reference,
                &[TransferStatus::Pending],
                TransferStatus::Completed,
                TransitionUpdate {
                    validated_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        match outcome {
            TransitionOutcome::Applied(updated) => {
                info!(reference, "Transfer completed by operator");
                notification::emit(
                    self.store.as_ref(),
                    NotificationKind::TransferCompleted,
                    &updated,
                )
                .await;
                Ok(TransitionReport::Applied(updated))
            }
            TransitionOutcome::Conflict {
                current: TransferStatus::Completed,
            } => Ok(TransitionReport::AlreadyApplied {
                current: TransferStatus::Completed,
            }),
            TransitionOutcome::Conflict { current } => Err(Error::InvalidTransition {
                reference: reference.to_string(),
                current,
                attempted: TransferStatus::Completed,
            }),
        }
    }

    /// Manual admin cancellation (`pending → cancelled`, no notification)
    pub async fn cancel(&self, reference: &str) -> Result<TransitionReport> {
        let outcome = self
            .store
            .transition(
                reference,
                &[TransferStatus::Pending],
                TransferStatus::Cancelled,
                TransitionUpdate::default(),
            )
            .await?;

        match outcome {
            TransitionOutcome::Applied(updated) => {
                info!(reference, "Transfer cancelled by operator");
                Ok(TransitionReport::Applied(updated))
            }
            TransitionOutcome::Conflict {
                current: TransferStatus::Cancelled,
            } => Ok(TransitionReport::AlreadyApplied {
                current: TransferStatus::Cancelled,
            }),
            TransitionOutcome::Conflict { current } => Err(Error::InvalidTransition {
                reference: reference.to_string(),
                current,
                attempted: TransferStatus::Cancelled,
            }),
        }
    }

    /// Compensating action after a failed payout attempt: force `failed`
    /// and queue a failure notification, then surface the provider error.
    async fn fail_after_payout_error(
        &self,
        reference: &str,
        message: String,
    ) -> Result<PayoutReport> {
        warn!(reference, %message, "Payout failed, compensating to failed status");

        let outcome = self
            .store
            .transition(
                reference,
                &[TransferStatus::Pending, TransferStatus::Paid],
                TransferStatus::Failed,
                TransitionUpdate::default(),
            )
            .await?;

        if let TransitionOutcome::Applied(updated) = outcome {
            notification::emit(self.store.as_ref(), NotificationKind::TransferFailed, &updated)
                .await;
        }

        Err(Error::PayoutFailed {
            reference: reference.to_string(),
            message,
        })
    }
}
