//! Notification emission
//!
//! Notifications are a best-effort side channel: they are created as a
//! side effect of status transitions, never update a transfer, and a
//! creation failure must not roll back the transition that triggered it.

use crate::store::{NewNotification, TransferStore};
use tracing::warn;
use transfer_core::{NotificationKind, Transfer};

/// User-facing message for a transition
pub fn message_for(kind: NotificationKind, transfer: &Transfer) -> String {
    match kind {
        NotificationKind::PaymentReceived => format!(
            "Payment of {} {} received for transfer {}",
            transfer.amount_sent, transfer.sender_currency, transfer.reference
        ),
        NotificationKind::TransferCompleted => format!(
            "Transfer {} completed: {} {} delivered",
            transfer.reference, transfer.amount_received, transfer.receiver_currency
        ),
        NotificationKind::TransferFailed => format!(
            "Transfer {} failed, our team has been notified",
            transfer.reference
        ),
    }
}

/// Emit notifications for a transition, swallowing store failures.
///
/// Failures also notify the operations channel (`recipient_id = None`,
/// an admin broadcast) so someone reconciles the payout.
pub async fn emit(store: &dyn TransferStore, kind: NotificationKind, transfer: &Transfer) {
    let mut recipients = vec![Some(transfer.user_id)];
    if kind == NotificationKind::TransferFailed {
        recipients.push(None);
    }

    for recipient_id in recipients {
        let result = store
            .record_notification(NewNotification {
                kind,
                transfer_id: transfer.id,
                recipient_id,
                message: message_for(kind, transfer),
            })
            .await;

        if let Err(e) = result {
            warn!(
                reference = %transfer.reference,
                ?kind,
                error = %e,
                "Notification write failed, continuing"
            );
        }
    }
}
