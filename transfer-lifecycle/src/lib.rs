//! Transfer lifecycle for KundaPay
//!
//! The status state machine governing a transfer from creation through
//! payment confirmation to completion, failure, or cancellation:
//!
//! ```text
//!              ┌──────────> cancelled (admin)
//!              │
//!  (submit) pending ──webhook──> paid ─────┐
//!              │                           │
//!              │ payout / admin            │ payment-failed webhook
//!              ▼                           ▼
//!          completed                    failed
//! ```
//!
//! Transitions are conditional updates against the freshly-read record
//! (compare-and-swap on status), which makes webhook replays and
//! double-invoked payout executions no-ops instead of double-processing
//! bugs. Within one transfer, ordering is enforced by the CAS; across
//! transfers there is no ordering at all.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod engine;
pub mod error;
pub mod notification;
pub mod store;

pub use engine::{LifecycleEngine, PayoutReport, SubmitTransfer, TransitionReport};
pub use error::{Error, Result};
pub use store::{
    MemoryStore, NewBeneficiary, NewNotification, NewTransfer, RestStore, TransferStore,
    TransitionOutcome, TransitionUpdate,
};
