//! Provider connector interfaces

use crate::types::*;
use crate::Result;
use async_trait::async_trait;

/// Collection-side connector (sender pays in)
///
/// `parse_webhook` verifies before it parses: a payload whose signature
/// does not check out is rejected without being interpreted, and event
/// types that do not concern transfers map to `Ok(None)`.
#[async_trait]
pub trait PaymentConnector: Send + Sync {
    /// Provider identity
    fn provider(&self) -> Provider;

    /// Create a collection session for a transfer
    async fn create_collection(&self, request: &CollectionRequest) -> Result<CollectionSession>;

    /// Verify a webhook delivery and normalize it
    fn parse_webhook(
        &self,
        raw_body: &[u8],
        signature_header: &str,
    ) -> Result<Option<PaymentEvent>>;
}

/// Payout-side connector (beneficiary receives)
#[async_trait]
pub trait PayoutConnector: Send + Sync {
    /// Connector name for logs and metrics
    fn name(&self) -> &str;

    /// Send funds to the beneficiary
    async fn send_payout(&self, request: &PayoutRequest) -> Result<PayoutResponse>;

    /// Query the provider-side status of a previous payout, for manual
    /// reconciliation after ambiguous outcomes
    async fn check_status(&self, reference: &str) -> Result<PayoutStatus>;
}
