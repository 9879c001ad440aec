//! Shared application state

use adapters::{PaymentConnector, PayoutConnector};
use identity_service::IdentityBridge;
use std::sync::Arc;
use transfer_lifecycle::LifecycleEngine;

/// State shared by every route
#[derive(Clone)]
pub struct AppState {
    /// The one lifecycle engine behind all entry points
    pub engine: Arc<LifecycleEngine>,

    /// Bearer token required on authenticated routes
    pub api_token: String,

    /// Card collection (Stripe), when configured
    pub stripe: Option<Arc<dyn PaymentConnector>>,

    /// Hosted payment collection (Checkout.com), when configured
    pub checkout: Option<Arc<dyn PaymentConnector>>,

    /// Mobile-money payout (Airtel Money), when configured
    pub payout: Option<Arc<dyn PayoutConnector>>,

    /// KYC bridge, when configured
    pub identity: Option<Arc<IdentityBridge>>,
}
