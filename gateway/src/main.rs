//! KundaPay gateway binary

use adapters::pricefeed::{CoinGeckoFeed, RateRefresher};
use adapters::{AirtelConfig, AirtelConnector, CheckoutConfig, CheckoutConnector, StripeConfig, StripeConnector};
use gateway::{app, AppState, GatewayConfig};
use identity_service::{IdentityBridge, MemoryIdentityStore, OnfidoClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use transfer_core::{FeeSchedule, RateTable, TransferCalculator};
use transfer_lifecycle::{LifecycleEngine, MemoryStore, RestStore, TransferStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    info!("Starting KundaPay gateway");

    let config = match std::env::var("GATEWAY_CONFIG") {
        Ok(path) => GatewayConfig::from_file(&path)?,
        Err(_) => GatewayConfig::from_env(),
    };

    if config.api_token.is_empty() {
        warn!("KUNDAPAY_API_TOKEN is empty, authenticated routes will reject everything");
    }

    // Persistence: hosted store when configured, in-memory otherwise
    let store: Arc<dyn TransferStore> = match &config.store {
        Some(settings) => {
            info!("Using hosted store at {}", settings.base_url);
            Arc::new(RestStore::new(
                settings.base_url.clone(),
                settings.api_key.clone(),
                Duration::from_secs(10),
            )?)
        }
        None => {
            warn!("No hosted store configured, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    // Rates: reference table, optionally refreshed from market feeds
    let mut rates = RateTable::reference();
    if config.refresh_rates_on_start {
        let refresher = RateRefresher::new(vec![Arc::new(CoinGeckoFeed::new(
            "https://api.coingecko.com",
        )?)]);
        rates = refresher.refreshed(&rates).await;
        info!("Exchange rates refreshed from market feeds");
    }
    let calculator = TransferCalculator::new(rates, FeeSchedule::reference());

    let engine = Arc::new(LifecycleEngine::new(store, calculator));

    let stripe = match &config.stripe {
        Some(s) => Some(Arc::new(StripeConnector::new(StripeConfig::new(
            s.api_key.clone(),
            s.webhook_secret.clone(),
        ))?) as Arc<dyn adapters::PaymentConnector>),
        None => None,
    };

    let checkout = match &config.checkout {
        Some(s) => Some(Arc::new(CheckoutConnector::new(CheckoutConfig::new(
            s.secret_key.clone(),
            s.webhook_secret.clone(),
            s.success_url.clone(),
            s.failure_url.clone(),
        ))?) as Arc<dyn adapters::PaymentConnector>),
        None => None,
    };

    let payout = match &config.airtel {
        Some(s) => Some(Arc::new(AirtelConnector::new(AirtelConfig::new(
            s.client_id.clone(),
            s.client_secret.clone(),
        ))?) as Arc<dyn adapters::PayoutConnector>),
        None => None,
    };

    let identity = match &config.identity {
        Some(s) => Some(Arc::new(IdentityBridge::new(
            Arc::new(OnfidoClient::new(s.api_token.clone())?),
            Arc::new(MemoryIdentityStore::new()),
            s.webhook_secret.clone(),
        ))),
        None => None,
    };

    let state = AppState {
        engine,
        api_token: config.api_token.clone(),
        stripe,
        checkout,
        payout,
        identity,
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Gateway listening on {}", config.bind_addr);
    info!("   POST /quotes                        - Price a transfer");
    info!("   POST /transfers                     - Submit a transfer");
    info!("   GET  /transfers/:reference          - Transfer status");
    info!("   POST /transfers/:reference/collect  - Create collection session");
    info!("   POST /transfers/:reference/execute  - Execute mobile-money payout");
    info!("   POST /webhooks/stripe|checkout      - Payment provider webhooks");
    info!("   POST /webhooks/identity             - KYC provider webhook");

    axum::serve(listener, app(state)).await?;
    Ok(())
}
