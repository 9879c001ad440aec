//! Gateway configuration

use serde::{Deserialize, Serialize};

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Listen address
    pub bind_addr: String,

    /// Bearer token required on authenticated routes
    pub api_token: String,

    /// Hosted store; in-memory when absent
    pub store: Option<StoreConfig>,

    /// Stripe credentials
    pub stripe: Option<StripeSettings>,

    /// Checkout.com credentials
    pub checkout: Option<CheckoutSettings>,

    /// Airtel Money credentials
    pub airtel: Option<AirtelSettings>,

    /// Identity provider credentials
    pub identity: Option<IdentitySettings>,

    /// Refresh exchange rates from market feeds at startup
    pub refresh_rates_on_start: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            api_token: String::new(),
            store: None,
            stripe: None,
            checkout: None,
            airtel: None,
            identity: None,
            refresh_rates_on_start: false,
        }
    }
}

/// Hosted store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// REST base URL
    pub base_url: String,
    /// API key
    pub api_key: String,
}

/// Stripe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeSettings {
    /// Secret API key
    pub api_key: String,
    /// Webhook signing secret
    pub webhook_secret: String,
}

/// Checkout.com settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSettings {
    /// Secret API key
    pub secret_key: String,
    /// Webhook signature key
    pub webhook_secret: String,
    /// Success redirect
    pub success_url: String,
    /// Failure redirect
    pub failure_url: String,
}

/// Airtel Money settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirtelSettings {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
}

/// Identity provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySettings {
    /// Provider API token
    pub api_token: String,
    /// Webhook signing secret
    pub webhook_secret: String,
}

impl GatewayConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load from environment variables, on top of defaults
    pub fn from_env() -> Self {
        let mut config = GatewayConfig::default();

        if let Ok(addr) = std::env::var("GATEWAY_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(token) = std::env::var("KUNDAPAY_API_TOKEN") {
            config.api_token = token;
        }
        if let (Ok(base_url), Ok(api_key)) =
            (std::env::var("STORE_URL"), std::env::var("STORE_API_KEY"))
        {
            config.store = Some(StoreConfig { base_url, api_key });
        }
        if let (Ok(api_key), Ok(webhook_secret)) = (
            std::env::var("STRIPE_API_KEY"),
            std::env::var("STRIPE_WEBHOOK_SECRET"),
        ) {
            config.stripe = Some(StripeSettings {
                api_key,
                webhook_secret,
            });
        }
        if let (Ok(secret_key), Ok(webhook_secret)) = (
            std::env::var("CHECKOUT_SECRET_KEY"),
            std::env::var("CHECKOUT_WEBHOOK_SECRET"),
        ) {
            config.checkout = Some(CheckoutSettings {
                secret_key,
                webhook_secret,
                success_url: std::env::var("CHECKOUT_SUCCESS_URL")
                    .unwrap_or_else(|_| "https://kundapay.com/payment/success".to_string()),
                failure_url: std::env::var("CHECKOUT_FAILURE_URL")
                    .unwrap_or_else(|_| "https://kundapay.com/payment/failure".to_string()),
            });
        }
        if let (Ok(client_id), Ok(client_secret)) = (
            std::env::var("AIRTEL_CLIENT_ID"),
            std::env::var("AIRTEL_CLIENT_SECRET"),
        ) {
            config.airtel = Some(AirtelSettings {
                client_id,
                client_secret,
            });
        }
        if let (Ok(api_token), Ok(webhook_secret)) = (
            std::env::var("ONFIDO_API_TOKEN"),
            std::env::var("ONFIDO_WEBHOOK_SECRET"),
        ) {
            config.identity = Some(IdentitySettings {
                api_token,
                webhook_secret,
            });
        }
        if let Ok(value) = std::env::var("REFRESH_RATES_ON_START") {
            config.refresh_rates_on_start = value == "1" || value.eq_ignore_ascii_case("true");
        }

        config
    }
}
