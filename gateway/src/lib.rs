//! KundaPay HTTP gateway
//!
//! Thin transport layer over the transfer lifecycle: quoting, transfer
//! submission, provider webhooks, payout execution, and admin
//! transitions. One engine instance backs every route, so transition
//! rules cannot drift between entry points.
//!
//! Status-code contract: 400 validation, 401 auth/signature, 404
//! not-found, 405 method, 502 upstream provider, 500 internal. CORS is
//! permissive for the browser and mobile clients.

pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use routes::app;
pub use state::AppState;
