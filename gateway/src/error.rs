//! Gateway error → HTTP response mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

/// Gateway error, one variant per response class
#[derive(Debug)]
pub enum GatewayError {
    /// 400
    Validation(String),
    /// 401
    Auth(String),
    /// 404
    NotFound(String),
    /// Upstream provider failure, surfaced with its status and message
    Provider {
        /// Upstream status code (mapped to 502/504 class)
        status_code: u16,
        /// Upstream message
        message: String,
    },
    /// 500
    Internal(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            GatewayError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, format!("Validation error: {msg}"))
            }
            GatewayError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            GatewayError::NotFound(msg) => (StatusCode::NOT_FOUND, format!("Not found: {msg}")),
            GatewayError::Provider {
                status_code,
                message,
            } => {
                let status = if status_code == 504 {
                    StatusCode::GATEWAY_TIMEOUT
                } else {
                    StatusCode::BAD_GATEWAY
                };
                (status, format!("Provider error {status_code}: {message}"))
            }
            GatewayError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Internal error: {msg}"))
            }
        };

        (
            status,
            Json(serde_json::json!({
                "error": message,
                "timestamp": Utc::now(),
            })),
        )
            .into_response()
    }
}

impl From<transfer_lifecycle::Error> for GatewayError {
    fn from(err: transfer_lifecycle::Error) -> Self {
        use transfer_lifecycle::Error as E;
        match err {
            E::NotFound(r) => GatewayError::NotFound(r),
            E::Domain(e) => GatewayError::Validation(e.to_string()),
            E::PayoutFailed { reference, message } => GatewayError::Provider {
                status_code: 502,
                message: format!("payout for {reference} failed: {message}"),
            },
            E::Ambiguous { reference } => GatewayError::Provider {
                status_code: 504,
                message: format!("payout for {reference} timed out, outcome unknown"),
            },
            E::InvalidTransition { .. } => GatewayError::Internal(err.to_string()),
            E::Store(msg) => GatewayError::Internal(msg),
        }
    }
}

impl From<adapters::Error> for GatewayError {
    fn from(err: adapters::Error) -> Self {
        use adapters::Error as E;
        match err {
            E::InvalidSignature(provider) => {
                GatewayError::Auth(format!("invalid webhook signature from {provider}"))
            }
            E::Provider {
                status_code,
                message,
                ..
            } => GatewayError::Provider {
                status_code,
                message,
            },
            E::Timeout { .. } => GatewayError::Provider {
                status_code: 504,
                message: err.to_string(),
            },
            E::MalformedEvent(msg) => GatewayError::Validation(msg),
            E::Json(e) => GatewayError::Validation(e.to_string()),
            other => GatewayError::Internal(other.to_string()),
        }
    }
}

impl From<identity_service::Error> for GatewayError {
    fn from(err: identity_service::Error) -> Self {
        use identity_service::Error as E;
        match err {
            E::InvalidSignature => {
                GatewayError::Auth("invalid identity webhook signature".to_string())
            }
            E::UnknownCheck(id) => GatewayError::NotFound(format!("check {id}")),
            E::Provider {
                status_code,
                message,
            } => GatewayError::Provider {
                status_code,
                message,
            },
            E::Malformed(msg) => GatewayError::Validation(msg),
            other => GatewayError::Internal(other.to_string()),
        }
    }
}

impl From<transfer_core::Error> for GatewayError {
    fn from(err: transfer_core::Error) -> Self {
        GatewayError::Validation(err.to_string())
    }
}
