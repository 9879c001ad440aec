//! HTTP routes and handlers
//!
//! Handlers parse JSON bodies by hand so malformed input stays in the 400
//! class, verify webhook signatures before touching any state, and defer
//! every transition decision to the lifecycle engine.

use crate::error::GatewayError;
use crate::metrics::METRICS;
use crate::state::AppState;
use adapters::{CollectionRequest, CollectionSession, PaymentConnector, Provider};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use transfer_core::{
    Direction, PaymentMethod, PayoutDetails, ReceivingMethod, Transfer, TransferQuote,
};
use transfer_lifecycle::{NewBeneficiary, PayoutReport, SubmitTransfer, TransitionReport};
use uuid::Uuid;

/// Build the gateway router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .route("/quotes", post(create_quote))
        .route("/transfers", post(submit_transfer))
        .route("/transfers/:reference", get(get_transfer))
        .route("/transfers/:reference/collect", post(collect_payment))
        .route("/transfers/:reference/execute", post(execute_payout))
        .route("/transfers/:reference/complete", post(complete_transfer))
        .route("/transfers/:reference/cancel", post(cancel_transfer))
        .route("/webhooks/stripe", post(stripe_webhook))
        .route("/webhooks/checkout", post(checkout_webhook))
        .route("/webhooks/identity", post(identity_webhook))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

#[derive(Debug, Deserialize)]
struct QuoteRequest {
    amount: Decimal,
    direction: Direction,
    payment_method: PaymentMethod,
    receiving_method: ReceivingMethod,
    #[serde(default)]
    is_receive_amount: bool,
}

#[derive(Debug, Deserialize)]
struct BeneficiaryRequest {
    first_name: String,
    last_name: String,
    #[serde(default)]
    email: Option<String>,
    payout_details: PayoutDetails,
}

#[derive(Debug, Deserialize)]
struct SubmitRequest {
    user_id: Uuid,
    amount: Decimal,
    direction: Direction,
    payment_method: PaymentMethod,
    receiving_method: ReceivingMethod,
    #[serde(default)]
    is_receive_amount: bool,
    #[serde(default)]
    funds_origin: Option<String>,
    #[serde(default)]
    transfer_reason: Option<String>,
    beneficiary: BeneficiaryRequest,
}

#[derive(Debug, Deserialize)]
struct CollectRequest {
    provider: Provider,
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, GatewayError> {
    serde_json::from_slice(body).map_err(|e| GatewayError::Validation(e.to_string()))
}

fn require_bearer(state: &AppState, headers: &HeaderMap) -> Result<(), GatewayError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| GatewayError::Auth("missing bearer token".to_string()))?;

    if state.api_token.is_empty() || token != state.api_token {
        return Err(GatewayError::Auth("invalid bearer token".to_string()));
    }
    Ok(())
}

fn signature_header(headers: &HeaderMap, name: &str) -> Result<String, GatewayError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| GatewayError::Auth(format!("missing {name} header")))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "kundapay-gateway",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn metrics_handler() -> Result<String, GatewayError> {
    METRICS
        .export()
        .map_err(|e| GatewayError::Internal(format!("metrics export: {e}")))
}

async fn create_quote(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<TransferQuote>, GatewayError> {
    let request: QuoteRequest = parse_json(&body)?;

    let quote = state.engine.calculator().calculate(
        request.amount,
        request.direction,
        request.payment_method,
        request.receiving_method,
        request.is_receive_amount,
    )?;

    METRICS.quotes_total.inc();
    Ok(Json(quote))
}

async fn submit_transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Transfer>), GatewayError> {
    require_bearer(&state, &headers)?;
    let request: SubmitRequest = parse_json(&body)?;

    let transfer = state
        .engine
        .submit(SubmitTransfer {
            user_id: request.user_id,
            amount: request.amount,
            direction: request.direction,
            payment_method: request.payment_method,
            receiving_method: request.receiving_method,
            is_receive_amount: request.is_receive_amount,
            funds_origin: request.funds_origin,
            transfer_reason: request.transfer_reason,
            beneficiary: NewBeneficiary {
                first_name: request.beneficiary.first_name,
                last_name: request.beneficiary.last_name,
                email: request.beneficiary.email,
                payout_details: request.beneficiary.payout_details,
            },
        })
        .await?;

    METRICS.transfers_submitted_total.inc();
    Ok((StatusCode::CREATED, Json(transfer)))
}

async fn get_transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(reference): Path<String>,
) -> Result<Json<Transfer>, GatewayError> {
    require_bearer(&state, &headers)?;

    let transfer = state
        .engine
        .store()
        .transfer_by_reference(&reference)
        .await
        .map_err(GatewayError::from)?
        .ok_or(GatewayError::NotFound(reference))?;
    Ok(Json(transfer))
}

async fn collect_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(reference): Path<String>,
    body: Bytes,
) -> Result<Json<CollectionSession>, GatewayError> {
    require_bearer(&state, &headers)?;
    let request: CollectRequest = parse_json(&body)?;

    let transfer = state
        .engine
        .store()
        .transfer_by_reference(&reference)
        .await
        .map_err(GatewayError::from)?
        .ok_or_else(|| GatewayError::NotFound(reference.clone()))?;

    if transfer.status != transfer_core::TransferStatus::Pending {
        return Err(GatewayError::Validation(format!(
            "transfer {reference} is {}, collection is only valid while pending",
            transfer.status
        )));
    }

    let connector = match request.provider {
        Provider::Stripe => state.stripe.clone(),
        Provider::Checkout => state.checkout.clone(),
        Provider::AirtelMoney => None,
    }
    .ok_or_else(|| {
        GatewayError::Internal(format!("{} collection not configured", request.provider))
    })?;

    let session = connector
        .create_collection(&CollectionRequest {
            amount: transfer.amount_sent,
            currency: transfer.sender_currency,
            reference: transfer.reference.clone(),
            metadata: HashMap::from([("user_id".to_string(), transfer.user_id.to_string())]),
        })
        .await?;

    info!(reference = %transfer.reference, provider = %session.provider, "Collection session created");
    Ok(Json(session))
}

async fn execute_payout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(reference): Path<String>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    require_bearer(&state, &headers)?;

    let connector = state
        .payout
        .clone()
        .ok_or_else(|| GatewayError::Internal("payout connector not configured".to_string()))?;

    match state
        .engine
        .execute_payout(&reference, connector.as_ref())
        .await
    {
        Ok(PayoutReport::Completed(transfer)) => {
            METRICS.payouts_total.with_label_values(&["completed"]).inc();
            Ok(Json(json!({ "status": "completed", "transfer": transfer })))
        }
        Ok(PayoutReport::Rejected { current }) => {
            METRICS.payouts_total.with_label_values(&["rejected"]).inc();
            Ok(Json(json!({ "status": "rejected", "current": current })))
        }
        Err(e) => {
            METRICS.payouts_total.with_label_values(&["failed"]).inc();
            Err(e.into())
        }
    }
}

async fn complete_transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(reference): Path<String>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    require_bearer(&state, &headers)?;
    let report = state.engine.complete(&reference).await?;
    Ok(Json(transition_body(report)))
}

async fn cancel_transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(reference): Path<String>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    require_bearer(&state, &headers)?;
    let report = state.engine.cancel(&reference).await?;
    Ok(Json(transition_body(report)))
}

fn transition_body(report: TransitionReport) -> serde_json::Value {
    match report {
        TransitionReport::Applied(transfer) => {
            json!({ "status": "applied", "transfer": transfer })
        }
        TransitionReport::AlreadyApplied { current } => {
            json!({ "status": "already_applied", "current": current })
        }
    }
}

async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let signature = signature_header(&headers, "Stripe-Signature")?;
    let connector = state
        .stripe
        .clone()
        .ok_or_else(|| GatewayError::Internal("stripe not configured".to_string()))?;
    handle_payment_webhook(&state, connector.as_ref(), &body, &signature).await
}

async fn checkout_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let signature = signature_header(&headers, "Cko-Signature")?;
    let connector = state
        .checkout
        .clone()
        .ok_or_else(|| GatewayError::Internal("checkout not configured".to_string()))?;
    handle_payment_webhook(&state, connector.as_ref(), &body, &signature).await
}

async fn handle_payment_webhook(
    state: &AppState,
    connector: &dyn PaymentConnector,
    raw_body: &[u8],
    signature: &str,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let provider = connector.provider().to_string();

    // Verification happens before any state is touched; a bad signature
    // answers 401 with no store access at all.
    let event = match connector.parse_webhook(raw_body, signature) {
        Ok(event) => event,
        Err(e) => {
            METRICS
                .webhooks_total
                .with_label_values(&[&provider, "rejected"])
                .inc();
            return Err(e.into());
        }
    };

    let Some(event) = event else {
        METRICS
            .webhooks_total
            .with_label_values(&[&provider, "ignored"])
            .inc();
        return Ok(Json(json!({ "received": true, "handled": false })));
    };

    let report = state.engine.apply_payment_event(&event).await?;
    METRICS
        .webhooks_total
        .with_label_values(&[&provider, "applied"])
        .inc();

    let replayed = matches!(report, TransitionReport::AlreadyApplied { .. });
    Ok(Json(json!({
        "received": true,
        "handled": true,
        "replayed": replayed,
    })))
}

async fn identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let signature = signature_header(&headers, "X-SHA2-Signature")?;
    let bridge = state
        .identity
        .clone()
        .ok_or_else(|| GatewayError::Internal("identity bridge not configured".to_string()))?;

    let outcome = bridge.handle_webhook(&body, &signature).await?;
    match outcome {
        Some(o) => Ok(Json(json!({
            "received": true,
            "handled": true,
            "verified": o.verified,
        }))),
        None => Ok(Json(json!({ "received": true, "handled": false }))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::{
        signature, PayoutConnector, PayoutRequest, PayoutResponse, PayoutStatus, StripeConfig,
        StripeConnector,
    };
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Utc;
    use identity_service::{
        ApplicantDetails, IdentityBridge, IdentityProvider, MemoryIdentityStore,
    };
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;
    use transfer_core::{TransferCalculator, TransferStatus};
    use transfer_lifecycle::{LifecycleEngine, MemoryStore, TransferStore};

    const TOKEN: &str = "secret-token";
    const STRIPE_WHSEC: &str = "whsec_test";

    struct OkPayout {
        calls: AtomicU32,
    }

    #[async_trait]
    impl PayoutConnector for OkPayout {
        fn name(&self) -> &str {
            "mock"
        }

        async fn send_payout(&self, request: &PayoutRequest) -> adapters::Result<PayoutResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PayoutResponse {
                reference: request.reference.clone(),
                status: PayoutStatus::Completed,
                provider_transaction_id: Some("MOCK-1".to_string()),
                message: None,
            })
        }

        async fn check_status(&self, _reference: &str) -> adapters::Result<PayoutStatus> {
            Ok(PayoutStatus::Completed)
        }
    }

    struct StubIdentityProvider;

    #[async_trait]
    impl IdentityProvider for StubIdentityProvider {
        async fn create_applicant(
            &self,
            _details: &ApplicantDetails,
        ) -> identity_service::Result<String> {
            Ok("applicant-1".to_string())
        }

        async fn create_check(&self, _applicant_id: &str) -> identity_service::Result<String> {
            Ok("check-1".to_string())
        }

        async fn sdk_token(&self, _applicant_id: &str) -> identity_service::Result<String> {
            Ok("sdk-1".to_string())
        }
    }

    fn test_state() -> (AppState, Arc<MemoryStore>, Arc<OkPayout>) {
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(LifecycleEngine::new(
            store.clone(),
            TransferCalculator::reference(),
        ));
        let stripe =
            StripeConnector::new(StripeConfig::new("sk_test", STRIPE_WHSEC)).unwrap();
        let payout = Arc::new(OkPayout {
            calls: AtomicU32::new(0),
        });
        let identity = IdentityBridge::new(
            Arc::new(StubIdentityProvider),
            Arc::new(MemoryIdentityStore::new()),
            "id_whsec",
        );

        let state = AppState {
            engine,
            api_token: TOKEN.to_string(),
            stripe: Some(Arc::new(stripe)),
            checkout: None,
            payout: Some(payout.clone()),
            identity: Some(Arc::new(identity)),
        };
        (state, store, payout)
    }

    fn quote_body() -> serde_json::Value {
        json!({
            "amount": "100",
            "direction": "FRANCE_TO_GABON",
            "payment_method": "card",
            "receiving_method": "airtel_money",
            "is_receive_amount": false
        })
    }

    fn submit_body() -> serde_json::Value {
        let mut body = quote_body();
        body["user_id"] = json!(Uuid::new_v4());
        body["funds_origin"] = json!("salary");
        body["beneficiary"] = json!({
            "first_name": "Jean",
            "last_name": "Ondo",
            "payout_details": {
                "kind": "phone",
                "msisdn": "074123456",
                "operator": "airtel"
            }
        });
        body
    }

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {TOKEN}"))
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn submit_transfer(state: &AppState) -> Transfer {
        state
            .engine
            .submit(SubmitTransfer {
                user_id: Uuid::new_v4(),
                amount: dec!(100),
                direction: Direction::FranceToGabon,
                payment_method: PaymentMethod::Card,
                receiving_method: ReceivingMethod::AirtelMoney,
                is_receive_amount: false,
                funds_origin: None,
                transfer_reason: None,
                beneficiary: NewBeneficiary {
                    first_name: "Jean".to_string(),
                    last_name: "Ondo".to_string(),
                    email: None,
                    payout_details: PayoutDetails::Phone {
                        msisdn: "074123456".to_string(),
                        operator: transfer_core::MobileOperator::Airtel,
                    },
                },
            })
            .await
            .unwrap()
    }

    fn stripe_header(body: &[u8]) -> String {
        let t = Utc::now().timestamp();
        let mut payload = t.to_string().into_bytes();
        payload.push(b'.');
        payload.extend_from_slice(body);
        let sig = signature::sign(STRIPE_WHSEC.as_bytes(), &payload);
        format!("t={t},v1={sig}")
    }

    fn stripe_event(reference: &str) -> Vec<u8> {
        json!({
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "data": { "object": {
                "id": "pi_123",
                "metadata": { "reference": reference }
            }}
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _, _) = test_state();
        let response = app(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_quote_ok() {
        let (state, _, _) = test_state();
        let response = app(state)
            .oneshot(post("/quotes", quote_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_quote_validation_is_400() {
        let (state, _, _) = test_state();
        let mut body = quote_body();
        body["amount"] = json!("-5");

        let response = app(state).oneshot(post("/quotes", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_direction_is_400() {
        let (state, _, _) = test_state();
        let mut body = quote_body();
        body["direction"] = json!("MARS_TO_VENUS");

        let response = app(state).oneshot(post("/quotes", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_wrong_method_is_405() {
        let (state, _, _) = test_state();
        let response = app(state)
            .oneshot(Request::get("/quotes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_submit_requires_bearer() {
        let (state, _, _) = test_state();
        let request = Request::builder()
            .method("POST")
            .uri("/transfers")
            .header("content-type", "application/json")
            .body(Body::from(submit_body().to_string()))
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_submit_creates_pending_transfer() {
        let (state, store, _) = test_state();
        let response = app(state)
            .oneshot(post("/transfers", submit_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        // Exactly one pending transfer landed in the store
        let notifications = store.notifications();
        assert!(notifications.is_empty());
    }

    #[tokio::test]
    async fn test_get_transfer_404() {
        let (state, _, _) = test_state();
        let request = Request::get("/transfers/KP-FFFFFFFFFFFF-11")
            .header("authorization", format!("Bearer {TOKEN}"))
            .body(Body::empty())
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stripe_webhook_marks_paid() {
        let (state, store, _) = test_state();
        let transfer = submit_transfer(&state).await;

        let body = stripe_event(&transfer.reference);
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/stripe")
            .header("Stripe-Signature", stripe_header(&body))
            .body(Body::from(body))
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stored = store
            .transfer_by_reference(&transfer.reference)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, TransferStatus::Paid);
    }

    #[tokio::test]
    async fn test_stripe_webhook_bad_signature_is_401_and_no_mutation() {
        let (state, store, _) = test_state();
        let transfer = submit_transfer(&state).await;

        let body = stripe_event(&transfer.reference);
        let t = Utc::now().timestamp();
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/stripe")
            .header("Stripe-Signature", format!("t={t},v1=deadbeef"))
            .body(Body::from(body))
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let stored = store
            .transfer_by_reference(&transfer.reference)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, TransferStatus::Pending);
        assert!(store.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_stripe_webhook_unknown_reference_is_404() {
        let (state, store, _) = test_state();

        let body = stripe_event("KP-FFFFFFFFFFFF-11");
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/stripe")
            .header("Stripe-Signature", stripe_header(&body))
            .body(Body::from(body))
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(store.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_execute_payout_completes_over_http() {
        let (state, store, payout) = test_state();
        let transfer = submit_transfer(&state).await;

        let request = Request::builder()
            .method("POST")
            .uri(format!("/transfers/{}/execute", transfer.reference))
            .header("authorization", format!("Bearer {TOKEN}"))
            .body(Body::empty())
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(payout.calls.load(Ordering::SeqCst), 1);

        let stored = store
            .transfer_by_reference(&transfer.reference)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, TransferStatus::Completed);
    }

    #[tokio::test]
    async fn test_identity_webhook_bad_signature_is_401() {
        let (state, _, _) = test_state();
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/identity")
            .header("X-SHA2-Signature", "deadbeef")
            .body(Body::from("{}"))
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
