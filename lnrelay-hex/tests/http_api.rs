//! Integration tests for the HTTP surface.
//!
//! Routes run against in-memory wallets and a fixed price oracle, so every
//! request is answered without network access.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use exchange_rates::{ExchangeRate, FixedPriceOracle, RateConverter};
use http_body_util::BodyExt;
use lnrelay_hex::inbound::{ApiKeyAuth, AppState, HttpServer};
use lnrelay_hex::{HealthProbe, PaymentOrchestrator};
use lnrelay_types::Msats;
use lnrelay_wallets::{Faults, MemoryConnector};
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::ServiceExt;

const API_KEY: &str = "test-key";

/// Alice holds 200 000 msats, Bob nothing, fee 1 msat, 50 000 EUR/BTC.
fn wallets() -> MemoryConnector {
    let connector = MemoryConnector::new().with_fee(Msats::new(1));
    connector.add_wallet("alice", 200_000);
    connector.add_wallet("bob", 0);
    connector
}

fn server_with(
    connector: &MemoryConnector,
    requests_per_minute: u32,
) -> HttpServer<MemoryConnector, FixedPriceOracle> {
    let registry = Arc::new(connector.registry());
    let oracle = FixedPriceOracle::new(ExchangeRate::new(dec!(50000)).unwrap());
    let service = PaymentOrchestrator::new(
        Arc::clone(&registry),
        connector.clone(),
        RateConverter::new(oracle),
    );
    let health = HealthProbe::new(registry, connector.clone());
    HttpServer::with_rate_limit(
        AppState::new(service, health),
        ApiKeyAuth::new(API_KEY),
        requests_per_minute,
    )
}

fn app(connector: &MemoryConnector) -> Router {
    server_with(connector, 100).router()
}

fn payment_request(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/nwc_payment")
        .header("Content-Type", "application/json")
        .header("X-API-Key", API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

// ─────────────────────────────────────────────────────────────────────────────
// Payments
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_payment_settles() {
    let connector = wallets();

    let (status, json) = send(
        app(&connector),
        payment_request(r#"{"sender":"alice","recipient":"BOB","euro_amount":0.05}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["amount_msats"], 100_000);
    assert_eq!(json["fees_paid"], 1);
    assert_eq!(json["sender_balance"], 99_999);
    assert_eq!(json["recipient_balance"], 100_000);
    assert_eq!(
        json["message"],
        "Successfully transferred 100000 msats (0.05000000 EUR) from ALICE to BOB"
    );
}

#[tokio::test]
async fn test_payment_unknown_wallet_is_404() {
    let (status, json) = send(
        app(&wallets()),
        payment_request(r#"{"sender":"ghost","recipient":"bob","euro_amount":1.0}"#),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], 404);
    assert!(json["error"].as_str().unwrap().contains("GHOST"));
}

#[tokio::test]
async fn test_payment_insufficient_funds_is_400() {
    let connector = wallets();
    connector.set_balance("alice", 10);

    let (status, _) = send(
        app(&connector),
        payment_request(r#"{"sender":"alice","recipient":"bob","euro_amount":0.05}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(connector.calls("alice").pay, 0);
}

#[tokio::test]
async fn test_payment_settlement_failure_is_502() {
    let connector = wallets();
    connector.set_faults(
        "alice",
        Faults {
            settle: true,
            ..Faults::default()
        },
    );

    let (status, json) = send(
        app(&connector),
        payment_request(r#"{"sender":"alice","recipient":"bob","euro_amount":0.05}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], 502);
}

#[tokio::test]
async fn test_payment_malformed_wallet_reply_is_502() {
    let connector = wallets();
    connector.set_faults(
        "alice",
        Faults {
            malformed: true,
            ..Faults::default()
        },
    );

    let (status, json) = send(
        app(&connector),
        payment_request(r#"{"sender":"alice","recipient":"bob","euro_amount":0.05}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], 502);
    assert!(json["error"].as_str().unwrap().contains("sender"));
    assert_eq!(connector.calls("alice").pay, 0);
}

#[tokio::test]
async fn test_payment_malformed_body_is_400() {
    let (status, json) = send(
        app(&wallets()),
        payment_request(r#"{"sender":"alice","euro_amount":"lots"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("invalid request"));
}

#[tokio::test]
async fn test_payment_zero_amount_is_400() {
    let (status, _) = send(
        app(&wallets()),
        payment_request(r#"{"sender":"alice","recipient":"bob","euro_amount":0}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_convert_with_query_key() {
    let (status, json) = send(
        app(&wallets()),
        get("/convert/eur-to-msats?amount=0.05&api_key=test-key"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["euro_amount"], 0.05);
    assert_eq!(json["msat_amount"], 100_000);
}

#[tokio::test]
async fn test_convert_missing_amount() {
    let (status, json) = send(app(&wallets()), get("/convert/eur-to-msats?api_key=test-key")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "amount parameter is required");
}

#[tokio::test]
async fn test_convert_malformed_amount() {
    let (status, json) = send(
        app(&wallets()),
        get("/convert/eur-to-msats?amount=ten&api_key=test-key"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid amount format");
}

// ─────────────────────────────────────────────────────────────────────────────
// Authentication
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_key_is_401() {
    let (status, json) = send(app(&wallets()), get("/convert/eur-to-msats?amount=1")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["error"].as_str().unwrap().starts_with("API key is required"));
}

#[tokio::test]
async fn test_wrong_key_is_401_before_any_wallet_call() {
    let connector = wallets();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/nwc_payment")
        .header("Content-Type", "application/json")
        .header("X-API-Key", "wrong")
        .body(Body::from(
            r#"{"sender":"alice","recipient":"bob","euro_amount":0.05}"#,
        ))
        .unwrap();

    let (status, json) = send(app(&connector), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Invalid API key");
    assert_eq!(connector.calls("alice").connect, 0);
}

#[tokio::test]
async fn test_bearer_key_accepted() {
    let request = Request::builder()
        .uri("/convert/eur-to-msats?amount=1")
        .header("Authorization", format!("Bearer {API_KEY}"))
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(app(&wallets()), request).await;

    assert_eq!(status, StatusCode::OK);
}

// ─────────────────────────────────────────────────────────────────────────────
// Health
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_needs_no_key() {
    let (status, json) = send(app(&wallets()), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        serde_json::json!({"status": "healthy", "wallets": {"ALICE": true, "BOB": true}})
    );
}

#[tokio::test]
async fn test_health_degraded_wallet() {
    let connector = wallets();
    connector.set_faults("bob", Faults::offline());

    let (status, json) = send(app(&connector), get("/health?wallet_id=bob")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({"status": "degraded", "wallets": {"BOB": false}}));
}

#[tokio::test]
async fn test_health_unknown_wallet_is_404() {
    let (status, json) = send(app(&wallets()), get("/health?wallet_id=ghost")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Wallet with ID 'GHOST' not found");
}

#[tokio::test]
async fn test_openapi_document_is_public() {
    let (status, json) = send(app(&wallets()), get("/api-docs/openapi.json")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/nwc_payment"].is_object());
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate Limiting
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_rate_limiting_returns_429_when_exceeded() {
    let app = server_with(&wallets(), 3).router();

    for i in 1..=3 {
        let (status, _) = send(
            app.clone(),
            get("/convert/eur-to-msats?amount=1&api_key=test-key"),
        )
        .await;
        assert_ne!(status, StatusCode::TOO_MANY_REQUESTS, "request {i} should pass");
    }

    let (status, json) = send(
        app.clone(),
        get("/convert/eur-to-msats?amount=1&api_key=test-key"),
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(json["error"].as_str().unwrap().contains("Rate limit exceeded"));
    assert_eq!(json["retry_after_seconds"], 60);
}

#[tokio::test]
async fn test_rate_limiting_health_endpoint_bypassed() {
    let app = server_with(&wallets(), 1).router();

    for _ in 0..10 {
        let (status, _) = send(app.clone(), get("/health")).await;
        assert_eq!(status, StatusCode::OK, "health should not be rate limited");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CORS
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cors_preflight_mirrors_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/nwc_payment")
        .header("Origin", "https://shop.example")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "x-api-key, content-type")
        .body(Body::empty())
        .unwrap();

    let response = app(&wallets()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "https://shop.example"
    );
    assert_eq!(
        headers.get("access-control-allow-credentials").unwrap(),
        "true"
    );
}
