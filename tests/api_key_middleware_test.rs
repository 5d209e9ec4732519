//! End-to-end checks of the API-key strategy through the router:
//! extraction, domain scoping, and the enforcement stage behind it.

mod common;

use std::sync::Arc;

use authgate::services::auth::ApiKeyVerifier;
use axum::http::StatusCode;
use common::{Call, body_text, json_body, router};

const KEYS: &str = r#"
- User: alice
  ApiKey: abc123
  Domain: ""
- User: bob
  ApiKey: loopback-key
  Domain: localhost
"#;

fn app(enforce: bool) -> axum::Router {
    router(Arc::new(ApiKeyVerifier::from_yaml(KEYS).unwrap()), enforce)
}

#[tokio::test]
async fn known_key_attaches_identity() {
    let res = Call::get("/api/v1/whoami")
        .header("x-authorization", "Apikey abc123")
        .from("203.0.113.7:55000")
        .send(&app(true))
        .await;

    let body = json_body(res).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["identity"]["subject"], "alice");
}

#[tokio::test]
async fn unknown_key_is_rejected_with_err_body() {
    let res = Call::get("/api/v1/whoami")
        .header("x-authorization", "Apikey nope")
        .from("127.0.0.1:55000")
        .send(&app(false))
        .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(res).await.starts_with("ERR: "));
}

#[tokio::test]
async fn localhost_key_accepts_only_loopback() {
    let app = app(true);

    for remote in ["127.0.0.1:40000", "[::1]:40000"] {
        let res = Call::get("/api/v1/whoami")
            .header("x-authorization", "Apikey loopback-key")
            .from(remote)
            .send(&app)
            .await;
        assert_eq!(res.status(), StatusCode::OK, "remote {remote}");
    }

    let res = Call::get("/api/v1/whoami")
        .header("x-authorization", "Apikey loopback-key")
        .from("198.51.100.2:40000")
        .send(&app)
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_credential_is_left_to_enforcement() {
    let res = Call::get("/api/v1/whoami").send(&app(false)).await;
    assert_eq!(json_body(res).await["authenticated"], false);

    let res = Call::get("/api/v1/whoami").send(&app(true)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(res).await.is_empty());
}

#[tokio::test]
async fn wrong_scheme_counts_as_no_credential() {
    // Bearer is not the API-key scheme, and `Authorization` is not its header.
    let res = Call::get("/api/v1/whoami")
        .header("x-authorization", "Bearer abc123")
        .send(&app(false))
        .await;
    assert_eq!(json_body(res).await["authenticated"], false);

    let res = Call::get("/api/v1/whoami")
        .header("authorization", "Apikey abc123")
        .send(&app(false))
        .await;
    assert_eq!(json_body(res).await["authenticated"], false);
}

#[tokio::test]
async fn top_level_health_bypasses_auth() {
    let res = Call::get("/health")
        .header("x-authorization", "Apikey nope")
        .send(&app(true))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn request_id_is_propagated() {
    let res = Call::get("/health").send(&app(false)).await;
    assert!(res.headers().contains_key("x-request-id"));
}
