//! The enforcement stage only looks at identity presence, whatever verifier
//! sits in front of it.

mod common;

use std::sync::Arc;

use authgate::services::auth::{ApiKeyVerifier, NoopVerifier};
use axum::http::StatusCode;
use common::{Call, json_body, router};

#[tokio::test]
async fn disabled_enforcement_always_forwards() {
    let app = router(Arc::new(NoopVerifier), false);
    let res = Call::get("/api/v1/whoami")
        .header("authorization", "Bearer whatever")
        .send(&app)
        .await;
    assert_eq!(json_body(res).await["authenticated"], false);
}

#[tokio::test]
async fn noop_with_enforcement_rejects_everything() {
    let app = router(Arc::new(NoopVerifier), true);
    for header in [None, Some("Bearer x"), Some("Apikey y")] {
        let mut call = Call::get("/api/v1/health");
        if let Some(value) = header {
            call = call.header("authorization", value);
        }
        assert_eq!(call.send(&app).await.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn enforcement_rejects_exactly_anonymous_requests() {
    let verifier = ApiKeyVerifier::from_yaml("- User: svc\n  ApiKey: k1\n").unwrap();
    let app = router(Arc::new(verifier), true);

    let anonymous = Call::get("/api/v1/health").send(&app).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let authenticated = Call::get("/api/v1/health")
        .header("x-authorization", "Apikey k1")
        .send(&app)
        .await;
    assert_eq!(authenticated.status(), StatusCode::OK);
}
