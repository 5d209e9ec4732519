/*
 * Responsibility
 * - GET /whoami: 検証済み主体 (Identity) をそのまま返す
 * - 匿名リクエスト (enforce 無効時) は authenticated=false
 */
use axum::{Json, response::IntoResponse};
use serde_json::json;

use crate::api::v1::extractors::Authenticated;

pub async fn whoami(identity: Option<Authenticated>) -> impl IntoResponse {
    match identity {
        Some(Authenticated(identity)) => Json(json!({
            "authenticated": true,
            "identity": identity,
        })),
        None => Json(json!({ "authenticated": false })),
    }
}
