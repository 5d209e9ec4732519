/*
 * Responsibility
 * - GET /api/v1/health (疎通用)
 * - 認証 layer の内側にあるので、enforce 有効時は Identity がないと 401 になる
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::api::v1::extractors::Authenticated;

pub async fn health(identity: Option<Authenticated>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "authenticated": identity.is_some(),
        })),
    )
}
