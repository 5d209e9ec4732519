/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - 認証 / enforcement の layer は app 側で掛ける (ここは route だけ)
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{health::health, whoami::whoami};

pub fn routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/whoami", get(whoami))
}
