/*
 * Responsibility
 * - 認証レイヤーが返す HTTP エラーの定義
 * - IntoResponse 実装 (status / plain-text body)
 * - 認証失敗の詳細は body に出さない (ログのみ)
 */
use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::auth::VerifyError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Credential presented but rejected. Body: `ERR: <message>`
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
    /// No identity where one is required. Empty body.
    #[error("unauthenticated")]
    Unauthenticated,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                format!("ERR: {message}\n"),
            )
                .into_response(),
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl From<VerifyError> for AppError {
    fn from(e: VerifyError) -> Self {
        AppError::Unauthorized(e.public_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn unauthorized_has_err_prefixed_body() {
        let res = AppError::from(VerifyError::UnknownApiKey).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ERR: Not authorized\n");
    }

    #[tokio::test]
    async fn unauthenticated_has_empty_body() {
        let res = AppError::Unauthenticated.into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn every_rejection_is_a_401() {
        let rejections = [
            AppError::from(VerifyError::Inactive),
            AppError::from(VerifyError::Jwt(
                jsonwebtoken::errors::ErrorKind::InvalidToken.into(),
            )),
            AppError::Unauthenticated,
        ];
        for rejection in rejections {
            assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }
}
