use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::{Extensions, StatusCode, request::Parts};

use super::Identity;

/// middleware → handler への受け渡し。
/// request ごとに高々 1 つ。既に入っていれば置き換える。
pub fn attach(extensions: &mut Extensions, identity: Identity) {
    extensions.insert(identity);
}

/// None は「このリクエストには検証済み主体がない」を意味する
pub fn current(extensions: &Extensions) -> Option<&Identity> {
    extensions.get::<Identity>()
}

/// Handler で Identity を受け取るための extractor
/// middleware が Identity を request.extensions() に insert 済みである前提
/// 見つからない場合は 401 を返す（匿名リクエスト・ミドルウェア未設定）
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current(&parts.extensions)
            .cloned()
            .map(Authenticated)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

/// 匿名も許す route 用。`Option<Authenticated>` で受け取る
impl<S> OptionalFromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(current(&parts.extensions).cloned().map(Authenticated))
    }
}
