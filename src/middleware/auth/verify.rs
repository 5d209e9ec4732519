//! credential 抽出 → verifier で検証 → Identity を extensions に入れる
//!
//! - 認証情報なし: そのまま next へ (匿名。可否は enforce 側が決める)
//! - 検証成功: Identity を attach して next へ
//! - 検証失敗: 401 `ERR: <message>` を返し、next は呼ばない

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::identity;
use crate::error::AppError;
use crate::services::auth::{RequestMeta, Verifier, credential};

/// 認証 middleware を適用する。verifier は起動時に 1 回だけ選ばれる。
///
/// 例：
/// ```ignore
/// let v1 = api::v1::routes();
/// let v1 = middleware::auth::enforce::apply(v1, policy);
/// let v1 = middleware::auth::verify::apply(v1, verifier);
/// ```
pub fn apply<S>(router: Router<S>, verifier: Arc<dyn Verifier>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(verifier, authenticate))
}

async fn authenticate(
    State(verifier): State<Arc<dyn Verifier>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(scheme) = verifier.scheme() else {
        return Ok(next.run(req).await);
    };

    let Some(credential) = credential::from_headers(req.headers(), scheme) else {
        return Ok(next.run(req).await);
    };

    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let meta = RequestMeta::new(remote_addr);

    match verifier.verify(&credential.token, &meta).await {
        Ok(Some(verified)) => {
            tracing::debug!(
                scheme = scheme.label(),
                subject = %verified.subject,
                "credential verified"
            );
            identity::attach(req.extensions_mut(), verified);
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(
                scheme = scheme.label(),
                remote = ?remote_addr,
                class = err.class(),
                error = %err,
                "credential verification failed"
            );
            return Err(err.into());
        }
    }

    Ok(next.run(req).await)
}
