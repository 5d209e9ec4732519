//! Identity が無いリクエストを拒否する (有効時のみ)。
//! どの verifier の後ろにも置ける (Identity の有無だけを見る)。

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::identity;
use crate::error::AppError;

/// Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnforcePolicy {
    pub enabled: bool,
}

impl EnforcePolicy {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

pub fn apply<S>(router: Router<S>, policy: EnforcePolicy) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(policy, enforce))
}

async fn enforce(
    State(policy): State<EnforcePolicy>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if policy.enabled {
        match identity::current(req.extensions()) {
            Some(found) => tracing::debug!(subject = %found.subject, "identity present"),
            None => {
                tracing::info!(path = %req.uri().path(), "no identity, rejecting");
                return Err(AppError::Unauthenticated);
            }
        }
    }

    Ok(next.run(req).await)
}
