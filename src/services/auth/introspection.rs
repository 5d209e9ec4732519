/*
 * Responsibility
 * - OAuth2 token introspection (RFC 7662) を毎リクエスト 1 回呼ぶ
 * - active / sub を検証し、username / client_id を Identity に載せる
 *
 * Notes
 * - キャッシュ・リトライ・独自 timeout はなし (transport の既定に従う)
 * - リクエストの future が drop されると introspection 呼び出しも drop される
 */
use async_trait::async_trait;
use serde_json::{Map, Value};
use url::Url;

use crate::api::v1::extractors::Identity;
use crate::services::auth::credential::Scheme;
use crate::services::auth::verifier::{RequestMeta, Verifier, VerifyError};

#[derive(Debug, Clone)]
pub struct IntrospectionVerifier {
    http: reqwest::Client,
    endpoint: Url,
    client_id: String,
}

impl IntrospectionVerifier {
    pub fn new(endpoint: Url, client_id: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint, client_id)
    }

    pub fn with_client(http: reqwest::Client, endpoint: Url, client_id: impl Into<String>) -> Self {
        Self {
            http,
            endpoint,
            client_id: client_id.into(),
        }
    }

    pub async fn introspect(&self, token: &str) -> Result<Identity, VerifyError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .form(&[("token", token)])
            .send()
            .await?
            .json::<Map<String, Value>>()
            .await?;

        tracing::debug!(
            active = ?response.get("active"),
            sub = ?response.get("sub"),
            "introspection response"
        );

        check_response(response, &self.client_id)
    }
}

/// Checks run in order: `active` present, `active` boolean and true, `sub`
/// equals the expected client id.
fn check_response(response: Map<String, Value>, client_id: &str) -> Result<Identity, VerifyError> {
    let active = response.get("active").ok_or(VerifyError::MissingActive)?;
    match active {
        Value::Bool(true) => {}
        Value::Bool(false) => return Err(VerifyError::Inactive),
        _ => return Err(VerifyError::ActiveNotBoolean),
    }

    if response.get("sub").and_then(Value::as_str) != Some(client_id) {
        return Err(VerifyError::SubjectMismatch);
    }

    let text = |name: &str| response.get(name).and_then(Value::as_str).map(str::to_owned);
    let mut identity = Identity::new(text("username").unwrap_or_default());
    if let Some(client_id) = text("client_id") {
        identity = identity.with_client_id(client_id);
    }

    Ok(identity.with_claims(response))
}

#[async_trait]
impl Verifier for IntrospectionVerifier {
    fn scheme(&self) -> Option<Scheme> {
        Some(Scheme::Bearer)
    }

    async fn verify(
        &self,
        token: &str,
        _meta: &RequestMeta,
    ) -> Result<Option<Identity>, VerifyError> {
        self.introspect(token).await.map(Some)
    }
}
