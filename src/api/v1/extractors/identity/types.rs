/*
 * Responsibility
 * - Handler から見える「検証済み主体」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - 認可 (role/permission 判定) はここでは扱わない。誰か (who) を確定するだけ
 */
use serde::Serialize;
use serde_json::{Map, Value};

/// Verified subject attached to a request after a successful credential check.
///
/// - `subject`: user name / `sub` claim
/// - `client_id`: OAuth2 client the token was issued to, when known
/// - `domain`: remote host an API key is scoped to
/// - `claims`: raw claim set (JWT) or introspection response
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Identity {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub claims: Map<String, Value>,
}

impl Identity {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_claims(mut self, claims: Map<String, Value>) -> Self {
        self.claims = claims;
        self
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }
}
