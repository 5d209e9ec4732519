/*
 * Responsibility
 * - 静的な API key 一覧 (YAML) を起動時に 1 回だけ読み込む
 * - key の完全一致 + (domain 指定があれば) 接続元ホストの一致を検証する
 */
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::api::v1::extractors::Identity;
use crate::services::auth::credential::Scheme;
use crate::services::auth::verifier::{RequestMeta, Verifier, VerifyError};

const LOCALHOST: &str = "localhost";

#[derive(Debug, Error)]
pub enum ApiKeyError {
    #[error("failed to read api key file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed api key list: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// One entry of the api key list.
///
/// Accepts `User`/`ApiKey`/`Domain` as well as their lowercase forms.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyEntry {
    #[serde(rename = "user", alias = "User")]
    pub user: String,
    #[serde(rename = "apikey", alias = "ApiKey", alias = "api_key")]
    pub api_key: String,
    #[serde(rename = "domain", alias = "Domain", default)]
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyRecord {
    pub subject: String,
    pub domain: String,
}

pub struct ApiKeyVerifier {
    keys: HashMap<String, ApiKeyRecord>,
}

impl std::fmt::Debug for ApiKeyVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("ApiKeyVerifier")
            .field("keys", &self.keys.len())
            .finish()
    }
}

impl ApiKeyVerifier {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ApiKeyError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ApiKeyError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ApiKeyError> {
        let entries: Vec<ApiKeyEntry> = serde_yaml::from_str(raw)?;
        Ok(Self::from_entries(entries))
    }

    /// Later entries with the same key replace earlier ones.
    pub fn from_entries(entries: impl IntoIterator<Item = ApiKeyEntry>) -> Self {
        let keys = entries
            .into_iter()
            .map(|e| {
                (
                    e.api_key,
                    ApiKeyRecord {
                        subject: e.user,
                        domain: e.domain,
                    },
                )
            })
            .collect::<HashMap<_, _>>();

        tracing::info!(count = keys.len(), "api keys loaded");
        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn check(&self, token: &str, meta: &RequestMeta) -> Result<Identity, VerifyError> {
        let record = self.keys.get(token).ok_or(VerifyError::UnknownApiKey)?;

        if record.domain.is_empty() {
            return Ok(Identity::new(&record.subject));
        }

        let remote = meta
            .remote_addr
            .ok_or(VerifyError::MissingRemoteAddr)?
            .ip()
            .to_canonical();

        if !domain_matches(&record.domain, remote) {
            return Err(VerifyError::DomainMismatch {
                expected: record.domain.clone(),
                actual: remote.to_string(),
            });
        }

        Ok(Identity::new(&record.subject).with_domain(&record.domain))
    }
}

/// `"localhost"` means loopback (127.0.0.1 / ::1); anything else is an exact
/// match on the textual remote IP.
fn domain_matches(domain: &str, remote: IpAddr) -> bool {
    if domain == LOCALHOST {
        return remote == IpAddr::V4(Ipv4Addr::LOCALHOST)
            || remote == IpAddr::V6(Ipv6Addr::LOCALHOST);
    }
    remote.to_string() == domain
}

#[async_trait]
impl Verifier for ApiKeyVerifier {
    fn scheme(&self) -> Option<Scheme> {
        Some(Scheme::Apikey)
    }

    async fn verify(
        &self,
        token: &str,
        meta: &RequestMeta,
    ) -> Result<Option<Identity>, VerifyError> {
        self.check(token, meta).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    const KEYS: &str = r#"
- User: alice
  ApiKey: abc123
  Domain: ""
- User: bob
  ApiKey: local-only
  Domain: localhost
- User: carol
  ApiKey: pinned
  Domain: 10.1.2.3
"#;

    fn verifier() -> ApiKeyVerifier {
        ApiKeyVerifier::from_yaml(KEYS).unwrap()
    }

    fn from(addr: &str) -> RequestMeta {
        RequestMeta::new(Some(addr.parse::<SocketAddr>().unwrap()))
    }

    #[test]
    fn loads_every_entry() {
        assert_eq!(verifier().len(), 3);
    }

    #[test]
    fn accepts_lowercase_field_names() {
        let v = ApiKeyVerifier::from_yaml("- user: dave\n  apikey: k\n").unwrap();
        let identity = v.check("k", &RequestMeta::default()).unwrap();
        assert_eq!(identity.subject, "dave");
    }

    #[test]
    fn malformed_source_is_an_error() {
        assert!(matches!(
            ApiKeyVerifier::from_yaml("not: [a, list"),
            Err(ApiKeyError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(matches!(
            ApiKeyVerifier::from_file("/nonexistent/api-keys.yaml"),
            Err(ApiKeyError::Read { .. })
        ));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = verifier().check("nope", &from("127.0.0.1:4000")).unwrap_err();
        assert!(matches!(err, VerifyError::UnknownApiKey));
    }

    #[test]
    fn unscoped_key_ignores_remote_address() {
        let v = verifier();
        for meta in [from("8.8.8.8:1"), from("[::1]:1"), RequestMeta::default()] {
            let identity = v.check("abc123", &meta).unwrap();
            assert_eq!(identity.subject, "alice");
            assert_eq!(identity.domain, None);
        }
    }

    #[test]
    fn localhost_key_requires_loopback() {
        let v = verifier();
        assert!(v.check("local-only", &from("127.0.0.1:5000")).is_ok());
        assert!(v.check("local-only", &from("[::1]:5000")).is_ok());
        assert!(v.check("local-only", &from("[::ffff:127.0.0.1]:5000")).is_ok());
        assert!(matches!(
            v.check("local-only", &from("192.168.0.10:5000")),
            Err(VerifyError::DomainMismatch { .. })
        ));
        assert!(matches!(
            v.check("local-only", &from("127.0.0.2:5000")),
            Err(VerifyError::DomainMismatch { .. })
        ));
    }

    #[test]
    fn pinned_key_requires_exact_host() {
        let v = verifier();
        let identity = v.check("pinned", &from("10.1.2.3:443")).unwrap();
        assert_eq!(identity.domain.as_deref(), Some("10.1.2.3"));
        assert!(v.check("pinned", &from("10.1.2.4:443")).is_err());
    }

    #[test]
    fn scoped_key_without_remote_address_is_rejected() {
        assert!(matches!(
            verifier().check("pinned", &RequestMeta::default()),
            Err(VerifyError::MissingRemoteAddr)
        ));
    }
}
