/*
 * Responsibility
 * - JWKS を起動時に 1 回だけ取得し、DecodingKey として保持する (以後 read-only)
 * - JWT の署名 + iss/aud/exp/nbf 検証 → claim set を Identity にする
 *
 * Notes
 * - 鍵のローテーションは再起動で反映する (定期 refresh はしない)
 * - 鍵の選択は token header の kid で行う。kid なしは鍵が 1 つだけのときのみ許可
 */
use std::time::Instant;

use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::api::v1::extractors::Identity;
use crate::services::auth::credential::Scheme;
use crate::services::auth::verifier::{RequestMeta, Verifier, VerifyError};

#[derive(Debug, Error)]
pub enum JwksError {
    #[error("invalid CA certificate: {0}")]
    InvalidCa(String),

    #[error("failed to build jwks http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to fetch jwks from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unable to load a signature verification key from jwks")]
    NoUsableKey,
}

#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub issuer: String,
    /// OAuth2 client id expected in `aud`
    pub audience: String,
    pub jwks_url: Url,
    /// Extra CA (PEM) appended to the system trust store for the JWKS fetch
    pub ca_cert_pem: Option<String>,
    pub algorithms: Vec<Algorithm>,
    pub leeway_seconds: u64,
}

impl JwtSettings {
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>, jwks_url: Url) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            jwks_url,
            ca_cert_pem: None,
            algorithms: vec![Algorithm::RS256],
            leeway_seconds: 60,
        }
    }
}

/// Key type of a JWK. `jsonwebtoken` refuses a `Validation` whose
/// algorithm list strays outside the decoding key's family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyFamily {
    Rsa,
    Ec,
    Ed,
    Hmac,
}

impl KeyFamily {
    fn of_jwk(jwk: &Jwk) -> Self {
        match jwk.algorithm {
            AlgorithmParameters::RSA(_) => Self::Rsa,
            AlgorithmParameters::EllipticCurve(_) => Self::Ec,
            AlgorithmParameters::OctetKeyPair(_) => Self::Ed,
            AlgorithmParameters::OctetKey(_) => Self::Hmac,
        }
    }

    fn admits(self, alg: Algorithm) -> bool {
        match self {
            Self::Rsa => matches!(
                alg,
                Algorithm::RS256
                    | Algorithm::RS384
                    | Algorithm::RS512
                    | Algorithm::PS256
                    | Algorithm::PS384
                    | Algorithm::PS512
            ),
            Self::Ec => matches!(alg, Algorithm::ES256 | Algorithm::ES384),
            Self::Ed => matches!(alg, Algorithm::EdDSA),
            Self::Hmac => matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512),
        }
    }
}

/// Decoding key plus the validation restricted to its family.
struct SigningKey {
    kid: Option<String>,
    key: DecodingKey,
    validation: Validation,
}

/// JWKS-backed access-token verifier.
///
/// - Key material is intentionally not printable via Debug.
pub struct JwtVerifier {
    keys: Vec<SigningKey>,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<_> = self
            .keys
            .iter()
            .map(|k| (k.kid.as_deref(), &k.validation.algorithms))
            .collect();
        f.debug_struct("JwtVerifier").field("keys", &keys).finish()
    }
}

impl JwtVerifier {
    /// Fetch the key set once and build the verifier.
    pub async fn fetch(settings: JwtSettings) -> Result<Self, JwksError> {
        let client = jwks_client(settings.ca_cert_pem.as_deref())?;

        let started = Instant::now();
        let set = client
            .get(settings.jwks_url.clone())
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|source| JwksError::Fetch {
                url: settings.jwks_url.to_string(),
                source,
            })?
            .json::<JwkSet>()
            .await
            .map_err(|source| JwksError::Fetch {
                url: settings.jwks_url.to_string(),
                source,
            })?;

        tracing::info!(
            url = %settings.jwks_url,
            keys = set.keys.len(),
            elapsed = ?started.elapsed(),
            "jwks fetched"
        );

        Self::from_jwks(&set, &settings)
    }

    /// Build from an already fetched key set.
    ///
    /// Each key only accepts the configured algorithms of its own family;
    /// keys whose family has none configured are skipped.
    pub fn from_jwks(set: &JwkSet, settings: &JwtSettings) -> Result<Self, JwksError> {
        let keys = set
            .keys
            .iter()
            .filter_map(|jwk| signing_key(jwk, settings))
            .collect::<Vec<_>>();

        if keys.is_empty() {
            return Err(JwksError::NoUsableKey);
        }

        Ok(Self { keys })
    }

    fn select_key(&self, kid: Option<&str>) -> Option<&SigningKey> {
        match kid {
            Some(kid) => self.keys.iter().find(|k| k.kid.as_deref() == Some(kid)),
            None if self.keys.len() == 1 => self.keys.first(),
            None => None,
        }
    }

    pub fn verify_token(&self, token: &str) -> Result<Identity, VerifyError> {
        let header = jsonwebtoken::decode_header(token)?;
        let signing = self
            .select_key(header.kid.as_deref())
            .ok_or_else(|| VerifyError::UnknownSigningKey(header.kid.clone()))?;

        let data = jsonwebtoken::decode::<Map<String, Value>>(
            token,
            &signing.key,
            &signing.validation,
        )?;
        let identity = identity_from_claims(data.claims);

        tracing::debug!(subject = %identity.subject, kid = ?header.kid, "jwt verified");
        Ok(identity)
    }
}

fn signing_key(jwk: &Jwk, settings: &JwtSettings) -> Option<SigningKey> {
    let kid = jwk.common.key_id.clone();
    let family = KeyFamily::of_jwk(jwk);

    let algorithms = settings
        .algorithms
        .iter()
        .copied()
        .filter(|alg| family.admits(*alg))
        .collect::<Vec<_>>();
    if algorithms.is_empty() {
        tracing::warn!(kid = ?kid, ?family, "no configured algorithm for jwk, skipping");
        return None;
    }

    match DecodingKey::from_jwk(jwk) {
        Ok(key) => Some(SigningKey {
            kid,
            key,
            validation: validation(settings, algorithms),
        }),
        Err(err) => {
            tracing::warn!(kid = ?kid, error = %err, "skipping unusable jwk");
            None
        }
    }
}

/// `algorithms` must be non-empty and of one family.
fn validation(settings: &JwtSettings, algorithms: Vec<Algorithm>) -> Validation {
    let mut validation = Validation::new(algorithms[0]);
    validation.algorithms = algorithms;
    validation.set_issuer(&[&settings.issuer]);
    validation.set_audience(&[&settings.audience]);
    validation.set_required_spec_claims(&["exp", "iss", "aud"]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = settings.leeway_seconds;
    validation
}

fn jwks_client(ca_cert_pem: Option<&str>) -> Result<reqwest::Client, JwksError> {
    let mut builder = reqwest::Client::builder();

    if let Some(pem) = ca_cert_pem {
        tracing::info!("adding CA certificate to jwks trust store");
        let certs = reqwest::Certificate::from_pem_bundle(pem.as_bytes())
            .map_err(|e| JwksError::InvalidCa(e.to_string()))?;
        if certs.is_empty() {
            return Err(JwksError::InvalidCa("no certificate in PEM".into()));
        }
        for cert in certs {
            builder = builder.add_root_certificate(cert);
        }
    }

    builder.build().map_err(JwksError::Client)
}

fn identity_from_claims(claims: Map<String, Value>) -> Identity {
    let text = |name: &str| claims.get(name).and_then(Value::as_str).map(str::to_owned);

    let subject = text("sub").unwrap_or_default();
    let client_id = text("client_id").or_else(|| text("azp"));

    let mut identity = Identity::new(subject);
    if let Some(client_id) = client_id {
        identity = identity.with_client_id(client_id);
    }
    identity.with_claims(claims)
}

#[async_trait]
impl Verifier for JwtVerifier {
    fn scheme(&self) -> Option<Scheme> {
        Some(Scheme::Bearer)
    }

    async fn verify(
        &self,
        token: &str,
        _meta: &RequestMeta,
    ) -> Result<Option<Identity>, VerifyError> {
        self.verify_token(token).map(Some)
    }
}
