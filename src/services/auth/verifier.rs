use std::net::SocketAddr;

use async_trait::async_trait;
use thiserror::Error;

use crate::api::v1::extractors::Identity;
use crate::services::auth::credential::Scheme;

/// Connection facts a verifier may consult besides the token itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestMeta {
    pub remote_addr: Option<SocketAddr>,
}

impl RequestMeta {
    pub fn new(remote_addr: Option<SocketAddr>) -> Self {
        Self { remote_addr }
    }
}

/// One credential verification strategy.
///
/// Implementations hold read-only trust material loaded at construction;
/// `verify` never mutates it.
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Scheme the credential is read under. `None` disables extraction:
    /// every request passes through anonymous.
    fn scheme(&self) -> Option<Scheme>;

    /// - `Ok(Some(_))`: verified, attach the identity
    /// - `Ok(None)`: accepted without an identity
    /// - `Err(_)`: reject with 401
    async fn verify(
        &self,
        token: &str,
        meta: &RequestMeta,
    ) -> Result<Option<Identity>, VerifyError>;
}

/// Every way a presented credential can fail.
///
/// `Display` is for the operational log only; responses use
/// [`VerifyError::public_message`].
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("unknown api key")]
    UnknownApiKey,

    #[error("remote address unavailable for domain-scoped api key")]
    MissingRemoteAddr,

    #[error("domain mismatch: key scoped to {expected}, request from {actual}")]
    DomainMismatch { expected: String, actual: String },

    #[error("no signing key for kid {0:?}")]
    UnknownSigningKey(Option<String>),

    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("introspection call failed: {0}")]
    Introspection(#[from] reqwest::Error),

    #[error("introspection response has no 'active' field")]
    MissingActive,

    #[error("introspection 'active' field is not a boolean")]
    ActiveNotBoolean,

    #[error("token is not active")]
    Inactive,

    #[error("token subject does not match client id")]
    SubjectMismatch,
}

impl VerifyError {
    /// Generic text safe to return to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::UnknownApiKey | Self::MissingRemoteAddr | Self::DomainMismatch { .. } => {
                "Not authorized"
            }
            Self::UnknownSigningKey(_) | Self::Jwt(_) => "Invalid auth token",
            Self::Introspection(_) => "Unable to verify auth token",
            Self::MissingActive | Self::ActiveNotBoolean => "Invalid auth token",
            Self::Inactive => "Expired auth token",
            Self::SubjectMismatch => "Invalid token",
        }
    }

    /// Short failure class for structured logs.
    pub fn class(&self) -> &'static str {
        match self {
            Self::UnknownApiKey => "unknown_api_key",
            Self::MissingRemoteAddr => "missing_remote_addr",
            Self::DomainMismatch { .. } => "domain_mismatch",
            Self::UnknownSigningKey(_) => "unknown_signing_key",
            Self::Jwt(_) => "jwt",
            Self::Introspection(_) => "introspection_transport",
            Self::MissingActive | Self::ActiveNotBoolean => "introspection_invalid",
            Self::Inactive => "introspection_inactive",
            Self::SubjectMismatch => "subject_mismatch",
        }
    }
}
