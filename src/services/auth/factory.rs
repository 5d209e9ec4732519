/// Factory: build the configured `Verifier` from application `Config`.
use std::sync::Arc;

use thiserror::Error;

use crate::config::AuthMode;
use crate::services::auth::{
    ApiKeyError, ApiKeyVerifier, IntrospectionVerifier, JwksError, JwtSettings, JwtVerifier,
    NoopVerifier, Verifier,
};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    ApiKey(#[from] ApiKeyError),
    #[error(transparent)]
    Jwks(#[from] JwksError),
}

pub async fn build_verifier(mode: &AuthMode) -> Result<Arc<dyn Verifier>, BuildError> {
    let verifier: Arc<dyn Verifier> = match mode {
        AuthMode::None => Arc::new(NoopVerifier),
        AuthMode::ApiKey { keys_file } => Arc::new(ApiKeyVerifier::from_file(keys_file)?),
        AuthMode::Jwt {
            issuer,
            audience,
            jwks_url,
            ca_cert_pem,
            algorithms,
            leeway_seconds,
        } => {
            let settings = JwtSettings {
                issuer: issuer.clone(),
                audience: audience.clone(),
                jwks_url: jwks_url.clone(),
                ca_cert_pem: ca_cert_pem.clone(),
                algorithms: algorithms.clone(),
                leeway_seconds: *leeway_seconds,
            };
            Arc::new(JwtVerifier::fetch(settings).await?)
        }
        AuthMode::Introspection {
            endpoint,
            client_id,
        } => Arc::new(IntrospectionVerifier::new(endpoint.clone(), client_id)),
    };

    tracing::info!(mode = mode.name(), "auth verifier ready");
    Ok(verifier)
}
