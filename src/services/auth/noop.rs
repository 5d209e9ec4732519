use async_trait::async_trait;

use crate::api::v1::extractors::Identity;
use crate::services::auth::credential::Scheme;
use crate::services::auth::verifier::{RequestMeta, Verifier, VerifyError};

/// Authentication disabled by configuration: nothing is extracted and
/// nothing is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVerifier;

#[async_trait]
impl Verifier for NoopVerifier {
    fn scheme(&self) -> Option<Scheme> {
        None
    }

    async fn verify(
        &self,
        _token: &str,
        _meta: &RequestMeta,
    ) -> Result<Option<Identity>, VerifyError> {
        Ok(None)
    }
}
