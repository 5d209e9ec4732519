pub mod api_key;
pub mod credential;
pub mod factory;
pub mod introspection;
pub mod jwt;
pub mod noop;
pub mod verifier;

pub use api_key::{ApiKeyEntry, ApiKeyError, ApiKeyVerifier};
pub use credential::{Credential, Scheme};
pub use factory::{BuildError, build_verifier};
pub use introspection::IntrospectionVerifier;
pub use jwt::{JwksError, JwtSettings, JwtVerifier};
pub use noop::NoopVerifier;
pub use verifier::{RequestMeta, Verifier, VerifyError};
