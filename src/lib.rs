//! Pluggable request authentication for axum services.
//!
//! One [`Verifier`](services::auth::Verifier) strategy (API key, JWT via JWKS,
//! OAuth2 introspection or no-op) is selected at startup and layered as
//! middleware; an enforcement layer then decides whether anonymous requests
//! may reach the handlers. Handlers read the verified
//! [`Identity`](api::v1::extractors::Identity) from request extensions.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
