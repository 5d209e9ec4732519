/*
 * Responsibility
 * - 起動時に組み立てる認証パイプラインの構成 (verifier + enforcement)
 * - Clone 前提で持つ (内部は Arc/Copy で cheap)
 */
use std::sync::Arc;

use crate::middleware::auth::EnforcePolicy;
use crate::services::auth::Verifier;

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn Verifier>,
    pub enforce: EnforcePolicy,
}

impl AppState {
    pub fn new(verifier: Arc<dyn Verifier>, enforce: EnforcePolicy) -> Self {
        Self { verifier, enforce }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("scheme", &self.verifier.scheme())
            .field("enforce", &self.enforce)
            .finish()
    }
}
