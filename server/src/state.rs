use std::sync::Arc;

use crate::auth::IdentityVerifier;
use crate::registry::Registry;

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Live participant registry shared by every connection actor
    pub registry: Registry,
    /// Identity verification collaborator consulted on join
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            registry: Registry::new(),
            verifier,
        }
    }
}
