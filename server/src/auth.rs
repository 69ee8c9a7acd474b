//! Identity verification seam for join messages.
//!
//! Credential checking belongs to the platform's auth service, not the
//! relay; the relay only carries the credentials presented at upgrade
//! time to whatever verifier is injected. The shipped default accepts
//! every join.

use async_trait::async_trait;

/// Credentials captured from the WebSocket upgrade request.
///
/// Viewers authenticate with `Authorization: Bearer <token>`, camera
/// devices with an `x-api-key` header. Either or both may be absent.
#[derive(Debug, Clone, Default)]
pub struct ConnectCredentials {
    pub bearer_token: Option<String>,
    pub api_key: Option<String>,
}

/// Decides whether a join message may identify a connection.
///
/// Implemented by the external identity service client; the relay
/// trusts the claimed id once this returns true.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify a viewer join against its bearer token.
    async fn verify_viewer(&self, credentials: &ConnectCredentials, claimed_id: &str) -> bool;

    /// Verify a camera join against its API key.
    async fn verify_camera(&self, credentials: &ConnectCredentials, claimed_id: &str) -> bool;
}

/// Verifier that accepts every join unconditionally.
pub struct OpenVerifier;

#[async_trait]
impl IdentityVerifier for OpenVerifier {
    async fn verify_viewer(&self, _credentials: &ConnectCredentials, _claimed_id: &str) -> bool {
        true
    }

    async fn verify_camera(&self, _credentials: &ConnectCredentials, _claimed_id: &str) -> bool {
        true
    }
}
