use crate::db::RecordStore;
use crate::domain::models::User;
use crate::services::session;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Opaque per-session credential presented by the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are credentials; keep them out of logs.
impl fmt::Debug for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CallerIdentity(..)")
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` when the identity is well-formed but maps to no user.
    async fn resolve(&self, identity: &CallerIdentity) -> Result<Option<User>>;
}

/// Resolves HMAC-signed session tokens against the user profile store.
pub struct SessionIdentityProvider {
    key: Vec<u8>,
    store: Arc<dyn RecordStore>,
}

impl SessionIdentityProvider {
    pub fn new(key: Vec<u8>, store: Arc<dyn RecordStore>) -> Self {
        Self { key, store }
    }
}

#[async_trait]
impl IdentityProvider for SessionIdentityProvider {
    async fn resolve(&self, identity: &CallerIdentity) -> Result<Option<User>> {
        let claims = match session::verify_session(identity.as_str(), &self.key) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("Session verification failed: {}", e);
                return Ok(None);
            }
        };
        self.store.find_user_by_id(claims.user_id).await
    }
}
