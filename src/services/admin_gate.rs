//! Admin authorization gate.
//!
//! Every call re-resolves the caller and re-reads the admin grant, so a
//! revoked grant takes effect on the next request.

use crate::db::RecordStore;
use crate::domain::models::{AdminRecord, User};
use crate::services::identity::{CallerIdentity, IdentityProvider};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessError {
    #[error("No authenticated user")]
    NotAuthenticated,
    #[error("User is not an admin")]
    NotAdmin,
}

/// Fatal outcome of [`AdminGate::require_access`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("Admin access required: {reason}")]
pub struct AdminAccessRequired {
    pub reason: AccessError,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccessCheck {
    pub is_admin: bool,
    pub user: Option<User>,
    pub admin_record: Option<AdminRecord>,
    pub error: Option<AccessError>,
}

impl AccessCheck {
    /// Result for a caller that presented no credential at all.
    pub fn unauthenticated() -> Self {
        Self::denied(None, AccessError::NotAuthenticated)
    }

    fn denied(user: Option<User>, error: AccessError) -> Self {
        Self {
            is_admin: false,
            user,
            admin_record: None,
            error: Some(error),
        }
    }

    fn granted(user: User, admin_record: AdminRecord) -> Self {
        Self {
            is_admin: true,
            user: Some(user),
            admin_record: Some(admin_record),
            error: None,
        }
    }
}

#[derive(Clone)]
pub struct AdminGate {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn RecordStore>,
    call_timeout: Duration,
}

impl AdminGate {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn RecordStore>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            identity,
            store,
            call_timeout,
        }
    }

    pub async fn check_access(&self, caller: &CallerIdentity) -> AccessCheck {
        let user = match timeout(self.call_timeout, self.identity.resolve(caller)).await {
            Ok(Ok(Some(user))) => user,
            Ok(Ok(None)) => return AccessCheck::denied(None, AccessError::NotAuthenticated),
            Ok(Err(e)) => {
                tracing::warn!("Identity provider failed to resolve caller: {}", e);
                return AccessCheck::denied(None, AccessError::NotAuthenticated);
            }
            Err(_) => {
                tracing::warn!(
                    "Identity provider timed out after {:?}",
                    self.call_timeout
                );
                return AccessCheck::denied(None, AccessError::NotAuthenticated);
            }
        };

        // Lookup failures deny access rather than erroring out.
        match timeout(self.call_timeout, self.store.find_active_admin(user.id)).await {
            Ok(Ok(Some(record))) => AccessCheck::granted(user, record),
            Ok(Ok(None)) => AccessCheck::denied(Some(user), AccessError::NotAdmin),
            Ok(Err(e)) => {
                tracing::error!("Admin record lookup failed for user {}: {}", user.id, e);
                AccessCheck::denied(Some(user), AccessError::NotAdmin)
            }
            Err(_) => {
                tracing::error!("Admin record lookup timed out for user {}", user.id);
                AccessCheck::denied(Some(user), AccessError::NotAdmin)
            }
        }
    }

    pub async fn require_access(
        &self,
        caller: &CallerIdentity,
    ) -> Result<AccessCheck, AdminAccessRequired> {
        let result = self.check_access(caller).await;
        if !result.is_admin {
            return Err(AdminAccessRequired {
                reason: result.error.unwrap_or(AccessError::NotAdmin),
            });
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use uuid::Uuid;

    /// Maps raw tokens straight to users.
    #[derive(Default)]
    struct StaticIdentity {
        tokens: HashMap<String, User>,
        broken: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl IdentityProvider for StaticIdentity {
        async fn resolve(&self, identity: &CallerIdentity) -> Result<Option<User>> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.broken {
                return Err(anyhow!("identity provider offline"));
            }
            Ok(self.tokens.get(identity.as_str()).cloned())
        }
    }

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: Some("Test".to_string()),
            created_at: Utc::now(),
            last_login: None,
        }
    }

    fn admin_record(user_id: Uuid, is_active: bool) -> AdminRecord {
        AdminRecord {
            user_id,
            is_active,
            created_at: Utc::now(),
        }
    }

    struct Fixture {
        gate: AdminGate,
        store: Arc<MemoryStore>,
        admin: User,
        member: User,
        revoked: User,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let admin = user("admin@x.com");
        let member = user("member@x.com");
        let revoked = user("revoked@x.com");
        for u in [&admin, &member, &revoked] {
            store.add_user(u.clone());
        }
        store.add_admin(admin_record(admin.id, true));
        store.add_admin(admin_record(revoked.id, false));

        let mut identity = StaticIdentity::default();
        identity.tokens.insert("admin-token".into(), admin.clone());
        identity.tokens.insert("member-token".into(), member.clone());
        identity.tokens.insert("revoked-token".into(), revoked.clone());

        let gate = AdminGate::new(Arc::new(identity), store.clone(), Duration::from_secs(1));
        Fixture {
            gate,
            store,
            admin,
            member,
            revoked,
        }
    }

    #[tokio::test]
    async fn unknown_caller_is_not_authenticated() {
        let f = fixture();
        let result = f.gate.check_access(&CallerIdentity::new("nobody")).await;
        assert!(!result.is_admin);
        assert_eq!(result.user, None);
        assert_eq!(result.admin_record, None);
        assert_eq!(result.error, Some(AccessError::NotAuthenticated));
    }

    #[tokio::test]
    async fn member_without_grant_is_not_admin() {
        let f = fixture();
        let result = f.gate.check_access(&CallerIdentity::new("member-token")).await;
        assert!(!result.is_admin);
        assert_eq!(result.user, Some(f.member.clone()));
        assert_eq!(result.error, Some(AccessError::NotAdmin));
    }

    #[tokio::test]
    async fn inactive_grant_is_not_admin() {
        let f = fixture();
        let result = f.gate.check_access(&CallerIdentity::new("revoked-token")).await;
        assert!(!result.is_admin);
        assert_eq!(result.user, Some(f.revoked.clone()));
        assert_eq!(result.error, Some(AccessError::NotAdmin));
    }

    #[tokio::test]
    async fn active_admin_is_granted() {
        let f = fixture();
        let result = f.gate.check_access(&CallerIdentity::new("admin-token")).await;
        assert!(result.is_admin);
        assert_eq!(result.user, Some(f.admin.clone()));
        assert_eq!(result.admin_record.as_ref().map(|r| r.user_id), Some(f.admin.id));
        assert_eq!(result.error, None);
    }

    #[tokio::test]
    async fn require_access_mirrors_check_access() {
        let f = fixture();

        let granted = f
            .gate
            .require_access(&CallerIdentity::new("admin-token"))
            .await
            .unwrap();
        let checked = f.gate.check_access(&CallerIdentity::new("admin-token")).await;
        assert_eq!(granted, checked);

        let denied = f
            .gate
            .require_access(&CallerIdentity::new("member-token"))
            .await
            .unwrap_err();
        assert_eq!(denied.reason, AccessError::NotAdmin);

        let denied = f
            .gate
            .require_access(&CallerIdentity::new("nobody"))
            .await
            .unwrap_err();
        assert_eq!(denied.reason, AccessError::NotAuthenticated);
    }

    #[tokio::test]
    async fn revocation_applies_on_next_call() {
        let f = fixture();
        let caller = CallerIdentity::new("admin-token");
        assert!(f.gate.check_access(&caller).await.is_admin);

        f.store.admins.write().unwrap().iter_mut().for_each(|a| {
            if a.user_id == f.admin.id {
                a.is_active = false;
            }
        });

        let result = f.gate.check_access(&caller).await;
        assert!(!result.is_admin);
        assert_eq!(result.error, Some(AccessError::NotAdmin));
    }

    #[tokio::test]
    async fn provider_failure_or_timeout_is_not_authenticated() {
        let store = Arc::new(MemoryStore::new());
        let broken = StaticIdentity {
            broken: true,
            ..StaticIdentity::default()
        };
        let gate = AdminGate::new(Arc::new(broken), store.clone(), Duration::from_secs(1));
        let result = gate.check_access(&CallerIdentity::new("any")).await;
        assert_eq!(result.error, Some(AccessError::NotAuthenticated));

        let slow = StaticIdentity {
            delay: Some(Duration::from_millis(200)),
            ..StaticIdentity::default()
        };
        let gate = AdminGate::new(Arc::new(slow), store, Duration::from_millis(20));
        let result = gate.check_access(&CallerIdentity::new("any")).await;
        assert_eq!(result.error, Some(AccessError::NotAuthenticated));
    }

    #[tokio::test]
    async fn store_failure_fails_closed() {
        let f = fixture();
        f.store.set_failing(true);
        let result = f.gate.check_access(&CallerIdentity::new("admin-token")).await;
        assert!(!result.is_admin);
        assert_eq!(result.user, Some(f.admin.clone()));
        assert_eq!(result.error, Some(AccessError::NotAdmin));
    }

    #[test]
    fn access_check_serializes_in_camel_case() {
        let result = AccessCheck::denied(None, AccessError::NotAuthenticated);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isAdmin"], false);
        assert_eq!(json["error"], "NOT_AUTHENTICATED");
        assert!(json["adminRecord"].is_null());
    }
}
