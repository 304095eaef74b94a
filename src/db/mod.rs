#[cfg(test)]
pub mod memory;
pub mod seed;

use crate::domain::models::{AdminRecord, FunnelModule, ModuleProgress, User};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Keyed lookups over users, admin grants, the module catalog and progress.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Admin grant for `user_id`, only if it is active.
    async fn find_active_admin(&self, user_id: Uuid) -> Result<Option<AdminRecord>>;

    /// All users, newest first.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Active modules in funnel order.
    async fn list_modules(&self) -> Result<Vec<FunnelModule>>;

    /// All progress rows, most recently updated first.
    async fn list_progress(&self) -> Result<Vec<ModuleProgress>>;

    async fn progress_for_user(&self, user_id: Uuid) -> Result<Vec<ModuleProgress>>;
}

#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, display_name, created_at, last_login
            FROM user_profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, display_name, created_at, last_login
            FROM user_profiles
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_active_admin(&self, user_id: Uuid) -> Result<Option<AdminRecord>> {
        let record = sqlx::query_as::<_, AdminRecord>(
            r#"
            SELECT user_id, is_active, created_at
            FROM admin_users
            WHERE user_id = $1
              AND is_active = true
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, display_name, created_at, last_login
            FROM user_profiles
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn list_modules(&self) -> Result<Vec<FunnelModule>> {
        let modules = sqlx::query_as::<_, FunnelModule>(
            r#"
            SELECT id, title, category, order_index
            FROM funnel_modules
            WHERE is_active = true
            ORDER BY order_index ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(modules)
    }

    async fn list_progress(&self) -> Result<Vec<ModuleProgress>> {
        let rows = sqlx::query_as::<_, ModuleProgress>(
            r#"
            SELECT user_id, module_id, status, progress_percentage, updated_at
            FROM user_module_progress
            ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn progress_for_user(&self, user_id: Uuid) -> Result<Vec<ModuleProgress>> {
        let rows = sqlx::query_as::<_, ModuleProgress>(
            r#"
            SELECT user_id, module_id, status, progress_percentage, updated_at
            FROM user_module_progress
            WHERE user_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
