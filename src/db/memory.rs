use super::RecordStore;
use crate::domain::models::{AdminRecord, FunnelModule, ModuleProgress, User};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use uuid::Uuid;

/// In-memory store for tests. `fail` makes every call error, `delay` makes
/// every call sleep first.
#[derive(Default)]
pub struct MemoryStore {
    pub users: RwLock<Vec<User>>,
    pub admins: RwLock<Vec<AdminRecord>>,
    pub modules: RwLock<Vec<FunnelModule>>,
    pub progress: RwLock<Vec<ModuleProgress>>,
    pub fail: AtomicBool,
    pub delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn add_user(&self, user: User) {
        self.users.write().unwrap().push(user);
    }

    pub fn add_admin(&self, record: AdminRecord) {
        self.admins.write().unwrap().push(record);
    }

    pub fn add_module(&self, module: FunnelModule) {
        self.modules.write().unwrap().push(module);
    }

    pub fn add_progress(&self, row: ModuleProgress) {
        self.progress.write().unwrap().push(row);
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    async fn enter(&self) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            bail!("store unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.enter().await?;
        Ok(self.users.read().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.enter().await?;
        let needle = email.trim().to_lowercase();
        Ok(self
            .users
            .read()
            .unwrap()
            .iter()
            .find(|u| u.email.to_lowercase() == needle)
            .cloned())
    }

    async fn find_active_admin(&self, user_id: Uuid) -> Result<Option<AdminRecord>> {
        self.enter().await?;
        Ok(self
            .admins
            .read()
            .unwrap()
            .iter()
            .find(|a| a.user_id == user_id && a.is_active)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.enter().await?;
        let mut users = self.users.read().unwrap().clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn list_modules(&self) -> Result<Vec<FunnelModule>> {
        self.enter().await?;
        let mut modules = self.modules.read().unwrap().clone();
        modules.sort_by(|a, b| (a.order_index, &a.id).cmp(&(b.order_index, &b.id)));
        Ok(modules)
    }

    async fn list_progress(&self) -> Result<Vec<ModuleProgress>> {
        self.enter().await?;
        let mut rows = self.progress.read().unwrap().clone();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    async fn progress_for_user(&self, user_id: Uuid) -> Result<Vec<ModuleProgress>> {
        let rows = self.list_progress().await?;
        Ok(rows.into_iter().filter(|r| r.user_id == user_id).collect())
    }
}
