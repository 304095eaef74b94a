//! Admin reporting: dashboard aggregates and on-demand progress sync.
//!
//! Read-only over the record store. Access control happens in front of
//! these calls, not inside them.

use crate::db::RecordStore;
use crate::domain::models::{
    CategoryProgress, DashboardOverview, DashboardStats, FunnelModule, ModuleProgress,
    ModuleStatus, OverviewStats, OverviewUser, ProgressEntry, ProgressReport, ProgressRow,
    ProgressSummary, RecentUser, SyncedUser, User, UserDirectory, UserListing,
};
use anyhow::anyhow;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const DEFAULT_RECENT_USERS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReportingError {
    #[error("dashboard statistics are unavailable")]
    StatsUnavailable,
    #[error("user sync failed")]
    SyncFailed,
}

#[derive(Clone)]
pub struct Reporting {
    store: Arc<dyn RecordStore>,
    call_timeout: Duration,
    recent_limit: usize,
}

impl Reporting {
    pub fn new(store: Arc<dyn RecordStore>, call_timeout: Duration, recent_limit: usize) -> Self {
        Self {
            store,
            call_timeout,
            recent_limit,
        }
    }

    async fn guarded<T>(
        &self,
        what: &str,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| anyhow!("{what} timed out after {:?}", self.call_timeout))?
    }

    async fn snapshot(&self) -> anyhow::Result<(Vec<User>, Vec<FunnelModule>, Vec<ModuleProgress>)> {
        let users = self.guarded("list users", self.store.list_users()).await?;
        let modules = self.guarded("list modules", self.store.list_modules()).await?;
        let progress = self.guarded("list progress", self.store.list_progress()).await?;
        Ok((users, modules, progress))
    }

    pub async fn dashboard_stats(&self, now: DateTime<Utc>) -> Result<DashboardStats, ReportingError> {
        let (users, modules, progress) = self.snapshot().await.map_err(|e| {
            tracing::error!("Failed to load dashboard data: {:#}", e);
            ReportingError::StatsUnavailable
        })?;
        Ok(compute_dashboard_stats(
            &users,
            &modules,
            &progress,
            now,
            self.recent_limit,
        ))
    }

    pub async fn dashboard_overview(
        &self,
        now: DateTime<Utc>,
    ) -> Result<DashboardOverview, ReportingError> {
        let (users, modules, progress) = self.snapshot().await.map_err(|e| {
            tracing::error!("Failed to load dashboard overview: {:#}", e);
            ReportingError::StatsUnavailable
        })?;
        Ok(compute_overview(
            &users,
            &modules,
            &progress,
            now,
            self.recent_limit,
        ))
    }

    pub async fn user_directory(&self) -> Result<UserDirectory, ReportingError> {
        let (users, modules, progress) = self.snapshot().await.map_err(|e| {
            tracing::error!("Failed to load user directory: {:#}", e);
            ReportingError::StatsUnavailable
        })?;
        Ok(compute_user_directory(&users, &modules, &progress))
    }

    pub async fn progress_report(&self) -> Result<ProgressReport, ReportingError> {
        let (users, modules, progress) = self.snapshot().await.map_err(|e| {
            tracing::error!("Failed to load progress report: {:#}", e);
            ReportingError::StatsUnavailable
        })?;
        Ok(compute_progress_report(&users, &modules, &progress))
    }

    /// Re-derives one user's funnel progress from the store.
    pub async fn force_sync_user(
        &self,
        email: &str,
    ) -> Result<(SyncedUser, ProgressSummary), ReportingError> {
        let sync = async {
            let user = self
                .guarded("find user", self.store.find_user_by_email(email))
                .await?
                .ok_or_else(|| anyhow!("no user profile for {email}"))?;
            let modules = self.guarded("list modules", self.store.list_modules()).await?;
            let rows = self
                .guarded("load progress", self.store.progress_for_user(user.id))
                .await?;
            anyhow::Ok((user, modules, rows))
        };

        let (user, modules, rows) = sync.await.map_err(|e| {
            tracing::error!("Force sync failed for {}: {:#}", email, e);
            ReportingError::SyncFailed
        })?;

        let summary = derive_progress(&user, &modules, &rows);
        tracing::info!(
            "Synced {}: {}/{} steps ({}%)",
            user.email,
            summary.completed_steps,
            summary.total_steps,
            summary.progress_percentage
        );

        let synced = SyncedUser {
            email: user.email.clone(),
            name: user.name(),
            created_at: user.created_at,
            last_login: user.last_login,
        };
        Ok((synced, summary))
    }
}

fn percentage(done: i64, total: i64) -> i32 {
    if total <= 0 {
        return 0;
    }
    ((done as f64 * 100.0) / total as f64).round() as i32
}

/// Completed modules per user, deduplicated and restricted to known users
/// and active modules.
fn completed_by_user<'a>(
    users: &[User],
    modules: &'a [FunnelModule],
    progress: &[ModuleProgress],
) -> HashMap<Uuid, HashSet<&'a str>> {
    let known_users: HashSet<Uuid> = users.iter().map(|u| u.id).collect();
    let active: HashSet<&'a str> = modules.iter().map(|m| m.id.as_str()).collect();

    let mut out: HashMap<Uuid, HashSet<&'a str>> = HashMap::new();
    for row in progress {
        if row.status != ModuleStatus::Completed || !known_users.contains(&row.user_id) {
            continue;
        }
        if let Some(module_id) = active.get(row.module_id.as_str()).copied() {
            out.entry(row.user_id).or_default().insert(module_id);
        }
    }
    out
}

fn active_since(progress: &[ModuleProgress], since: DateTime<Utc>) -> i64 {
    progress
        .iter()
        .filter(|p| p.updated_at >= since)
        .map(|p| p.user_id)
        .collect::<HashSet<_>>()
        .len() as i64
}

/// Completed vs possible (module, user) pairs per category, in catalog order.
fn category_progress(
    user_count: i64,
    modules: &[FunnelModule],
    completed: &HashMap<Uuid, HashSet<&str>>,
) -> Vec<CategoryProgress> {
    let module_category: HashMap<&str, &str> = modules
        .iter()
        .map(|m| (m.id.as_str(), m.category.as_str()))
        .collect();
    let mut categories: Vec<&str> = Vec::new();
    let mut modules_per_category: HashMap<&str, i64> = HashMap::new();
    for module in modules {
        let count = modules_per_category.entry(module.category.as_str()).or_insert(0);
        if *count == 0 {
            categories.push(module.category.as_str());
        }
        *count += 1;
    }
    let mut completed_per_category: HashMap<&str, i64> = HashMap::new();
    for module_id in completed.values().flatten() {
        if let Some(category) = module_category.get(module_id) {
            *completed_per_category.entry(*category).or_insert(0) += 1;
        }
    }
    categories
        .into_iter()
        .map(|category| CategoryProgress {
            category: category.to_string(),
            completed: completed_per_category.get(category).copied().unwrap_or(0),
            total: modules_per_category.get(category).copied().unwrap_or(0) * user_count,
        })
        .collect()
}

pub fn compute_dashboard_stats(
    users: &[User],
    modules: &[FunnelModule],
    progress: &[ModuleProgress],
    now: DateTime<Utc>,
    recent_limit: usize,
) -> DashboardStats {
    let week_ago = now - ChronoDuration::days(7);
    let total_steps = modules.len() as i64;
    let completed = completed_by_user(users, modules, progress);

    let mut newest: Vec<&User> = users.iter().collect();
    newest.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let recent_users = newest
        .into_iter()
        .take(recent_limit)
        .map(|user| {
            let done = completed.get(&user.id).map_or(0, |set| set.len() as i64);
            RecentUser {
                id: user.id,
                email: user.email.clone(),
                name: user.name(),
                created_at: user.created_at,
                last_login: user.last_login,
                progress_percentage: percentage(done, total_steps),
                completed_steps: done,
                total_steps,
            }
        })
        .collect();

    DashboardStats {
        total_users: users.len() as i64,
        new_this_week: users.iter().filter(|u| u.created_at >= week_ago).count() as i64,
        active_users: active_since(progress, week_ago),
        completions: completed.values().map(|set| set.len() as i64).sum(),
        completed_funnels: if total_steps == 0 {
            0
        } else {
            completed
                .values()
                .filter(|set| set.len() as i64 == total_steps)
                .count() as i64
        },
        recent_users,
        progress_by_category: category_progress(users.len() as i64, modules, &completed),
    }
}

pub fn compute_overview(
    users: &[User],
    modules: &[FunnelModule],
    progress: &[ModuleProgress],
    now: DateTime<Utc>,
    recent_limit: usize,
) -> DashboardOverview {
    let week_ago = now - ChronoDuration::days(7);
    let month_ago = now - ChronoDuration::days(30);
    let emails: HashMap<Uuid, &str> = users.iter().map(|u| (u.id, u.email.as_str())).collect();

    let mut newest: Vec<&User> = users.iter().collect();
    newest.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let stats = OverviewStats {
        total_users: users.len() as i64,
        new_users_week: users.iter().filter(|u| u.created_at >= week_ago).count() as i64,
        new_users_month: users.iter().filter(|u| u.created_at >= month_ago).count() as i64,
        total_completions: completed_by_user(users, modules, progress)
            .values()
            .map(|set| set.len() as i64)
            .sum(),
        active_users_week: active_since(progress, week_ago),
        active_users_month: active_since(progress, month_ago),
    };

    let recent_users = newest
        .into_iter()
        .take(recent_limit)
        .map(|user| OverviewUser {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            created_at: user.created_at,
            first_name: user.name(),
            last_name: String::new(),
        })
        .collect();

    let mut rows: Vec<&ModuleProgress> = progress.iter().collect();
    rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    let progress_summary = rows
        .into_iter()
        .map(|p| ProgressEntry {
            user_id: p.user_id,
            email: emails.get(&p.user_id).copied().unwrap_or("Unknown").to_string(),
            protocol_id: p.module_id.clone(),
            status: p.status.clone(),
            progress_percentage: p.progress_percentage,
        })
        .collect();

    DashboardOverview {
        stats,
        recent_users,
        progress_summary,
    }
}

/// Every user, newest first, with their funnel completion.
pub fn compute_user_directory(
    users: &[User],
    modules: &[FunnelModule],
    progress: &[ModuleProgress],
) -> UserDirectory {
    let total_steps = modules.len() as i64;
    let completed = completed_by_user(users, modules, progress);
    let mut last_activity: HashMap<Uuid, DateTime<Utc>> = HashMap::new();
    for row in progress {
        let seen = last_activity.entry(row.user_id).or_insert(row.updated_at);
        if row.updated_at > *seen {
            *seen = row.updated_at;
        }
    }

    let mut newest: Vec<&User> = users.iter().collect();
    newest.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let users = newest
        .into_iter()
        .map(|user| {
            let done = completed.get(&user.id).map_or(0, |set| set.len() as i64);
            UserListing {
                id: user.id,
                email: user.email.clone(),
                name: user.name(),
                created_at: user.created_at,
                last_login: user.last_login,
                last_activity: last_activity.get(&user.id).copied(),
                completed_steps: done,
                total_steps,
                progress_percentage: percentage(done, total_steps),
            }
        })
        .collect();
    UserDirectory { users }
}

/// Progress rows of known users, most recently updated first, plus the
/// per-category completion totals.
pub fn compute_progress_report(
    users: &[User],
    modules: &[FunnelModule],
    progress: &[ModuleProgress],
) -> ProgressReport {
    let by_id: HashMap<Uuid, &User> = users.iter().map(|u| (u.id, u)).collect();
    let by_module: HashMap<&str, &FunnelModule> =
        modules.iter().map(|m| (m.id.as_str(), m)).collect();

    let mut rows: Vec<ProgressRow> = progress
        .iter()
        .filter_map(|p| {
            let user = by_id.get(&p.user_id)?;
            let module = by_module.get(p.module_id.as_str());
            Some(ProgressRow {
                user_id: p.user_id,
                email: user.email.clone(),
                name: user.name(),
                module_id: p.module_id.clone(),
                module_title: module.map(|m| m.title.clone()),
                category: module.map(|m| m.category.clone()),
                status: p.status.clone(),
                progress_percentage: p.progress_percentage,
                updated_at: p.updated_at,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let completed = completed_by_user(users, modules, progress);
    ProgressReport {
        progress: rows,
        category_stats: category_progress(users.len() as i64, modules, &completed),
    }
}

pub fn derive_progress(
    user: &User,
    modules: &[FunnelModule],
    rows: &[ModuleProgress],
) -> ProgressSummary {
    let titles: HashMap<&str, &str> = modules
        .iter()
        .map(|m| (m.id.as_str(), m.title.as_str()))
        .collect();
    let own: Vec<&ModuleProgress> = rows
        .iter()
        .filter(|r| r.user_id == user.id && titles.contains_key(r.module_id.as_str()))
        .collect();

    let completed_steps = own
        .iter()
        .filter(|r| r.status == ModuleStatus::Completed)
        .map(|r| r.module_id.as_str())
        .collect::<HashSet<_>>()
        .len() as i64;
    let total_steps = modules.len() as i64;

    let latest_open = own
        .iter()
        .filter(|r| r.status != ModuleStatus::Completed)
        .max_by_key(|r| r.updated_at);
    let latest_any = own.iter().max_by_key(|r| r.updated_at);
    let current_protocol = latest_open
        .or(latest_any)
        .and_then(|r| titles.get(r.module_id.as_str()))
        .map(|title| title.to_string());

    ProgressSummary {
        email: user.email.clone(),
        total_steps,
        completed_steps,
        current_protocol,
        last_activity: latest_any.map(|r| r.updated_at),
        progress_percentage: percentage(completed_steps, total_steps),
    }
}
