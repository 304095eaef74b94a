use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "module_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Display name, falling back to the local part of the email.
    pub fn name(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .filter(|local| !local.is_empty())
                .unwrap_or("Unknown")
                .to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct AdminRecord {
    pub user_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct FunnelModule {
    pub id: String,
    pub title: String,
    pub category: String,
    pub order_index: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct ModuleProgress {
    pub user_id: Uuid,
    pub module_id: String,
    pub status: ModuleStatus,
    pub progress_percentage: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    pub question_id: Option<i64>,
    pub score: Option<i64>,
    pub theme: Option<String>,
}

/// Typed view over a raw quiz payload. Every field is optional; a missing or
/// mistyped field is read as absent without affecting the others.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct QuizSubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub answers: Vec<QuizAnswer>,
    pub utm_source: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_content: Option<String>,
    pub utm_term: Option<String>,
    pub interessado: bool,
    pub total_score: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionAck {
    pub success: bool,
    pub message: String,
    pub lead_id: String,
    pub timestamp: DateTime<Utc>,
    pub lead_data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecentUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub progress_percentage: i32,
    pub completed_steps: i64,
    pub total_steps: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryProgress {
    pub category: String,
    pub completed: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub new_this_week: i64,
    pub active_users: i64,
    pub completions: i64,
    pub completed_funnels: i64,
    pub recent_users: Vec<RecentUser>,
    pub progress_by_category: Vec<CategoryProgress>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncedUser {
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressSummary {
    pub email: String,
    pub total_steps: i64,
    pub completed_steps: i64,
    pub current_protocol: Option<String>,
    pub last_activity: Option<DateTime<Utc>>,
    pub progress_percentage: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverviewStats {
    pub total_users: i64,
    pub new_users_week: i64,
    pub new_users_month: i64,
    pub total_completions: i64,
    pub active_users_week: i64,
    pub active_users_month: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverviewUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressEntry {
    pub user_id: Uuid,
    pub email: String,
    pub protocol_id: String,
    pub status: ModuleStatus,
    pub progress_percentage: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub stats: OverviewStats,
    pub recent_users: Vec<OverviewUser>,
    pub progress_summary: Vec<ProgressEntry>,
}

/// One row of the admin user directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserListing {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub completed_steps: i64,
    pub total_steps: i64,
    pub progress_percentage: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserDirectory {
    pub users: Vec<UserListing>,
}

/// A progress row joined with its user and module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRow {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub module_id: String,
    pub module_title: Option<String>,
    pub category: Option<String>,
    pub status: ModuleStatus,
    pub progress_percentage: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub progress: Vec<ProgressRow>,
    pub category_stats: Vec<CategoryProgress>,
}
