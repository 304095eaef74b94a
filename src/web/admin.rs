use crate::domain::models::{
    DashboardOverview, DashboardStats, ProgressReport, ProgressSummary, SyncedUser, UserDirectory,
};
use crate::services::admin_gate::AccessCheck;
use crate::services::identity::CallerIdentity;
use crate::services::reporting::ReportingError;
use crate::state::SharedState;
use crate::web::error::AppResult;
use crate::web::session::{self, AdminAccess};
use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub user: SyncedUser,
    pub progress: ProgressSummary,
    pub message: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/access", get(access))
        .route("/dashboard-stats", get(dashboard_stats))
        .route("/dashboard-data", get(dashboard_data))
        .route("/users", get(users))
        .route("/progress", get(progress))
        .route("/force-sync-user", post(force_sync_user))
        .with_state(state)
}

/// Non-fatal check for the admin login page.
async fn access(headers: HeaderMap, State(state): State<SharedState>) -> Json<AccessCheck> {
    let result = match session::extract_token(&headers) {
        Some(token) => state.gate.check_access(&CallerIdentity::new(token)).await,
        None => AccessCheck::unauthenticated(),
    };
    Json(result)
}

async fn dashboard_stats(
    AdminAccess(_admin): AdminAccess,
    State(state): State<SharedState>,
) -> AppResult<Json<DashboardStats>> {
    let stats = state.reporting.dashboard_stats(Utc::now()).await?;
    Ok(Json(stats))
}

async fn dashboard_data(
    AdminAccess(_admin): AdminAccess,
    State(state): State<SharedState>,
) -> AppResult<Json<DashboardOverview>> {
    let overview = state.reporting.dashboard_overview(Utc::now()).await?;
    Ok(Json(overview))
}

async fn users(
    AdminAccess(_admin): AdminAccess,
    State(state): State<SharedState>,
) -> AppResult<Json<UserDirectory>> {
    Ok(Json(state.reporting.user_directory().await?))
}

async fn progress(
    AdminAccess(_admin): AdminAccess,
    State(state): State<SharedState>,
) -> AppResult<Json<ProgressReport>> {
    Ok(Json(state.reporting.progress_report().await?))
}

async fn force_sync_user(
    AdminAccess(admin): AdminAccess,
    State(state): State<SharedState>,
) -> AppResult<Json<SyncResponse>> {
    let Some(target) = state.config.sync_target_email.as_deref() else {
        tracing::error!("Force sync requested but SYNC_TARGET_EMAIL is not configured");
        return Err(ReportingError::SyncFailed.into());
    };

    if let Some(user) = admin.user.as_ref() {
        tracing::info!("Admin {} forced a progress sync for {}", user.email, target);
    }

    let (user, progress) = state.reporting.force_sync_user(target).await?;
    Ok(Json(SyncResponse {
        success: true,
        user,
        progress,
        message: "Usuário sincronizado com sucesso".to_string(),
    }))
}
