use crate::domain::models::SubmissionAck;
use crate::services::export;
use crate::state::SharedState;
use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::Value;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/leads", post(submit))
        .route("/api/leads/export", post(export_leads))
        .with_state(state)
}

/// Takes the raw body so that no payload shape can fail the funnel.
async fn submit(State(state): State<SharedState>, body: Bytes) -> Json<SubmissionAck> {
    let payload = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|e| {
            tracing::warn!("Lead submission body is not JSON ({} bytes): {}", body.len(), e);
            Value::Null
        })
    };
    Json(state.leads.submit(payload).await)
}

async fn export_leads(Json(leads): Json<Vec<Value>>) -> impl IntoResponse {
    let csv = export::export_csv(&leads);
    let filename = export::export_filename(Utc::now().date_naive());
    tracing::info!("Exported {} leads to {}", leads.len(), filename);
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
}
