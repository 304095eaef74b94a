use crate::services::admin_gate::AccessError;
use crate::services::reporting::ReportingError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Handler-level errors. Bodies carry a fixed message per condition; details
/// stay in the logs.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("admin access required: {0}")]
    AdminAccessRequired(AccessError),

    #[error(transparent)]
    Reporting(#[from] ReportingError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::AdminAccessRequired(AccessError::NotAuthenticated) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Authentication required" }),
            ),
            AppError::AdminAccessRequired(AccessError::NotAdmin) => (
                StatusCode::FORBIDDEN,
                json!({ "error": "Admin access required" }),
            ),
            AppError::Reporting(ReportingError::StatsUnavailable) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Erro ao buscar estatísticas" }),
            ),
            AppError::Reporting(ReportingError::SyncFailed) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "success": false, "error": "Erro ao sincronizar usuário" }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn access_errors_map_to_auth_statuses() {
        let (status, _) = render(AppError::AdminAccessRequired(AccessError::NotAuthenticated)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = render(AppError::AdminAccessRequired(AccessError::NotAdmin)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn reporting_errors_are_generic_server_errors() {
        let (status, body) = render(ReportingError::StatsUnavailable.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({ "error": "Erro ao buscar estatísticas" }));

        let (status, body) = render(ReportingError::SyncFailed.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }
}
