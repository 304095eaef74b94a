use crate::services::admin_gate::{AccessCheck, AccessError};
use crate::services::identity::CallerIdentity;
use crate::state::SharedState;
use crate::web::error::AppError;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};

/// Bearer header first, then the `session` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(val) = auth.to_str() {
            if let Some(bearer) = val.strip_prefix("Bearer ") {
                let bearer = bearer.trim();
                if !bearer.is_empty() {
                    return Some(bearer.to_string());
                }
            }
        }
    }
    if let Some(cookie) = headers.get(axum::http::header::COOKIE) {
        if let Ok(val) = cookie.to_str() {
            for pair in val.split(';') {
                if let Some(rest) = pair.trim().strip_prefix("session=") {
                    if !rest.is_empty() {
                        return Some(rest.to_string());
                    }
                }
            }
        }
    }
    None
}

// ============================================
// Axum Extractor for admin-only handlers
// ============================================

/// Runs `require_access` for the caller before the handler body.
///
/// Usage:
/// ```rust,ignore
/// async fn handler(AdminAccess(access): AdminAccess) -> Result<...> {
///     // access.is_admin is true
/// }
/// ```
pub struct AdminAccess(pub AccessCheck);

#[async_trait]
impl<S> FromRequestParts<S> for AdminAccess
where
    S: Send + Sync,
    SharedState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let shared_state = SharedState::from_ref(state);

        let Some(token) = extract_token(&parts.headers) else {
            tracing::warn!("Admin endpoint {} called without credentials", parts.uri.path());
            return Err(AppError::AdminAccessRequired(AccessError::NotAuthenticated));
        };

        let access = shared_state
            .gate
            .require_access(&CallerIdentity::new(token))
            .await
            .map_err(|denied| {
                tracing::warn!("Admin access denied on {}: {}", parts.uri.path(), denied);
                AppError::AdminAccessRequired(denied.reason)
            })?;

        Ok(AdminAccess(access))
    }
}
