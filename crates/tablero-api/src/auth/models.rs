use crate::error::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use uuid::Uuid;

/// Authenticated caller, extracted from the JWT by the auth middleware and
/// stored in request extensions. Company-level roles are not carried here;
/// they are looked up per request by the authorization gate.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub user_id: Uuid,
    pub email: String,
    pub is_platform_admin: bool,
}

// Implement FromRequestParts for CallerContext to work with Multipart
// Extension cannot be used with Multipart, so we extract directly from request parts
impl<S> FromRequestParts<S> for CallerContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerContext>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse {
                        error: "Missing caller context".to_string(),
                        details: None,
                        error_type: None,
                        code: "MISSING_CALLER_CONTEXT".to_string(),
                        recoverable: false,
                    }),
                )
            })
    }
}
