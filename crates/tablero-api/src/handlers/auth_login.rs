use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tablero_core::{models::UserIdentity, AppError};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::jwt::issue_token;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserIdentity,
}

#[utoipa::path(
    post,
    path = "/api/v0/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "login"))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let identity = state
        .db
        .identities
        .get_by_email(&request.email)
        .await
        .map_err(HttpAppError)?;

    // Same message for unknown email and wrong password.
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let identity = identity.ok_or_else(|| HttpAppError(invalid()))?;
    let hash = identity
        .password_hash
        .clone()
        .ok_or_else(|| HttpAppError(invalid()))?;

    let matches = bcrypt::verify(&request.password, &hash)
        .map_err(|e| HttpAppError(AppError::Internal(format!("Password check failed: {}", e))))?;
    if !matches {
        return Err(HttpAppError(invalid()));
    }

    let token = issue_token(&identity, &state.config.jwt_secret, state.config.jwt_expiry_hours)
        .map_err(HttpAppError)?;

    Ok(Json(LoginResponse {
        token,
        user: identity,
    }))
}
