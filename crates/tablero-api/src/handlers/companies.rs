use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tablero_core::{models::Company, validation::not_blank, AppError};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::gate;
use crate::auth::models::CallerContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::DbState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCompanyRequest {
    #[validate(custom(function = not_blank))]
    pub name: String,
    #[validate(email)]
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCompanyRequest {
    #[validate(custom(function = not_blank))]
    pub name: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub logo_url: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v0/companies",
    tag = "companies",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = Company),
        (status = 403, description = "Not a platform admin", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, request), fields(user_id = %caller.user_id, operation = "create_company"))]
pub async fn create_company(
    caller: CallerContext,
    State(db): State<DbState>,
    ValidatedJson(request): ValidatedJson<CreateCompanyRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if !caller.is_platform_admin {
        return Err(HttpAppError(AppError::Forbidden(
            "Only platform admins may create companies".to_string(),
        )));
    }

    let company = db
        .companies
        .create(
            request.name.trim().to_string(),
            request.contact_email,
            request.contact_phone,
            request.description,
            request.website_url,
            request.logo_url,
            caller.user_id,
        )
        .await
        .map_err(HttpAppError)?;

    Ok((StatusCode::CREATED, Json(company)))
}

#[utoipa::path(
    get,
    path = "/api/v0/companies",
    tag = "companies",
    responses(
        (status = 200, description = "Companies visible to the caller", body = [Company])
    )
)]
#[tracing::instrument(skip(db), fields(user_id = %caller.user_id))]
pub async fn list_companies(
    caller: CallerContext,
    State(db): State<DbState>,
) -> Result<impl IntoResponse, HttpAppError> {
    let companies = db
        .companies
        .list_for_user(caller.user_id, caller.is_platform_admin)
        .await
        .map_err(HttpAppError)?;
    Ok(Json(companies))
}

#[utoipa::path(
    get,
    path = "/api/v0/companies/{id}",
    tag = "companies",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company", body = Company),
        (status = 404, description = "Company not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db), fields(user_id = %caller.user_id, company_id = %id))]
pub async fn get_company(
    caller: CallerContext,
    Path(id): Path<Uuid>,
    State(db): State<DbState>,
) -> Result<impl IntoResponse, HttpAppError> {
    gate::effective_role(&db.members, &caller, id)
        .await
        .map_err(HttpAppError)?;
    let company = db
        .companies
        .get_by_id(id)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Company not found".to_string())))?;
    Ok(Json(company))
}

#[utoipa::path(
    put,
    path = "/api/v0/companies/{id}",
    tag = "companies",
    params(("id" = Uuid, Path, description = "Company ID")),
    request_body = UpdateCompanyRequest,
    responses(
        (status = 200, description = "Company updated", body = Company),
        (status = 403, description = "Not an admin of this company", body = ErrorResponse),
        (status = 404, description = "Company not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, request), fields(user_id = %caller.user_id, company_id = %id, operation = "update_company"))]
pub async fn update_company(
    caller: CallerContext,
    Path(id): Path<Uuid>,
    State(db): State<DbState>,
    ValidatedJson(request): ValidatedJson<UpdateCompanyRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    gate::require_admin(&db.members, &caller, id)
        .await
        .map_err(HttpAppError)?;

    let company = db
        .companies
        .update(
            id,
            request.name,
            request.contact_email,
            request.contact_phone,
            request.description,
            request.website_url,
            request.logo_url,
            caller.user_id,
        )
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Company not found".to_string())))?;

    Ok(Json(company))
}
