use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tablero_core::{
    models::{CompanyMember, MemberRole},
    AppError,
};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::gate;
use crate::auth::models::CallerContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::DbState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMemberRequest {
    pub user_id: Uuid,
    pub role: MemberRole,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangeRoleRequest {
    pub role: MemberRole,
}

/// Attach an existing identity to a company. The granted role passes the
/// asymmetric gate rule: editors may only grant viewer.
#[utoipa::path(
    post,
    path = "/api/v0/companies/{id}/members",
    tag = "members",
    params(("id" = Uuid, Path, description = "Company ID")),
    request_body = CreateMemberRequest,
    responses(
        (status = 201, description = "Member created", body = CompanyMember),
        (status = 403, description = "Role grant not allowed", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Already a member", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, request), fields(user_id = %caller.user_id, company_id = %company_id, operation = "create_member"))]
pub async fn create_member(
    caller: CallerContext,
    Path(company_id): Path<Uuid>,
    State(db): State<DbState>,
    ValidatedJson(request): ValidatedJson<CreateMemberRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let actor_role = gate::effective_role(&db.members, &caller, company_id)
        .await
        .map_err(HttpAppError)?;
    gate::check_member_grant(actor_role, request.role).map_err(HttpAppError)?;

    db.identities
        .get_by_id(request.user_id)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound("User not found".to_string())))?;

    let member = db
        .members
        .create(
            company_id,
            request.user_id,
            request.role,
            request.full_name,
            request.phone,
        )
        .await
        .map_err(HttpAppError)?;

    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    get,
    path = "/api/v0/companies/{id}/members",
    tag = "members",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Members of the company", body = [CompanyMember]),
        (status = 403, description = "Not a member", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db), fields(user_id = %caller.user_id, company_id = %company_id))]
pub async fn list_members(
    caller: CallerContext,
    Path(company_id): Path<Uuid>,
    State(db): State<DbState>,
) -> Result<impl IntoResponse, HttpAppError> {
    gate::effective_role(&db.members, &caller, company_id)
        .await
        .map_err(HttpAppError)?;
    let members = db
        .members
        .list_for_company(company_id)
        .await
        .map_err(HttpAppError)?;
    Ok(Json(members))
}

/// Change an existing member's role. Editors may target viewer or editor,
/// never admin.
#[utoipa::path(
    put,
    path = "/api/v0/companies/{id}/members/{user_id}/role",
    tag = "members",
    params(
        ("id" = Uuid, Path, description = "Company ID"),
        ("user_id" = Uuid, Path, description = "Member's user ID")
    ),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = CompanyMember),
        (status = 403, description = "Role change not allowed", body = ErrorResponse),
        (status = 404, description = "Membership not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, request), fields(user_id = %caller.user_id, company_id = %company_id, target_user_id = %target_user_id, operation = "change_member_role"))]
pub async fn change_member_role(
    caller: CallerContext,
    Path((company_id, target_user_id)): Path<(Uuid, Uuid)>,
    State(db): State<DbState>,
    ValidatedJson(request): ValidatedJson<ChangeRoleRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let actor_role = gate::effective_role(&db.members, &caller, company_id)
        .await
        .map_err(HttpAppError)?;
    gate::check_role_change(actor_role, request.role).map_err(HttpAppError)?;

    let member = db
        .members
        .update_role(company_id, target_user_id, request.role)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| {
            HttpAppError(AppError::NotFound(
                "User is not a member of this company".to_string(),
            ))
        })?;

    Ok(Json(member))
}
