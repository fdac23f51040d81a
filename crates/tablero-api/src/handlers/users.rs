//! User creation sagas.
//!
//! Identity creation stands in for the external auth provider call, which
//! makes "create identity, then attach membership" a two-step write. The
//! compensation is typed: membership failure deletes the identity created in
//! step one, so a half-created user never survives the request.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tablero_core::{
    models::{CompanyMember, MemberRole, UserIdentity},
    validation::validate_password,
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
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
    pub company_id: Uuid,
    pub role: MemberRole,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct InviteUserRequest {
    #[validate(email)]
    pub email: String,
    pub company_id: Uuid,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CreatedUserResponse {
    pub user: UserIdentity,
    pub member: CompanyMember,
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub company_id: Option<Uuid>,
}

/// Create a login identity with a password and attach it to a company.
#[utoipa::path(
    post,
    path = "/api/v0/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = CreatedUserResponse),
        (status = 400, description = "Password policy violation", body = ErrorResponse),
        (status = 403, description = "Role grant not allowed", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, request), fields(user_id = %caller.user_id, operation = "create_user"))]
pub async fn create_user(
    caller: CallerContext,
    State(db): State<DbState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let actor_role = gate::effective_role(&db.members, &caller, request.company_id)
        .await
        .map_err(HttpAppError)?;
    gate::check_member_grant(actor_role, request.role).map_err(HttpAppError)?;

    let email = request.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(HttpAppError(AppError::InvalidInput(
            "A valid email is required".to_string(),
        )));
    }
    // Policy check runs before any identity write.
    validate_password(&request.password).map_err(HttpAppError)?;

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
        .map_err(|e| HttpAppError(AppError::Internal(format!("Password hash failed: {}", e))))?;

    let identity = db
        .identities
        .create(email, Some(password_hash))
        .await
        .map_err(HttpAppError)?;

    let member = attach_membership(
        &db,
        identity.id,
        request.company_id,
        request.role,
        request.full_name,
        request.phone,
        true,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse {
            user: identity,
            member,
        }),
    ))
}

/// Invite a user by email: identity without a password, always viewer.
/// Reuses an existing identity when the email is already registered; the
/// compensation then skips the identity delete.
#[utoipa::path(
    post,
    path = "/api/v0/users/invite",
    tag = "users",
    request_body = InviteUserRequest,
    responses(
        (status = 201, description = "User invited", body = CreatedUserResponse),
        (status = 403, description = "Not allowed to invite", body = ErrorResponse),
        (status = 409, description = "Already a member", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, request), fields(user_id = %caller.user_id, operation = "invite_user"))]
pub async fn invite_user(
    caller: CallerContext,
    State(db): State<DbState>,
    ValidatedJson(request): ValidatedJson<InviteUserRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let actor_role = gate::effective_role(&db.members, &caller, request.company_id)
        .await
        .map_err(HttpAppError)?;
    gate::check_member_grant(actor_role, MemberRole::Viewer).map_err(HttpAppError)?;

    let email = request.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(HttpAppError(AppError::InvalidInput(
            "A valid email is required".to_string(),
        )));
    }

    let existing = db.identities.get_by_email(&email).await.map_err(HttpAppError)?;
    let created_here = existing.is_none();
    let identity = match existing {
        Some(identity) => identity,
        None => db
            .identities
            .create(email, None)
            .await
            .map_err(HttpAppError)?,
    };

    let member = attach_membership(
        &db,
        identity.id,
        request.company_id,
        MemberRole::Viewer,
        request.full_name,
        request.phone,
        created_here,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse {
            user: identity,
            member,
        }),
    ))
}

/// Step two of both sagas. On failure, compensates by deleting the identity
/// when this request created it.
async fn attach_membership(
    db: &DbState,
    user_id: Uuid,
    company_id: Uuid,
    role: MemberRole,
    full_name: Option<String>,
    phone: Option<String>,
    compensate_identity: bool,
) -> Result<CompanyMember, HttpAppError> {
    match db
        .members
        .create(company_id, user_id, role, full_name, phone)
        .await
    {
        Ok(member) => Ok(member),
        Err(e) => {
            if compensate_identity {
                if let Err(cleanup_err) = db.identities.delete(user_id).await {
                    tracing::error!(
                        error = %cleanup_err,
                        user_id = %user_id,
                        "Compensating identity delete failed; identity row is orphaned"
                    );
                } else {
                    tracing::warn!(
                        user_id = %user_id,
                        "Membership creation failed; identity rolled back"
                    );
                }
            }
            Err(HttpAppError(e))
        }
    }
}

/// List users: company admins see their company's users, platform admins may
/// omit the scope and see everyone.
#[utoipa::path(
    get,
    path = "/api/v0/users",
    tag = "users",
    params(("company_id" = Option<Uuid>, Query, description = "Scope to one company")),
    responses(
        (status = 200, description = "Users", body = [UserIdentity]),
        (status = 403, description = "Not allowed to list users", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db), fields(user_id = %caller.user_id))]
pub async fn list_users(
    caller: CallerContext,
    Query(query): Query<ListUsersQuery>,
    State(db): State<DbState>,
) -> Result<impl IntoResponse, HttpAppError> {
    let users = match query.company_id {
        Some(company_id) => {
            gate::require_admin(&db.members, &caller, company_id)
                .await
                .map_err(HttpAppError)?;
            db.identities
                .list_for_company(company_id)
                .await
                .map_err(HttpAppError)?
        }
        None => {
            if !caller.is_platform_admin {
                return Err(HttpAppError(AppError::Forbidden(
                    "A company_id scope is required".to_string(),
                )));
            }
            db.identities.list_all().await.map_err(HttpAppError)?
        }
    };
    Ok(Json(users))
}
