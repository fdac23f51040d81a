use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tablero_core::{
    models::{BlogPost, PublishStatus},
    validation::{derive_key, not_blank},
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
pub struct CreatePostRequest {
    #[validate(custom(function = not_blank))]
    pub title: String,
    /// Derived from the title when absent.
    pub slug: Option<String>,
    pub body: String,
    pub status: Option<PublishStatus>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePostRequest {
    #[validate(custom(function = not_blank))]
    pub title: Option<String>,
    pub body: Option<String>,
    pub status: Option<PublishStatus>,
}

#[utoipa::path(
    post,
    path = "/api/v0/companies/{id}/blog",
    tag = "blog",
    params(("id" = Uuid, Path, description = "Company ID")),
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = BlogPost),
        (status = 403, description = "Viewer cannot create posts", body = ErrorResponse),
        (status = 409, description = "Slug already used", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, request), fields(user_id = %caller.user_id, company_id = %company_id, operation = "create_post"))]
pub async fn create_post(
    caller: CallerContext,
    Path(company_id): Path<Uuid>,
    State(db): State<DbState>,
    ValidatedJson(request): ValidatedJson<CreatePostRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    gate::require_editor(&db.members, &caller, company_id)
        .await
        .map_err(HttpAppError)?;

    let slug = match request.slug {
        Some(slug) if !slug.trim().is_empty() => slug.trim().to_lowercase(),
        _ => derive_key(&request.title).replace('_', "-"),
    };
    if slug.is_empty() {
        return Err(HttpAppError(AppError::InvalidInput(
            "Title produces an empty slug".to_string(),
        )));
    }

    let post = db
        .blog
        .create(
            company_id,
            request.title.trim().to_string(),
            slug,
            request.body,
            request.status.unwrap_or(PublishStatus::Draft),
            caller.user_id,
        )
        .await
        .map_err(HttpAppError)?;

    Ok((StatusCode::CREATED, Json(post)))
}

#[utoipa::path(
    get,
    path = "/api/v0/companies/{id}/blog",
    tag = "blog",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Posts of the company", body = [BlogPost]),
        (status = 403, description = "Not a member", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db), fields(user_id = %caller.user_id, company_id = %company_id))]
pub async fn list_posts(
    caller: CallerContext,
    Path(company_id): Path<Uuid>,
    State(db): State<DbState>,
) -> Result<impl IntoResponse, HttpAppError> {
    gate::effective_role(&db.members, &caller, company_id)
        .await
        .map_err(HttpAppError)?;
    let posts = db
        .blog
        .list_for_company(company_id)
        .await
        .map_err(HttpAppError)?;
    Ok(Json(posts))
}

#[utoipa::path(
    put,
    path = "/api/v0/blog/{id}",
    tag = "blog",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = BlogPost),
        (status = 403, description = "Viewer cannot update posts", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, request), fields(user_id = %caller.user_id, post_id = %id, operation = "update_post"))]
pub async fn update_post(
    caller: CallerContext,
    Path(id): Path<Uuid>,
    State(db): State<DbState>,
    ValidatedJson(request): ValidatedJson<UpdatePostRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let post = fetch_post(&db, id).await?;
    gate::require_editor(&db.members, &caller, post.company_id)
        .await
        .map_err(HttpAppError)?;

    let updated = db
        .blog
        .update(id, request.title, request.body, request.status)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Post not found".to_string())))?;

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/v0/blog/{id}",
    tag = "blog",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 403, description = "Viewer cannot delete posts", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db), fields(user_id = %caller.user_id, post_id = %id, operation = "delete_post"))]
pub async fn delete_post(
    caller: CallerContext,
    Path(id): Path<Uuid>,
    State(db): State<DbState>,
) -> Result<impl IntoResponse, HttpAppError> {
    let post = fetch_post(&db, id).await?;
    gate::require_editor(&db.members, &caller, post.company_id)
        .await
        .map_err(HttpAppError)?;

    if !db.blog.delete(id).await.map_err(HttpAppError)? {
        return Err(HttpAppError(AppError::NotFound(
            "Post not found".to_string(),
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_post(db: &DbState, id: Uuid) -> Result<BlogPost, HttpAppError> {
    db.blog
        .get_by_id(id)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Post not found".to_string())))
}
