use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tablero_core::{
    models::{AttributeDefinition, NewAttributeDefinition},
    validation::{not_blank, parse_import_rows, template_csv, ImportRow},
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
pub struct CreateDefinitionsRequest {
    #[validate(custom(function = not_blank))]
    pub item_type: String,
    #[validate(length(min = 1))]
    pub definitions: Vec<NewAttributeDefinition>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDefinitionRequest {
    #[validate(custom(function = not_blank))]
    pub label: Option<String>,
    pub is_required: Option<bool>,
    pub is_filterable: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ImportDefinitionsRequest {
    #[validate(custom(function = not_blank))]
    pub item_type: String,
    pub rows: Vec<ImportRow>,
}

#[derive(Serialize, ToSchema)]
pub struct ImportDefinitionsResponse {
    pub created: Vec<AttributeDefinition>,
    pub skipped_rows: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListDefinitionsQuery {
    pub item_type: Option<String>,
}

/// Bulk-create attribute definitions for one item type. Keys are derived
/// from labels server-side; duplicates fail the whole batch.
#[utoipa::path(
    post,
    path = "/api/v0/companies/{id}/attribute-definitions",
    tag = "attributes",
    params(("id" = Uuid, Path, description = "Company ID")),
    request_body = CreateDefinitionsRequest,
    responses(
        (status = 201, description = "Definitions created", body = [AttributeDefinition]),
        (status = 400, description = "Empty labels or duplicate keys", body = ErrorResponse),
        (status = 403, description = "Not a company admin", body = ErrorResponse),
        (status = 409, description = "Key already defined", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, request), fields(user_id = %caller.user_id, company_id = %company_id, operation = "create_definitions"))]
pub async fn create_definitions(
    caller: CallerContext,
    Path(company_id): Path<Uuid>,
    State(db): State<DbState>,
    ValidatedJson(request): ValidatedJson<CreateDefinitionsRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    gate::require_admin(&db.members, &caller, company_id)
        .await
        .map_err(HttpAppError)?;

    let created = db
        .attribute_definitions
        .create_bulk(company_id, request.item_type.trim(), &request.definitions)
        .await
        .map_err(HttpAppError)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v0/companies/{id}/attribute-definitions",
    tag = "attributes",
    params(
        ("id" = Uuid, Path, description = "Company ID"),
        ("item_type" = Option<String>, Query, description = "Scope to one item type")
    ),
    responses(
        (status = 200, description = "Definitions", body = [AttributeDefinition]),
        (status = 403, description = "Not a member", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db), fields(user_id = %caller.user_id, company_id = %company_id))]
pub async fn list_definitions(
    caller: CallerContext,
    Path(company_id): Path<Uuid>,
    Query(query): Query<ListDefinitionsQuery>,
    State(db): State<DbState>,
) -> Result<impl IntoResponse, HttpAppError> {
    gate::effective_role(&db.members, &caller, company_id)
        .await
        .map_err(HttpAppError)?;
    let definitions = db
        .attribute_definitions
        .list(company_id, query.item_type.as_deref())
        .await
        .map_err(HttpAppError)?;
    Ok(Json(definitions))
}

/// Update label and flags. `key` and `data_type` are immutable.
#[utoipa::path(
    put,
    path = "/api/v0/attribute-definitions/{id}",
    tag = "attributes",
    params(("id" = Uuid, Path, description = "Definition ID")),
    request_body = UpdateDefinitionRequest,
    responses(
        (status = 200, description = "Definition updated", body = AttributeDefinition),
        (status = 403, description = "Not a company admin", body = ErrorResponse),
        (status = 404, description = "Definition not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, request), fields(user_id = %caller.user_id, definition_id = %id, operation = "update_definition"))]
pub async fn update_definition(
    caller: CallerContext,
    Path(id): Path<Uuid>,
    State(db): State<DbState>,
    ValidatedJson(request): ValidatedJson<UpdateDefinitionRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let definition = db
        .attribute_definitions
        .get_by_id(id)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Definition not found".to_string())))?;
    gate::require_admin(&db.members, &caller, definition.company_id)
        .await
        .map_err(HttpAppError)?;

    let updated = db
        .attribute_definitions
        .update(id, request.label, request.is_required, request.is_filterable)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Definition not found".to_string())))?;

    Ok(Json(updated))
}

/// Import definitions from spreadsheet rows (Label / Data Type / Filtrable /
/// Requerido). Placeholder rows are skipped and malformed rows surface as
/// per-row errors; valid rows are bulk-inserted.
#[utoipa::path(
    post,
    path = "/api/v0/companies/{id}/attribute-definitions/import",
    tag = "attributes",
    params(("id" = Uuid, Path, description = "Company ID")),
    request_body = ImportDefinitionsRequest,
    responses(
        (status = 201, description = "Import outcome", body = ImportDefinitionsResponse),
        (status = 400, description = "No importable rows", body = ErrorResponse),
        (status = 403, description = "Not a company admin", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, request), fields(user_id = %caller.user_id, company_id = %company_id, operation = "import_definitions"))]
pub async fn import_definitions(
    caller: CallerContext,
    Path(company_id): Path<Uuid>,
    State(db): State<DbState>,
    ValidatedJson(request): ValidatedJson<ImportDefinitionsRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    gate::require_admin(&db.members, &caller, company_id)
        .await
        .map_err(HttpAppError)?;

    let outcome = parse_import_rows(&request.rows).map_err(HttpAppError)?;
    if outcome.definitions.is_empty() {
        return Err(HttpAppError(AppError::InvalidInput(format!(
            "No importable rows: {}",
            outcome.errors.join("; ")
        ))));
    }

    let created = db
        .attribute_definitions
        .create_bulk(company_id, request.item_type.trim(), &outcome.definitions)
        .await
        .map_err(HttpAppError)?;

    Ok((
        StatusCode::CREATED,
        Json(ImportDefinitionsResponse {
            created,
            skipped_rows: outcome.skipped_rows,
            errors: outcome.errors,
        }),
    ))
}

/// The downloadable CSV template for the import.
#[utoipa::path(
    get,
    path = "/api/v0/companies/{id}/attribute-definitions/template",
    tag = "attributes",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "CSV template", content_type = "text/csv")
    )
)]
#[tracing::instrument(skip(db), fields(user_id = %caller.user_id, company_id = %company_id))]
pub async fn definition_template(
    caller: CallerContext,
    Path(company_id): Path<Uuid>,
    State(db): State<DbState>,
) -> Result<impl IntoResponse, HttpAppError> {
    gate::effective_role(&db.members, &caller, company_id)
        .await
        .map_err(HttpAppError)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"atributos.csv\"",
            ),
        ],
        template_csv(),
    ))
}
