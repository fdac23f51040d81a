use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tablero_core::{
    models::{AttributeValue, ItemAttribute},
    AppError,
};
use tablero_db::coerce_value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::gate;
use crate::auth::models::CallerContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::items::fetch_item;
use crate::state::DbState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpsertValueRequest {
    /// Raw JSON value; null clears. Coerced by the definition's data_type.
    pub value: JsonValue,
}

#[derive(Serialize, ToSchema)]
pub struct UpsertValueResponse {
    pub item_id: Uuid,
    pub attribute_id: Uuid,
    pub value: Option<AttributeValue>,
}

/// Upsert one typed attribute value. The write is keyed on
/// (item, attribute), so repeating it replaces rather than duplicates.
#[utoipa::path(
    put,
    path = "/api/v0/items/{id}/attributes/{attribute_id}",
    tag = "attributes",
    params(
        ("id" = Uuid, Path, description = "Item ID"),
        ("attribute_id" = Uuid, Path, description = "Attribute definition ID")
    ),
    request_body = UpsertValueRequest,
    responses(
        (status = 200, description = "Value upserted", body = UpsertValueResponse),
        (status = 400, description = "Type mismatch or required value cleared", body = ErrorResponse),
        (status = 403, description = "Viewer cannot write values", body = ErrorResponse),
        (status = 404, description = "Item or definition not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, request), fields(user_id = %caller.user_id, item_id = %item_id, attribute_id = %attribute_id, operation = "upsert_value"))]
pub async fn upsert_value(
    caller: CallerContext,
    Path((item_id, attribute_id)): Path<(Uuid, Uuid)>,
    State(db): State<DbState>,
    ValidatedJson(request): ValidatedJson<UpsertValueRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let item = fetch_item(&db, item_id).await?;
    gate::require_editor(&db.members, &caller, item.company_id)
        .await
        .map_err(HttpAppError)?;

    let definition = db
        .attribute_definitions
        .get_by_id(attribute_id)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Definition not found".to_string())))?;

    if definition.company_id != item.company_id || definition.item_type != item.item_type {
        return Err(HttpAppError(AppError::InvalidInput(format!(
            "Attribute '{}' does not apply to item type '{}'",
            definition.key, item.item_type
        ))));
    }

    let value = coerce_value(&definition, &request.value).map_err(HttpAppError)?;
    if value.is_none() && definition.is_required {
        return Err(HttpAppError(AppError::InvalidInput(format!(
            "Attribute '{}' is required and cannot be cleared",
            definition.key
        ))));
    }

    db.attribute_values
        .upsert(item_id, attribute_id, value.clone())
        .await
        .map_err(HttpAppError)?;

    Ok(Json(UpsertValueResponse {
        item_id,
        attribute_id,
        value,
    }))
}

/// All definitions of the item's scope joined with its current values.
#[utoipa::path(
    get,
    path = "/api/v0/items/{id}/attributes",
    tag = "attributes",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Typed values", body = [ItemAttribute]),
        (status = 404, description = "Item not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db), fields(user_id = %caller.user_id, item_id = %id))]
pub async fn list_item_attributes(
    caller: CallerContext,
    Path(id): Path<Uuid>,
    State(db): State<DbState>,
) -> Result<impl IntoResponse, HttpAppError> {
    let item = fetch_item(&db, id).await?;
    gate::effective_role(&db.members, &caller, item.company_id)
        .await
        .map_err(HttpAppError)?;

    let attributes = db
        .attribute_values
        .list_for_item(id, item.company_id, &item.item_type)
        .await
        .map_err(HttpAppError)?;

    Ok(Json(attributes))
}
