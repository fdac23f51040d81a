use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tablero_core::{models::FilterPreference, validation::not_blank, AppError};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::gate;
use crate::auth::models::CallerContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::DbState;

#[derive(Debug, Deserialize)]
pub struct PreferenceQuery {
    pub company_id: Uuid,
    pub item_type: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SavePreferenceRequest {
    pub company_id: Uuid,
    #[validate(custom(function = not_blank))]
    pub item_type: String,
    pub attribute_ids: Vec<Uuid>,
}

#[derive(Serialize, ToSchema)]
pub struct PreferenceResponse {
    pub attribute_ids: Vec<Uuid>,
}

/// The caller's saved advanced-filter selection for one (company, item_type)
/// scope. Missing preference reads as an empty selection.
#[utoipa::path(
    get,
    path = "/api/v0/filter-preferences",
    tag = "preferences",
    params(
        ("company_id" = Uuid, Query, description = "Company ID"),
        ("item_type" = String, Query, description = "Item type")
    ),
    responses(
        (status = 200, description = "Saved selection", body = PreferenceResponse),
        (status = 403, description = "Not a member", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db), fields(user_id = %caller.user_id, company_id = %query.company_id))]
pub async fn get_preference(
    caller: CallerContext,
    Query(query): Query<PreferenceQuery>,
    State(db): State<DbState>,
) -> Result<impl IntoResponse, HttpAppError> {
    gate::effective_role(&db.members, &caller, query.company_id)
        .await
        .map_err(HttpAppError)?;
    let preference = db
        .filter_preferences
        .get(caller.user_id, query.company_id, &query.item_type)
        .await
        .map_err(HttpAppError)?;
    Ok(Json(PreferenceResponse {
        attribute_ids: preference.map(|p| p.attribute_ids).unwrap_or_default(),
    }))
}

/// Replace the caller's selection. Every id must be a filterable definition
/// of the given scope.
#[utoipa::path(
    put,
    path = "/api/v0/filter-preferences",
    tag = "preferences",
    request_body = SavePreferenceRequest,
    responses(
        (status = 200, description = "Selection saved", body = FilterPreference),
        (status = 400, description = "Unknown or non-filterable attribute", body = ErrorResponse),
        (status = 403, description = "Not a member", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, request), fields(user_id = %caller.user_id, company_id = %request.company_id, operation = "save_preference"))]
pub async fn save_preference(
    caller: CallerContext,
    State(db): State<DbState>,
    ValidatedJson(request): ValidatedJson<SavePreferenceRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    gate::effective_role(&db.members, &caller, request.company_id)
        .await
        .map_err(HttpAppError)?;

    let definitions = db
        .attribute_definitions
        .list(request.company_id, Some(&request.item_type))
        .await
        .map_err(HttpAppError)?;
    for attribute_id in &request.attribute_ids {
        let definition = definitions
            .iter()
            .find(|d| d.id == *attribute_id)
            .ok_or_else(|| {
                HttpAppError(AppError::InvalidInput(format!(
                    "Unknown attribute {} for this item type",
                    attribute_id
                )))
            })?;
        if !definition.is_filterable {
            return Err(HttpAppError(AppError::InvalidInput(format!(
                "Attribute '{}' is not filterable",
                definition.key
            ))));
        }
    }

    let preference = db
        .filter_preferences
        .upsert(
            caller.user_id,
            request.company_id,
            &request.item_type,
            request.attribute_ids,
        )
        .await
        .map_err(HttpAppError)?;

    Ok(Json(preference))
}
