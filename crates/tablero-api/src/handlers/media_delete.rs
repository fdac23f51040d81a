use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tablero_core::AppError;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::gate;
use crate::auth::models::CallerContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct DeleteMediaResponse {
    pub ok: bool,
    /// Present when the metadata row was removed but the storage object
    /// could not be deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Delete item media. The metadata row goes first; the storage delete is
/// best-effort and a failure there downgrades to a warning in the response.
#[utoipa::path(
    delete,
    path = "/api/v0/media/{id}",
    tag = "media",
    params(("id" = Uuid, Path, description = "Media ID")),
    responses(
        (status = 200, description = "Media deleted", body = DeleteMediaResponse),
        (status = 403, description = "Viewer cannot delete media", body = ErrorResponse),
        (status = 404, description = "Media not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %caller.user_id, media_id = %id, operation = "delete_media"))]
pub async fn delete_media(
    caller: CallerContext,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let media = state
        .db
        .item_media
        .get_by_id(id)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Media not found".to_string())))?;
    gate::require_editor(&state.db.members, &caller, media.company_id)
        .await
        .map_err(HttpAppError)?;

    let deleted = state
        .db
        .item_media
        .delete(id)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Media not found".to_string())))?;

    let warning = match state.media.storage.delete(&deleted.storage_key).await {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(
                error = %e,
                storage_key = %deleted.storage_key,
                "Storage cleanup failed after row deletion"
            );
            Some(format!(
                "Metadata removed, but the stored file could not be deleted: {}",
                e
            ))
        }
    };

    Ok(Json(DeleteMediaResponse { ok: true, warning }))
}
