//! Item media upload.
//!
//! Validation runs to completion before the first storage write: MIME
//! allowlist, size ceiling, pdf-requires-description, and the per-item count
//! caps. The write itself is a two-step saga: put the object, insert the
//! metadata row, and on insert failure delete the just-written object so no
//! orphan survives the request.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use std::sync::Arc;
use tablero_core::{
    constants::{MAX_ITEM_IMAGES, MAX_ITEM_PDFS},
    models::{ItemMedia, MediaFileType},
    AppError,
};
use tablero_storage::keys::generate_media_key;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::gate;
use crate::auth::models::CallerContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Default)]
struct UploadForm {
    data: Option<Bytes>,
    content_type: Option<String>,
    filename: Option<String>,
    description: Option<String>,
    is_cover: bool,
    sort_order: i32,
}

#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadMediaForm {
    #[schema(value_type = String, format = Binary)]
    pub file: String,
    pub description: Option<String>,
    pub is_cover: Option<bool>,
    pub sort_order: Option<i32>,
}

#[utoipa::path(
    post,
    path = "/api/v0/items/{id}/media",
    tag = "media",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body(content = UploadMediaForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Media uploaded", body = ItemMedia),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Viewer cannot upload media", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(user_id = %caller.user_id, item_id = %item_id, operation = "upload_media"))]
pub async fn upload_media(
    caller: CallerContext,
    Path(item_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let item = state
        .db
        .items
        .get_by_id(item_id)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Item not found".to_string())))?;
    gate::require_editor(&state.db.members, &caller, item.company_id)
        .await
        .map_err(HttpAppError)?;

    let form = read_form(multipart).await?;

    let data = form.data.ok_or_else(|| {
        HttpAppError(AppError::InvalidInput(
            "Missing 'file' field in the upload".to_string(),
        ))
    })?;
    let content_type = form.content_type.unwrap_or_default();

    let file_type = validate_upload_file(
        &content_type,
        &data,
        form.description.as_deref(),
        state.media.max_file_size,
    )
    .map_err(HttpAppError)?;

    let count = state
        .db
        .item_media
        .count_by_type(item_id, file_type)
        .await
        .map_err(HttpAppError)?;
    check_media_capacity(file_type, count).map_err(HttpAppError)?;

    let extension = extension_for(form.filename.as_deref(), &content_type);
    let storage_key = generate_media_key(item.company_id, item_id, &extension);

    let url = state
        .media
        .storage
        .upload(&storage_key, &content_type, data.to_vec())
        .await
        .map_err(HttpAppError::from)?;

    match state
        .db
        .item_media
        .create(
            item_id,
            item.company_id,
            file_type,
            url,
            storage_key.clone(),
            form.description,
            form.is_cover,
            form.sort_order,
        )
        .await
    {
        Ok(media) => Ok((StatusCode::CREATED, Json(media))),
        Err(e) => {
            // Compensate: the object was written but the row insert failed.
            if let Err(cleanup_err) = state.media.storage.delete(&storage_key).await {
                tracing::error!(
                    error = %cleanup_err,
                    storage_key = %storage_key,
                    "Compensating storage delete failed; object is orphaned"
                );
            } else {
                tracing::warn!(
                    storage_key = %storage_key,
                    "Metadata insert failed; uploaded object rolled back"
                );
            }
            Err(HttpAppError(e))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v0/items/{id}/media",
    tag = "media",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Media attached to the item", body = [ItemMedia]),
        (status = 404, description = "Item not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %caller.user_id, item_id = %id))]
pub async fn list_item_media(
    caller: CallerContext,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let item = state
        .db
        .items
        .get_by_id(id)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Item not found".to_string())))?;
    gate::effective_role(&state.db.members, &caller, item.company_id)
        .await
        .map_err(HttpAppError)?;

    let media = state
        .db
        .item_media
        .list_for_item(id)
        .await
        .map_err(HttpAppError)?;
    Ok(Json(media))
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, HttpAppError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        HttpAppError(AppError::InvalidInput(format!(
            "Malformed multipart body: {}",
            e
        )))
    })? {
        match field.name().unwrap_or_default() {
            "file" => {
                form.content_type = field.content_type().map(|s| s.to_string());
                form.filename = field.file_name().map(|s| s.to_string());
                form.data = Some(field.bytes().await.map_err(|e| {
                    HttpAppError(AppError::InvalidInput(format!(
                        "Failed to read the uploaded file: {}",
                        e
                    )))
                })?);
            }
            "description" => {
                form.description = Some(read_text(field).await?);
            }
            "is_cover" => {
                form.is_cover = read_text(field).await?.trim().eq_ignore_ascii_case("true");
            }
            "sort_order" => {
                form.sort_order = read_text(field).await?.trim().parse().unwrap_or(0);
            }
            _ => {}
        }
    }
    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, HttpAppError> {
    field.text().await.map_err(|e| {
        HttpAppError(AppError::InvalidInput(format!(
            "Malformed multipart field: {}",
            e
        )))
    })
}

/// Everything that must hold before the object is written: MIME allowlist,
/// size ceiling, non-empty body, pdf-requires-description.
fn validate_upload_file(
    content_type: &str,
    data: &[u8],
    description: Option<&str>,
    max_file_size: usize,
) -> Result<MediaFileType, AppError> {
    let file_type = MediaFileType::from_content_type(content_type).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "Unsupported content type '{}': expected an image or a pdf",
            content_type
        ))
    })?;
    if data.len() > max_file_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File is {} bytes, the limit is {} bytes",
            data.len(),
            max_file_size
        )));
    }
    if data.is_empty() {
        return Err(AppError::InvalidInput("Uploaded file is empty".to_string()));
    }
    if file_type == MediaFileType::Pdf && description.map(str::trim).unwrap_or_default().is_empty()
    {
        return Err(AppError::InvalidInput(
            "A description is required for pdf uploads".to_string(),
        ));
    }
    Ok(file_type)
}

/// Per-item count caps, checked against the rows already stored.
fn check_media_capacity(file_type: MediaFileType, existing: i64) -> Result<(), AppError> {
    let limit = match file_type {
        MediaFileType::Image => MAX_ITEM_IMAGES,
        MediaFileType::Pdf => MAX_ITEM_PDFS,
    };
    if existing >= limit {
        return Err(AppError::InvalidInput(format!(
            "Item already has the maximum of {} {} files",
            limit,
            file_type.as_str()
        )));
    }
    Ok(())
}

fn extension_for(filename: Option<&str>, content_type: &str) -> String {
    if let Some(ext) = filename
        .and_then(|f| f.rsplit_once('.'))
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5)
    {
        return ext;
    }
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "application/pdf" => "pdf",
        _ => "bin",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_prefers_filename() {
        assert_eq!(extension_for(Some("plano.PDF"), "application/pdf"), "pdf");
        assert_eq!(extension_for(Some("foto.jpeg"), "image/jpeg"), "jpeg");
    }

    #[test]
    fn test_extension_falls_back_to_content_type() {
        assert_eq!(extension_for(None, "image/jpeg"), "jpg");
        assert_eq!(extension_for(Some("noext"), "image/png"), "png");
        assert_eq!(extension_for(Some("x.superlongext"), "application/pdf"), "pdf");
    }

    const LIMIT: usize = 1024;

    #[test]
    fn test_upload_rejects_unknown_content_type() {
        let err = validate_upload_file("text/plain", b"hola", None, LIMIT).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_upload_rejects_oversize_file() {
        let data = vec![0u8; LIMIT + 1];
        let err = validate_upload_file("image/png", &data, None, LIMIT).unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }

    #[test]
    fn test_upload_rejects_empty_file() {
        let err = validate_upload_file("image/png", b"", None, LIMIT).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_pdf_upload_requires_description() {
        assert!(validate_upload_file("application/pdf", b"%PDF", None, LIMIT).is_err());
        assert!(validate_upload_file("application/pdf", b"%PDF", Some("   "), LIMIT).is_err());
        assert_eq!(
            validate_upload_file("application/pdf", b"%PDF", Some("Plano"), LIMIT).unwrap(),
            MediaFileType::Pdf
        );
    }

    #[test]
    fn test_image_upload_needs_no_description() {
        assert_eq!(
            validate_upload_file("image/jpeg", b"xx", None, LIMIT).unwrap(),
            MediaFileType::Image
        );
    }

    #[test]
    fn test_capacity_caps_per_file_type() {
        assert!(check_media_capacity(MediaFileType::Image, MAX_ITEM_IMAGES - 1).is_ok());
        assert!(check_media_capacity(MediaFileType::Image, MAX_ITEM_IMAGES).is_err());
        assert!(check_media_capacity(MediaFileType::Pdf, MAX_ITEM_PDFS - 1).is_ok());
        assert!(check_media_capacity(MediaFileType::Pdf, MAX_ITEM_PDFS).is_err());
    }
}
