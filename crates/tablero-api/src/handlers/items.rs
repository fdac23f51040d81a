use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tablero_core::{
    models::{Item, PublishStatus},
    validation::{not_blank, qualify_item_type},
    AppError,
};
use tablero_db::{ItemListFilter, SortDirection};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::gate;
use crate::auth::models::CallerContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::DbState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    #[validate(custom(function = not_blank))]
    pub item_type: String,
    #[validate(custom(function = not_blank))]
    pub title: String,
    pub summary: Option<String>,
    pub status: Option<PublishStatus>,
    /// When true, `item_type` is treated as a bare type name and qualified
    /// with the company name server-side.
    #[serde(default)]
    pub qualify_type: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateItemRequest {
    #[validate(custom(function = not_blank))]
    pub title: Option<String>,
    pub summary: Option<String>,
    pub status: Option<PublishStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    /// Comma-separated statuses.
    pub status: Option<String>,
    /// Comma-separated item types.
    pub item_type: Option<String>,
    pub sort: Option<SortDirection>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    /// Advanced filters: JSON object mapping attribute definition id to the
    /// selected values, e.g. `{"<uuid>": ["3", "4"]}`.
    pub filters: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ItemListResponse {
    pub items: Vec<Item>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

#[utoipa::path(
    post,
    path = "/api/v0/companies/{id}/items",
    tag = "items",
    params(("id" = Uuid, Path, description = "Company ID")),
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 403, description = "Viewer cannot create items", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, request), fields(user_id = %caller.user_id, company_id = %company_id, operation = "create_item"))]
pub async fn create_item(
    caller: CallerContext,
    Path(company_id): Path<Uuid>,
    State(db): State<DbState>,
    ValidatedJson(request): ValidatedJson<CreateItemRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    gate::require_editor(&db.members, &caller, company_id)
        .await
        .map_err(HttpAppError)?;

    let item_type = if request.qualify_type {
        let company = db
            .companies
            .get_by_id(company_id)
            .await
            .map_err(HttpAppError)?
            .ok_or_else(|| HttpAppError(AppError::NotFound("Company not found".to_string())))?;
        qualify_item_type(request.item_type.trim(), &company.name)
    } else {
        request.item_type.trim().to_string()
    };

    let item = db
        .items
        .create(
            company_id,
            item_type,
            request.title.trim().to_string(),
            request.summary,
            request.status.unwrap_or(PublishStatus::Draft),
            caller.user_id,
        )
        .await
        .map_err(HttpAppError)?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// Paginated listing. Status, item_type and sort go to the database; the
/// advanced attribute filters run as a post-filter over the fetched page
/// only, so a page can shrink below page_size while `total` still counts the
/// unfiltered set.
#[utoipa::path(
    get,
    path = "/api/v0/companies/{id}/items",
    tag = "items",
    params(
        ("id" = Uuid, Path, description = "Company ID"),
        ("status" = Option<String>, Query, description = "Comma-separated statuses"),
        ("item_type" = Option<String>, Query, description = "Comma-separated item types"),
        ("sort" = Option<String>, Query, description = "updated_at direction: asc or desc"),
        ("page" = Option<i64>, Query, description = "1-based page"),
        ("page_size" = Option<i64>, Query, description = "Page size, max 100"),
        ("filters" = Option<String>, Query, description = "JSON map of attribute id to selected values")
    ),
    responses(
        (status = 200, description = "One page of items", body = ItemListResponse),
        (status = 400, description = "Malformed filter", body = ErrorResponse),
        (status = 403, description = "Not a member", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, query), fields(user_id = %caller.user_id, company_id = %company_id))]
pub async fn list_items(
    caller: CallerContext,
    Path(company_id): Path<Uuid>,
    Query(query): Query<ListItemsQuery>,
    State(db): State<DbState>,
) -> Result<impl IntoResponse, HttpAppError> {
    gate::effective_role(&db.members, &caller, company_id)
        .await
        .map_err(HttpAppError)?;

    let statuses = parse_statuses(query.status.as_deref()).map_err(HttpAppError)?;
    let item_types = query
        .item_type
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let advanced = parse_advanced_filters(query.filters.as_deref()).map_err(HttpAppError)?;

    let filter = ItemListFilter {
        statuses,
        item_types,
        sort: query.sort.unwrap_or_default(),
        page: query.page.unwrap_or(1),
        page_size: query.page_size.unwrap_or(0),
    };
    let mut page = db
        .items
        .list(company_id, &filter)
        .await
        .map_err(HttpAppError)?;

    if !advanced.is_empty() {
        // Only filterable definitions of this company may act as filters.
        for attribute_id in advanced.keys() {
            let definition = db
                .attribute_definitions
                .get_by_id(*attribute_id)
                .await
                .map_err(HttpAppError)?
                .filter(|d| d.company_id == company_id)
                .ok_or_else(|| {
                    HttpAppError(AppError::InvalidInput(format!(
                        "Unknown filter attribute {}",
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

        let item_ids: Vec<Uuid> = page.items.iter().map(|i| i.id).collect();
        let values = db
            .attribute_values
            .values_for_items(&item_ids)
            .await
            .map_err(HttpAppError)?;

        page.items.retain(|item| {
            advanced.iter().all(|(attribute_id, wanted)| {
                values
                    .iter()
                    .find(|v| v.item_id == item.id && v.attribute_id == *attribute_id)
                    .map(|v| wanted.iter().any(|w| v.value.matches_filter(w)))
                    .unwrap_or(false)
            })
        });
    }

    Ok(Json(ItemListResponse {
        items: page.items,
        total: page.total,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v0/items/{id}",
    tag = "items",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item", body = Item),
        (status = 404, description = "Item not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db), fields(user_id = %caller.user_id, item_id = %id))]
pub async fn get_item(
    caller: CallerContext,
    Path(id): Path<Uuid>,
    State(db): State<DbState>,
) -> Result<impl IntoResponse, HttpAppError> {
    let item = fetch_item(&db, id).await?;
    gate::effective_role(&db.members, &caller, item.company_id)
        .await
        .map_err(HttpAppError)?;
    Ok(Json(item))
}

#[utoipa::path(
    put,
    path = "/api/v0/items/{id}",
    tag = "items",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = Item),
        (status = 403, description = "Viewer cannot update items", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db, request), fields(user_id = %caller.user_id, item_id = %id, operation = "update_item"))]
pub async fn update_item(
    caller: CallerContext,
    Path(id): Path<Uuid>,
    State(db): State<DbState>,
    ValidatedJson(request): ValidatedJson<UpdateItemRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let item = fetch_item(&db, id).await?;
    gate::require_editor(&db.members, &caller, item.company_id)
        .await
        .map_err(HttpAppError)?;

    let updated = db
        .items
        .update(id, request.title, request.summary, request.status, caller.user_id)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Item not found".to_string())))?;

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/v0/items/{id}",
    tag = "items",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 403, description = "Viewer cannot delete items", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(db), fields(user_id = %caller.user_id, item_id = %id, operation = "delete_item"))]
pub async fn delete_item(
    caller: CallerContext,
    Path(id): Path<Uuid>,
    State(db): State<DbState>,
) -> Result<impl IntoResponse, HttpAppError> {
    let item = fetch_item(&db, id).await?;
    gate::require_editor(&db.members, &caller, item.company_id)
        .await
        .map_err(HttpAppError)?;

    if !db.items.delete(id).await.map_err(HttpAppError)? {
        return Err(HttpAppError(AppError::NotFound(
            "Item not found".to_string(),
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn fetch_item(db: &DbState, id: Uuid) -> Result<Item, HttpAppError> {
    db.items
        .get_by_id(id)
        .await
        .map_err(HttpAppError)?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Item not found".to_string())))
}

fn parse_statuses(raw: Option<&str>) -> Result<Vec<PublishStatus>, AppError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| match s {
            "draft" => Ok(PublishStatus::Draft),
            "published" => Ok(PublishStatus::Published),
            "archived" => Ok(PublishStatus::Archived),
            other => Err(AppError::InvalidInput(format!(
                "Unknown status '{}', expected draft, published or archived",
                other
            ))),
        })
        .collect()
}

fn parse_advanced_filters(raw: Option<&str>) -> Result<HashMap<Uuid, Vec<String>>, AppError> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(HashMap::new());
    };
    let filters: HashMap<Uuid, Vec<String>> = serde_json::from_str(raw).map_err(|e| {
        AppError::InvalidInput(format!("Malformed filters parameter: {}", e))
    })?;
    Ok(filters
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_statuses() {
        assert_eq!(
            parse_statuses(Some("draft,published")).unwrap(),
            vec![PublishStatus::Draft, PublishStatus::Published]
        );
        assert!(parse_statuses(Some("live")).is_err());
        assert!(parse_statuses(None).unwrap().is_empty());
    }

    #[test]
    fn test_parse_advanced_filters() {
        let id = Uuid::new_v4();
        let raw = format!(r#"{{"{}": ["3", "4"]}}"#, id);
        let filters = parse_advanced_filters(Some(&raw)).unwrap();
        assert_eq!(filters.get(&id).unwrap(), &vec!["3".to_string(), "4".to_string()]);

        // empty selections drop out
        let raw = format!(r#"{{"{}": []}}"#, id);
        assert!(parse_advanced_filters(Some(&raw)).unwrap().is_empty());

        assert!(parse_advanced_filters(Some("not json")).is_err());
    }
}
