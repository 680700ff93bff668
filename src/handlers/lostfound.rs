// src/handlers/lostfound.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        envelope::ApiResponse,
        item::{Category, ContactInfo, Item, ItemStatus, ItemType, Priority},
        request::{CreateItemRequest, ListParams, UpdateItemRequest},
        user::CurrentUser,
    },
    services::{
        LostFoundService,
        query::{ItemQuery, PaginationMeta},
        stats::ItemStats,
    },
    utils::{jwt::AdminUser, query::QueryParams, validated_json::ValidatedJson},
};

#[derive(OpenApi)]
#[openapi(
    paths(list_items, get_item, create_item, update_item, delete_item, my_items, stats),
    components(schemas(
        Item,
        ItemType,
        Category,
        ItemStatus,
        Priority,
        ContactInfo,
        CreateItemRequest,
        UpdateItemRequest,
        ItemStats,
        PaginationMeta
    )),
    tags((name = "Lost & Found", description = "Lost and found item reports"))
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document.
pub async fn openapi() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Unparseable ids cannot match any item.
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Item not found".to_string()))
}

/// List active items with filters, search, sorting and pagination.
#[utoipa::path(
    get,
    path = "/api/lostfound",
    tag = "Lost & Found",
    params(ListParams),
    responses(
        (status = 200, description = "Page of items", body = [Item]),
        (status = 400, description = "Unknown filter value or malformed query string")
    )
)]
pub async fn list_items(
    State(service): State<LostFoundService>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = ItemQuery::from_params(params)?;
    let page = service.list(&query).await?;

    Ok(ApiResponse::ok(page.items).with_pagination(page.pagination))
}

/// Get a single item and count the view.
#[utoipa::path(
    get,
    path = "/api/lostfound/{id}",
    tag = "Lost & Found",
    params(("id" = String, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item found", body = Item),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_item(
    State(service): State<LostFoundService>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let item = service.view_item(parse_id(&id)?).await?;
    Ok(ApiResponse::ok(item))
}

/// Report a lost or found item.
/// Requires: Login.
#[utoipa::path(
    post,
    path = "/api/lostfound",
    tag = "Lost & Found",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item reported", body = Item),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_item(
    State(service): State<LostFoundService>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let item = service.report(&user, payload).await?;
    Ok(ApiResponse::created(item).with_message("Item reported successfully"))
}

/// Update an item.
/// Requires: Login + (Reporter OR Admin). Admin-only fields sent by the
/// reporter are ignored.
#[utoipa::path(
    put,
    path = "/api/lostfound/{id}",
    tag = "Lost & Found",
    params(("id" = String, Path, description = "Item id")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = Item),
        (status = 400, description = "Validation failed or illegal status change"),
        (status = 403, description = "Not the reporter or an admin"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn update_item(
    State(service): State<LostFoundService>,
    user: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let item = service.apply_update(&user, parse_id(&id)?, payload).await?;
    Ok(ApiResponse::ok(item).with_message("Item updated successfully"))
}

/// Delete an item.
/// Requires: Login + (Reporter OR Admin).
#[utoipa::path(
    delete,
    path = "/api/lostfound/{id}",
    tag = "Lost & Found",
    params(("id" = String, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item deleted"),
        (status = 403, description = "Not the reporter or an admin"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn delete_item(
    State(service): State<LostFoundService>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    service.remove(&user, parse_id(&id)?).await?;
    Ok(ApiResponse::message("Item deleted successfully"))
}

/// Items reported by the caller.
#[utoipa::path(
    get,
    path = "/api/lostfound/user/my-items",
    tag = "Lost & Found",
    responses(
        (status = 200, description = "Caller's items", body = [Item]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_items(
    State(service): State<LostFoundService>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let items = service.my_items(&user).await?;
    Ok(ApiResponse::ok(items))
}

/// Dashboard counters.
/// Admin only.
#[utoipa::path(
    get,
    path = "/api/lostfound/admin/stats",
    tag = "Lost & Found",
    responses(
        (status = 200, description = "Aggregate counts", body = ItemStats),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn stats(
    State(service): State<LostFoundService>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let stats = service.compute_stats().await?;
    Ok(ApiResponse::ok(stats))
}
