use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, patch},
    Router,
};
use serde_json::json;

use marketplace_core::{ItemId, SellerId};
use marketplace_infra::entity_store::EntityStore;

use super::{no_content, respond};
use crate::app::extract::{ApiJson, ApiQuery};
use crate::app::services::Services;
use crate::app::{dto, errors};

pub fn router<S: EntityStore + 'static>() -> Router {
    Router::new()
        .route("/", get(list_items::<S>).post(create_item::<S>))
        .route("/count", get(count_items::<S>))
        .route(
            "/:id",
            get(get_item::<S>).put(update_item::<S>).delete(delete_item::<S>),
        )
        .route("/:id/quantity", patch(update_item_quantity::<S>))
        .route("/:id/availability", get(item_availability::<S>))
}

pub async fn create_item<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    ApiJson(body): ApiJson<dto::CreateItemRequest>,
) -> axum::response::Response {
    let seller_id: SellerId = match dto::parse_id(&body.seller_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let details = match body.item.details() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };
    respond(StatusCode::CREATED, services.catalog.create_item(seller_id, details).await)
}

pub async fn list_items<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    ApiQuery(query): ApiQuery<dto::ItemListQuery>,
) -> axum::response::Response {
    let (filter, pagination) = match query.into_parts() {
        Ok(parts) => parts,
        Err(e) => return errors::domain_error_to_response(e),
    };
    respond(StatusCode::OK, services.catalog.list_items(filter, pagination).await)
}

/// Counts honor the same filters as the listing (`available`, `max_quantity`, ...).
pub async fn count_items<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    ApiQuery(query): ApiQuery<dto::ItemListQuery>,
) -> axum::response::Response {
    let (filter, _) = match query.into_parts() {
        Ok(parts) => parts,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let result = services.catalog.count_items(filter).await;
    respond(StatusCode::OK, result.map(|count| json!({ "count": count })))
}

pub async fn get_item<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.catalog.get_item(id).await)
}

pub async fn update_item<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::ItemRequest>,
) -> axum::response::Response {
    let id: ItemId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let details = match body.details() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };
    respond(StatusCode::OK, services.catalog.update_item(id, details).await)
}

pub async fn update_item_quantity<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::QuantityRequest>,
) -> axum::response::Response {
    let id: ItemId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services.catalog.update_item_quantity(id, body.quantity).await,
    )
}

pub async fn delete_item<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    no_content(services.catalog.delete_item(id).await)
}

pub async fn item_availability<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<dto::AvailabilityQuery>,
) -> axum::response::Response {
    let id: ItemId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services.catalog.is_item_available(id, query.quantity).await;
    respond(
        StatusCode::OK,
        result.map(|available| {
            json!({
                "item_id": id,
                "requested_quantity": query.quantity,
                "available": available,
            })
        }),
    )
}
