use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Router,
};
use serde_json::json;

use marketplace_core::SellerId;
use marketplace_infra::entity_store::{EntityStore, ItemFilter, PurchaseFilter};

use super::{no_content, respond};
use crate::app::extract::{ApiJson, ApiQuery};
use crate::app::services::Services;
use crate::app::{dto, errors};

pub fn router<S: EntityStore + 'static>() -> Router {
    Router::new()
        .route("/", get(list_sellers::<S>).post(register_seller::<S>))
        .route("/count", get(count_sellers::<S>))
        .route("/by-email", get(get_seller_by_email::<S>))
        .route(
            "/:id",
            get(get_seller::<S>).put(update_seller::<S>).delete(delete_seller::<S>),
        )
        .route(
            "/:id/items",
            get(list_seller_items::<S>).post(create_seller_item::<S>),
        )
        .route("/:id/sales", get(list_seller_sales::<S>))
        .route("/:id/revenue", get(seller_revenue::<S>))
}

pub async fn register_seller<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    ApiJson(body): ApiJson<dto::AccountRequest>,
) -> axum::response::Response {
    let details = match body.details() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };
    respond(StatusCode::CREATED, services.accounts.register_seller(details).await)
}

pub async fn list_sellers<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    ApiQuery(query): ApiQuery<dto::SellerListQuery>,
) -> axum::response::Response {
    let (filter, pagination) = query.into_parts();
    respond(StatusCode::OK, services.accounts.list_sellers(filter, pagination).await)
}

pub async fn count_sellers<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
) -> axum::response::Response {
    let result = services.accounts.count_sellers().await;
    respond(StatusCode::OK, result.map(|count| json!({ "count": count })))
}

pub async fn get_seller_by_email<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    ApiQuery(query): ApiQuery<dto::EmailQuery>,
) -> axum::response::Response {
    respond(StatusCode::OK, services.accounts.get_seller_by_email(&query.email).await)
}

pub async fn get_seller<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: SellerId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.accounts.get_seller(id).await)
}

pub async fn update_seller<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::AccountRequest>,
) -> axum::response::Response {
    let id: SellerId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let details = match body.details() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };
    respond(StatusCode::OK, services.accounts.update_seller(id, details).await)
}

pub async fn delete_seller<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: SellerId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    no_content(services.accounts.delete_seller(id).await)
}

pub async fn list_seller_items<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
    ApiQuery(page): ApiQuery<dto::PageQuery>,
) -> axum::response::Response {
    let id: SellerId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Err(e) = services.accounts.get_seller(id).await {
        return errors::service_error_to_response(e);
    }
    let result = services
        .catalog
        .list_items(ItemFilter::by_seller(id), page.pagination())
        .await;
    respond(StatusCode::OK, result)
}

pub async fn create_seller_item<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::ItemRequest>,
) -> axum::response::Response {
    let id: SellerId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let details = match body.details() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };
    respond(StatusCode::CREATED, services.catalog.create_item(id, details).await)
}

pub async fn list_seller_sales<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
    ApiQuery(page): ApiQuery<dto::PageQuery>,
) -> axum::response::Response {
    let id: SellerId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Err(e) = services.accounts.get_seller(id).await {
        return errors::service_error_to_response(e);
    }
    let result = services
        .purchases
        .list_purchases(PurchaseFilter::by_seller(id), page.pagination())
        .await;
    respond(StatusCode::OK, result)
}

pub async fn seller_revenue<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: SellerId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services.purchases.total_revenue_for_seller(id).await;
    respond(
        StatusCode::OK,
        result.map(|total| json!({ "seller_id": id, "total_revenue": total })),
    )
}
