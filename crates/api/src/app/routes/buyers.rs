use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Router,
};
use serde_json::json;

use marketplace_core::BuyerId;
use marketplace_infra::entity_store::{EntityStore, PurchaseFilter};

use super::{no_content, respond};
use crate::app::extract::{ApiJson, ApiQuery};
use crate::app::services::Services;
use crate::app::{dto, errors};

pub fn router<S: EntityStore + 'static>() -> Router {
    Router::new()
        .route("/", get(list_buyers::<S>).post(register_buyer::<S>))
        .route("/count", get(count_buyers::<S>))
        .route("/by-email", get(get_buyer_by_email::<S>))
        .route(
            "/:id",
            get(get_buyer::<S>).put(update_buyer::<S>).delete(delete_buyer::<S>),
        )
        .route("/:id/purchases", get(list_buyer_purchases::<S>))
        .route("/:id/spending", get(buyer_spending::<S>))
}

pub async fn register_buyer<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    ApiJson(body): ApiJson<dto::AccountRequest>,
) -> axum::response::Response {
    let details = match body.details() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };
    respond(StatusCode::CREATED, services.accounts.register_buyer(details).await)
}

pub async fn list_buyers<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    ApiQuery(query): ApiQuery<dto::BuyerListQuery>,
) -> axum::response::Response {
    let (filter, pagination) = query.into_parts();
    respond(StatusCode::OK, services.accounts.list_buyers(filter, pagination).await)
}

pub async fn count_buyers<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
) -> axum::response::Response {
    let result = services.accounts.count_buyers().await;
    respond(StatusCode::OK, result.map(|count| json!({ "count": count })))
}

pub async fn get_buyer_by_email<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    ApiQuery(query): ApiQuery<dto::EmailQuery>,
) -> axum::response::Response {
    respond(StatusCode::OK, services.accounts.get_buyer_by_email(&query.email).await)
}

pub async fn get_buyer<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: BuyerId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.accounts.get_buyer(id).await)
}

pub async fn update_buyer<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::AccountRequest>,
) -> axum::response::Response {
    let id: BuyerId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let details = match body.details() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };
    respond(StatusCode::OK, services.accounts.update_buyer(id, details).await)
}

pub async fn delete_buyer<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: BuyerId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    no_content(services.accounts.delete_buyer(id).await)
}

pub async fn list_buyer_purchases<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
    ApiQuery(page): ApiQuery<dto::PageQuery>,
) -> axum::response::Response {
    let id: BuyerId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    // Unknown buyers are a 404, not an empty page.
    if let Err(e) = services.accounts.get_buyer(id).await {
        return errors::service_error_to_response(e);
    }
    let result = services
        .purchases
        .list_purchases(PurchaseFilter::by_buyer(id), page.pagination())
        .await;
    respond(StatusCode::OK, result)
}

pub async fn buyer_spending<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: BuyerId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services.purchases.total_spending_for_buyer(id).await;
    respond(
        StatusCode::OK,
        result.map(|total| json!({ "buyer_id": id, "total_spending": total })),
    )
}
