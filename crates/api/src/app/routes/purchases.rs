use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde_json::json;

use marketplace_core::{BuyerId, ItemId, PurchaseId};
use marketplace_infra::entity_store::{EntityStore, Pagination};

use super::{no_content, respond};
use crate::app::extract::{ApiJson, ApiQuery};
use crate::app::services::Services;
use crate::app::{dto, errors};

pub fn router<S: EntityStore + 'static>() -> Router {
    Router::new()
        .route("/", get(list_purchases::<S>).post(buy::<S>))
        .route("/validate", post(validate::<S>))
        .route("/recent", get(recent_purchases::<S>))
        .route("/stats/count", get(count_purchases::<S>))
        .route("/stats/most-purchased", get(most_purchased::<S>))
        .route("/:id", get(get_purchase::<S>).delete(cancel::<S>))
}

fn parse_request(
    body: &dto::PurchaseRequest,
) -> Result<(BuyerId, ItemId), axum::response::Response> {
    Ok((dto::parse_id(&body.buyer_id)?, dto::parse_id(&body.item_id)?))
}

pub async fn buy<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    ApiJson(body): ApiJson<dto::PurchaseRequest>,
) -> axum::response::Response {
    let (buyer_id, item_id) = match parse_request(&body) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::CREATED,
        services.purchases.buy(buyer_id, item_id, body.quantity).await,
    )
}

pub async fn cancel<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PurchaseId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    no_content(services.purchases.cancel(id).await)
}

/// Dry run of a buy: answers `valid: false` rather than an error for unknown
/// records, bad quantities and short stock.
pub async fn validate<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    ApiJson(body): ApiJson<dto::PurchaseRequest>,
) -> axum::response::Response {
    let (buyer_id, item_id) = match parse_request(&body) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };
    let result = services
        .purchases
        .validate(buyer_id, item_id, body.quantity)
        .await;
    respond(
        StatusCode::OK,
        result.map(|valid| {
            let message = if valid {
                "purchase request is valid"
            } else {
                "purchase request is invalid"
            };
            json!({ "valid": valid, "message": message })
        }),
    )
}

pub async fn get_purchase<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PurchaseId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.purchases.get_purchase(id).await)
}

pub async fn list_purchases<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    ApiQuery(query): ApiQuery<dto::PurchaseListQuery>,
) -> axum::response::Response {
    let (filter, pagination) = match query.into_parts() {
        Ok(parts) => parts,
        Err(e) => return errors::domain_error_to_response(e),
    };
    respond(
        StatusCode::OK,
        services.purchases.list_purchases(filter, pagination).await,
    )
}

pub async fn recent_purchases<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    ApiQuery(query): ApiQuery<dto::RecentQuery>,
) -> axum::response::Response {
    let days = query.days.unwrap_or(dto::DEFAULT_RECENT_DAYS);
    let pagination = Pagination::new(query.limit, query.offset);
    respond(
        StatusCode::OK,
        services.purchases.recent_purchases(days, pagination).await,
    )
}

pub async fn count_purchases<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
) -> axum::response::Response {
    let result = services.purchases.count_purchases().await;
    respond(StatusCode::OK, result.map(|count| json!({ "count": count })))
}

pub async fn most_purchased<S: EntityStore + 'static>(
    Extension(services): Extension<Services<S>>,
    ApiQuery(query): ApiQuery<dto::RankingQuery>,
) -> axum::response::Response {
    let limit = query.limit.unwrap_or(dto::DEFAULT_RANKING_LIMIT);
    respond(
        StatusCode::OK,
        services.purchases.most_purchased_items(limit).await,
    )
}
