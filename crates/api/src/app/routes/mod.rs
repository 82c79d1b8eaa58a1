use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::Serialize;

use marketplace_infra::entity_store::EntityStore;
use marketplace_infra::ServiceResult;

use crate::app::errors;

pub mod buyers;
pub mod items;
pub mod purchases;
pub mod sellers;
pub mod system;

/// Router for every `/api` endpoint.
pub fn router<S: EntityStore + 'static>() -> Router {
    Router::new()
        .nest("/buyers", buyers::router::<S>())
        .nest("/sellers", sellers::router::<S>())
        .nest("/items", items::router::<S>())
        .nest("/purchases", purchases::router::<S>())
}

fn respond<T: Serialize>(status: StatusCode, result: ServiceResult<T>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

fn no_content(result: ServiceResult<()>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
