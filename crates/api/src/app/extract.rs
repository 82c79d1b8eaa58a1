//! `Json` and `Query` extractors whose rejections use the API error body.

use axum::async_trait;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::app::errors;

/// JSON request body.
pub struct ApiJson<T>(pub T);

/// Query-string parameters.
pub struct ApiQuery<T>(pub T);

/// Malformed and ill-typed input are both a 400; 415 and 413 keep their status.
fn rejection_status(status: StatusCode) -> StatusCode {
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        StatusCode::BAD_REQUEST
    } else {
        status
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = axum::response::Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = axum::response::Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(query_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> axum::response::Response {
    errors::json_error(
        rejection_status(rejection.status()),
        "invalid_request",
        rejection.body_text(),
    )
}

fn query_rejection(rejection: QueryRejection) -> axum::response::Response {
    errors::json_error(
        rejection_status(rejection.status()),
        "invalid_request",
        rejection.body_text(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unprocessable_becomes_bad_request() {
        assert_eq!(
            rejection_status(StatusCode::UNPROCESSABLE_ENTITY),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            rejection_status(StatusCode::UNSUPPORTED_MEDIA_TYPE),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }
}
