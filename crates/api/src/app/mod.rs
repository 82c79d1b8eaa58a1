//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the managers every handler talks to
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and query-string mapping
//! - `errors.rs`: consistent error responses
//! - `extract.rs`: body and query extractors with the same error shape

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use thiserror::Error;
use tower::ServiceBuilder;

use marketplace_infra::entity_store::{
    EntityStore, InMemoryEntityStore, PostgresEntityStore, StoreError,
};
use marketplace_infra::{AppConfig, Clock, StoreBackend, SystemClock};

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("entity store setup failed: {0}")]
    Store(#[from] StoreError),
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, BuildError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match &config.store {
        StoreBackend::InMemory => {
            tracing::info!("using in-memory entity store");
            Ok(app_with_store(Arc::new(InMemoryEntityStore::new()), clock))
        }
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => {
            let store = PostgresEntityStore::connect(database_url, *max_connections).await?;
            store.migrate().await?;
            tracing::info!(max_connections, "using postgres entity store");
            Ok(app_with_store(Arc::new(store), clock))
        }
    }
}

/// Router over an explicit store and clock (tests pin both).
pub fn app_with_store<S>(store: Arc<S>, clock: Arc<dyn Clock>) -> Router
where
    S: EntityStore + 'static,
{
    let services = Arc::new(services::AppServices::new(store, clock));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", routes::router::<S>().layer(Extension(services)))
        .layer(ServiceBuilder::new())
}
