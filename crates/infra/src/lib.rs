//! Infrastructure layer: entity stores, services, config, clock.

pub mod clock;
pub mod config;
pub mod entity_store;
pub mod services;


pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, ConfigError, StoreBackend};
pub use services::{AccountManager, CatalogManager, PurchaseWorkflow, ServiceError, ServiceResult};
