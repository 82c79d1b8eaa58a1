//! Transactional entity store boundary.
//!
//! Buyers, sellers, items and purchases are read and written through a
//! [`UnitOfWork`] obtained from an [`EntityStore`]. Every business operation
//! runs inside exactly one unit of work.

pub mod in_memory;
pub mod postgres;
pub mod query;
pub mod r#trait;

pub use in_memory::{InMemoryEntityStore, InMemoryUnitOfWork};
pub use postgres::{PostgresEntityStore, PostgresUnitOfWork};
pub use query::{
    BuyerFilter, ItemFilter, ItemSales, ItemSort, Page, Pagination, PurchaseFilter, SellerFilter,
};
pub use r#trait::{EntityStore, StoreError, UnitOfWork};
