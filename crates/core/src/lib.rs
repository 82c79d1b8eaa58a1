//! `marketplace-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the error model, and the value objects shared by the account,
//! catalog and purchasing crates.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{BuyerId, ItemId, PurchaseId, SellerId};
pub use value_object::{Email, Money, ValueObject};
