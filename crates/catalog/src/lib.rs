//! Catalog domain module (items and stock).
//!
//! This crate contains business rules for catalog items, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod item;

pub use item::{Item, ItemDetails};
