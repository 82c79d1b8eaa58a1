//! Accounts domain module (buyers and sellers).
//!
//! This crate contains business rules for marketplace accounts, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod account;

pub use account::{AccountDetails, Buyer, Seller, ensure_email_free};
