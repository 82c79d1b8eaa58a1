//! Purchasing domain module (purchases and the cancellation window).
//!
//! This crate contains business rules for purchases, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod purchase;

pub use purchase::{CANCELLATION_WINDOW_HOURS, Purchase, cancellation_window};
