//! # pgmock-demos
//!
//! Two small pieces of database logic written against the `pgmock` driver
//! traits, and tested in `tests/` without a database:
//!
//! - [`stats::record_stats`] counts a product view and records the viewer
//!   in one transaction.
//! - [`orders::cancel_order`] locks an order with its buyer, refunds the
//!   buyer and marks the order cancelled.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod orders;
pub mod stats;

pub use orders::{CancelOutcome, ORDER_CANCELLED, ORDER_PENDING, Order, User, cancel_order};
pub use stats::record_stats;
