//! vitals core: the metrics registry and the health aggregator.
//!
//! This crate owns the metric model (counters, gauge, duration recorder,
//! business-operation family) and the probe/aggregation protocol. It carries
//! no HTTP or config dependencies; the gateway crate is one caller of it,
//! tests are another.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Metric mutation never fails, and probe failures surface as DOWN results
//! instead of errors to the caller of `aggregate()`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod health;
pub mod metrics;

/// Shared result type.
pub use error::{Result, VitalsError};
