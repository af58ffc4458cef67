//! vitals gateway library entry.
//!
//! This crate wires config, shared state, the demo business API and the
//! operational endpoints around `vitals-core`. It is consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod ops;
pub mod router;
