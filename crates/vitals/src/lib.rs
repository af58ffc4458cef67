//! Top-level facade crate for vitals.
//!
//! Re-exports the core (metrics registry, health aggregator) and the gateway
//! library so users can depend on a single crate.

pub mod core {
    pub use vitals_core::*;
}

pub mod gateway {
    pub use vitals_gateway::*;
}
