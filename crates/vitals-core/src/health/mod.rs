//! Health probes and their aggregation.
//!
//! Each probe yields UP/DOWN plus free-form diagnostics; `HealthAggregator`
//! runs all of them and reports UP only when every probe is UP.

pub mod aggregator;
pub mod probe;
pub mod service;
pub mod storage;

pub use aggregator::{AggregateHealth, HealthAggregator, DEFAULT_PROBE_TIMEOUT};
pub use probe::{Detail, HealthProbe, HealthStatus, ProbeReport};
pub use service::{ServiceProbe, DEFAULT_SUCCESS_PROBABILITY, TIMEOUT_REASON};
pub use storage::{
    BlockingConnector, InMemoryConnector, StorageConnector, StorageProbe, TcpConnector,
};
