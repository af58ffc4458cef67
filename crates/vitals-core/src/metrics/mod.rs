//! Lightweight in-process metrics.
//!
//! Metrics are stored as atomics inside `DashMap`-backed families and read
//! through `MetricsRegistry::snapshot` or `render_prometheus` by whatever
//! exposition transport the caller wires up.

pub mod family;
pub mod registry;
pub mod snapshot;
pub mod timer;

pub use family::{Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramVec, TagSet};
pub use registry::{
    MetricsRegistry, API_DURATION, APPLICATION_TAG, BUSINESS_OPERATIONS_TOTAL,
    DEFAULT_MAX_OPERATION_TYPES, ENDPOINT_TAG, ERRORS_TOTAL, OVERFLOW_TYPE, REQUESTS_TOTAL,
    REQUEST_DURATION, TYPE_TAG, USERS_ACTIVE,
};
pub use snapshot::{MetricsSnapshot, Series, TimerStats};
pub use timer::{Sample, TimerGuard};
