use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::family::{Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramVec};
use super::snapshot::MetricsSnapshot;
use super::timer::{Sample, TimerGuard};

pub const REQUESTS_TOTAL: &str = "custom_requests_total";
pub const ERRORS_TOTAL: &str = "custom_errors_total";
pub const REQUEST_DURATION: &str = "custom_request_duration_seconds";
pub const USERS_ACTIVE: &str = "custom_users_active";
pub const BUSINESS_OPERATIONS_TOTAL: &str = "custom_business_operations_total";
pub const API_DURATION: &str = "custom_api_duration_seconds";

pub const APPLICATION_TAG: &str = "application";
pub const TYPE_TAG: &str = "type";
pub const ENDPOINT_TAG: &str = "endpoint";

/// `type` value that absorbs operation types beyond the cardinality cap.
pub const OVERFLOW_TYPE: &str = "__overflow__";
pub const DEFAULT_MAX_OPERATION_TYPES: usize = 1000;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Application metrics: request/error counters, request-duration timer,
/// per-endpoint duration timers, active-users gauge and the per-type
/// business-operation family.
///
/// Construct once at startup and share behind an `Arc`; every operation takes
/// `&self` and is safe under any number of concurrent callers.
pub struct MetricsRegistry {
    id: u64,
    application: String,
    max_operation_types: usize,

    requests: CounterVec,
    errors: CounterVec,
    duration: HistogramVec,
    active_users: GaugeVec,
    business_operations: CounterVec,
    api_duration: HistogramVec,

    // Fixed series, resolved once.
    requests_total: Counter,
    errors_total: Counter,
    request_duration: Histogram,
    users_active: Gauge,

    operation_types: AtomicUsize,
    overflow_warned: AtomicBool,
}

impl MetricsRegistry {
    /// Registry tagging every series with `application`, with the default
    /// business-operation cardinality cap.
    pub fn new(application: impl Into<String>) -> Self {
        let application = application.into();
        let app_tag = [(APPLICATION_TAG, application.as_str())];

        let requests = CounterVec::default();
        let errors = CounterVec::default();
        let duration = HistogramVec::default();
        let active_users = GaugeVec::default();

        let requests_total = requests.with_tags(&app_tag);
        let errors_total = errors.with_tags(&app_tag);
        let request_duration = duration.with_tags(&app_tag);
        let users_active = active_users.with_tags(&app_tag);

        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            application,
            max_operation_types: DEFAULT_MAX_OPERATION_TYPES,
            requests,
            errors,
            duration,
            active_users,
            business_operations: CounterVec::default(),
            api_duration: HistogramVec::default(),
            requests_total,
            errors_total,
            request_duration,
            users_active,
            operation_types: AtomicUsize::new(0),
            overflow_warned: AtomicBool::new(false),
        }
    }

    /// Cap on distinct business-operation types; `0` removes the cap.
    pub fn with_max_operation_types(mut self, max: usize) -> Self {
        self.max_operation_types = max;
        self
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn increment_request_count(&self) {
        self.requests_total.inc();
    }

    pub fn increment_error_count(&self) {
        self.errors_total.inc();
    }

    pub fn start_timer(&self) -> Sample {
        Sample::start(self.id)
    }

    /// Record the time elapsed since `sample` started and return it.
    ///
    /// A sample started by another registry is a caller bug: it trips a debug
    /// assertion and is otherwise dropped without being recorded.
    pub fn stop_timer(&self, sample: Sample) -> Duration {
        self.record(sample, &self.request_duration)
    }

    pub(crate) fn record(&self, sample: Sample, target: &Histogram) -> Duration {
        let elapsed = sample.elapsed();
        debug_assert_eq!(
            sample.registry_id, self.id,
            "sample stopped on a registry that did not start it"
        );
        if sample.registry_id != self.id {
            tracing::error!(
                sample_registry = sample.registry_id,
                registry = self.id,
                "foreign timer sample discarded"
            );
            return elapsed;
        }
        target.observe(elapsed);
        elapsed
    }

    /// Start a sample that is stopped when the returned guard drops.
    pub fn time(&self) -> TimerGuard<'_> {
        TimerGuard::new(self, self.request_duration.clone())
    }

    /// Like `time`, but records into the `endpoint=<endpoint>` series of the
    /// per-endpoint duration timer. Endpoint names come from route code, not
    /// from request input.
    pub fn time_endpoint(&self, endpoint: &str) -> TimerGuard<'_> {
        let target = self.api_duration.with_tags(&[
            (APPLICATION_TAG, self.application.as_str()),
            (ENDPOINT_TAG, endpoint),
        ]);
        TimerGuard::new(self, target)
    }

    /// Overwrite the active-users gauge. Negative values are stored as given.
    pub fn set_active_users(&self, count: i64) {
        self.users_active.set(count);
    }

    /// Count one business operation of `op_type`, creating its series on
    /// first sight. Once the cap is reached, unseen types are counted under
    /// `type="__overflow__"`; a caller passing that label itself is counted
    /// there too and never takes a slot under the cap.
    pub fn increment_business_operation(&self, op_type: &str) {
        if op_type == OVERFLOW_TYPE {
            self.increment_overflow();
            return;
        }
        let tags = [
            (APPLICATION_TAG, self.application.as_str()),
            (TYPE_TAG, op_type),
        ];
        if self
            .business_operations
            .inc_or_admit(&tags, || self.admit_operation_type())
        {
            return;
        }

        if !self.overflow_warned.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                max = self.max_operation_types,
                rejected = %op_type,
                "business operation type cap reached, folding new types into overflow series"
            );
        }
        self.increment_overflow();
    }

    fn increment_overflow(&self) {
        let overflow = [
            (APPLICATION_TAG, self.application.as_str()),
            (TYPE_TAG, OVERFLOW_TYPE),
        ];
        self.business_operations.inc(&overflow);
    }

    fn admit_operation_type(&self) -> bool {
        if self.max_operation_types == 0 {
            self.operation_types.fetch_add(1, Ordering::Relaxed);
            return true;
        }
        self.operation_types
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                (n < self.max_operation_types).then_some(n + 1)
            })
            .is_ok()
    }

    /// Current count of one business-operation type, if it was ever seen.
    pub fn business_operation_count(&self, op_type: &str) -> Option<u64> {
        self.business_operations.get(&[
            (APPLICATION_TAG, self.application.as_str()),
            (TYPE_TAG, op_type),
        ])
    }

    /// Distinct business-operation series, overflow included.
    pub fn business_operation_series(&self) -> usize {
        self.business_operations.len()
    }

    pub fn request_count(&self) -> u64 {
        self.requests_total.get()
    }

    pub fn error_count(&self) -> u64 {
        self.errors_total.get()
    }

    pub fn active_users(&self) -> i64 {
        self.users_active.get()
    }

    pub fn recorded_durations(&self) -> u64 {
        self.request_duration.count()
    }

    /// Samples recorded for one endpoint, if it was ever timed.
    pub fn endpoint_durations(&self, endpoint: &str) -> Option<u64> {
        self.api_duration.count(&[
            (APPLICATION_TAG, self.application.as_str()),
            (ENDPOINT_TAG, endpoint),
        ])
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut counters = self.requests.series(REQUESTS_TOTAL);
        counters.extend(self.errors.series(ERRORS_TOTAL));
        counters.extend(self.business_operations.series(BUSINESS_OPERATIONS_TOTAL));

        let mut timers = self.duration.series(REQUEST_DURATION);
        timers.extend(self.api_duration.series(API_DURATION));

        MetricsSnapshot {
            counters,
            gauges: self.active_users.series(USERS_ACTIVE),
            timers,
        }
    }

    /// Render all registered metrics in Prometheus text format 0.0.4.
    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();
        self.requests
            .render(REQUESTS_TOTAL, "Total number of processed requests", &mut out);
        self.errors
            .render(ERRORS_TOTAL, "Total number of errors", &mut out);
        self.duration
            .render(REQUEST_DURATION, "Request processing duration", &mut out);
        self.active_users
            .render(USERS_ACTIVE, "Number of active users", &mut out);
        self.business_operations.render(
            BUSINESS_OPERATIONS_TOTAL,
            "Number of business operations performed",
            &mut out,
        );
        self.api_duration
            .render(API_DURATION, "Duration of individual API endpoints", &mut out);
        out
    }
}
