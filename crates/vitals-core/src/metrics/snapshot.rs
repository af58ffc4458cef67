//! Read-only view of the registry for exposition transports.

use std::collections::BTreeMap;

use serde::Serialize;

/// One series of a metric family: name, tag set, current value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series<T> {
    pub name: String,
    pub tags: BTreeMap<String, String>,
    pub value: T,
}

impl<T> Series<T> {
    pub(crate) fn new(name: &str, tags: BTreeMap<String, String>, value: T) -> Self {
        Self {
            name: name.to_string(),
            tags,
            value,
        }
    }

    fn matches(&self, name: &str, tags: &[(&str, &str)]) -> bool {
        self.name == name
            && self.tags.len() == tags.len()
            && tags
                .iter()
                .all(|(k, v)| self.tags.get(*k).map(String::as_str) == Some(*v))
    }
}

/// Distribution summary of a duration recorder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerStats {
    pub count: u64,
    pub total_seconds: f64,
    pub max_seconds: f64,
    /// Cumulative `(upper bound in seconds, samples <= bound)` pairs.
    pub buckets: Vec<(f64, u64)>,
}

/// Point-in-time copy of every registered series, keyed by (name, tags).
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub counters: Vec<Series<u64>>,
    pub gauges: Vec<Series<i64>>,
    pub timers: Vec<Series<TimerStats>>,
}

impl MetricsSnapshot {
    pub fn counter(&self, name: &str, tags: &[(&str, &str)]) -> Option<u64> {
        self.counters
            .iter()
            .find(|s| s.matches(name, tags))
            .map(|s| s.value)
    }

    pub fn gauge(&self, name: &str, tags: &[(&str, &str)]) -> Option<i64> {
        self.gauges
            .iter()
            .find(|s| s.matches(name, tags))
            .map(|s| s.value)
    }

    pub fn timer(&self, name: &str, tags: &[(&str, &str)]) -> Option<&TimerStats> {
        self.timers
            .iter()
            .find(|s| s.matches(name, tags))
            .map(|s| &s.value)
    }
}
