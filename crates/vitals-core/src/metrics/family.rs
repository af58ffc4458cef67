//! Tagged metric families.
//!
//! Each family maps a tag set to one atomic cell. Tag sets are flattened into
//! key-sorted vectors so `[("a","1"),("b","2")]` and `[("b","2"),("a","1")]`
//! address the same series. Cells live behind `Arc` so the registry can
//! resolve fixed series once and mutate them without touching the map again.
//! Histogram buckets are fixed in microseconds to avoid floating point math on
//! the hot path; conversion to seconds happens only when reading.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::snapshot::{Series, TimerStats};

/// Key-sorted, owned tag set.
pub type TagSet = Vec<(String, String)>;

fn tag_set(tags: &[(&str, &str)]) -> TagSet {
    let mut key: TagSet = tags
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn tag_map(tags: &TagSet) -> BTreeMap<String, String> {
    tags.iter().cloned().collect()
}

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn render_labels(tags: &TagSet) -> String {
    tags.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn render_header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}

/// Snapshot of a family's series, ordered by tag set for stable output.
fn sorted_series<V, T>(map: &DashMap<TagSet, V>, read: impl Fn(&V) -> T) -> Vec<(TagSet, T)> {
    let mut rows: Vec<(TagSet, T)> = map
        .iter()
        .map(|r| (r.key().clone(), read(r.value())))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows
}

/// Monotonic counter cell.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicU64>);

impl Counter {
    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, v: u64) {
        self.0.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Last-write-wins gauge cell.
#[derive(Clone, Default)]
pub struct Gauge(Arc<AtomicI64>);

impl Gauge {
    pub fn set(&self, v: i64) {
        self.0.store(v, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<TagSet, Counter>,
}

impl CounterVec {
    /// Resolve (creating at zero if absent) the series for `tags`.
    pub fn with_tags(&self, tags: &[(&str, &str)]) -> Counter {
        self.map.entry(tag_set(tags)).or_default().clone()
    }

    /// Increment by 1.
    pub fn inc(&self, tags: &[(&str, &str)]) {
        self.add(tags, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, tags: &[(&str, &str)], v: u64) {
        self.map.entry(tag_set(tags)).or_default().add(v);
    }

    /// Increment an existing series, or create it only if `admit` agrees.
    ///
    /// `admit` runs at most once and only for a series not yet present; it is
    /// called while the shard is locked, so concurrent first sightings of the
    /// same tag set consult it once. Returns false when the series was
    /// refused.
    pub fn inc_or_admit(&self, tags: &[(&str, &str)], admit: impl FnOnce() -> bool) -> bool {
        let key = tag_set(tags);
        if let Some(existing) = self.map.get(&key) {
            existing.inc();
            return true;
        }
        match self.map.entry(key) {
            Entry::Occupied(e) => {
                e.get().inc();
                true
            }
            Entry::Vacant(e) => {
                if !admit() {
                    return false;
                }
                let counter = Counter::default();
                counter.inc();
                e.insert(counter);
                true
            }
        }
    }

    pub fn get(&self, tags: &[(&str, &str)]) -> Option<u64> {
        self.map.get(&tag_set(tags)).map(|c| c.get())
    }

    /// Number of distinct series.
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn series(&self, name: &str) -> Vec<Series<u64>> {
        sorted_series(&self.map, Counter::get)
            .into_iter()
            .map(|(tags, value)| Series::new(name, tag_map(&tags), value))
            .collect()
    }

    /// Render in Prometheus text exposition format.
    pub(crate) fn render(&self, name: &str, help: &str, out: &mut String) {
        render_header(out, name, help, "counter");
        for (tags, val) in sorted_series(&self.map, Counter::get) {
            let _ = writeln!(out, "{}{{{}}} {}", name, render_labels(&tags), val);
        }
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<TagSet, Gauge>,
}

impl GaugeVec {
    /// Resolve (creating at zero if absent) the series for `tags`.
    pub fn with_tags(&self, tags: &[(&str, &str)]) -> Gauge {
        self.map.entry(tag_set(tags)).or_default().clone()
    }

    pub(crate) fn series(&self, name: &str) -> Vec<Series<i64>> {
        sorted_series(&self.map, Gauge::get)
            .into_iter()
            .map(|(tags, value)| Series::new(name, tag_map(&tags), value))
            .collect()
    }

    /// Render in Prometheus text exposition format.
    pub(crate) fn render(&self, name: &str, help: &str, out: &mut String) {
        render_header(out, name, help, "gauge");
        for (tags, val) in sorted_series(&self.map, Gauge::get) {
            let _ = writeln!(out, "{}{{{}}} {}", name, render_labels(&tags), val);
        }
    }
}

// Fixed upper bounds in microseconds (µs):
// 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const BUCKETS_MICROS: [u64; 12] = [
    1_000, 5_000, 10_000, 25_000, 50_000, 100_000, 250_000, 500_000, 1_000_000, 2_500_000,
    5_000_000, 10_000_000,
];

fn micros_to_secs(v: u64) -> f64 {
    v as f64 / 1_000_000.0
}

struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    max: AtomicU64,
    buckets: [AtomicU64; BUCKETS_MICROS.len()],
}

impl Default for AtomicHistogram {
    fn default() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: AtomicU64::new(0),
            max: AtomicU64::new(0),
            buckets: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }
}

impl AtomicHistogram {
    fn stats(&self) -> TimerStats {
        TimerStats {
            count: self.count.load(Ordering::Relaxed),
            total_seconds: micros_to_secs(self.sum.load(Ordering::Relaxed)),
            max_seconds: micros_to_secs(self.max.load(Ordering::Relaxed)),
            buckets: BUCKETS_MICROS
                .iter()
                .zip(self.buckets.iter())
                .map(|(&le, n)| (micros_to_secs(le), n.load(Ordering::Relaxed)))
                .collect(),
        }
    }
}

/// Duration distribution cell.
#[derive(Clone, Default)]
pub struct Histogram(Arc<AtomicHistogram>);

impl Histogram {
    /// Observe a duration and increment cumulative buckets (microsecond scale).
    pub fn observe(&self, duration: Duration) {
        let hist = &self.0;
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);
        hist.max.fetch_max(micros, Ordering::Relaxed);

        // Cumulative: every bucket whose bound covers the sample.
        for (i, &b) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self) -> u64 {
        self.0.count.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> TimerStats {
        self.0.stats()
    }
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<TagSet, Histogram>,
}

impl HistogramVec {
    /// Resolve (creating empty if absent) the series for `tags`.
    pub fn with_tags(&self, tags: &[(&str, &str)]) -> Histogram {
        self.map.entry(tag_set(tags)).or_default().clone()
    }

    /// Sample count of one series, if it exists.
    pub fn count(&self, tags: &[(&str, &str)]) -> Option<u64> {
        self.map.get(&tag_set(tags)).map(|h| h.count())
    }

    pub(crate) fn series(&self, name: &str) -> Vec<Series<TimerStats>> {
        sorted_series(&self.map, Histogram::stats)
            .into_iter()
            .map(|(tags, value)| Series::new(name, tag_map(&tags), value))
            .collect()
    }

    /// Render in Prometheus text exposition format (unit: seconds).
    pub(crate) fn render(&self, name: &str, help: &str, out: &mut String) {
        render_header(out, name, help, "histogram");
        for (tags, stats) in sorted_series(&self.map, Histogram::stats) {
            let label_str = render_labels(&tags);
            let prefix = if label_str.is_empty() {
                String::new()
            } else {
                format!("{},", label_str)
            };

            for (le, count) in &stats.buckets {
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
            }
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, stats.count);
            let _ = writeln!(out, "{}_sum{{{}}} {}", name, label_str, stats.total_seconds);
            let _ = writeln!(out, "{}_count{{{}}} {}", name, label_str, stats.count);
        }
    }
}
