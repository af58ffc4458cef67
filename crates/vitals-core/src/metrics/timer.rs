//! Start/stop duration measurement.
//!
//! A `Sample` is consumed by `MetricsRegistry::stop_timer`, so stopping the
//! same sample twice does not compile. `TimerGuard` wraps a sample and stops
//! it on drop, covering early returns, `?` and unwinding.

use std::time::{Duration, Instant};

use super::family::Histogram;
use super::registry::MetricsRegistry;

/// Ephemeral handle for one in-flight measurement.
#[derive(Debug)]
#[must_use = "a Sample records nothing until passed to MetricsRegistry::stop_timer"]
pub struct Sample {
    pub(crate) registry_id: u64,
    pub(crate) started: Instant,
}

impl Sample {
    pub(crate) fn start(registry_id: u64) -> Self {
        Self {
            registry_id,
            started: Instant::now(),
        }
    }

    /// Time since the sample was started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Scoped measurement: records into its target timer when dropped.
#[must_use = "dropping the guard immediately records a near-zero duration"]
pub struct TimerGuard<'a> {
    registry: &'a MetricsRegistry,
    target: Histogram,
    sample: Option<Sample>,
}

impl<'a> TimerGuard<'a> {
    pub(crate) fn new(registry: &'a MetricsRegistry, target: Histogram) -> Self {
        Self {
            registry,
            target,
            sample: Some(registry.start_timer()),
        }
    }

    /// Stop now and return the recorded duration.
    pub fn finish(mut self) -> Duration {
        self.stop().unwrap_or_default()
    }

    fn stop(&mut self) -> Option<Duration> {
        let sample = self.sample.take()?;
        Some(self.registry.record(sample, &self.target))
    }
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.stop();
    }
}
