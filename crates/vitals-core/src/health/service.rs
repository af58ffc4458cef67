use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;

use crate::error::Result;

use super::probe::{HealthProbe, ProbeReport};

pub const DEFAULT_SUCCESS_PROBABILITY: f64 = 0.8;
pub const TIMEOUT_REASON: &str = "Service timeout";

/// Simulated external dependency: UP with a fixed probability, otherwise DOWN
/// with a timeout reason. Stand-in for a real bounded-latency remote call.
pub struct ServiceProbe {
    name: String,
    success_probability: f64,
}

impl ServiceProbe {
    /// `success_probability` is clamped to `0.0..=1.0`; NaN counts as 0.
    pub fn new(name: impl Into<String>, success_probability: f64) -> Self {
        let success_probability = if success_probability.is_nan() {
            0.0
        } else {
            success_probability.clamp(0.0, 1.0)
        };
        Self {
            name: name.into(),
            success_probability,
        }
    }

    pub fn success_probability(&self) -> f64 {
        self.success_probability
    }

    /// Roll once: `Some(response_ms)` when the service answered.
    fn roll(&self) -> Option<u64> {
        let mut rng = rand::thread_rng();
        rng.gen_bool(self.success_probability)
            .then(|| rng.gen_range(50..250))
    }
}

#[async_trait]
impl HealthProbe for ServiceProbe {
    fn id(&self) -> &'static str {
        "custom"
    }

    async fn check(&self) -> Result<ProbeReport> {
        let report = match self.roll() {
            Some(response_ms) => ProbeReport::up()
                .with_detail("status", "Operational")
                .with_detail("responseTime", format!("{response_ms}ms")),
            None => ProbeReport::down()
                .with_detail("status", "Unavailable")
                .with_detail("error", TIMEOUT_REASON),
        };
        Ok(report
            .with_detail("service", self.name.as_str())
            .with_detail("lastCheck", Utc::now()))
    }
}
