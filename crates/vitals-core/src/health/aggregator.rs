use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use serde::Serialize;
use tokio::task::JoinError;
use tokio::time::timeout;

use super::probe::{HealthProbe, HealthStatus, ProbeReport};

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Combined status over every registered probe plus each probe's own result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateHealth {
    pub status: HealthStatus,
    pub components: BTreeMap<String, ProbeReport>,
}

impl AggregateHealth {
    fn from_components(components: BTreeMap<String, ProbeReport>) -> Self {
        let status = components
            .values()
            .fold(HealthStatus::Up, |acc, r| acc.and(r.status));
        Self { status, components }
    }

    pub fn is_up(&self) -> bool {
        self.status.is_up()
    }

    pub fn component(&self, id: &str) -> Option<&ProbeReport> {
        self.components.get(id)
    }
}

/// Registry of probes, evaluated together on demand.
///
/// Nothing is cached: every `aggregate` call runs each probe again. Each probe
/// runs in its own tokio task bounded by `probe_timeout`, so a probe that
/// blocks its worker thread is reported DOWN once the timeout expires instead
/// of holding the aggregation. Blocking work should still go through
/// `spawn_blocking` (see `storage::BlockingConnector`), otherwise it occupies
/// a runtime worker until it returns.
pub struct HealthAggregator {
    probes: DashMap<&'static str, Arc<dyn HealthProbe>>,
    probe_timeout: Duration,
}

impl Default for HealthAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

impl HealthAggregator {
    pub fn new(probe_timeout: Duration) -> Self {
        Self {
            probes: DashMap::new(),
            probe_timeout,
        }
    }

    /// Register a probe; a probe with the same id is replaced.
    pub fn register(&self, probe: Arc<dyn HealthProbe>) {
        let id = probe.id();
        if self.probes.insert(id, probe).is_some() {
            tracing::warn!(probe = id, "health probe replaced");
        }
    }

    pub fn registered_probes(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = self.probes.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// Run every probe and AND-combine their statuses.
    ///
    /// A probe that errors, panics or overruns its timeout is reported DOWN
    /// with an `error` detail; the others are unaffected. With no probes
    /// registered the result is UP. Must be called inside a tokio runtime.
    pub async fn aggregate(&self) -> AggregateHealth {
        // Clone handles out first; no map guard may live across an await.
        let probes: Vec<Arc<dyn HealthProbe>> =
            self.probes.iter().map(|e| Arc::clone(e.value())).collect();

        let limit = self.probe_timeout;
        let mut futs: FuturesUnordered<_> = probes
            .into_iter()
            .map(|probe| run_probe(probe, limit))
            .collect();

        let mut components = BTreeMap::new();
        while let Some((id, report)) = futs.next().await {
            components.insert(id.to_string(), report);
        }

        let health = AggregateHealth::from_components(components);
        tracing::debug!(status = %health.status, probes = health.components.len(), "health aggregated");
        health
    }
}

async fn run_probe(probe: Arc<dyn HealthProbe>, limit: Duration) -> (&'static str, ProbeReport) {
    let id = probe.id();
    let mut task = tokio::spawn(async move { probe.check().await });

    let report = match timeout(limit, &mut task).await {
        Ok(Ok(Ok(report))) => report,
        Ok(Ok(Err(e))) => {
            tracing::warn!(probe = id, error = %e, "health probe failed");
            ProbeReport::down().with_detail("error", e.to_string())
        }
        Ok(Err(join)) => {
            let msg = join_failure(join);
            tracing::warn!(probe = id, error = %msg, "health probe task failed");
            ProbeReport::down().with_detail("error", msg)
        }
        Err(_) => {
            // Stops async probes; a thread stuck in blocking code runs on
            // until it returns, but its result is discarded.
            task.abort();
            tracing::warn!(probe = id, timeout_ms = limit.as_millis() as u64, "health probe timed out");
            ProbeReport::down().with_detail(
                "error",
                format!("probe timed out after {}ms", limit.as_millis()),
            )
        }
    };

    if !report.status.is_up() {
        tracing::warn!(probe = id, "health probe reported DOWN");
    }
    (id, report)
}

fn join_failure(err: JoinError) -> String {
    if err.is_panic() {
        format!("probe panicked: {}", panic_message(err.into_panic().as_ref()))
    } else {
        "probe task cancelled".to_string()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
