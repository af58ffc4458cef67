//! Probe behavior and AND-style aggregation.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use vitals_core::error::{Result, VitalsError};
use vitals_core::health::{
    BlockingConnector, Detail, HealthAggregator, HealthProbe, HealthStatus, InMemoryConnector,
    ProbeReport, ServiceProbe, StorageConnector, StorageProbe, TcpConnector, TIMEOUT_REASON,
};

fn storage_probe(connector: Arc<dyn StorageConnector>) -> Arc<StorageProbe> {
    Arc::new(StorageProbe::new(
        "H2 Database",
        "jdbc:h2:mem:testdb",
        connector,
        Duration::from_millis(200),
    ))
}

fn aggregator_with(service_probability: f64) -> HealthAggregator {
    let agg = HealthAggregator::new(Duration::from_millis(500));
    agg.register(Arc::new(ServiceProbe::new("Custom Service", service_probability)));
    agg.register(storage_probe(Arc::new(InMemoryConnector)));
    agg
}

struct FailingProbe;

#[async_trait]
impl HealthProbe for FailingProbe {
    fn id(&self) -> &'static str {
        "failing"
    }
    async fn check(&self) -> Result<ProbeReport> {
        Err(VitalsError::ProbeFailed("disk on fire".into()))
    }
}

struct PanickingProbe;

#[async_trait]
impl HealthProbe for PanickingProbe {
    fn id(&self) -> &'static str {
        "panicking"
    }
    async fn check(&self) -> Result<ProbeReport> {
        panic!("probe bug");
    }
}

struct SlowProbe;

#[async_trait]
impl HealthProbe for SlowProbe {
    fn id(&self) -> &'static str {
        "slow"
    }
    async fn check(&self) -> Result<ProbeReport> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(ProbeReport::up())
    }
}

/// Parks its worker thread instead of yielding, like a synchronous driver call.
struct StalledCheck;

#[async_trait]
impl HealthProbe for StalledCheck {
    fn id(&self) -> &'static str {
        "stalled"
    }
    async fn check(&self) -> Result<ProbeReport> {
        std::thread::sleep(Duration::from_secs(1));
        Ok(ProbeReport::up())
    }
}

#[derive(Default)]
struct CountingProbe {
    calls: AtomicU64,
}

#[async_trait]
impl HealthProbe for CountingProbe {
    fn id(&self) -> &'static str {
        "counting"
    }
    async fn check(&self) -> Result<ProbeReport> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ProbeReport::up().with_detail("calls", n as i64))
    }
}

struct RefusingConnector;

#[async_trait]
impl StorageConnector for RefusingConnector {
    async fn ping(&self) -> Result<()> {
        Err(VitalsError::ProbeFailed("Connection refused by H2".into()))
    }
}

struct HangingConnector;

#[async_trait]
impl StorageConnector for HangingConnector {
    async fn ping(&self) -> Result<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

#[tokio::test]
async fn all_up_when_every_probe_is_up() {
    let health = aggregator_with(1.0).aggregate().await;
    assert_eq!(health.status, HealthStatus::Up);
    assert_eq!(health.components.len(), 2);

    let custom = health.component("custom").unwrap();
    assert_eq!(custom.status, HealthStatus::Up);
    assert_eq!(custom.detail("status").unwrap().as_text(), Some("Operational"));
    assert_eq!(custom.detail("service").unwrap().as_text(), Some("Custom Service"));
    assert!(custom.detail("lastCheck").is_some());

    let rt = custom.detail("responseTime").unwrap().as_text().unwrap();
    let ms: u64 = rt.strip_suffix("ms").unwrap().parse().unwrap();
    assert!((50..250).contains(&ms));
}

#[tokio::test]
async fn service_down_makes_overall_down() {
    let health = aggregator_with(0.0).aggregate().await;
    assert_eq!(health.status, HealthStatus::Down);

    let custom = health.component("custom").unwrap();
    assert_eq!(custom.status, HealthStatus::Down);
    assert_eq!(custom.detail("error").unwrap().as_text(), Some(TIMEOUT_REASON));
    assert_eq!(custom.detail("status").unwrap().as_text(), Some("Unavailable"));
    assert!(custom.detail("responseTime").is_none());

    let db = health.component("database").unwrap();
    assert_eq!(db.status, HealthStatus::Up);
    assert_eq!(db.detail("status").unwrap().as_text(), Some("Connected"));
    assert_eq!(db.detail("url").unwrap().as_text(), Some("jdbc:h2:mem:testdb"));
}

#[tokio::test]
async fn storage_failure_text_is_surfaced_verbatim() {
    let agg = HealthAggregator::default();
    agg.register(Arc::new(ServiceProbe::new("Custom Service", 1.0)));
    agg.register(storage_probe(Arc::new(RefusingConnector)));

    let health = agg.aggregate().await;
    assert_eq!(health.status, HealthStatus::Down);
    assert_eq!(health.component("custom").unwrap().status, HealthStatus::Up);

    let db = health.component("database").unwrap();
    assert_eq!(db.status, HealthStatus::Down);
    assert_eq!(db.detail("status").unwrap().as_text(), Some("Error"));
    assert_eq!(db.detail("error").unwrap().as_text(), Some("Connection refused by H2"));
    assert_eq!(db.detail("database").unwrap().as_text(), Some("H2 Database"));
}

#[tokio::test]
async fn hanging_storage_check_reports_down_within_its_timeout() {
    let agg = HealthAggregator::new(Duration::from_secs(5));
    agg.register(storage_probe(Arc::new(HangingConnector)));

    let health = tokio::time::timeout(Duration::from_secs(2), agg.aggregate())
        .await
        .expect("storage probe must bound its own check");
    let db = health.component("database").unwrap();
    assert_eq!(db.status, HealthStatus::Down);
    assert!(db.detail("error").unwrap().as_text().unwrap().contains("200ms"));
}

#[tokio::test]
async fn failing_probe_is_isolated() {
    let agg = aggregator_with(1.0);
    agg.register(Arc::new(FailingProbe));
    agg.register(Arc::new(PanickingProbe));

    let health = agg.aggregate().await;
    assert_eq!(health.status, HealthStatus::Down);
    assert_eq!(health.components.len(), 4);

    let failing = health.component("failing").unwrap();
    assert_eq!(failing.status, HealthStatus::Down);
    assert_eq!(failing.detail("error").unwrap().as_text(), Some("disk on fire"));

    let panicking = health.component("panicking").unwrap();
    assert_eq!(panicking.status, HealthStatus::Down);
    assert!(panicking.detail("error").unwrap().as_text().unwrap().contains("probe bug"));

    assert_eq!(health.component("custom").unwrap().status, HealthStatus::Up);
    assert_eq!(health.component("database").unwrap().status, HealthStatus::Up);
}

#[tokio::test]
async fn slow_probe_times_out_without_stalling_others() {
    let agg = HealthAggregator::new(Duration::from_millis(50));
    agg.register(Arc::new(SlowProbe));
    agg.register(Arc::new(ServiceProbe::new("Custom Service", 1.0)));

    let health = tokio::time::timeout(Duration::from_secs(2), agg.aggregate())
        .await
        .expect("aggregation must be bounded by the probe timeout");

    let slow = health.component("slow").unwrap();
    assert_eq!(slow.status, HealthStatus::Down);
    assert!(slow.detail("error").unwrap().as_text().unwrap().contains("timed out"));
    assert_eq!(health.component("custom").unwrap().status, HealthStatus::Up);
    assert_eq!(health.status, HealthStatus::Down);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn thread_blocking_check_still_times_out() {
    let agg = HealthAggregator::new(Duration::from_millis(50));
    agg.register(Arc::new(StalledCheck));
    agg.register(Arc::new(ServiceProbe::new("Custom Service", 1.0)));

    let started = Instant::now();
    let health = agg.aggregate().await;
    assert!(started.elapsed() < Duration::from_millis(500));

    let stalled = health.component("stalled").unwrap();
    assert_eq!(stalled.status, HealthStatus::Down);
    assert!(stalled.detail("error").unwrap().as_text().unwrap().contains("timed out"));
    assert_eq!(health.component("custom").unwrap().status, HealthStatus::Up);
    assert_eq!(health.status, HealthStatus::Down);
}

#[tokio::test]
async fn blocking_connector_is_bounded_by_storage_timeout() {
    let agg = HealthAggregator::default();
    agg.register(storage_probe(Arc::new(BlockingConnector::new(|| {
        std::thread::sleep(Duration::from_secs(1));
        Ok(())
    }))));

    let started = Instant::now();
    let health = agg.aggregate().await;
    assert!(started.elapsed() < Duration::from_millis(800));

    let db = health.component("database").unwrap();
    assert_eq!(db.status, HealthStatus::Down);
    assert!(db.detail("error").unwrap().as_text().unwrap().contains("200ms"));
}

#[tokio::test]
async fn blocking_connector_passes_through_its_result() {
    let ok = BlockingConnector::new(|| Ok(()));
    assert!(ok.ping().await.is_ok());

    let agg = HealthAggregator::default();
    agg.register(storage_probe(Arc::new(BlockingConnector::new(|| {
        Err(VitalsError::ProbeFailed("driver: socket closed".into()))
    }))));
    let health = agg.aggregate().await;
    let db = health.component("database").unwrap();
    assert_eq!(db.status, HealthStatus::Down);
    assert_eq!(db.detail("error").unwrap().as_text(), Some("driver: socket closed"));
}

#[tokio::test]
async fn probes_run_fresh_on_every_aggregation() {
    let agg = HealthAggregator::default();
    let probe = Arc::new(CountingProbe::default());
    agg.register(probe.clone());

    agg.aggregate().await;
    let second = agg.aggregate().await;

    assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        second.component("counting").unwrap().detail("calls"),
        Some(&Detail::Int(2))
    );
}

#[tokio::test]
async fn no_probes_is_up() {
    let health = HealthAggregator::default().aggregate().await;
    assert!(health.is_up());
    assert!(health.components.is_empty());
}

#[tokio::test]
async fn registering_same_id_replaces_probe() {
    let agg = HealthAggregator::default();
    agg.register(Arc::new(ServiceProbe::new("first", 0.0)));
    agg.register(Arc::new(ServiceProbe::new("second", 1.0)));

    assert_eq!(agg.registered_probes(), vec!["custom"]);
    let health = agg.aggregate().await;
    let custom = health.component("custom").unwrap();
    assert_eq!(custom.detail("service").unwrap().as_text(), Some("second"));
}

#[tokio::test]
async fn tcp_connector_checks_a_real_socket() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let up = TcpConnector::new(addr.clone());
    assert!(up.ping().await.is_ok());

    drop(listener);
    let agg = HealthAggregator::default();
    agg.register(storage_probe(Arc::new(TcpConnector::new(addr))));
    let health = agg.aggregate().await;
    assert_eq!(health.component("database").unwrap().status, HealthStatus::Down);
}

#[test]
fn probability_is_clamped() {
    assert_eq!(ServiceProbe::new("s", 1.7).success_probability(), 1.0);
    assert_eq!(ServiceProbe::new("s", -0.2).success_probability(), 0.0);
    assert_eq!(ServiceProbe::new("s", f64::NAN).success_probability(), 0.0);
}

#[tokio::test]
async fn aggregate_serializes_as_status_and_components() {
    let health = aggregator_with(0.0).aggregate().await;
    let v = serde_json::to_value(&health).unwrap();

    assert_eq!(v["status"], "DOWN");
    assert_eq!(v["components"]["custom"]["status"], "DOWN");
    assert_eq!(v["components"]["custom"]["details"]["error"], "Service timeout");
    assert_eq!(v["components"]["database"]["status"], "UP");
    assert_eq!(v["components"]["database"]["details"]["database"], "H2 Database");
}
