//! Shared application state for the vitals gateway.
//!
//! The metrics registry and the health aggregator are built once here and
//! handed to every handler through `AppState`; nothing is looked up globally.

use std::sync::Arc;

use vitals_core::error::Result;
use vitals_core::health::{
    HealthAggregator, InMemoryConnector, ServiceProbe, StorageConnector, StorageProbe,
    TcpConnector,
};
use vitals_core::metrics::MetricsRegistry;

use crate::config::VitalsConfig;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    metrics: Arc<MetricsRegistry>,
    health: Arc<HealthAggregator>,
}

struct AppStateInner {
    cfg: VitalsConfig,
}

impl AppState {
    /// Build application state from a validated config.
    pub fn new(cfg: VitalsConfig) -> Result<Self> {
        cfg.validate()?;

        // 1) Metrics registry
        let metrics = MetricsRegistry::new(cfg.metrics.application.clone())
            .with_max_operation_types(cfg.metrics.max_operation_types);

        // 2) Health aggregator + built-in probes
        let health = HealthAggregator::new(cfg.health.probe_timeout());

        let svc = &cfg.health.service;
        health.register(Arc::new(ServiceProbe::new(
            svc.name.clone(),
            svc.success_probability,
        )));

        let storage = &cfg.health.storage;
        let connector: Arc<dyn StorageConnector> = match &storage.address {
            Some(addr) => Arc::new(TcpConnector::new(addr.clone())),
            None => {
                tracing::warn!(
                    database = %storage.name,
                    "no storage address configured, storage probe uses the in-memory placeholder"
                );
                Arc::new(InMemoryConnector)
            }
        };
        health.register(Arc::new(StorageProbe::new(
            storage.name.clone(),
            storage.url.clone(),
            connector,
            cfg.health.storage_connect_timeout(),
        )));

        tracing::info!(
            application = %metrics.application(),
            probes = ?health.registered_probes(),
            "vitals state ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg }),
            metrics: Arc::new(metrics),
            health: Arc::new(health),
        })
    }

    pub fn cfg(&self) -> &VitalsConfig {
        &self.inner.cfg
    }

    pub fn metrics(&self) -> Arc<MetricsRegistry> {
        Arc::clone(&self.metrics)
    }

    pub fn health(&self) -> Arc<HealthAggregator> {
        Arc::clone(&self.health)
    }
}
