use std::time::Duration;

use serde::Deserialize;
use vitals_core::error::{Result, VitalsError};
use vitals_core::health::DEFAULT_SUCCESS_PROBABILITY;
use vitals_core::metrics::DEFAULT_MAX_OPERATION_TYPES;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VitalsConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub metrics: MetricsSection,

    #[serde(default)]
    pub health: HealthSection,

    #[serde(default)]
    pub api: ApiSection,
}

impl VitalsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(VitalsError::UnsupportedVersion);
        }

        self.metrics.validate()?;
        self.health.validate()?;
        self.api.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Value of the `application` tag carried by every series.
    #[serde(default = "default_application")]
    pub application: String,

    /// Distinct business-operation types tracked before folding into the
    /// overflow series. `0` disables the cap.
    #[serde(default = "default_max_operation_types")]
    pub max_operation_types: usize,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            application: default_application(),
            max_operation_types: default_max_operation_types(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        if self.application.trim().is_empty() {
            return Err(VitalsError::BadRequest(
                "metrics.application must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn default_application() -> String {
    "actuator-monitoring".into()
}
fn default_max_operation_types() -> usize {
    DEFAULT_MAX_OPERATION_TYPES
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthSection {
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    #[serde(default)]
    pub service: ServiceProbeSection,

    #[serde(default)]
    pub storage: StorageProbeSection,
}

impl Default for HealthSection {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_probe_timeout_ms(),
            service: ServiceProbeSection::default(),
            storage: StorageProbeSection::default(),
        }
    }
}

impl HealthSection {
    pub fn validate(&self) -> Result<()> {
        if !(10..=60000).contains(&self.probe_timeout_ms) {
            return Err(VitalsError::BadRequest(
                "health.probe_timeout_ms must be between 10 and 60000".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.service.success_probability) {
            return Err(VitalsError::BadRequest(
                "health.service.success_probability must be between 0.0 and 1.0".into(),
            ));
        }
        if let Some(addr) = &self.storage.address {
            if !is_host_port(addr) {
                return Err(VitalsError::BadRequest(
                    "health.storage.address must be host:port".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Bound on one storage liveness check: 90% of `probe_timeout`, so the
    /// storage probe reports its own timeout before the aggregator cuts it off.
    pub fn storage_connect_timeout(&self) -> Duration {
        let limit = self.probe_timeout();
        limit - limit / 10
    }
}

/// `host:port` with a non-empty host and a non-zero port; the port is
/// whatever follows the last colon, so `[::1]:5432` is accepted.
fn is_host_port(addr: &str) -> bool {
    match addr.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty() && matches!(port.parse::<u16>(), Ok(p) if p != 0)
        }
        None => false,
    }
}

fn default_probe_timeout_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceProbeSection {
    #[serde(default = "default_service_name")]
    pub name: String,

    #[serde(default = "default_success_probability")]
    pub success_probability: f64,
}

impl Default for ServiceProbeSection {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            success_probability: default_success_probability(),
        }
    }
}

fn default_service_name() -> String {
    "Custom Service".into()
}
fn default_success_probability() -> f64 {
    DEFAULT_SUCCESS_PROBABILITY
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageProbeSection {
    #[serde(default = "default_storage_name")]
    pub name: String,

    /// Reported as a diagnostic only.
    #[serde(default = "default_storage_url")]
    pub url: String,

    /// `host:port` to connect to. Without it the probe uses the in-memory
    /// placeholder connector, which is always reachable.
    #[serde(default)]
    pub address: Option<String>,
}

impl Default for StorageProbeSection {
    fn default() -> Self {
        Self {
            name: default_storage_name(),
            url: default_storage_url(),
            address: None,
        }
    }
}

fn default_storage_name() -> String {
    "H2 Database".into()
}
fn default_storage_url() -> String {
    "jdbc:h2:mem:testdb".into()
}

/// Knobs for the simulated business operation behind `/api/operation`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    #[serde(default = "default_operation_delay_min_ms")]
    pub operation_delay_min_ms: u64,

    #[serde(default = "default_operation_delay_max_ms")]
    pub operation_delay_max_ms: u64,

    #[serde(default)]
    pub operation_failure_rate: f64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            operation_delay_min_ms: default_operation_delay_min_ms(),
            operation_delay_max_ms: default_operation_delay_max_ms(),
            operation_failure_rate: 0.0,
        }
    }
}

impl ApiSection {
    pub fn validate(&self) -> Result<()> {
        if self.operation_delay_min_ms > self.operation_delay_max_ms {
            return Err(VitalsError::BadRequest(
                "api.operation_delay_min_ms must not exceed operation_delay_max_ms".into(),
            ));
        }
        if self.operation_delay_max_ms > 10000 {
            return Err(VitalsError::BadRequest(
                "api.operation_delay_max_ms must be at most 10000".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.operation_failure_rate) {
            return Err(VitalsError::BadRequest(
                "api.operation_failure_rate must be between 0.0 and 1.0".into(),
            ));
        }
        Ok(())
    }
}

fn default_operation_delay_min_ms() -> u64 {
    50
}
fn default_operation_delay_max_ms() -> u64 {
    250
}
