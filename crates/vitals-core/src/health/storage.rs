//! Storage availability probe.
//!
//! The probe itself only maps a connector's answer to UP/DOWN; the liveness
//! check lives behind `StorageConnector` so a real driver can be plugged in.
//! `InMemoryConnector` is a placeholder that is always reachable; synchronous
//! drivers go through `BlockingConnector`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use crate::error::{Result, VitalsError};

use super::probe::{HealthProbe, ProbeReport};

/// Liveness check against a storage backend.
#[async_trait]
pub trait StorageConnector: Send + Sync {
    async fn ping(&self) -> Result<()>;
}

/// Placeholder connector with no backend behind it.
#[derive(Debug, Default)]
pub struct InMemoryConnector;

#[async_trait]
impl StorageConnector for InMemoryConnector {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Considers storage alive when a TCP connection to `address` succeeds.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    address: String,
}

impl TcpConnector {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl StorageConnector for TcpConnector {
    async fn ping(&self) -> Result<()> {
        let stream = tokio::net::TcpStream::connect(self.address.as_str()).await?;
        drop(stream);
        Ok(())
    }
}

/// Runs a synchronous liveness check (e.g. a blocking driver's ping) on the
/// blocking pool so it never occupies a runtime worker.
pub struct BlockingConnector<F> {
    check: Arc<F>,
}

impl<F> BlockingConnector<F>
where
    F: Fn() -> Result<()> + Send + Sync + 'static,
{
    pub fn new(check: F) -> Self {
        Self {
            check: Arc::new(check),
        }
    }
}

#[async_trait]
impl<F> StorageConnector for BlockingConnector<F>
where
    F: Fn() -> Result<()> + Send + Sync + 'static,
{
    async fn ping(&self) -> Result<()> {
        let check = Arc::clone(&self.check);
        tokio::task::spawn_blocking(move || (*check)())
            .await
            .map_err(|e| VitalsError::ProbeFailed(format!("storage check aborted: {e}")))?
    }
}

pub struct StorageProbe {
    name: String,
    url: String,
    connector: Arc<dyn StorageConnector>,
    connect_timeout: Duration,
}

impl StorageProbe {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        connector: Arc<dyn StorageConnector>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            connector,
            connect_timeout,
        }
    }

    async fn ping(&self) -> Result<()> {
        match timeout(self.connect_timeout, self.connector.ping()).await {
            Ok(res) => res,
            Err(_) => Err(VitalsError::Timeout(format!(
                "storage check exceeded {}ms",
                self.connect_timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl HealthProbe for StorageProbe {
    fn id(&self) -> &'static str {
        "database"
    }

    async fn check(&self) -> Result<ProbeReport> {
        let report = match self.ping().await {
            Ok(()) => ProbeReport::up()
                .with_detail("status", "Connected")
                .with_detail("url", self.url.as_str()),
            Err(e) => ProbeReport::down()
                .with_detail("status", "Error")
                .with_detail("error", e.to_string()),
        };
        Ok(report.with_detail("database", self.name.as_str()))
    }
}
