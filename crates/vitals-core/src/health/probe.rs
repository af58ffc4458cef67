use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

/// Probe or aggregate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    Down,
}

impl HealthStatus {
    pub fn is_up(self) -> bool {
        self == HealthStatus::Up
    }

    /// AND-combine: UP only when both sides are UP.
    pub fn and(self, other: HealthStatus) -> HealthStatus {
        if self.is_up() && other.is_up() {
            HealthStatus::Up
        } else {
            HealthStatus::Down
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Up => write!(f, "UP"),
            HealthStatus::Down => write!(f, "DOWN"),
        }
    }
}

/// One diagnostic value attached to a probe result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Detail {
    Int(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl From<&str> for Detail {
    fn from(v: &str) -> Self {
        Detail::Text(v.to_string())
    }
}

impl From<String> for Detail {
    fn from(v: String) -> Self {
        Detail::Text(v)
    }
}

impl From<i64> for Detail {
    fn from(v: i64) -> Self {
        Detail::Int(v)
    }
}

impl From<f64> for Detail {
    fn from(v: f64) -> Self {
        Detail::Float(v)
    }
}

impl From<DateTime<Utc>> for Detail {
    fn from(v: DateTime<Utc>) -> Self {
        Detail::Timestamp(v)
    }
}

impl Detail {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Detail::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// What a probe observed on one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReport {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Detail>,
}

impl ProbeReport {
    pub fn up() -> Self {
        Self::with_status(HealthStatus::Up)
    }

    pub fn down() -> Self {
        Self::with_status(HealthStatus::Down)
    }

    fn with_status(status: HealthStatus) -> Self {
        Self {
            status,
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Detail>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&Detail> {
        self.details.get(key)
    }
}

/// A single independent health check.
///
/// `check` is invoked fresh on every aggregation; implementations keep no
/// result cache. Returning `Err` (or panicking) is reported as DOWN for this
/// probe only.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Stable identifier, used as the component key in aggregate output.
    fn id(&self) -> &'static str;
    async fn check(&self) -> Result<ProbeReport>;
}
