//! Alert records raised on anomalous readings.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::patient::RiskLevel;

/// Globally unique alert identifier.
///
/// Random (UUID v4) rather than derived from patient and timestamp, so two
/// readings for the same patient at the same instant never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub uuid::Uuid);

impl AlertId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

impl AlertLevel {
    /// The alert level raised for a reading at `risk`, if any.
    pub fn for_risk(risk: RiskLevel) -> Option<Self> {
        match risk {
            RiskLevel::Normal => None,
            RiskLevel::Warning => Some(Self::Warning),
            RiskLevel::Critical => Some(Self::Critical),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Where an alert came from.
///
/// `Auto` alerts are raised by the consumer; `Manual` alerts are created by
/// clinicians through the query API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSource {
    #[default]
    Auto,
    Manual,
}

/// An immutable alert record. Never mutated or deleted after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: AlertId,
    pub patient_id: String,
    pub created_at: DateTime<Utc>,
    pub message: String,
    pub level: AlertLevel,
    #[serde(default)]
    pub source: AlertSource,
}
