//! Patient roster entries and the rolling per-patient summary.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::vital::VitalReading;

/// Risk level derived from a single reading's thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    /// An anomaly is any reading whose risk level is not `normal`.
    pub fn is_anomaly(&self) -> bool {
        !matches!(self, Self::Normal)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    M,
    F,
    O,
}

/// A patient on the producer's roster.
///
/// The roster is injected configuration; it is never discovered from the
/// patient directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub patient_id: String,
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub sex: Option<Sex>,
}

/// The fields written by a summary upsert. Every field is overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryUpdate {
    pub last_heart_rate: i32,
    pub last_spo2: i32,
    pub last_bp_sys: i32,
    pub last_bp_dia: i32,
    pub last_vital_timestamp: DateTime<Utc>,
    pub risk_level: RiskLevel,
}

impl SummaryUpdate {
    pub fn from_reading(reading: &VitalReading, risk: RiskLevel) -> Self {
        Self {
            last_heart_rate: reading.heart_rate,
            last_spo2: reading.spo2,
            last_bp_sys: reading.bp_sys,
            last_bp_dia: reading.bp_dia,
            last_vital_timestamp: reading.timestamp,
            risk_level: risk,
        }
    }
}

/// Mutable rolling projection of a patient's most recent reading.
///
/// Demographic fields are only present when the patient was seeded from the
/// roster; a summary created lazily by the consumer carries just the id and
/// the last reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub patient_id: String,
    pub name: Option<String>,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    pub risk_level: RiskLevel,
    pub last_heart_rate: Option<i32>,
    pub last_spo2: Option<i32>,
    pub last_bp_sys: Option<i32>,
    pub last_bp_dia: Option<i32>,
    pub last_vital_timestamp: Option<DateTime<Utc>>,
}

impl PatientSummary {
    /// An empty summary for a patient the store has not seen before.
    pub fn empty(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            name: None,
            age: None,
            sex: None,
            risk_level: RiskLevel::Normal,
            last_heart_rate: None,
            last_spo2: None,
            last_bp_sys: None,
            last_bp_dia: None,
            last_vital_timestamp: None,
        }
    }

    pub fn from_profile(profile: &PatientProfile) -> Self {
        Self {
            name: Some(profile.name.clone()),
            age: profile.age,
            sex: profile.sex,
            ..Self::empty(profile.patient_id.clone())
        }
    }

    /// Overwrite every last_* field and the risk level from `update`.
    ///
    /// Prior values are discarded entirely; nothing is merged.
    pub fn apply(&mut self, update: &SummaryUpdate) {
        self.last_heart_rate = Some(update.last_heart_rate);
        self.last_spo2 = Some(update.last_spo2);
        self.last_bp_sys = Some(update.last_bp_sys);
        self.last_bp_dia = Some(update.last_bp_dia);
        self.last_vital_timestamp = Some(update.last_vital_timestamp);
        self.risk_level = update.risk_level;
    }
}
