//! Vital-sign readings: the stream wire message and the persisted fact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::patient::RiskLevel;

/// One reading as emitted onto the stream by the producer.
///
/// Serialized as JSON with `timestamp` in ISO-8601 UTC:
///
/// ```json
/// { "patient_id": "p1", "heart_rate": 82, "spo2": 97,
///   "bp_sys": 121, "bp_dia": 79, "timestamp": "2026-10-16T09:30:00Z" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalMessage {
    pub patient_id: String,
    pub heart_rate: i32,
    pub spo2: i32,
    pub bp_sys: i32,
    pub bp_dia: i32,
    pub timestamp: DateTime<Utc>,
}

/// An immutable, persisted vital-sign reading.
///
/// Created once by the consumer at ingestion time. `is_anomaly` is true
/// exactly when the reading's risk level is not `normal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalReading {
    pub patient_id: String,
    pub timestamp: DateTime<Utc>,
    pub heart_rate: i32,
    pub spo2: i32,
    pub bp_sys: i32,
    pub bp_dia: i32,
    pub is_anomaly: bool,
}

impl VitalReading {
    /// Build the persisted reading for `message` classified as `risk`.
    pub fn from_message(message: &VitalMessage, risk: RiskLevel) -> Self {
        Self {
            patient_id: message.patient_id.clone(),
            timestamp: message.timestamp,
            heart_rate: message.heart_rate,
            spo2: message.spo2,
            bp_sys: message.bp_sys,
            bp_dia: message.bp_dia,
            is_anomaly: risk.is_anomaly(),
        }
    }
}
