//! Configuration schema.
//!
//! A `PipelineConfig` is deserialized from TOML. Every section and field is
//! optional; omitted values fall back to the defaults documented on each
//! field.
//!
//! Example:
//! ```toml
//! [producer]
//! anomaly_probability = 0.15
//! seed = 7
//!
//! [notification]
//! topic = "rpm-alerts"
//!
//! [[patients]]
//! patient_id = "p1"
//! name = "Alice Johnson"
//! age = 54
//! sex = "F"
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use rpm_contracts::patient::PatientProfile;
use rpm_core::{ConsumerSettings, ProducerSettings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerSection {
    /// Probability that a generated reading is anomalous. Default 0.15.
    pub anomaly_probability: f64,
    /// Sleep while the stream is OFF. Default 5000.
    pub off_backoff_ms: u64,
    /// Per-patient jitter bounds. Default 500..=1500.
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
    /// Pause between cycles before jitter. Default 5000.
    pub cycle_base_ms: u64,
    /// Signed jitter added to `cycle_base_ms`. Default -2000..=3000.
    pub cycle_jitter_min_ms: i64,
    pub cycle_jitter_max_ms: i64,
    /// Lower bound on the pause between cycles. Default 1000.
    pub cycle_floor_ms: u64,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for ProducerSection {
    fn default() -> Self {
        Self {
            anomaly_probability: 0.15,
            off_backoff_ms: 5000,
            jitter_min_ms: 500,
            jitter_max_ms: 1500,
            cycle_base_ms: 5000,
            cycle_jitter_min_ms: -2000,
            cycle_jitter_max_ms: 3000,
            cycle_floor_ms: 1000,
            seed: None,
        }
    }
}

impl ProducerSection {
    pub fn to_settings(&self) -> ProducerSettings {
        ProducerSettings {
            anomaly_probability: self.anomaly_probability,
            off_backoff: Duration::from_millis(self.off_backoff_ms),
            jitter_min: Duration::from_millis(self.jitter_min_ms),
            jitter_max: Duration::from_millis(self.jitter_max_ms),
            cycle_base: Duration::from_millis(self.cycle_base_ms),
            cycle_jitter_min_ms: self.cycle_jitter_min_ms,
            cycle_jitter_max_ms: self.cycle_jitter_max_ms,
            cycle_floor: Duration::from_millis(self.cycle_floor_ms),
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerSection {
    /// Maximum records per batch. Default 100.
    pub batch_size: usize,
    /// How long one receive waits for records. Default 1000.
    pub receive_wait_ms: u64,
}

impl Default for ConsumerSection {
    fn default() -> Self {
        Self {
            batch_size: 100,
            receive_wait_ms: 1000,
        }
    }
}

impl ConsumerSection {
    pub fn to_settings(&self) -> ConsumerSettings {
        ConsumerSettings {
            batch_size: self.batch_size,
            receive_wait: Duration::from_millis(self.receive_wait_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSection {
    pub stream_name: String,
    /// Number of partitions. Default 4.
    pub shard_count: usize,
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            stream_name: "patient-vitals-stream".to_string(),
            shard_count: 4,
        }
    }
}

/// Notification channel settings. No topic means no channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSection {
    pub topic: Option<String>,
}

impl NotificationSection {
    /// The configured topic, treating an empty or blank string as absent.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// The top-level structure deserialized from a pipeline TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub producer: ProducerSection,
    pub consumer: ConsumerSection,
    pub transport: TransportSection,
    pub notification: NotificationSection,
    /// The producer's roster, in emission order.
    pub patients: Vec<PatientProfile>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            producer: ProducerSection::default(),
            consumer: ConsumerSection::default(),
            transport: TransportSection::default(),
            notification: NotificationSection::default(),
            patients: default_roster(),
        }
    }
}

/// The four demo patients used when no roster is configured.
pub fn default_roster() -> Vec<PatientProfile> {
    [
        ("p1", "Alice Johnson"),
        ("p2", "Bob Smith"),
        ("p3", "Carlos Diaz"),
        ("p4", "Diana Patel"),
    ]
    .into_iter()
    .map(|(id, name)| PatientProfile {
        patient_id: id.to_string(),
        name: name.to_string(),
        age: None,
        sex: None,
    })
    .collect()
}
