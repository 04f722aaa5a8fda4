//! Collaborator traits for the vitals pipeline.
//!
//! The pipeline owns no storage or infrastructure. Every side effect goes
//! through one of these traits, and each component is constructed with the
//! collaborators it needs:
//!
//! - `VitalsStore`, `PatientSummaryStore`, `AlertStore` — managed data store
//! - `ConfigStore`         — key/value store holding the stream gate flag
//! - `StreamSink`          — producer side of the partitioned stream
//! - `StreamSource`        — consumer side of the partitioned stream
//! - `NotificationChannel` — optional fan-out for alert notifications
//! - `Sleeper`             — the producer's timed waits

use std::time::Duration;

use rpm_contracts::{
    alert::Alert,
    error::PipelineResult,
    patient::SummaryUpdate,
    stream::RawRecord,
    vital::VitalReading,
};

/// Append-only store of vital readings.
pub trait VitalsStore: Send + Sync {
    /// Persist one reading. Readings are never modified or deleted.
    fn put(&self, reading: &VitalReading) -> PipelineResult<()>;
}

/// Store of per-patient rolling summaries.
pub trait PatientSummaryStore: Send + Sync {
    /// Insert the summary if absent, then overwrite every field in `update`.
    ///
    /// Last write wins. Implementations must not merge with prior values or
    /// apply optimistic concurrency checks.
    fn upsert(&self, patient_id: &str, update: &SummaryUpdate) -> PipelineResult<()>;
}

/// Append-only store of alerts.
pub trait AlertStore: Send + Sync {
    fn put(&self, alert: &Alert) -> PipelineResult<()>;
}

/// External key/value configuration store.
pub trait ConfigStore: Send + Sync {
    /// Return the value stored under `key`, or `None` if there is no entry.
    fn get(&self, key: &str) -> PipelineResult<Option<String>>;

    /// Overwrite the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> PipelineResult<()>;
}

/// Producer side of an ordered, partitioned stream.
pub trait StreamSink: Send + Sync {
    /// Append `data` to the partition selected by `partition_key`.
    ///
    /// Records sharing a partition key must be delivered in send order.
    /// Returns the sequence number assigned by the transport.
    fn send(&self, partition_key: &str, data: Vec<u8>) -> PipelineResult<u64>;
}

/// Consumer side of an ordered, partitioned stream.
pub trait StreamSource: Send + Sync {
    /// Return up to `max_records` records, waiting at most `wait` for the
    /// first one to arrive. An empty batch means nothing arrived in time.
    fn receive_batch(&self, max_records: usize, wait: Duration) -> PipelineResult<Vec<RawRecord>>;
}

/// Best-effort notification fan-out (e-mail, SMS, pager topic, ...).
pub trait NotificationChannel: Send + Sync {
    fn publish(&self, subject: &str, message: &str) -> PipelineResult<()>;
}

/// Blocking timed wait.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// `Sleeper` backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
