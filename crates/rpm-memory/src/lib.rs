//! # rpm-memory
//!
//! In-memory reference implementations of every collaborator the vitals
//! pipeline depends on. Used by the demo and by tests; a deployment would
//! back the same traits with a managed database, a hosted stream, and a
//! real notification service.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rpm_memory::{InMemoryAlertStore, InMemorySummaryStore, InMemoryVitalsStore};
//! use rpm_core::{AlertPublisher, VitalsConsumer};
//!
//! let consumer = VitalsConsumer::new(
//!     Arc::new(InMemoryVitalsStore::new()),
//!     Arc::new(InMemorySummaryStore::new()),
//!     Arc::new(InMemoryAlertStore::new()),
//!     AlertPublisher::disabled(),
//! );
//! ```

pub mod config_store;
pub mod notify;
pub mod store;
pub mod stream;

pub use config_store::InMemoryConfigStore;
pub use notify::{Notification, RecordingChannel};
pub use store::{InMemoryAlertStore, InMemorySummaryStore, InMemoryVitalsStore};
pub use stream::InMemoryStream;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{
        sync::{atomic::AtomicBool, Arc},
        thread,
        time::{Duration, Instant},
    };

    use chrono::{TimeZone, Utc};

    use rpm_contracts::{
        alert::{Alert, AlertId, AlertLevel, AlertSource},
        error::PipelineError,
        patient::{PatientProfile, RiskLevel, Sex, SummaryUpdate},
        stream::{StreamStatus, STREAM_STATUS_KEY},
        vital::VitalMessage,
    };
    use rpm_core::{
        traits::{AlertStore, ConfigStore, PatientSummaryStore, StreamSink, StreamSource, Sleeper},
        AlertPublisher, ConsumerSettings, ProducerSettings, StreamStatusGate, VitalsConsumer,
        VitalsProducer,
    };

    use super::*;

    struct NoSleep;

    impl Sleeper for NoSleep {
        fn sleep(&self, _duration: Duration) {}
    }

    fn message_bytes(patient_id: &str, hr: i32) -> Vec<u8> {
        serde_json::to_vec(&VitalMessage {
            patient_id: patient_id.to_string(),
            heart_rate: hr,
            spo2: 97,
            bp_sys: 120,
            bp_dia: 80,
            timestamp: Utc::now(),
        })
        .unwrap()
    }

    fn update(hr: i32, risk: RiskLevel) -> SummaryUpdate {
        SummaryUpdate {
            last_heart_rate: hr,
            last_spo2: 97,
            last_bp_sys: 120,
            last_bp_dia: 80,
            last_vital_timestamp: Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap(),
            risk_level: risk,
        }
    }

    // ── Stream ────────────────────────────────────────────────────────────────

    #[test]
    fn stream_preserves_per_key_order() {
        let stream = InMemoryStream::new("vitals", 3);
        for i in 0..20 {
            for key in ["p1", "p2", "p3", "p4"] {
                stream.send(key, message_bytes(key, 60 + i)).unwrap();
            }
        }

        let mut received = Vec::new();
        loop {
            let batch = stream.receive_batch(7, Duration::from_millis(0)).unwrap();
            if batch.is_empty() {
                break;
            }
            received.extend(batch);
        }

        assert_eq!(received.len(), 80);
        for key in ["p1", "p2", "p3", "p4"] {
            let seqs: Vec<u64> = received
                .iter()
                .filter(|r| r.partition_key == key)
                .map(|r| r.sequence_number)
                .collect();
            assert_eq!(seqs.len(), 20);
            assert!(seqs.windows(2).all(|w| w[0] < w[1]), "{key} out of order: {:?}", seqs);
        }
    }

    #[test]
    fn stream_routes_a_key_to_one_shard() {
        let stream = InMemoryStream::new("vitals", 4);
        let shard = stream.shard_for("p1");
        assert!(shard < 4);
        assert_eq!(stream.shard_for("p1"), shard);
        assert_eq!(InMemoryStream::new("x", 0).shard_count(), 1);
    }

    #[test]
    fn stream_sequence_numbers_increase() {
        let stream = InMemoryStream::new("vitals", 2);
        let a = stream.send("p1", b"{}".to_vec()).unwrap();
        let b = stream.send("p2", b"{}".to_vec()).unwrap();
        assert!(b > a);
        assert_eq!(stream.pending(), 2);
    }

    #[test]
    fn empty_receive_waits_then_returns_nothing() {
        let stream = InMemoryStream::new("vitals", 1);
        let started = Instant::now();
        let batch = stream.receive_batch(10, Duration::from_millis(50)).unwrap();
        assert!(batch.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn receive_wakes_on_send() {
        let stream = Arc::new(InMemoryStream::new("vitals", 2));
        let sender = {
            let stream = stream.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                stream.send("p1", b"{}".to_vec()).unwrap();
            })
        };

        let batch = stream.receive_batch(10, Duration::from_secs(5)).unwrap();
        sender.join().unwrap();
        assert_eq!(batch.len(), 1);
    }

    // ── Stores ────────────────────────────────────────────────────────────────

    #[test]
    fn summary_is_created_lazily_then_overwritten() {
        let store = InMemorySummaryStore::new();
        assert!(store.get("p9").is_none());

        store.upsert("p9", &update(150, RiskLevel::Critical)).unwrap();
        let created = store.get("p9").unwrap();
        assert_eq!(created.name, None);
        assert_eq!(created.risk_level, RiskLevel::Critical);

        store.upsert("p9", &update(80, RiskLevel::Normal)).unwrap();
        let updated = store.get("p9").unwrap();
        assert_eq!(updated.risk_level, RiskLevel::Normal);
        assert_eq!(updated.last_heart_rate, Some(80));
    }

    #[test]
    fn seeding_keeps_existing_rows() {
        let store = InMemorySummaryStore::new();
        store.upsert("p1", &update(150, RiskLevel::Critical)).unwrap();
        store.seed(&[
            PatientProfile {
                patient_id: "p1".to_string(),
                name: "Alice Johnson".to_string(),
                age: Some(54),
                sex: Some(Sex::F),
            },
            PatientProfile {
                patient_id: "p2".to_string(),
                name: "Bob Smith".to_string(),
                age: None,
                sex: None,
            },
        ]);

        assert_eq!(store.get("p1").unwrap().risk_level, RiskLevel::Critical);
        assert_eq!(store.get("p1").unwrap().name, None);
        assert_eq!(store.get("p2").unwrap().name.as_deref(), Some("Bob Smith"));
        assert_eq!(store.all().len(), 2);
    }

    #[test]
    fn alert_store_rejects_duplicate_ids() {
        let store = InMemoryAlertStore::new();
        let alert = Alert {
            alert_id: AlertId::new(),
            patient_id: "p1".to_string(),
            created_at: Utc::now(),
            message: "HR=150".to_string(),
            level: AlertLevel::Critical,
            source: AlertSource::Auto,
        };

        store.put(&alert).unwrap();
        let err = store.put(&alert).unwrap_err();
        assert!(matches!(err, PipelineError::Persistence { .. }));
        assert!(!err.is_retryable());
        assert_eq!(store.len(), 1);
        assert_eq!(store.alerts_for("p1").len(), 1);
        assert!(store.alerts_for("p2").is_empty());
    }

    #[test]
    fn config_store_get_and_set() {
        let store = InMemoryConfigStore::new();
        assert_eq!(store.get(STREAM_STATUS_KEY).unwrap(), None);
        store.set(STREAM_STATUS_KEY, "ON").unwrap();
        assert_eq!(store.get(STREAM_STATUS_KEY).unwrap().as_deref(), Some("ON"));
    }

    // ── End to end ────────────────────────────────────────────────────────────

    #[test]
    fn producer_to_consumer_round_trip() {
        let config = Arc::new(InMemoryConfigStore::new());
        let stream = Arc::new(InMemoryStream::new("patient-vitals-stream", 2));
        let vitals = Arc::new(InMemoryVitalsStore::new());
        let summaries = Arc::new(InMemorySummaryStore::new());
        let alerts = Arc::new(InMemoryAlertStore::new());
        let channel = Arc::new(RecordingChannel::new("rpm-alerts"));

        let roster: Vec<PatientProfile> = ["p1", "p2", "p3"]
            .iter()
            .map(|id| PatientProfile {
                patient_id: id.to_string(),
                name: format!("Patient {id}"),
                age: None,
                sex: None,
            })
            .collect();
        summaries.seed(&roster);

        let gate = StreamStatusGate::new(config.clone());
        gate.set(StreamStatus::On).unwrap();

        let mut producer = VitalsProducer::new(
            gate,
            stream.clone(),
            Arc::new(NoSleep),
            roster,
            ProducerSettings {
                anomaly_probability: 0.5,
                seed: Some(17),
                ..ProducerSettings::default()
            },
        );
        producer.run(Some(5));
        assert_eq!(stream.pending(), 15);

        let consumer = VitalsConsumer::new(
            vitals.clone(),
            summaries.clone(),
            alerts.clone(),
            AlertPublisher::new(Some(channel.clone())),
        );
        let totals = consumer.run_until(
            stream.as_ref(),
            &ConsumerSettings { batch_size: 4, receive_wait: Duration::from_millis(10) },
            &AtomicBool::new(true),
        );

        assert_eq!(totals.records, 15);
        assert_eq!(vitals.len(), 15);
        let anomalous = vitals.all().iter().filter(|r| r.is_anomaly).count();
        assert_eq!(alerts.len(), anomalous);
        assert_eq!(channel.sent().len(), anomalous);

        for summary in summaries.all() {
            let readings = vitals.readings_for(&summary.patient_id);
            let last = readings.last().unwrap();
            assert_eq!(summary.last_heart_rate, Some(last.heart_rate));
            assert_eq!(summary.last_vital_timestamp, Some(last.timestamp));
            assert!(summary.name.is_some(), "seeded demographics survive upserts");
        }
    }
}
