//! # rpm-contracts
//!
//! Shared types, wire formats, and error contracts for the remote patient
//! monitoring vitals pipeline.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions and error types.

pub mod alert;
pub mod error;
pub mod patient;
pub mod stream;
pub mod vital;

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use alert::{AlertId, AlertLevel, AlertSource};
    use error::PipelineError;
    use patient::{PatientProfile, PatientSummary, RiskLevel, Sex, SummaryUpdate};
    use stream::StreamStatus;
    use vital::{VitalMessage, VitalReading};

    fn message(hr: i32, spo2: i32, bp_sys: i32, bp_dia: i32) -> VitalMessage {
        VitalMessage {
            patient_id: "p1".to_string(),
            heart_rate: hr,
            spo2,
            bp_sys,
            bp_dia,
            timestamp: Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap(),
        }
    }

    // ── Wire format ──────────────────────────────────────────────────────────

    #[test]
    fn vital_message_uses_documented_field_names() {
        let json = serde_json::to_value(message(80, 97, 120, 80)).unwrap();
        let obj = json.as_object().unwrap();

        for field in ["patient_id", "heart_rate", "spo2", "bp_sys", "bp_dia", "timestamp"] {
            assert!(obj.contains_key(field), "missing wire field {field}");
        }
        assert_eq!(obj.len(), 6);
        assert_eq!(json["timestamp"], "2026-10-16T09:30:00Z");
    }

    #[test]
    fn reading_records_anomaly_flag_from_risk() {
        let msg = message(150, 85, 190, 100);
        let reading = VitalReading::from_message(&msg, RiskLevel::Critical);
        assert!(reading.is_anomaly);
        assert_eq!(reading.bp_dia, 100);

        let normal = VitalReading::from_message(&message(80, 97, 120, 80), RiskLevel::Normal);
        assert!(!normal.is_anomaly);
    }

    // ── Risk and alert levels ────────────────────────────────────────────────

    #[test]
    fn risk_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RiskLevel::Critical).unwrap(), "\"critical\"");
        let decoded: RiskLevel = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(decoded, RiskLevel::Warning);
    }

    #[test]
    fn only_non_normal_risk_is_anomalous() {
        assert!(!RiskLevel::Normal.is_anomaly());
        assert!(RiskLevel::Warning.is_anomaly());
        assert!(RiskLevel::Critical.is_anomaly());
    }

    #[test]
    fn alert_level_follows_risk() {
        assert_eq!(AlertLevel::for_risk(RiskLevel::Normal), None);
        assert_eq!(AlertLevel::for_risk(RiskLevel::Warning), Some(AlertLevel::Warning));
        assert_eq!(AlertLevel::for_risk(RiskLevel::Critical), Some(AlertLevel::Critical));
    }

    #[test]
    fn alert_source_defaults_to_auto_when_absent() {
        let json = r#"{
            "alert_id": "6f1d3c1e-8d0a-4c56-9d68-1f1f0e0f6a11",
            "patient_id": "p2",
            "created_at": "2026-10-16T09:30:00Z",
            "message": "manual check",
            "level": "info"
        }"#;
        let alert: alert::Alert = serde_json::from_str(json).unwrap();
        assert_eq!(alert.source, AlertSource::Auto);
        assert_eq!(alert.level, AlertLevel::Info);
    }

    #[test]
    fn alert_ids_are_unique() {
        let ids: std::collections::HashSet<String> =
            (0..100).map(|_| AlertId::new().to_string()).collect();
        assert_eq!(ids.len(), 100);
    }

    // ── Stream status ────────────────────────────────────────────────────────

    #[test]
    fn stream_status_is_fail_closed() {
        assert_eq!(StreamStatus::from_stored(Some("ON")), StreamStatus::On);
        assert_eq!(StreamStatus::from_stored(Some("OFF")), StreamStatus::Off);
        assert_eq!(StreamStatus::from_stored(Some("on")), StreamStatus::Off);
        assert_eq!(StreamStatus::from_stored(None), StreamStatus::Off);
        assert_eq!(StreamStatus::default(), StreamStatus::Off);
    }

    #[test]
    fn stream_status_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&StreamStatus::On).unwrap(), "\"ON\"");
    }

    // ── Patient summary ──────────────────────────────────────────────────────

    #[test]
    fn summary_apply_overwrites_every_field() {
        let profile = PatientProfile {
            patient_id: "p1".to_string(),
            name: "Alice Johnson".to_string(),
            age: Some(54),
            sex: Some(Sex::F),
        };
        let mut summary = PatientSummary::from_profile(&profile);

        let first = VitalReading::from_message(&message(150, 85, 190, 100), RiskLevel::Critical);
        summary.apply(&SummaryUpdate::from_reading(&first, RiskLevel::Critical));
        assert_eq!(summary.risk_level, RiskLevel::Critical);

        let second = VitalReading::from_message(&message(80, 97, 120, 80), RiskLevel::Normal);
        summary.apply(&SummaryUpdate::from_reading(&second, RiskLevel::Normal));

        assert_eq!(summary.risk_level, RiskLevel::Normal);
        assert_eq!(summary.last_heart_rate, Some(80));
        assert_eq!(summary.last_spo2, Some(97));
        assert_eq!(summary.last_bp_sys, Some(120));
        assert_eq!(summary.last_bp_dia, Some(80));
        // Demographics survive the upsert.
        assert_eq!(summary.name.as_deref(), Some("Alice Johnson"));
    }

    // ── PipelineError ────────────────────────────────────────────────────────

    #[test]
    fn error_validation_display() {
        let err = PipelineError::validation("missing field 'spo2'");
        let msg = err.to_string();
        assert!(msg.contains("invalid vital record"));
        assert!(msg.contains("spo2"));
    }

    #[test]
    fn error_persistence_display_names_store() {
        let err = PipelineError::persistence("alerts", "throttled", true);
        assert!(err.to_string().contains("alerts write failed"));
        assert!(err.to_string().contains("throttled"));
    }

    #[test]
    fn only_transient_failures_are_retryable() {
        assert!(PipelineError::persistence("vitals", "timeout", true).is_retryable());
        assert!(!PipelineError::persistence("vitals", "bad item", false).is_retryable());
        assert!(PipelineError::TransportSend {
            partition_key: "p1".to_string(),
            reason: "throughput exceeded".to_string(),
            retryable: true,
        }
        .is_retryable());
        assert!(!PipelineError::validation("bad json").is_retryable());
        assert!(!PipelineError::Notification { reason: "x".to_string() }.is_retryable());
        assert!(!PipelineError::Config { reason: "x".to_string() }.is_retryable());
    }
}
