//! The vitals consumer.
//!
//! For each record in a delivered batch, independently:
//!
//!   decode → classify → store reading → upsert summary → [alert → notify]
//!
//! A malformed record is rejected and skipped. Once a record decodes, the
//! three writes are attempted independently: a failed reading write does
//! not stop the summary upsert or the alert, and nothing already written is
//! rolled back. Every failure is logged and returned as a typed value in the
//! `BatchReport`; nothing escapes `process_batch`.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use rpm_contracts::{
    alert::{Alert, AlertId, AlertLevel, AlertSource},
    error::{PipelineError, PipelineResult},
    patient::{RiskLevel, SummaryUpdate},
    stream::RawRecord,
    vital::{VitalMessage, VitalReading},
};

use crate::{
    publisher::{AlertPublisher, Delivery},
    risk::classify,
    traits::{AlertStore, PatientSummaryStore, StreamSource, VitalsStore},
};

/// Batch receive limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerSettings {
    pub batch_size: usize,
    pub receive_wait: Duration,
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            receive_wait: Duration::from_secs(1),
        }
    }
}

// ── Outcomes ──────────────────────────────────────────────────────────────────

/// Result of raising an alert for one anomalous reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertOutcome {
    pub alert_id: AlertId,
    pub level: AlertLevel,
    pub stored: PipelineResult<()>,
    pub notification: Delivery,
}

/// Result of processing one record that decoded successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedRecord {
    pub patient_id: String,
    pub risk: RiskLevel,
    pub reading: PipelineResult<()>,
    pub summary: PipelineResult<()>,
    /// `None` for a normal reading.
    pub alert: Option<AlertOutcome>,
}

impl ProcessedRecord {
    /// Store failures for this record, in pipeline order.
    ///
    /// Notification failures are not included; they are never errors.
    pub fn failures(&self) -> Vec<&PipelineError> {
        let alert_stored = self.alert.as_ref().map(|a| &a.stored);
        [Some(&self.reading), Some(&self.summary), alert_stored]
            .into_iter()
            .flatten()
            .filter_map(|r| r.as_ref().err())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The record could not be decoded. Nothing was written.
    Rejected {
        sequence_number: u64,
        partition_key: String,
        error: PipelineError,
    },
    Processed(ProcessedRecord),
}

/// Per-record outcomes for one batch, in delivery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn processed(&self) -> impl Iterator<Item = &ProcessedRecord> {
        self.outcomes.iter().filter_map(|o| match o {
            RecordOutcome::Processed(p) => Some(p),
            RecordOutcome::Rejected { .. } => None,
        })
    }

    pub fn rejected(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RecordOutcome::Rejected { .. }))
            .count()
    }

    pub fn alerts_raised(&self) -> usize {
        self.processed()
            .filter(|p| p.alert.as_ref().is_some_and(|a| a.stored.is_ok()))
            .count()
    }

    /// Every error in the batch: rejections and store failures.
    pub fn failures(&self) -> Vec<&PipelineError> {
        let mut out = Vec::new();
        for outcome in &self.outcomes {
            match outcome {
                RecordOutcome::Rejected { error, .. } => out.push(error),
                RecordOutcome::Processed(p) => out.extend(p.failures()),
            }
        }
        out
    }

    /// Failures a caller could reasonably retry.
    pub fn retryable_failures(&self) -> Vec<&PipelineError> {
        self.failures().into_iter().filter(|e| e.is_retryable()).collect()
    }
}

/// Running totals across batches for `VitalsConsumer::run_until`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerTotals {
    pub batches: u64,
    pub records: u64,
    pub rejected: u64,
    pub alerts: u64,
    pub store_failures: u64,
}

impl ConsumerTotals {
    fn absorb(&mut self, report: &BatchReport) {
        self.batches += 1;
        self.records += report.len() as u64;
        self.rejected += report.rejected() as u64;
        self.alerts += report.alerts_raised() as u64;
        self.store_failures += report.processed().map(|p| p.failures().len() as u64).sum::<u64>();
    }
}

// ── Consumer ──────────────────────────────────────────────────────────────────

pub struct VitalsConsumer {
    vitals: Arc<dyn VitalsStore>,
    summaries: Arc<dyn PatientSummaryStore>,
    alerts: Arc<dyn AlertStore>,
    publisher: AlertPublisher,
}

impl VitalsConsumer {
    pub fn new(
        vitals: Arc<dyn VitalsStore>,
        summaries: Arc<dyn PatientSummaryStore>,
        alerts: Arc<dyn AlertStore>,
        publisher: AlertPublisher,
    ) -> Self {
        Self { vitals, summaries, alerts, publisher }
    }

    /// Process every record in `records`, in order.
    pub fn process_batch(&self, records: &[RawRecord]) -> BatchReport {
        let report = BatchReport {
            outcomes: records.iter().map(|r| self.process_record(r)).collect(),
        };

        info!(
            records = report.len(),
            rejected = report.rejected(),
            alerts = report.alerts_raised(),
            "processed batch"
        );
        report
    }

    /// Process a single record. Never panics and never returns early on a
    /// store failure.
    pub fn process_record(&self, record: &RawRecord) -> RecordOutcome {
        let message = match decode_record(&record.data, Utc::now()) {
            Ok(m) => m,
            Err(e) => {
                warn!(
                    partition_key = %record.partition_key,
                    sequence = record.sequence_number,
                    error = %e,
                    "skipping malformed record"
                );
                return RecordOutcome::Rejected {
                    sequence_number: record.sequence_number,
                    partition_key: record.partition_key.clone(),
                    error: e,
                };
            }
        };

        let risk = classify(message.heart_rate, message.spo2, message.bp_sys);
        let reading = VitalReading::from_message(&message, risk);
        debug!(
            patient_id = %reading.patient_id,
            risk = %risk,
            is_anomaly = reading.is_anomaly,
            "classified reading"
        );

        let reading_result = self.vitals.put(&reading);
        if let Err(e) = &reading_result {
            error!(patient_id = %reading.patient_id, error = %e, "failed to store reading");
        }

        let update = SummaryUpdate::from_reading(&reading, risk);
        let summary_result = self.summaries.upsert(&reading.patient_id, &update);
        if let Err(e) = &summary_result {
            error!(patient_id = %reading.patient_id, error = %e, "failed to update patient summary");
        }

        let alert = AlertLevel::for_risk(risk).map(|level| self.raise_alert(&reading, risk, level));

        RecordOutcome::Processed(ProcessedRecord {
            patient_id: reading.patient_id,
            risk,
            reading: reading_result,
            summary: summary_result,
            alert,
        })
    }

    /// Receive one batch from `source` and process it.
    ///
    /// Returns `Err` only if the receive itself fails.
    pub fn poll(&self, source: &dyn StreamSource, settings: &ConsumerSettings) -> PipelineResult<BatchReport> {
        let records = source.receive_batch(settings.batch_size, settings.receive_wait)?;
        if records.is_empty() {
            return Ok(BatchReport::default());
        }
        Ok(self.process_batch(&records))
    }

    /// Poll until `stop` is set and a receive comes back empty.
    ///
    /// The stream is drained before returning. A failed receive is logged
    /// and polling continues.
    pub fn run_until(
        &self,
        source: &dyn StreamSource,
        settings: &ConsumerSettings,
        stop: &AtomicBool,
    ) -> ConsumerTotals {
        let mut totals = ConsumerTotals::default();
        loop {
            match self.poll(source, settings) {
                Ok(report) if report.is_empty() => {
                    if stop.load(Ordering::SeqCst) {
                        break;
                    }
                }
                Ok(report) => totals.absorb(&report),
                Err(e) => {
                    error!(error = %e, retryable = e.is_retryable(), "batch receive failed");
                    if stop.load(Ordering::SeqCst) {
                        break;
                    }
                }
            }
        }

        info!(
            batches = totals.batches,
            records = totals.records,
            rejected = totals.rejected,
            alerts = totals.alerts,
            "vitals consumer stopped"
        );
        totals
    }

    fn raise_alert(&self, reading: &VitalReading, risk: RiskLevel, level: AlertLevel) -> AlertOutcome {
        let alert = Alert {
            alert_id: AlertId::new(),
            patient_id: reading.patient_id.clone(),
            created_at: reading.timestamp,
            message: alert_message(reading, risk),
            level,
            source: AlertSource::Auto,
        };

        let stored = self.alerts.put(&alert);
        match &stored {
            Ok(()) => info!(
                patient_id = %alert.patient_id,
                alert_id = %alert.alert_id,
                level = %level,
                "alert raised"
            ),
            Err(e) => error!(
                patient_id = %alert.patient_id,
                alert_id = %alert.alert_id,
                error = %e,
                "failed to store alert"
            ),
        }

        let notification = self
            .publisher
            .publish(&alert_subject(&reading.patient_id, risk), &alert.message);

        AlertOutcome {
            alert_id: alert.alert_id,
            level,
            stored,
            notification,
        }
    }
}

// ── Decoding and formatting ───────────────────────────────────────────────────

/// Decode and validate one stream record.
///
/// `patient_id` must be a non-empty string. The four vitals must be integers;
/// integral floats (`80.0`) and integer strings (`"82"`) are accepted.
/// `timestamp` is optional and never rejects a record: ISO-8601 with an
/// offset is normalized to UTC, a naive ISO-8601 value is read as UTC, and
/// anything else falls back to `arrival`.
pub fn decode_record(data: &[u8], arrival: DateTime<Utc>) -> PipelineResult<VitalMessage> {
    let value: Value = serde_json::from_slice(data)
        .map_err(|e| PipelineError::validation(format!("record is not valid JSON: {}", e)))?;
    let obj = value
        .as_object()
        .ok_or_else(|| PipelineError::validation("record is not a JSON object"))?;

    let patient_id = match obj.get("patient_id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::String(_)) => return Err(PipelineError::validation("field 'patient_id' is empty")),
        Some(_) => return Err(PipelineError::validation("field 'patient_id' must be a string")),
        None => return Err(PipelineError::validation("missing field 'patient_id'")),
    };

    let timestamp = match obj.get("timestamp") {
        None | Some(Value::Null) => arrival,
        Some(Value::String(s)) => parse_timestamp(s).unwrap_or_else(|| {
            warn!(patient_id = %patient_id, timestamp = %s, "unparseable timestamp, using arrival time");
            arrival
        }),
        Some(other) => {
            warn!(patient_id = %patient_id, timestamp = %other, "non-string timestamp, using arrival time");
            arrival
        }
    };

    Ok(VitalMessage {
        patient_id,
        heart_rate: int_field(obj, "heart_rate")?,
        spo2: int_field(obj, "spo2")?,
        bp_sys: int_field(obj, "bp_sys")?,
        bp_dia: int_field(obj, "bp_dia")?,
        timestamp,
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|t| t.and_utc())
}

fn int_field(obj: &Map<String, Value>, name: &str) -> PipelineResult<i32> {
    let raw = match obj.get(name) {
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                // Saturating cast; out-of-range values fail the i32 check below.
                .map(|f| f as i64)
        }),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
        None => return Err(PipelineError::validation(format!("missing field '{}'", name))),
    };

    raw.and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| PipelineError::validation(format!("field '{}' must be an integer", name)))
}

/// Notification subject, e.g. `[ALERT] Patient p1 - CRITICAL`.
pub fn alert_subject(patient_id: &str, risk: RiskLevel) -> String {
    format!("[ALERT] Patient {} - {}", patient_id, risk.as_str().to_uppercase())
}

pub fn alert_message(reading: &VitalReading, risk: RiskLevel) -> String {
    format!(
        "Anomaly detected for patient {}:\nHR={}, SpO2={}, BP={}/{}, Risk={}",
        reading.patient_id, reading.heart_rate, reading.spo2, reading.bp_sys, reading.bp_dia, risk
    )
}
