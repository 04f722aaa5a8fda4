//! The synthetic vitals producer.
//!
//! A single sequential loop over a fixed roster. Each cycle:
//!
//! 1. Read the stream gate. If OFF, sleep `off_backoff` and end the cycle.
//! 2. For each patient in roster order: generate a reading, stamp it with
//!    the current UTC time, and send it with the patient id as partition key.
//!    A failed send is logged and the next patient is still processed.
//!    After each patient, sleep a uniform jitter in `[jitter_min, jitter_max]`.
//! 3. Sleep `max(cycle_floor, cycle_base + uniform(cycle_jitter))`.
//!
//! Patients are emitted one at a time, which preserves per-patient order on
//! the stream.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tracing::{debug, error, info};

use rpm_contracts::{
    error::{PipelineError, PipelineResult},
    patient::PatientProfile,
    stream::StreamStatus,
    vital::VitalMessage,
};

use crate::{
    gate::StreamStatusGate,
    generator::{GeneratedVitals, VitalsGenerator, DEFAULT_ANOMALY_PROBABILITY},
    traits::{Sleeper, StreamSink},
};

/// Producer timings and randomness.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerSettings {
    pub anomaly_probability: f64,
    /// Pause between gate polls while the stream is OFF.
    pub off_backoff: Duration,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
    pub cycle_base: Duration,
    /// Signed bounds, in milliseconds, added to `cycle_base`.
    pub cycle_jitter_min_ms: i64,
    pub cycle_jitter_max_ms: i64,
    pub cycle_floor: Duration,
    /// Seed for reproducible runs; `None` uses OS entropy.
    pub seed: Option<u64>,
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self {
            anomaly_probability: DEFAULT_ANOMALY_PROBABILITY,
            off_backoff: Duration::from_secs(5),
            jitter_min: Duration::from_millis(500),
            jitter_max: Duration::from_millis(1500),
            cycle_base: Duration::from_secs(5),
            cycle_jitter_min_ms: -2000,
            cycle_jitter_max_ms: 3000,
            cycle_floor: Duration::from_secs(1),
            seed: None,
        }
    }
}

/// Summary of one producer cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub status: StreamStatus,
    pub emitted: usize,
    pub anomalies: usize,
    /// Send failures, in roster order. Each one was logged and skipped.
    pub failures: Vec<PipelineError>,
}

impl CycleReport {
    fn paused() -> Self {
        Self {
            status: StreamStatus::Off,
            emitted: 0,
            anomalies: 0,
            failures: Vec::new(),
        }
    }
}

pub struct VitalsProducer {
    gate: StreamStatusGate,
    sink: Arc<dyn StreamSink>,
    sleeper: Arc<dyn Sleeper>,
    roster: Vec<PatientProfile>,
    settings: ProducerSettings,
    generator: VitalsGenerator,
}

impl VitalsProducer {
    pub fn new(
        gate: StreamStatusGate,
        sink: Arc<dyn StreamSink>,
        sleeper: Arc<dyn Sleeper>,
        roster: Vec<PatientProfile>,
        settings: ProducerSettings,
    ) -> Self {
        let generator = VitalsGenerator::new(settings.anomaly_probability, settings.seed);
        Self { gate, sink, sleeper, roster, settings, generator }
    }

    pub fn roster(&self) -> &[PatientProfile] {
        &self.roster
    }

    /// Run `cycles` cycles, or forever when `None`.
    ///
    /// Paused cycles (gate OFF) count towards the total.
    pub fn run(&mut self, cycles: Option<u64>) {
        info!(
            patients = self.roster.len(),
            anomaly_probability = self.settings.anomaly_probability,
            "vitals producer starting"
        );

        let mut completed = 0u64;
        while cycles.map_or(true, |limit| completed < limit) {
            self.run_cycle();
            completed += 1;
        }

        info!(cycles = completed, "vitals producer stopped");
    }

    /// Run one cycle, including its trailing sleep.
    pub fn run_cycle(&mut self) -> CycleReport {
        let status = self.gate.get();
        if status != StreamStatus::On {
            info!(
                status = %status,
                backoff_ms = self.settings.off_backoff.as_millis() as u64,
                "stream is not ON; sleeping"
            );
            self.sleeper.sleep(self.settings.off_backoff);
            return CycleReport::paused();
        }

        let mut report = CycleReport {
            status,
            emitted: 0,
            anomalies: 0,
            failures: Vec::new(),
        };

        for patient in &self.roster {
            let vitals = self.generator.generate();
            match vitals.anomaly {
                Some(kind) => debug!(patient_id = %patient.patient_id, anomaly = %kind, "generated anomalous reading"),
                None => debug!(patient_id = %patient.patient_id, "generated normal reading"),
            }

            match emit(self.sink.as_ref(), &patient.patient_id, &vitals) {
                Ok(sequence) => {
                    info!(
                        patient_id = %patient.patient_id,
                        sequence,
                        heart_rate = vitals.heart_rate,
                        spo2 = vitals.spo2,
                        bp = %format!("{}/{}", vitals.bp_sys, vitals.bp_dia),
                        "reading sent"
                    );
                    report.emitted += 1;
                    if vitals.anomaly.is_some() {
                        report.anomalies += 1;
                    }
                }
                Err(e) => {
                    error!(
                        patient_id = %patient.patient_id,
                        error = %e,
                        retryable = e.is_retryable(),
                        "failed to send reading; continuing with next patient"
                    );
                    report.failures.push(e);
                }
            }

            let jitter_ms = self.generator.uniform_i64(
                self.settings.jitter_min.as_millis() as i64,
                self.settings.jitter_max.as_millis() as i64,
            );
            self.sleeper.sleep(Duration::from_millis(jitter_ms.max(0) as u64));
        }

        let pause = self.cycle_pause();
        info!(
            emitted = report.emitted,
            anomalies = report.anomalies,
            failed = report.failures.len(),
            pause_ms = pause.as_millis() as u64,
            "producer cycle complete"
        );
        self.sleeper.sleep(pause);

        report
    }

    fn cycle_pause(&mut self) -> Duration {
        let offset = self
            .generator
            .uniform_i64(self.settings.cycle_jitter_min_ms, self.settings.cycle_jitter_max_ms);
        let pause_ms = self.settings.cycle_base.as_millis() as i64 + offset;
        let floor_ms = self.settings.cycle_floor.as_millis() as i64;
        Duration::from_millis(pause_ms.max(floor_ms).max(0) as u64)
    }
}

/// Stamp, encode, and send one reading.
fn emit(sink: &dyn StreamSink, patient_id: &str, vitals: &GeneratedVitals) -> PipelineResult<u64> {
    let message = VitalMessage {
        patient_id: patient_id.to_string(),
        heart_rate: vitals.heart_rate,
        spo2: vitals.spo2,
        bp_sys: vitals.bp_sys,
        bp_dia: vitals.bp_dia,
        timestamp: Utc::now(),
    };

    let data = serde_json::to_vec(&message).map_err(|e| PipelineError::TransportSend {
        partition_key: patient_id.to_string(),
        reason: format!("failed to encode reading: {}", e),
        retryable: false,
    })?;

    sink.send(patient_id, data)
}
