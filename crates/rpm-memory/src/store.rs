//! In-memory implementations of the three data stores.
//!
//! Each store keeps its rows behind a `Mutex`, so one instance can be shared
//! between a consumer thread and whatever reads the results. Trait writes
//! map a poisoned lock to a non-retryable `PipelineError::Persistence`.

use std::{
    collections::{BTreeMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
};

use tracing::debug;

use rpm_contracts::{
    alert::{Alert, AlertId},
    error::{PipelineError, PipelineResult},
    patient::{PatientProfile, PatientSummary, SummaryUpdate},
    vital::VitalReading,
};
use rpm_core::traits::{AlertStore, PatientSummaryStore, VitalsStore};

fn lock_for_write<'a, T>(store: &str, mutex: &'a Mutex<T>) -> PipelineResult<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|e| PipelineError::persistence(store, format!("store lock poisoned: {}", e), false))
}

fn lock_for_read<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Vitals ────────────────────────────────────────────────────────────────────

/// Append-only reading log, in write order.
#[derive(Debug, Default)]
pub struct InMemoryVitalsStore {
    rows: Mutex<Vec<VitalReading>>,
}

impl InMemoryVitalsStore {
    pub const NAME: &'static str = "patient_vitals";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock_for_read(&self.rows).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all(&self) -> Vec<VitalReading> {
        lock_for_read(&self.rows).clone()
    }

    /// Readings for one patient, oldest write first.
    pub fn readings_for(&self, patient_id: &str) -> Vec<VitalReading> {
        lock_for_read(&self.rows)
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect()
    }
}

impl VitalsStore for InMemoryVitalsStore {
    fn put(&self, reading: &VitalReading) -> PipelineResult<()> {
        lock_for_write(Self::NAME, &self.rows)?.push(reading.clone());
        Ok(())
    }
}

// ── Patient summaries ─────────────────────────────────────────────────────────

/// Patient summaries keyed by patient id.
#[derive(Debug, Default)]
pub struct InMemorySummaryStore {
    rows: Mutex<BTreeMap<String, PatientSummary>>,
}

impl InMemorySummaryStore {
    pub const NAME: &'static str = "patients";

    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate demographic rows for a roster.
    ///
    /// Existing summaries are left untouched.
    pub fn seed(&self, profiles: &[PatientProfile]) {
        let mut rows = lock_for_read(&self.rows);
        for profile in profiles {
            rows.entry(profile.patient_id.clone())
                .or_insert_with(|| PatientSummary::from_profile(profile));
        }
    }

    pub fn get(&self, patient_id: &str) -> Option<PatientSummary> {
        lock_for_read(&self.rows).get(patient_id).cloned()
    }

    /// All summaries, ordered by patient id.
    pub fn all(&self) -> Vec<PatientSummary> {
        lock_for_read(&self.rows).values().cloned().collect()
    }
}

impl PatientSummaryStore for InMemorySummaryStore {
    fn upsert(&self, patient_id: &str, update: &SummaryUpdate) -> PipelineResult<()> {
        let mut rows = lock_for_write(Self::NAME, &self.rows)?;
        let summary = rows.entry(patient_id.to_string()).or_insert_with(|| {
            debug!(patient_id = %patient_id, "creating patient summary on first reading");
            PatientSummary::empty(patient_id)
        });
        summary.apply(update);
        Ok(())
    }
}

// ── Alerts ────────────────────────────────────────────────────────────────────

/// Append-only alert log that rejects duplicate alert ids.
#[derive(Debug, Default)]
pub struct InMemoryAlertStore {
    state: Mutex<AlertRows>,
}

#[derive(Debug, Default)]
struct AlertRows {
    alerts: Vec<Alert>,
    ids: HashSet<AlertId>,
}

impl InMemoryAlertStore {
    pub const NAME: &'static str = "alerts";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock_for_read(&self.state).alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all(&self) -> Vec<Alert> {
        lock_for_read(&self.state).alerts.clone()
    }

    pub fn alerts_for(&self, patient_id: &str) -> Vec<Alert> {
        lock_for_read(&self.state)
            .alerts
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect()
    }
}

impl AlertStore for InMemoryAlertStore {
    fn put(&self, alert: &Alert) -> PipelineResult<()> {
        let mut state = lock_for_write(Self::NAME, &self.state)?;
        if !state.ids.insert(alert.alert_id.clone()) {
            return Err(PipelineError::persistence(
                Self::NAME,
                format!("alert '{}' already exists", alert.alert_id),
                false,
            ));
        }
        state.alerts.push(alert.clone());
        Ok(())
    }
}
