//! Loading and validating a `PipelineConfig`.

use std::{collections::HashSet, path::Path};

use tracing::debug;

use rpm_contracts::error::{PipelineError, PipelineResult};

use crate::settings::PipelineConfig;

impl PipelineConfig {
    /// Parse `s` as TOML and validate the result.
    ///
    /// Returns `PipelineError::Config` if the TOML is malformed, does not
    /// match the schema, or fails `validate()`.
    pub fn from_toml_str(s: &str) -> PipelineResult<Self> {
        let config: PipelineConfig = toml::from_str(s).map_err(|e| PipelineError::Config {
            reason: format!("failed to parse pipeline TOML: {}", e),
        })?;
        config.validate()?;
        debug!(
            patients = config.patients.len(),
            shards = config.transport.shard_count,
            notification = config.notification.topic().is_some(),
            "pipeline configuration loaded"
        );
        Ok(config)
    }

    /// Read the file at `path` and parse it as pipeline configuration.
    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| PipelineError::Config {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> PipelineResult<()> {
        let p = &self.producer;
        if !(0.0..=1.0).contains(&p.anomaly_probability) {
            return Err(config_error(format!(
                "producer.anomaly_probability must be within [0, 1], got {}",
                p.anomaly_probability
            )));
        }
        if p.jitter_min_ms > p.jitter_max_ms {
            return Err(config_error("producer.jitter_min_ms must not exceed producer.jitter_max_ms"));
        }
        if p.cycle_jitter_min_ms > p.cycle_jitter_max_ms {
            return Err(config_error(
                "producer.cycle_jitter_min_ms must not exceed producer.cycle_jitter_max_ms",
            ));
        }
        if self.transport.shard_count == 0 {
            return Err(config_error("transport.shard_count must be at least 1"));
        }
        if self.consumer.batch_size == 0 {
            return Err(config_error("consumer.batch_size must be at least 1"));
        }

        let mut seen = HashSet::new();
        for patient in &self.patients {
            if patient.patient_id.trim().is_empty() {
                return Err(config_error("patients: patient_id must not be empty"));
            }
            if !seen.insert(patient.patient_id.as_str()) {
                return Err(config_error(format!(
                    "patients: duplicate patient_id '{}'",
                    patient.patient_id
                )));
            }
        }

        Ok(())
    }
}

fn config_error(reason: impl Into<String>) -> PipelineError {
    PipelineError::Config { reason: reason.into() }
}
