//! The producer's ON/OFF gate, backed by an external config store.
//!
//! Reads are fail-closed: a missing entry, an unrecognised value, or a
//! store error all read as `OFF`, so the producer stays idle rather than
//! emitting while its state is unknown.

use std::sync::Arc;

use tracing::{info, warn};

use rpm_contracts::{
    error::PipelineResult,
    stream::{StreamStatus, STREAM_STATUS_KEY},
};

use crate::traits::ConfigStore;

#[derive(Clone)]
pub struct StreamStatusGate {
    store: Arc<dyn ConfigStore>,
}

impl StreamStatusGate {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Read the current flag. Never fails; see the module docs.
    pub fn get(&self) -> StreamStatus {
        match self.store.get(STREAM_STATUS_KEY) {
            Ok(value) => StreamStatus::from_stored(value.as_deref()),
            Err(e) => {
                warn!(error = %e, "failed to read stream status; treating as OFF");
                StreamStatus::Off
            }
        }
    }

    /// Overwrite the flag. Setting the current value again is a no-op write.
    pub fn set(&self, status: StreamStatus) -> PipelineResult<()> {
        self.store.set(STREAM_STATUS_KEY, status.as_str())?;
        info!(status = %status, "stream status updated");
        Ok(())
    }

    pub fn start(&self) -> PipelineResult<StreamStatus> {
        self.set(StreamStatus::On)?;
        Ok(self.get())
    }

    pub fn stop(&self) -> PipelineResult<StreamStatus> {
        self.set(StreamStatus::Off)?;
        Ok(self.get())
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use rpm_contracts::error::PipelineError;

    use super::*;

    #[derive(Default)]
    struct MapStore(Mutex<HashMap<String, String>>);

    impl ConfigStore for MapStore {
        fn get(&self, key: &str) -> PipelineResult<Option<String>> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> PipelineResult<()> {
            self.0.lock().unwrap().insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    struct BrokenStore;

    impl ConfigStore for BrokenStore {
        fn get(&self, _key: &str) -> PipelineResult<Option<String>> {
            Err(PipelineError::persistence("system_config", "unreachable", true))
        }

        fn set(&self, _key: &str, _value: &str) -> PipelineResult<()> {
            Err(PipelineError::persistence("system_config", "unreachable", true))
        }
    }

    #[test]
    fn absent_entry_reads_off() {
        let gate = StreamStatusGate::new(Arc::new(MapStore::default()));
        assert_eq!(gate.get(), StreamStatus::Off);
    }

    #[test]
    fn set_is_an_idempotent_overwrite() {
        let store = Arc::new(MapStore::default());
        let gate = StreamStatusGate::new(store.clone());

        gate.set(StreamStatus::On).unwrap();
        gate.set(StreamStatus::On).unwrap();
        assert_eq!(gate.get(), StreamStatus::On);
        assert_eq!(store.0.lock().unwrap().len(), 1);

        assert_eq!(gate.stop().unwrap(), StreamStatus::Off);
        assert_eq!(gate.start().unwrap(), StreamStatus::On);
    }

    #[test]
    fn garbage_value_reads_off() {
        let store = Arc::new(MapStore::default());
        store.set(STREAM_STATUS_KEY, "maybe").unwrap();
        let gate = StreamStatusGate::new(store);
        assert_eq!(gate.get(), StreamStatus::Off);
    }

    #[test]
    fn store_failure_reads_off_and_set_propagates() {
        let gate = StreamStatusGate::new(Arc::new(BrokenStore));
        assert_eq!(gate.get(), StreamStatus::Off);
        assert!(gate.set(StreamStatus::On).is_err());
    }
}
