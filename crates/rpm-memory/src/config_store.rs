//! In-memory key/value config store.

use std::{collections::HashMap, sync::Mutex};

use rpm_contracts::error::{PipelineError, PipelineResult};
use rpm_core::traits::ConfigStore;

#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryConfigStore {
    pub const NAME: &'static str = "system_config";

    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn get(&self, key: &str) -> PipelineResult<Option<String>> {
        let entries = self.entries.lock().map_err(|e| {
            PipelineError::persistence(Self::NAME, format!("store lock poisoned: {}", e), false)
        })?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PipelineResult<()> {
        let mut entries = self.entries.lock().map_err(|e| {
            PipelineError::persistence(Self::NAME, format!("store lock poisoned: {}", e), false)
        })?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
