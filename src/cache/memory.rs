use super::StateStore;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory [`StateStore`]; clones share state so tests can keep a probe.
#[derive(Clone)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, serde_json::Value>>>,
    update_count: Arc<Mutex<usize>>,
    fail_updates: Arc<Mutex<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            values: Arc::new(Mutex::new(HashMap::new())),
            update_count: Arc::new(Mutex::new(0)),
            fail_updates: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_value(self, key: &str, value: serde_json::Value) -> Self {
        self.values.lock().unwrap().insert(key.to_string(), value);
        self
    }

    pub fn with_failing_updates(self, fail: bool) -> Self {
        *self.fail_updates.lock().unwrap() = fail;
        self
    }

    /// Number of successful updates.
    pub fn get_update_count(&self) -> usize {
        *self.update_count.lock().unwrap()
    }

    pub fn get_value(&self, key: &str) -> Option<serde_json::Value> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn update(&self, key: &str, value: serde_json::Value) -> Result<()> {
        if *self.fail_updates.lock().unwrap() {
            return Err(Error::Io(std::io::Error::other("Mock store failure")));
        }

        *self.update_count.lock().unwrap() += 1;
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}
