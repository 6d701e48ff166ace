use crate::error_handling::types::StoreError;
use crate::store::kv_store::KvStore;
use async_trait::async_trait;
use log::{debug, info};
use std::sync::Mutex;

/// In-process store that records every write.
///
/// Backs `--dry-run` and stands in for Consul in tests. A store created with
/// [`MemoryStore::failing`] rejects every write but still records the attempt.
#[derive(Debug, Default)]
pub struct MemoryStore {
    writes: Mutex<Vec<(String, Vec<u8>)>>,
    failure: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
            failure: Some(message.into()),
        }
    }

    /// Every attempted write, in order.
    pub fn writes(&self) -> Vec<(String, Vec<u8>)> {
        match self.writes.lock() {
            Ok(writes) => writes.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn write_count(&self) -> usize {
        self.writes().len()
    }

    /// Last value written under `key`, as UTF-8.
    pub fn get(&self, key: &str) -> Option<String> {
        self.writes()
            .into_iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| String::from_utf8_lossy(&v).into_owned())
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        match self.writes.lock() {
            Ok(mut writes) => writes.push((key.to_string(), value.to_vec())),
            Err(poisoned) => poisoned.into_inner().push((key.to_string(), value.to_vec())),
        }
        debug!("MemoryStore recorded {} byte(s) under {}", value.len(), key);

        if let Some(message) = &self.failure {
            return Err(StoreError::Unavailable(message.clone()));
        }
        info!("Stored key {} in memory", key);
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory store".to_string()
    }
}
