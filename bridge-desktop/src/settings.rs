//! Settings Storage
//!
//! Two `SettingsStore` implementations: a JSON-document store persisted to
//! disk (the desktop default) and a volatile in-memory store for tests.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    settings::SettingsStore,
};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;

/// File-backed settings store
///
/// All settings live in one JSON object on disk; every write rewrites the
/// document. Fine for the handful of configuration keys the core reads --
/// this is not a general-purpose database.
pub struct JsonSettingsStore {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
}

impl JsonSettingsStore {
    /// Open (or create) the settings document at `path`.
    pub async fn new(path: PathBuf) -> Result<Self> {
        let values = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Map<String, Value>>(&bytes).map_err(|e| {
                BridgeError::OperationFailed(format!(
                    "Settings file {} is not a JSON object: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(BridgeError::Io(e)),
        };

        debug!(path = %path.display(), keys = values.len(), "Loaded settings document");

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    async fn persist(&self, values: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(BridgeError::Io)?;
        }
        let bytes = serde_json::to_vec_pretty(values)
            .map_err(|e| BridgeError::OperationFailed(format!("Settings encode failed: {}", e)))?;
        tokio::fs::write(&self.path, bytes).await.map_err(BridgeError::Io)
    }

    async fn set_value(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.write().await;
        values.insert(key.to_string(), value);
        self.persist(&values).await
    }

    async fn get_value(&self, key: &str) -> Option<Value> {
        self.values.read().await.get(key).cloned()
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, Value::String(value.to_string())).await
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .get_value(key)
            .await
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set_value(key, Value::Bool(value)).await
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.get_value(key).await.and_then(|v| v.as_bool()))
    }

    async fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.set_value(key, Value::from(value)).await
    }

    async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.get_value(key).await.and_then(|v| v.as_i64()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().await;
        values.remove(key);
        self.persist(&values).await
    }
}

/// In-memory settings store for tests and ephemeral hosts.
#[derive(Default)]
pub struct MemorySettingsStore {
    values: RwLock<Map<String, Value>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn set_value(&self, key: &str, value: Value) -> Result<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, Value::String(value.to_string())).await
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .read()
            .await
            .get(key)
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set_value(key, Value::Bool(value)).await
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.values.read().await.get(key).and_then(|v| v.as_bool()))
    }

    async fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.set_value(key, Value::from(value)).await
    }

    async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.values.read().await.get(key).and_then(|v| v.as_i64()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}
