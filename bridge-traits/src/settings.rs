//! Key-Value Settings Storage
//!
//! Abstracts host-specific preferences/configuration storage behind a
//! generic async get/set mapping. Keys are dotted, namespaced strings
//! (e.g. `storage.oss.bucket`, `backup.fingerprint`).

use async_trait::async_trait;

use crate::error::Result;

/// Key-value settings storage trait
///
/// The core reads credentials, endpoint URLs, the preferred-endpoint flag,
/// the last-applied backup fingerprint, and the resume mode through this
/// trait; it never owns the values. Missing keys read as `None`, not as an
/// error.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::settings::SettingsStore;
///
/// async fn save_preference(store: &dyn SettingsStore) -> Result<()> {
///     store.set_bool("storage.endpoint.prefer_local", true).await?;
///     store.set_string("backup.fingerprint", "\"9a0364b9e99bb480dd25e1f0284c8555\"").await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store a boolean value
    async fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    /// Retrieve a boolean value
    async fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    /// Store an integer value
    async fn set_i64(&self, key: &str, value: i64) -> Result<()>;

    /// Retrieve an integer value
    async fn get_i64(&self, key: &str) -> Result<Option<i64>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }
}
