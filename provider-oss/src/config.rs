//! Storage configuration snapshots
//!
//! Credential and endpoint state is owned by the host's settings store.
//! This module materializes read-only snapshots of that state; the storage
//! facade compares snapshots by value and rebuilds its transport when they
//! differ. Nothing here caches across calls.

use std::fmt;

use bridge_traits::settings::SettingsStore;

use crate::error::Result;

/// Settings keys consumed by this provider.
pub mod keys {
    pub const ACCESS_ID: &str = "storage.oss.access_id";
    pub const SECRET_KEY: &str = "storage.oss.secret_key";
    pub const BUCKET: &str = "storage.oss.bucket";
    pub const REGION: &str = "storage.oss.region";
    pub const LOCAL_URL: &str = "storage.endpoint.local_url";
    pub const REMOTE_URL: &str = "storage.endpoint.remote_url";
    pub const PREFER_LOCAL: &str = "storage.endpoint.prefer_local";
}

/// Read-only snapshot of the signing credential.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct StorageCredential {
    pub access_id: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
}

impl StorageCredential {
    /// Default virtual-host domain for this bucket/region pair, when both
    /// are known.
    pub fn default_host(&self) -> Option<String> {
        if self.bucket.is_empty() || self.region.is_empty() {
            return None;
        }
        Some(format!("{}.cos.{}.myqcloud.com", self.bucket, self.region))
    }
}

impl fmt::Debug for StorageCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageCredential")
            .field("access_id", &self.access_id)
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .finish()
    }
}

/// Read-only snapshot of the endpoint pair and the persisted selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndpointConfig {
    pub local_url: Option<String>,
    pub remote_url: Option<String>,
    pub prefer_local: bool,
}

impl EndpointConfig {
    /// The endpoint storage calls should target, honoring the persisted
    /// preference. `None` means "use the backend's default domain".
    pub fn active_url(&self) -> Option<&str> {
        let url = if self.prefer_local {
            self.local_url.as_deref()
        } else {
            self.remote_url.as_deref()
        };
        url.filter(|u| !u.is_empty()).map(|u| u.trim_end_matches('/'))
    }
}

/// Combined storage configuration: the value-equality rebuild signal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OssConfig {
    pub credential: StorageCredential,
    pub endpoint: EndpointConfig,
}

impl OssConfig {
    /// Load a fresh snapshot from the settings store.
    pub async fn load(settings: &dyn SettingsStore) -> Result<Self> {
        let get = |v: Option<String>| v.unwrap_or_default();

        let credential = StorageCredential {
            access_id: get(settings.get_string(keys::ACCESS_ID).await?),
            secret_key: get(settings.get_string(keys::SECRET_KEY).await?),
            bucket: get(settings.get_string(keys::BUCKET).await?),
            region: get(settings.get_string(keys::REGION).await?),
        };

        let endpoint = EndpointConfig {
            local_url: settings.get_string(keys::LOCAL_URL).await?,
            remote_url: settings.get_string(keys::REMOTE_URL).await?,
            prefer_local: settings.get_bool(keys::PREFER_LOCAL).await?.unwrap_or(false),
        };

        Ok(Self {
            credential,
            endpoint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_host_requires_bucket_and_region() {
        let mut credential = StorageCredential {
            access_id: "AKID".into(),
            secret_key: "secret".into(),
            bucket: "media-1250000000".into(),
            region: "ap-shanghai".into(),
        };
        assert_eq!(
            credential.default_host().as_deref(),
            Some("media-1250000000.cos.ap-shanghai.myqcloud.com")
        );

        credential.region.clear();
        assert_eq!(credential.default_host(), None);
    }

    #[test]
    fn test_active_url_follows_preference() {
        let endpoint = EndpointConfig {
            local_url: Some("http://nas.lan:9000/".into()),
            remote_url: Some("https://oss.example.com".into()),
            prefer_local: true,
        };

        assert_eq!(endpoint.active_url(), Some("http://nas.lan:9000"));

        let endpoint = EndpointConfig {
            prefer_local: false,
            ..endpoint
        };
        assert_eq!(endpoint.active_url(), Some("https://oss.example.com"));
    }

    #[test]
    fn test_empty_url_reads_as_unset() {
        let endpoint = EndpointConfig {
            local_url: Some(String::new()),
            remote_url: None,
            prefer_local: true,
        };
        assert_eq!(endpoint.active_url(), None);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credential = StorageCredential {
            access_id: "AKID".into(),
            secret_key: "super-secret".into(),
            bucket: String::new(),
            region: String::new(),
        };
        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_config_value_equality() {
        let a = OssConfig::default();
        let mut b = OssConfig::default();
        assert_eq!(a, b);

        b.credential.bucket = "media".into();
        assert_ne!(a, b);
    }
}
