//! Remote count API
//!
//! The count server shares the storage deployment: it is reached through
//! the same local/remote endpoint split (honoring the persisted
//! prefer-local flag) and authenticates with the storage credential pair.
//! The session token is fetched once and cached for the process lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bridge_traits::settings::SettingsStore;
use core_library::models::MediaKey;
use provider_oss::config::keys as storage_keys;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::error::{PlayCountError, Result};

/// Settings keys for the count API endpoints.
pub mod keys {
    pub const LOCAL_URL: &str = "count.endpoint.local_url";
    pub const REMOTE_URL: &str = "count.endpoint.remote_url";
}

/// Remote transfer of play counters.
#[async_trait]
pub trait CountService: Send + Sync {
    /// Bulk-fetch counts for `keys`; the result maps `platform-id` strings
    /// to counts. Missing entries simply have no plays recorded yet.
    async fn fetch_counts(&self, keys: &[MediaKey]) -> Result<HashMap<String, u64>>;

    /// Record one play for `key` on the server.
    async fn record_play(&self, key: &MediaKey) -> Result<()>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct CountListResponse {
    #[serde(default)]
    data: HashMap<String, u64>,
}

#[derive(Serialize)]
struct RecordRequest<'a> {
    key: &'a str,
}

/// HTTP implementation of [`CountService`].
pub struct HttpCountService {
    http: Arc<dyn HttpClient>,
    settings: Arc<dyn SettingsStore>,
    token: Mutex<Option<String>>,
}

impl HttpCountService {
    pub fn new(http: Arc<dyn HttpClient>, settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            http,
            settings,
            token: Mutex::new(None),
        }
    }

    /// Base URL of the count API, following the persisted endpoint
    /// preference.
    async fn api_base(&self) -> Result<String> {
        let prefer_local = self
            .settings
            .get_bool(storage_keys::PREFER_LOCAL)
            .await?
            .unwrap_or(false);

        let key = if prefer_local { keys::LOCAL_URL } else { keys::REMOTE_URL };
        match self.settings.get_string(key).await? {
            Some(url) if !url.is_empty() => Ok(url.trim_end_matches('/').to_string()),
            _ => Err(PlayCountError::NotConfigured(format!("{} is not set", key))),
        }
    }

    async fn ensure_token(&self, base: &str) -> Result<String> {
        let mut token = self.token.lock().await;
        if let Some(token) = token.as_ref() {
            return Ok(token.clone());
        }

        let username = self
            .settings
            .get_string(storage_keys::ACCESS_ID)
            .await?
            .unwrap_or_default();
        let password = self
            .settings
            .get_string(storage_keys::SECRET_KEY)
            .await?
            .unwrap_or_default();
        if username.is_empty() || password.is_empty() {
            return Err(PlayCountError::Auth("storage credential is missing".to_string()));
        }

        let request = HttpRequest::new(HttpMethod::Post, format!("{}/api/login", base)).json(
            &LoginRequest {
                username: &username,
                password: &password,
            },
        )?;

        let response = self.http.execute(request).await?;
        if !response.is_success() {
            return Err(PlayCountError::Auth(format!(
                "login rejected with status {}",
                response.status
            )));
        }

        let login: LoginResponse = response
            .json()
            .map_err(|e| PlayCountError::Parse(e.to_string()))?;
        if login.token.is_empty() {
            return Err(PlayCountError::Auth("login returned an empty token".to_string()));
        }

        debug!("count service token acquired");
        *token = Some(login.token.clone());
        Ok(login.token)
    }
}

#[async_trait]
impl CountService for HttpCountService {
    #[instrument(skip(self, keys), fields(keys = keys.len()))]
    async fn fetch_counts(&self, keys: &[MediaKey]) -> Result<HashMap<String, u64>> {
        let base = self.api_base().await?;
        let token = self.ensure_token(&base).await?;

        let key_strings: Vec<String> = keys.iter().map(|key| key.to_string()).collect();
        let request = HttpRequest::new(
            HttpMethod::Post,
            format!("{}/music/getPlayCountList", base),
        )
        .json(&key_strings)?
        .header("Authorization", token);

        let response = self.http.execute(request).await?;
        if !response.is_success() {
            return Err(PlayCountError::Backend {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            });
        }

        let counts: CountListResponse = response
            .json()
            .map_err(|e| PlayCountError::Parse(e.to_string()))?;
        Ok(counts.data)
    }

    #[instrument(skip(self))]
    async fn record_play(&self, key: &MediaKey) -> Result<()> {
        let base = self.api_base().await?;
        let token = self.ensure_token(&base).await?;

        let key_string = key.to_string();
        let request = HttpRequest::new(HttpMethod::Post, format!("{}/music/setPlayCount", base))
            .json(&RecordRequest { key: &key_string })?
            .header("Authorization", token);

        let response = self.http.execute(request).await?;
        if !response.is_success() {
            return Err(PlayCountError::Backend {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            });
        }
        Ok(())
    }
}
