//! Endpoint reachability selection
//!
//! Decides whether storage calls should target the local or the remote
//! endpoint by probing a well-known object on the local one. The decision
//! is persisted and reused; it is only re-evaluated when `resolve` is
//! called again (startup or on demand), never per storage call.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bridge_traits::settings::SettingsStore;
use bridge_traits::time::Clock;
use tracing::{debug, info, instrument};

use crate::config::{keys, OssConfig, StorageCredential};
use crate::error::Result;
use crate::signing::Signer;

/// Well-known object probed on the local endpoint.
pub const PROBE_OBJECT_KEY: &str = "home.txt";

/// Probe timeout; the only timeout in this provider.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Outcome of endpoint resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointChoice {
    Local,
    Remote,
}

/// Probes the local endpoint and persists the selection.
pub struct EndpointSelector {
    http: Arc<dyn HttpClient>,
    settings: Arc<dyn SettingsStore>,
    signer: Signer,
}

impl EndpointSelector {
    pub fn new(
        http: Arc<dyn HttpClient>,
        settings: Arc<dyn SettingsStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http,
            settings,
            signer: Signer::new(clock),
        }
    }

    /// Probe the local endpoint and persist the resulting preference.
    ///
    /// Reachable (2xx-3xx within the timeout) selects local; any failure
    /// (timeout, connection error, other status, missing configuration)
    /// falls over to remote.
    #[instrument(skip(self))]
    pub async fn resolve(&self) -> Result<EndpointChoice> {
        let config = OssConfig::load(self.settings.as_ref()).await?;

        let local_reachable = match config.endpoint.local_url.as_deref().filter(|u| !u.is_empty()) {
            Some(local_url) => self.probe(&config.credential, local_url).await,
            None => false,
        };

        self.settings
            .set_bool(keys::PREFER_LOCAL, local_reachable)
            .await?;

        let choice = if local_reachable {
            EndpointChoice::Local
        } else {
            EndpointChoice::Remote
        };
        info!(?choice, "endpoint selection persisted");
        Ok(choice)
    }

    async fn probe(&self, credential: &StorageCredential, local_url: &str) -> bool {
        let url = match self.signer.presigned_url(
            credential,
            Some(local_url.trim_end_matches('/')),
            PROBE_OBJECT_KEY,
            HttpMethod::Head,
            None,
        ) {
            Ok(url) => url,
            Err(e) => {
                debug!(error = %e, "local probe skipped");
                return false;
            }
        };

        let request = HttpRequest::new(HttpMethod::Head, url).timeout(PROBE_TIMEOUT);
        match self.http.execute(request).await {
            Ok(response) => {
                debug!(status = response.status, "local probe answered");
                (200..400).contains(&response.status)
            }
            Err(e) => {
                debug!(error = %e, "local probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_desktop::MemorySettingsStore;
    use bridge_traits::error::BridgeError;
    use bridge_traits::http::HttpResponse;
    use bridge_traits::time::SystemClock;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> bridge_traits::error::Result<HttpResponse>;
        }
    }

    async fn settings_with_oss_config() -> Arc<MemorySettingsStore> {
        let settings = Arc::new(MemorySettingsStore::new());
        settings.set_string(keys::ACCESS_ID, "AKID").await.unwrap();
        settings.set_string(keys::SECRET_KEY, "secret").await.unwrap();
        settings.set_string(keys::BUCKET, "media-125").await.unwrap();
        settings.set_string(keys::REGION, "ap-shanghai").await.unwrap();
        settings
            .set_string(keys::LOCAL_URL, "http://nas.lan:9000")
            .await
            .unwrap();
        settings
            .set_string(keys::REMOTE_URL, "https://oss.example.com")
            .await
            .unwrap();
        settings
    }

    fn head_response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    #[tokio::test]
    async fn test_reachable_local_endpoint_is_selected() {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(|request| {
            assert_eq!(request.method, HttpMethod::Head);
            assert!(request.url.starts_with("http://nas.lan:9000/media-125/home.txt?"));
            assert_eq!(request.timeout, Some(PROBE_TIMEOUT));
            Ok(head_response(200))
        });

        let settings = settings_with_oss_config().await;
        let selector = EndpointSelector::new(Arc::new(http), settings.clone(), Arc::new(SystemClock));

        let choice = selector.resolve().await.unwrap();
        assert_eq!(choice, EndpointChoice::Local);
        assert_eq!(settings.get_bool(keys::PREFER_LOCAL).await.unwrap(), Some(true));
    }

    #[tokio::test]
    async fn test_redirect_status_counts_as_reachable() {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(|_| Ok(head_response(302)));

        let settings = settings_with_oss_config().await;
        let selector = EndpointSelector::new(Arc::new(http), settings, Arc::new(SystemClock));

        assert_eq!(selector.resolve().await.unwrap(), EndpointChoice::Local);
    }

    #[tokio::test]
    async fn test_probe_failure_falls_back_to_remote() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::Timeout("probe".to_string())));

        let settings = settings_with_oss_config().await;
        let selector = EndpointSelector::new(Arc::new(http), settings.clone(), Arc::new(SystemClock));

        let choice = selector.resolve().await.unwrap();
        assert_eq!(choice, EndpointChoice::Remote);
        assert_eq!(settings.get_bool(keys::PREFER_LOCAL).await.unwrap(), Some(false));
    }

    #[tokio::test]
    async fn test_non_success_status_falls_back_to_remote() {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(|_| Ok(head_response(403)));

        let settings = settings_with_oss_config().await;
        let selector = EndpointSelector::new(Arc::new(http), settings, Arc::new(SystemClock));

        assert_eq!(selector.resolve().await.unwrap(), EndpointChoice::Remote);
    }

    #[tokio::test]
    async fn test_missing_local_url_skips_probe() {
        let http = MockHttp::new(); // no expectations: probe must not run

        let settings = settings_with_oss_config().await;
        settings.delete(keys::LOCAL_URL).await.unwrap();
        let selector = EndpointSelector::new(Arc::new(http), settings, Arc::new(SystemClock));

        assert_eq!(selector.resolve().await.unwrap(), EndpointChoice::Remote);
    }
}
