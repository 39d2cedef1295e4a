//! Object-storage operations
//!
//! Two interchangeable backends implement [`ObjectStore`]:
//!
//! - [`PresignedStore`] signs a short-lived URL per operation and performs
//!   the transfer as a plain HTTP call. Used for general binary media
//!   objects.
//! - [`SignedStore`] canonicalizes the request and attaches the token as an
//!   `Authorization` header; the vendor backend's verifier expects
//!   header-based auth for these calls.
//!
//! [`OssStorage`] layers the lazily rebuilt transport on top: every call
//! loads a fresh configuration snapshot and rebuilds the backend only when
//! the snapshot differs by value from the one the current backend was built
//! with.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bridge_traits::settings::SettingsStore;
use bridge_traits::time::Clock;
use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::config::OssConfig;
use crate::error::{OssError, Result};
use crate::signing::{object_url, SignRequest, Signer};

/// Opaque backend-supplied token identifying the exact byte content of a
/// stored object (an entity tag). Compared by equality only, never parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Uniform object-storage operations, backend-agnostic.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// "HEAD succeeds with 2xx". Any other outcome -- including a transport
    /// failure -- reads as absent; callers cannot distinguish a transient
    /// network failure from a missing object through this call.
    async fn exists(&self, key: &str) -> bool;

    /// Fetch an object's bytes.
    async fn get(&self, key: &str) -> Result<Bytes> {
        Ok(self.get_with_fingerprint(key).await?.0)
    }

    /// Fetch an object's bytes plus the fingerprint the backend returned
    /// alongside them.
    async fn get_with_fingerprint(&self, key: &str) -> Result<(Bytes, Option<Fingerprint>)>;

    /// Store an object; returns the backend's fingerprint when it sends one.
    async fn put(&self, key: &str, body: Bytes) -> Result<Option<Fingerprint>>;

    /// Remove an object. `Ok(true)` when an existing object was removed,
    /// `Ok(false)` when there was nothing to remove.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Fetch only the fingerprint (metadata call, no body transfer).
    /// `Ok(None)` when the object does not exist.
    async fn head_fingerprint(&self, key: &str) -> Result<Option<Fingerprint>>;

    /// Issue a presigned GET URL usable by a plain HTTP client.
    async fn presign_get(&self, key: &str) -> Result<String>;
}

const ETAG_HEADER: &str = "etag";
const OCTET_STREAM: &str = "application/octet-stream";

fn fingerprint_of(response: &bridge_traits::http::HttpResponse) -> Option<Fingerprint> {
    response.header(ETAG_HEADER).map(Fingerprint::new)
}

fn host_of(url: &str) -> Option<&str> {
    let rest = url.split_once("://")?.1;
    Some(rest.split('/').next().unwrap_or(rest))
}

/// Directly-signed backend: header-based auth against the vendor verifier.
pub struct SignedStore {
    http: Arc<dyn HttpClient>,
    signer: Signer,
    config: OssConfig,
}

impl SignedStore {
    pub fn new(http: Arc<dyn HttpClient>, config: OssConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            http,
            signer: Signer::new(clock),
            config,
        }
    }

    /// Build the object URL plus the signed request skeleton for `method`.
    ///
    /// The host actually targeted joins the signed header set, so a token
    /// minted for one endpoint cannot be replayed against another.
    fn signed_request(
        &self,
        method: HttpMethod,
        key: &str,
        extra_headers: &[(&str, String)],
    ) -> Result<HttpRequest> {
        let credential = &self.config.credential;
        let url = object_url(credential, self.config.endpoint.active_url(), key)?;
        let host = host_of(&url)
            .ok_or_else(|| OssError::NotConfigured(format!("unparsable object URL: {}", url)))?
            .to_string();

        let mut sign = SignRequest::new(method, key).header("Host", host.clone());
        for (name, value) in extra_headers {
            sign = sign.header(*name, value.clone());
        }
        let token = self.signer.authorization(credential, &sign)?;

        let mut request = HttpRequest::new(method, url)
            .header("Host", host)
            .header("Authorization", token);
        for (name, value) in extra_headers {
            request = request.header(*name, value.clone());
        }
        Ok(request)
    }
}

#[async_trait]
impl ObjectStore for SignedStore {
    async fn exists(&self, key: &str) -> bool {
        let request = match self.signed_request(HttpMethod::Head, key, &[]) {
            Ok(request) => request,
            Err(e) => {
                debug!(key, error = %e, "existence check could not sign");
                return false;
            }
        };
        match self.http.execute(request).await {
            Ok(response) => response.is_success(),
            Err(e) => {
                debug!(key, error = %e, "existence check failed, reporting absent");
                false
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_with_fingerprint(&self, key: &str) -> Result<(Bytes, Option<Fingerprint>)> {
        let request = self.signed_request(HttpMethod::Get, key, &[])?;
        let response = self.http.execute(request).await?;
        if !response.is_success() {
            return Err(OssError::Backend {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            });
        }
        let fingerprint = fingerprint_of(&response);
        Ok((response.body, fingerprint))
    }

    #[instrument(skip(self, body), fields(len = body.len()))]
    async fn put(&self, key: &str, body: Bytes) -> Result<Option<Fingerprint>> {
        let headers = [
            ("Content-Type", OCTET_STREAM.to_string()),
            ("Content-Length", body.len().to_string()),
        ];
        let request = self.signed_request(HttpMethod::Put, key, &headers)?.body(body);
        let response = self.http.execute(request).await?;
        if !response.is_success() {
            return Err(OssError::Backend {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            });
        }
        Ok(fingerprint_of(&response))
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<bool> {
        if !self.exists(key).await {
            return Ok(false);
        }
        let request = self.signed_request(HttpMethod::Delete, key, &[])?;
        let response = self.http.execute(request).await?;
        if response.is_success() || response.status == 404 {
            Ok(true)
        } else {
            Err(OssError::Backend {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            })
        }
    }

    async fn head_fingerprint(&self, key: &str) -> Result<Option<Fingerprint>> {
        let request = self.signed_request(HttpMethod::Head, key, &[])?;
        let response = self.http.execute(request).await?;
        if response.is_success() {
            Ok(fingerprint_of(&response))
        } else if response.status == 404 {
            Ok(None)
        } else {
            Err(OssError::Backend {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            })
        }
    }

    async fn presign_get(&self, key: &str) -> Result<String> {
        self.signer.presigned_url(
            &self.config.credential,
            self.config.endpoint.active_url(),
            key,
            HttpMethod::Get,
            None,
        )
    }
}

/// Presigned-URL backend: signs the URL, transfers with a plain request.
pub struct PresignedStore {
    http: Arc<dyn HttpClient>,
    signer: Signer,
    config: OssConfig,
}

impl PresignedStore {
    pub fn new(http: Arc<dyn HttpClient>, config: OssConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            http,
            signer: Signer::new(clock),
            config,
        }
    }

    fn presign(&self, method: HttpMethod, key: &str) -> Result<String> {
        self.signer.presigned_url(
            &self.config.credential,
            self.config.endpoint.active_url(),
            key,
            method,
            None,
        )
    }
}

#[async_trait]
impl ObjectStore for PresignedStore {
    async fn exists(&self, key: &str) -> bool {
        let url = match self.presign(HttpMethod::Head, key) {
            Ok(url) => url,
            Err(e) => {
                debug!(key, error = %e, "existence check could not presign");
                return false;
            }
        };
        match self.http.execute(HttpRequest::new(HttpMethod::Head, url)).await {
            Ok(response) => response.is_success(),
            Err(e) => {
                debug!(key, error = %e, "existence check failed, reporting absent");
                false
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_with_fingerprint(&self, key: &str) -> Result<(Bytes, Option<Fingerprint>)> {
        let url = self.presign(HttpMethod::Get, key)?;
        let response = self.http.execute(HttpRequest::new(HttpMethod::Get, url)).await?;
        if !response.is_success() {
            return Err(OssError::Backend {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            });
        }
        let fingerprint = fingerprint_of(&response);
        Ok((response.body, fingerprint))
    }

    #[instrument(skip(self, body), fields(len = body.len()))]
    async fn put(&self, key: &str, body: Bytes) -> Result<Option<Fingerprint>> {
        let url = self.presign(HttpMethod::Put, key)?;
        let request = HttpRequest::new(HttpMethod::Put, url)
            .header("Content-Type", OCTET_STREAM)
            .body(body);
        let response = self.http.execute(request).await?;
        if !response.is_success() {
            return Err(OssError::Backend {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            });
        }
        Ok(fingerprint_of(&response))
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<bool> {
        if !self.exists(key).await {
            return Ok(false);
        }
        let url = self.presign(HttpMethod::Delete, key)?;
        let response = self.http.execute(HttpRequest::new(HttpMethod::Delete, url)).await?;
        if response.is_success() || response.status == 404 {
            Ok(true)
        } else {
            Err(OssError::Backend {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            })
        }
    }

    async fn head_fingerprint(&self, key: &str) -> Result<Option<Fingerprint>> {
        let url = self.presign(HttpMethod::Head, key)?;
        let response = self.http.execute(HttpRequest::new(HttpMethod::Head, url)).await?;
        if response.is_success() {
            Ok(fingerprint_of(&response))
        } else if response.status == 404 {
            Ok(None)
        } else {
            Err(OssError::Backend {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            })
        }
    }

    async fn presign_get(&self, key: &str) -> Result<String> {
        self.presign(HttpMethod::Get, key)
    }
}

/// Which signing style the rebuilt transport should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Presigned,
    Signed,
}

struct CachedBackend {
    config: OssConfig,
    store: Arc<dyn ObjectStore>,
}

/// Storage facade with a lazily rebuilt transport.
///
/// Credential and endpoint state live in the settings store; each call
/// loads a snapshot and compares it by value against the snapshot the
/// cached backend was built with. Mismatch triggers a rebuild on the spot
/// -- rebuild is cheap and idempotent, so no coordination beyond the cache
/// lock is needed.
pub struct OssStorage {
    http: Arc<dyn HttpClient>,
    settings: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
    kind: BackendKind,
    cached: Mutex<Option<CachedBackend>>,
}

impl OssStorage {
    pub fn new(
        http: Arc<dyn HttpClient>,
        settings: Arc<dyn SettingsStore>,
        clock: Arc<dyn Clock>,
        kind: BackendKind,
    ) -> Self {
        Self {
            http,
            settings,
            clock,
            kind,
            cached: Mutex::new(None),
        }
    }

    async fn backend(&self) -> Result<Arc<dyn ObjectStore>> {
        let config = OssConfig::load(self.settings.as_ref()).await?;

        let mut cached = self.cached.lock().await;
        if let Some(entry) = cached.as_ref() {
            if entry.config == config {
                return Ok(entry.store.clone());
            }
            debug!(kind = ?self.kind, "storage configuration changed, rebuilding transport");
        }

        let store: Arc<dyn ObjectStore> = match self.kind {
            BackendKind::Presigned => Arc::new(PresignedStore::new(
                self.http.clone(),
                config.clone(),
                self.clock.clone(),
            )),
            BackendKind::Signed => Arc::new(SignedStore::new(
                self.http.clone(),
                config.clone(),
                self.clock.clone(),
            )),
        };
        *cached = Some(CachedBackend {
            config,
            store: store.clone(),
        });
        Ok(store)
    }
}

#[async_trait]
impl ObjectStore for OssStorage {
    async fn exists(&self, key: &str) -> bool {
        match self.backend().await {
            Ok(store) => store.exists(key).await,
            Err(e) => {
                warn!(key, error = %e, "existence check skipped, storage unconfigured");
                false
            }
        }
    }

    async fn get_with_fingerprint(&self, key: &str) -> Result<(Bytes, Option<Fingerprint>)> {
        self.backend().await?.get_with_fingerprint(key).await
    }

    async fn put(&self, key: &str, body: Bytes) -> Result<Option<Fingerprint>> {
        self.backend().await?.put(key, body).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.backend().await?.delete(key).await
    }

    async fn head_fingerprint(&self, key: &str) -> Result<Option<Fingerprint>> {
        self.backend().await?.head_fingerprint(key).await
    }

    async fn presign_get(&self, key: &str) -> Result<String> {
        self.backend().await?.presign_get(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keys;
    use async_trait::async_trait;
    use bridge_desktop::MemorySettingsStore;
    use bridge_traits::error::BridgeError;
    use bridge_traits::http::HttpResponse;
    use bridge_traits::time::SystemClock;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> bridge_traits::error::Result<HttpResponse>;
        }
    }

    fn test_config() -> OssConfig {
        let mut config = OssConfig::default();
        config.credential.access_id = "AKID".into();
        config.credential.secret_key = "secret".into();
        config.credential.bucket = "media-125".into();
        config.credential.region = "ap-shanghai".into();
        config.endpoint.remote_url = Some("https://oss.example.com".into());
        config
    }

    fn response(status: u16, etag: Option<&str>, body: &[u8]) -> HttpResponse {
        let mut headers = HashMap::new();
        if let Some(etag) = etag {
            headers.insert("ETag".to_string(), etag.to_string());
        }
        HttpResponse {
            status,
            headers,
            body: Bytes::copy_from_slice(body),
        }
    }

    #[test]
    fn test_host_extraction() {
        assert_eq!(host_of("http://nas.lan:9000/bucket/key"), Some("nas.lan:9000"));
        assert_eq!(host_of("https://b.cos.r.myqcloud.com/key"), Some("b.cos.r.myqcloud.com"));
        assert_eq!(host_of("not-a-url"), None);
    }

    #[tokio::test]
    async fn test_signed_get_attaches_authorization_header() {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(|request| {
            assert_eq!(request.method, HttpMethod::Get);
            assert_eq!(request.url, "https://oss.example.com/media-125/backup/doc.json");
            let auth = request.headers.get("Authorization").expect("signed header");
            assert!(auth.starts_with("q-sign-algorithm=sha1&q-ak=AKID"));
            assert!(auth.contains("q-header-list=host&"));
            assert_eq!(request.headers.get("Host").map(String::as_str), Some("oss.example.com"));
            Ok(response(200, Some("\"abc\""), b"{}"))
        });

        let store = SignedStore::new(Arc::new(http), test_config(), Arc::new(SystemClock));
        let (body, fingerprint) = store.get_with_fingerprint("backup/doc.json").await.unwrap();
        assert_eq!(&body[..], b"{}");
        assert_eq!(fingerprint, Some(Fingerprint::new("\"abc\"")));
    }

    #[tokio::test]
    async fn test_signed_put_returns_fingerprint() {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(|request| {
            assert_eq!(request.method, HttpMethod::Put);
            let auth = request.headers.get("Authorization").unwrap();
            assert!(auth.contains("q-header-list=content-length;content-type;host&"));
            assert_eq!(
                request.headers.get("Content-Type").map(String::as_str),
                Some("application/octet-stream")
            );
            Ok(response(200, Some("\"v2\""), b""))
        });

        let store = SignedStore::new(Arc::new(http), test_config(), Arc::new(SystemClock));
        let fingerprint = store.put("backup/doc.json", Bytes::from_static(b"data")).await.unwrap();
        assert_eq!(fingerprint, Some(Fingerprint::new("\"v2\"")));
    }

    #[tokio::test]
    async fn test_signed_put_surfaces_backend_status() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(response(403, None, b"AccessDenied")));

        let store = SignedStore::new(Arc::new(http), test_config(), Arc::new(SystemClock));
        let err = store.put("k", Bytes::from_static(b"x")).await.unwrap_err();
        assert!(matches!(err, OssError::Backend { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_exists_degrades_errors_to_absent() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::Timeout("head".into())));

        let store = SignedStore::new(Arc::new(http), test_config(), Arc::new(SystemClock));
        assert!(!store.exists("k").await);
    }

    #[tokio::test]
    async fn test_exists_degrades_non_success_to_absent() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(response(500, None, b"")));

        let store = SignedStore::new(Arc::new(http), test_config(), Arc::new(SystemClock));
        assert!(!store.exists("k").await);
    }

    #[tokio::test]
    async fn test_head_fingerprint_missing_object_is_none() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(response(404, None, b"")));

        let store = SignedStore::new(Arc::new(http), test_config(), Arc::new(SystemClock));
        assert_eq!(store.head_fingerprint("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_of_absent_object_reports_false() {
        let mut http = MockHttp::new();
        // The exists() pre-check answers 404; no DELETE must follow.
        http.expect_execute()
            .times(1)
            .returning(|request| {
                assert_eq!(request.method, HttpMethod::Head);
                Ok(response(404, None, b""))
            });

        let store = SignedStore::new(Arc::new(http), test_config(), Arc::new(SystemClock));
        assert!(!store.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_of_existing_object() {
        let mut http = MockHttp::new();
        let mut sequence = mockall::Sequence::new();
        http.expect_execute()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|request| {
                assert_eq!(request.method, HttpMethod::Head);
                Ok(response(200, Some("\"x\""), b""))
            });
        http.expect_execute()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|request| {
                assert_eq!(request.method, HttpMethod::Delete);
                Ok(response(204, None, b""))
            });

        let store = SignedStore::new(Arc::new(http), test_config(), Arc::new(SystemClock));
        assert!(store.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_presigned_get_uses_token_query_not_headers() {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(|request| {
            assert!(request.url.contains("?q-sign-algorithm=sha1"));
            assert!(!request.headers.contains_key("Authorization"));
            Ok(response(200, Some("\"tag\""), b"bytes"))
        });

        let store = PresignedStore::new(Arc::new(http), test_config(), Arc::new(SystemClock));
        let (body, _) = store.get_with_fingerprint("data/320k/a.mp3").await.unwrap();
        assert_eq!(&body[..], b"bytes");
    }

    async fn storage_settings() -> Arc<MemorySettingsStore> {
        let settings = Arc::new(MemorySettingsStore::new());
        settings.set_string(keys::ACCESS_ID, "AKID").await.unwrap();
        settings.set_string(keys::SECRET_KEY, "secret").await.unwrap();
        settings.set_string(keys::BUCKET, "media-125").await.unwrap();
        settings.set_string(keys::REGION, "ap-shanghai").await.unwrap();
        settings
            .set_string(keys::REMOTE_URL, "https://oss.example.com")
            .await
            .unwrap();
        settings
    }

    #[tokio::test]
    async fn test_transport_is_reused_while_config_unchanged() {
        let settings = storage_settings().await;
        let storage = OssStorage::new(
            Arc::new(MockHttp::new()),
            settings,
            Arc::new(SystemClock),
            BackendKind::Signed,
        );

        let first = storage.backend().await.unwrap();
        let second = storage.backend().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_transport_rebuilds_on_config_change() {
        let settings = storage_settings().await;
        let storage = OssStorage::new(
            Arc::new(MockHttp::new()),
            settings.clone(),
            Arc::new(SystemClock),
            BackendKind::Presigned,
        );

        let first = storage.backend().await.unwrap();
        settings.set_string(keys::BUCKET, "other-125").await.unwrap();
        let second = storage.backend().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        // Unchanged again: the rebuilt transport is now the cached one.
        let third = storage.backend().await.unwrap();
        assert!(Arc::ptr_eq(&second, &third));
    }

    #[tokio::test]
    async fn test_facade_rebuilds_when_preference_flips() {
        let settings = storage_settings().await;
        settings
            .set_string(keys::LOCAL_URL, "http://nas.lan:9000")
            .await
            .unwrap();
        let storage = OssStorage::new(
            Arc::new(MockHttp::new()),
            settings.clone(),
            Arc::new(SystemClock),
            BackendKind::Signed,
        );

        let remote = storage.backend().await.unwrap();
        settings.set_bool(keys::PREFER_LOCAL, true).await.unwrap();
        let local = storage.backend().await.unwrap();
        assert!(!Arc::ptr_eq(&remote, &local));
    }
}
