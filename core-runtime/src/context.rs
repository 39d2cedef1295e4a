//! # Core Context
//!
//! The composition-root context object handed to every component.
//!
//! ## Overview
//!
//! One `CoreContext` is built per process (per test, in tests) and carries
//! the host bridges plus the notice bus. The builder enforces fail-fast
//! validation: a missing required bridge is a build error with an
//! actionable message, not a panic at first use.
//!
//! ## Required Dependencies
//!
//! - `SettingsStore` - the host's configuration surface; never defaulted,
//!   because credentials and endpoint state belong to the host
//!
//! ## Optional Dependencies (with defaults)
//!
//! - `HttpClient` - desktop default (reqwest) when the `desktop-shims`
//!   feature is enabled
//! - `Clock` - defaults to the system clock
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::context::CoreContext;
//! use std::sync::Arc;
//!
//! let context = CoreContext::builder()
//!     .settings_store(Arc::new(my_settings))
//!     .build()?;
//! ```

use std::sync::Arc;

use bridge_traits::http::HttpClient;
use bridge_traits::settings::SettingsStore;
use bridge_traits::time::{Clock, SystemClock};

use crate::error::{Error, Result};
use crate::notify::NoticeBus;

/// Shared dependencies for all core components.
#[derive(Clone)]
pub struct CoreContext {
    pub http_client: Arc<dyn HttpClient>,
    pub settings_store: Arc<dyn SettingsStore>,
    pub clock: Arc<dyn Clock>,
    pub notices: NoticeBus,
}

impl std::fmt::Debug for CoreContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreContext")
            .field("http_client", &"HttpClient { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field("clock", &"Clock { ... }")
            .finish()
    }
}

impl CoreContext {
    /// Creates a new builder for constructing a `CoreContext`.
    pub fn builder() -> CoreContextBuilder {
        CoreContextBuilder::default()
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for storage and count transfer. \
                 Desktop: enable the 'desktop-shims' feature to use the default reqwest client. \
                 Other hosts: inject a platform-native HTTP adapter."
            .to_string(),
    })
}

/// Builder for [`CoreContext`] instances.
#[derive(Default)]
pub struct CoreContextBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    clock: Option<Arc<dyn Clock>>,
    notice_capacity: Option<usize>,
}

impl CoreContextBuilder {
    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) is used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the settings store implementation (required).
    ///
    /// Credentials, endpoint URLs, and sync state are read through this
    /// store; the core never owns those values.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the time source. Defaults to the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the notice bus buffer size. Default: 16.
    pub fn notice_capacity(mut self, capacity: usize) -> Self {
        self.notice_capacity = Some(capacity);
        self
    }

    /// Builds the final `CoreContext` instance.
    ///
    /// # Errors
    ///
    /// Returns an error with an actionable message when a required bridge
    /// is missing or a value is invalid.
    pub fn build(self) -> Result<CoreContext> {
        let settings_store = self.settings_store.ok_or_else(|| Error::CapabilityMissing {
            capability: "SettingsStore".to_string(),
            message: "SettingsStore implementation is required: it is the host's \
                     configuration surface (credentials, endpoints, sync state). \
                     Use .settings_store() to inject one."
                .to_string(),
        })?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let capacity = self.notice_capacity.unwrap_or(16);
        if capacity == 0 {
            return Err(Error::Config(
                "Notice capacity must be greater than 0".to_string(),
            ));
        }

        Ok(CoreContext {
            http_client,
            settings_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            notices: NoticeBus::new(capacity),
        })
    }
}
