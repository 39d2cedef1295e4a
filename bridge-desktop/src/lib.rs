//! # Desktop Bridge Implementations
//!
//! Desktop-ready adapters for the bridge traits:
//!
//! - [`ReqwestHttpClient`] - HTTP via reqwest with connection pooling
//! - [`JsonSettingsStore`] - settings persisted as a single JSON document
//! - [`MemorySettingsStore`] - volatile settings for tests and ephemeral hosts

pub mod http;
pub mod settings;

pub use http::ReqwestHttpClient;
pub use settings::{JsonSettingsStore, MemorySettingsStore};
