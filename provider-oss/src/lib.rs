//! # Object-Storage Provider
//!
//! Storage-backend access for the backup core: request signing, endpoint
//! selection, and uniform object operations.
//!
//! ## Overview
//!
//! - **Signing** (`signing`): HMAC-SHA1 authorization tokens and presigned
//!   URLs, canonicalized to match the vendor verifier bit-for-bit
//! - **Endpoint selection** (`endpoint`): local/remote reachability probe,
//!   persisted as a preference and never re-run implicitly
//! - **Object store** (`store`): `exists`/`get`/`put`/`delete`/fingerprint
//!   operations over a presigned-URL backend or a header-signed backend,
//!   behind a transport that rebuilds when configuration changes by value
//! - **Keys** (`key`): deterministic object-key derivation for media items
//! - **Media** (`media`): upload/delete/locate conventions for binary media

pub mod config;
pub mod endpoint;
pub mod error;
pub mod key;
pub mod media;
pub mod signing;
pub mod store;

pub use config::{EndpointConfig, OssConfig, StorageCredential};
pub use endpoint::{EndpointChoice, EndpointSelector};
pub use error::{OssError, Result};
pub use key::{is_native_item, object_key, OSS_PLATFORM};
pub use media::{MediaLocation, MediaObjects};
pub use signing::{SignRequest, Signer};
pub use store::{BackendKind, Fingerprint, ObjectStore, OssStorage, PresignedStore, SignedStore};
