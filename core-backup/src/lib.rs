//! # Backup & Restore Module
//!
//! Serializes the user's curated state (collections + extension
//! references) into a portable document, transfers it through the object
//! store, and reconciles a remote snapshot back into local state.
//!
//! ## Components
//!
//! - **Snapshot** (`snapshot`): the backup document model and its pure
//!   serialization
//! - **Reconciler** (`reconcile`): merge logic with the extension version
//!   gate and partial-failure isolation
//! - **Service** (`service`): top-level backup / restore / auto-sync entry
//!   points with fingerprint-gated change detection

pub mod error;
pub mod reconcile;
pub mod service;
pub mod snapshot;

pub use error::{BackupError, Result};
pub use reconcile::{MergeReport, Reconciler};
pub use service::{BackupService, SyncOutcome, SNAPSHOT_OBJECT_KEY};
pub use snapshot::{BackupSnapshot, ExtensionRef};
