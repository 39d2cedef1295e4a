//! Collaborator contracts implemented by the host application
//!
//! The backup core drives these during restore; it never persists
//! collections or extensions itself.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Collection, InstalledExtension, ResumeMode};

/// Host-side store of the user's collections.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Snapshot of all local collections, in display order.
    async fn list_collections(&self) -> Result<Vec<Collection>>;

    /// Apply a merged set of incoming collections under the given mode.
    ///
    /// Duplicate-id reconciliation under [`ResumeMode::Append`] is this
    /// store's own policy; the caller only passes the mode through.
    async fn apply_collections(&self, incoming: Vec<Collection>, mode: ResumeMode) -> Result<()>;
}

/// Host-side extension (plugin) manager.
#[async_trait]
pub trait ExtensionManager: Send + Sync {
    /// All currently installed extensions with their source URLs.
    async fn list_installed(&self) -> Result<Vec<InstalledExtension>>;

    /// Download and install an extension from its source URL.
    async fn install_from_source(&self, url: &str) -> Result<()>;
}
