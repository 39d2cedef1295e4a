//! Backup document model
//!
//! The wire format is one JSON object:
//!
//! ```json
//! {
//!   "collections": [ ... ],
//!   "extensionRefs": [ { "sourceURL": "https://...", "version": "1.2.0" } ]
//! }
//! ```
//!
//! Collection structure round-trips without loss; extension entries are
//! reduced to source URL + version so no other extension metadata leaks
//! into the backup.

use core_library::models::{Collection, InstalledExtension};
use serde::{Deserialize, Serialize};

use crate::error::{BackupError, Result};

/// Reference to an extension inside a backup document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRef {
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A portable snapshot of the user's curated state.
///
/// Immutable once produced by [`BackupSnapshot::serialize`]; consumed whole
/// by the reconciler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    #[serde(default)]
    pub collections: Vec<Collection>,
    #[serde(rename = "extensionRefs", default)]
    pub extension_refs: Vec<ExtensionRef>,
}

impl BackupSnapshot {
    /// Pure, deterministic serialization of local state.
    pub fn serialize(collections: Vec<Collection>, extensions: &[InstalledExtension]) -> Self {
        let extension_refs = extensions
            .iter()
            .map(|ext| ExtensionRef {
                source_url: ext.source_url.clone(),
                version: ext.version.clone(),
            })
            .collect();

        Self {
            collections,
            extension_refs,
        }
    }

    /// Encode to the JSON wire format.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| BackupError::Format(e.to_string()))
    }

    /// Decode from the JSON wire format.
    ///
    /// # Errors
    ///
    /// [`BackupError::Format`] when `raw` is not a valid backup document.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| BackupError::Format(e.to_string()))
    }
}
