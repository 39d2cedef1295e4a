//! Snapshot merge logic
//!
//! Reconciles an incoming backup document into local state. Extension
//! installs and the collection merge run concurrently; the merge resolves
//! only once every sub-operation has settled, and one failing install
//! neither cancels nor fails the others.

use std::sync::Arc;

use core_library::models::{InstalledExtension, ResumeMode};
use core_library::stores::{CollectionStore, ExtensionManager};
use futures::future::{join, join_all};
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::snapshot::{BackupSnapshot, ExtensionRef};

/// Version an installed extension counts as when it reports none.
const DEFAULT_LOCAL_VERSION: &str = "0.0.0";

/// Version an incoming reference counts as when it carries none. Slightly
/// above the local default, so an unversioned pair keeps the existing
/// install.
const DEFAULT_INCOMING_VERSION: &str = "0.0.1";

/// Outcome of one merge, settled sub-operation by sub-operation.
#[derive(Debug, Default)]
pub struct MergeReport {
    /// Source URLs installed during this merge
    pub installed: Vec<String>,
    /// Source URLs skipped by the version gate
    pub skipped: Vec<String>,
    /// `(source URL, error)` pairs for installs that failed
    pub failed: Vec<(String, String)>,
    /// Whether the collection merge was applied
    pub collections_applied: bool,
    /// Collection merge failure, when there was one
    pub collection_error: Option<String>,
}

impl MergeReport {
    /// True when every sub-operation succeeded.
    pub fn fully_applied(&self) -> bool {
        self.collections_applied && self.failed.is_empty()
    }
}

/// Merges backup documents into local state and snapshots local state out.
pub struct Reconciler {
    collections: Arc<dyn CollectionStore>,
    extensions: Arc<dyn ExtensionManager>,
}

impl Reconciler {
    pub fn new(collections: Arc<dyn CollectionStore>, extensions: Arc<dyn ExtensionManager>) -> Self {
        Self {
            collections,
            extensions,
        }
    }

    /// Serialize the current local state into a portable document.
    pub async fn snapshot_local(&self) -> Result<BackupSnapshot> {
        let collections = self.collections.list_collections().await?;
        let extensions = self.extensions.list_installed().await?;
        Ok(BackupSnapshot::serialize(collections, &extensions))
    }

    /// Merge `snapshot` into local state under `mode`.
    ///
    /// Installs and the collection merge launch together and the call
    /// resolves once all have settled. Per-extension failures land in the
    /// report; they never abort the rest of the merge.
    #[instrument(skip(self, snapshot), fields(collections = snapshot.collections.len(), refs = snapshot.extension_refs.len()))]
    pub async fn merge(&self, snapshot: BackupSnapshot, mode: ResumeMode) -> MergeReport {
        let mut report = MergeReport::default();

        // The version gate needs the local install list up front. If it
        // cannot be read, skip every install rather than blindly
        // reinstalling over existing extensions; the collection merge
        // still runs.
        let installed = match self.extensions.list_installed().await {
            Ok(installed) => Some(installed),
            Err(e) => {
                warn!(error = %e, "cannot list installed extensions, skipping installs");
                None
            }
        };

        let mut to_install: Vec<&ExtensionRef> = Vec::new();
        match &installed {
            Some(installed) => {
                for reference in &snapshot.extension_refs {
                    if is_already_satisfied(installed, reference) {
                        report.skipped.push(reference.source_url.clone());
                    } else {
                        to_install.push(reference);
                    }
                }
            }
            None => {
                for reference in &snapshot.extension_refs {
                    report
                        .failed
                        .push((reference.source_url.clone(), "local extension list unavailable".to_string()));
                }
            }
        }

        let installs = join_all(to_install.iter().map(|reference| {
            let url = reference.source_url.clone();
            async move {
                let result = self.extensions.install_from_source(&url).await;
                (url, result)
            }
        }));

        let collection_merge = self.collections.apply_collections(snapshot.collections, mode);

        let (install_results, merge_result) = join(installs, collection_merge).await;

        for (url, result) in install_results {
            match result {
                Ok(()) => report.installed.push(url),
                Err(e) => {
                    warn!(url = %url, error = %e, "extension install failed");
                    report.failed.push((url, e.to_string()));
                }
            }
        }

        match merge_result {
            Ok(()) => report.collections_applied = true,
            Err(e) => {
                warn!(error = %e, "collection merge failed");
                report.collection_error = Some(e.to_string());
            }
        }

        info!(
            installed = report.installed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            collections_applied = report.collections_applied,
            "merge settled"
        );
        report
    }
}

/// Version gate: a local install with the same source URL and a version >=
/// the incoming one satisfies the reference.
fn is_already_satisfied(installed: &[InstalledExtension], reference: &ExtensionRef) -> bool {
    installed.iter().any(|ext| {
        ext.source_url == reference.source_url
            && version_gte(
                ext.version.as_deref().unwrap_or(DEFAULT_LOCAL_VERSION),
                reference.version.as_deref().unwrap_or(DEFAULT_INCOMING_VERSION),
            )
    })
}

/// Compare dotted numeric version tags; missing or non-numeric segments
/// count as zero.
fn version_gte(local: &str, incoming: &str) -> bool {
    let local = version_key(local);
    let incoming = version_key(incoming);
    let len = local.len().max(incoming.len());

    for i in 0..len {
        let a = local.get(i).copied().unwrap_or(0);
        let b = incoming.get(i).copied().unwrap_or(0);
        if a != b {
            return a > b;
        }
    }
    true
}

fn version_key(version: &str) -> Vec<u64> {
    version
        .trim()
        .trim_start_matches('v')
        .split('.')
        .map(|segment| segment.trim().parse().unwrap_or(0))
        .collect()
}
