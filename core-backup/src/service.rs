//! Backup / restore / auto-sync entry points
//!
//! Each entry point reports at most one success or one failure notice for
//! the whole operation, regardless of how many sub-operations it fanned
//! out into. Auto-sync is gated on a fingerprint comparison so an
//! unchanged remote snapshot costs one metadata call and no download.

use std::str::FromStr;
use std::sync::Arc;

use bridge_traits::settings::SettingsStore;
use bytes::Bytes;
use core_library::models::ResumeMode;
use core_library::stores::{CollectionStore, ExtensionManager};
use core_runtime::context::CoreContext;
use core_runtime::notify::NoticeBus;
use provider_oss::store::{BackendKind, Fingerprint, ObjectStore, OssStorage};
use tracing::{debug, info, instrument, warn};

use crate::error::{BackupError, Result};
use crate::reconcile::{MergeReport, Reconciler};
use crate::snapshot::BackupSnapshot;

/// Well-known object key of the backup snapshot.
pub const SNAPSHOT_OBJECT_KEY: &str = "music/backup/TuneVault/CollectionBackup.json";

/// Settings keys owned by the backup service.
pub mod keys {
    /// Fingerprint of the last snapshot applied locally
    pub const FINGERPRINT: &str = "backup.fingerprint";
    /// Resume mode for restores ("append" / "overwrite")
    pub const RESUME_MODE: &str = "backup.resume_mode";
    /// Whether auto-sync runs at all
    pub const AUTO_SYNC: &str = "backup.auto_sync";
}

/// What an auto-sync pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Auto-sync is switched off
    Disabled,
    /// Remote fingerprint matches the last applied one (or there is no
    /// remote snapshot); nothing transferred
    UpToDate,
    /// A changed snapshot was downloaded and merged
    Applied,
    /// The check or merge failed; next pass will retry
    Skipped,
}

/// Top-level backup orchestration.
pub struct BackupService {
    store: Arc<dyn ObjectStore>,
    settings: Arc<dyn SettingsStore>,
    reconciler: Reconciler,
    notices: NoticeBus,
}

impl BackupService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        settings: Arc<dyn SettingsStore>,
        reconciler: Reconciler,
        notices: NoticeBus,
    ) -> Self {
        Self {
            store,
            settings,
            reconciler,
            notices,
        }
    }

    /// Wire a service from the process context, using the directly-signed
    /// storage backend the snapshot endpoint expects.
    pub fn from_context(
        context: &CoreContext,
        collections: Arc<dyn CollectionStore>,
        extensions: Arc<dyn ExtensionManager>,
    ) -> Self {
        let store = Arc::new(OssStorage::new(
            context.http_client.clone(),
            context.settings_store.clone(),
            context.clock.clone(),
            BackendKind::Signed,
        ));
        Self::new(
            store,
            context.settings_store.clone(),
            Reconciler::new(collections, extensions),
            context.notices.clone(),
        )
    }

    /// Serialize local state and upload it as the backup snapshot.
    #[instrument(skip(self))]
    pub async fn backup(&self) -> Result<()> {
        match self.backup_inner().await {
            Ok(()) => {
                self.notices.success("Backup complete");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "backup failed");
                self.notices.failure(format!("Backup failed: {}", e));
                Err(e)
            }
        }
    }

    async fn backup_inner(&self) -> Result<()> {
        let snapshot = self.reconciler.snapshot_local().await?;
        let body = Bytes::from(snapshot.to_json()?);
        let fingerprint = self.store.put(SNAPSHOT_OBJECT_KEY, body).await?;
        self.persist_fingerprint(fingerprint).await?;
        info!("snapshot uploaded");
        Ok(())
    }

    /// Download the backup snapshot and merge it into local state.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<MergeReport> {
        match self.restore_inner().await {
            Ok(report) if report.fully_applied() => {
                self.notices.success("Restore complete");
                Ok(report)
            }
            Ok(report) => {
                self.notices.failure(format!(
                    "Restore finished with {} failed operation(s)",
                    report.failed.len() + report.collection_error.iter().count()
                ));
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "restore failed");
                self.notices.failure(format!("Restore failed: {}", e));
                Err(e)
            }
        }
    }

    async fn restore_inner(&self) -> Result<MergeReport> {
        let mode = self.resume_mode().await;
        let (body, fingerprint) = self.store.get_with_fingerprint(SNAPSHOT_OBJECT_KEY).await?;
        let raw = String::from_utf8(body.to_vec())
            .map_err(|e| BackupError::Format(format!("snapshot is not UTF-8: {}", e)))?;
        let snapshot = BackupSnapshot::from_json(&raw)?;

        let report = self.reconciler.merge(snapshot, mode).await;

        // The fingerprint marks "this snapshot is fully applied". A partial
        // merge leaves the previous value so the next auto-sync pass
        // retries the same snapshot (at-least-once).
        if report.fully_applied() {
            self.persist_fingerprint(fingerprint).await?;
        }
        Ok(report)
    }

    /// Fingerprint-gated sync: merge the remote snapshot only when its
    /// fingerprint differs from the last applied one.
    #[instrument(skip(self))]
    pub async fn auto_sync(&self) -> SyncOutcome {
        let enabled = match self.settings.get_bool(keys::AUTO_SYNC).await {
            Ok(flag) => flag.unwrap_or(false),
            Err(e) => {
                warn!(error = %e, "auto-sync flag unreadable");
                false
            }
        };
        if !enabled {
            return SyncOutcome::Disabled;
        }

        let remote = match self.store.head_fingerprint(SNAPSHOT_OBJECT_KEY).await {
            Ok(remote) => remote,
            Err(e) => {
                warn!(error = %e, "fingerprint check failed, sync skipped");
                self.notices.failure("Auto-sync skipped: backup unreachable");
                return SyncOutcome::Skipped;
            }
        };

        let Some(remote) = remote else {
            debug!("no remote snapshot, nothing to sync");
            return SyncOutcome::UpToDate;
        };

        let local = match self.settings.get_string(keys::FINGERPRINT).await {
            Ok(local) => local,
            Err(e) => {
                warn!(error = %e, "local fingerprint unreadable, sync skipped");
                self.notices.failure("Auto-sync skipped: state unreadable");
                return SyncOutcome::Skipped;
            }
        };

        if local.as_deref() == Some(remote.as_str()) {
            debug!(fingerprint = %remote, "remote snapshot unchanged");
            return SyncOutcome::UpToDate;
        }

        info!(remote = %remote, local = ?local, "remote snapshot changed, merging");
        match self.restore_inner().await {
            Ok(report) if report.fully_applied() => {
                self.notices.success("Collections updated from backup");
                SyncOutcome::Applied
            }
            Ok(report) => {
                self.notices.failure(format!(
                    "Auto-sync incomplete: {} operation(s) failed",
                    report.failed.len() + report.collection_error.iter().count()
                ));
                SyncOutcome::Skipped
            }
            Err(e) => {
                warn!(error = %e, "auto-sync merge failed");
                self.notices.failure(format!("Auto-sync failed: {}", e));
                SyncOutcome::Skipped
            }
        }
    }

    async fn resume_mode(&self) -> ResumeMode {
        match self.settings.get_string(keys::RESUME_MODE).await {
            Ok(Some(raw)) => ResumeMode::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "unknown resume mode, defaulting to append");
                ResumeMode::Append
            }),
            _ => ResumeMode::Append,
        }
    }

    async fn persist_fingerprint(&self, fingerprint: Option<Fingerprint>) -> Result<()> {
        let fingerprint = match fingerprint {
            Some(fingerprint) => Some(fingerprint),
            // Backend did not echo one; ask for it.
            None => self.store.head_fingerprint(SNAPSHOT_OBJECT_KEY).await?,
        };

        if let Some(fingerprint) = fingerprint {
            self.settings
                .set_string(keys::FINGERPRINT, fingerprint.as_str())
                .await?;
        }
        Ok(())
    }
}
