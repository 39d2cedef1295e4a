//! Per-collection play-count cache
//!
//! Counts are scoped to the currently loaded collection: switching
//! collections discards the whole table and bulk-fetches fresh counts.
//! While the cache is invalid (load failed, or nothing loaded yet) counts
//! read as unknown -- never as zero -- and plays are not recorded.

use std::collections::HashMap;
use std::sync::Arc;

use core_library::models::MediaItem;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::service::CountService;

#[derive(Default)]
struct CacheState {
    collection_id: Option<String>,
    counts: HashMap<String, u64>,
    valid: bool,
}

/// Process-wide play-count cache with optimistic local updates.
pub struct PlayCountCache {
    service: Arc<dyn CountService>,
    state: Mutex<CacheState>,
}

impl PlayCountCache {
    pub fn new(service: Arc<dyn CountService>) -> Self {
        Self {
            service,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Load counts for `collection_id`.
    ///
    /// A no-op when that collection is already loaded and valid. Otherwise
    /// the cache is invalidated, a bulk fetch runs, and the cache becomes
    /// valid only if the fetch succeeds; on failure counts read as unknown
    /// until the next successful load.
    pub async fn load_for(&self, collection_id: &str, items: &[MediaItem]) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.valid && state.collection_id.as_deref() == Some(collection_id) {
            return Ok(());
        }

        state.valid = false;
        state.counts.clear();
        state.collection_id = Some(collection_id.to_string());

        let keys: Vec<_> = items.iter().map(|item| item.key()).collect();
        match self.service.fetch_counts(&keys).await {
            Ok(counts) => {
                debug!(collection_id, entries = counts.len(), "play counts loaded");
                state.counts = counts;
                state.valid = true;
                Ok(())
            }
            Err(e) => {
                warn!(collection_id, error = %e, "play-count load failed, cache invalid");
                Err(e)
            }
        }
    }

    /// The known count for `item`, or `None` when unknown (not loaded, or
    /// the item has no recorded plays and the cache is invalid).
    pub async fn count(&self, item: &MediaItem) -> Option<u64> {
        let state = self.state.lock().await;
        if !state.valid {
            return None;
        }
        state.counts.get(&item.key().to_string()).copied()
    }

    /// Record one play: bump the local count immediately and confirm
    /// remotely in a detached task.
    ///
    /// Returns `false` (and records nothing) while the cache is invalid.
    /// A failed remote confirmation is logged but never rolls the local
    /// bump back.
    pub async fn record_play(&self, item: &MediaItem) -> bool {
        let key = item.key();
        {
            let mut state = self.state.lock().await;
            if !state.valid {
                return false;
            }
            *state.counts.entry(key.to_string()).or_insert(0) += 1;
        }

        let service = self.service.clone();
        tokio::spawn(async move {
            if let Err(e) = service.record_play(&key).await {
                warn!(key = %key, error = %e, "remote play-count confirmation failed");
            }
        });
        true
    }
}
