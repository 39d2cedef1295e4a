//! Media object transfer helpers
//!
//! Thin layer over [`ObjectStore`] that derives keys from media items and
//! applies the upload/delete conventions for binary media: empty payloads
//! are rejected before any network call, and deleting an absent object is
//! not an error.

use std::sync::Arc;

use bytes::Bytes;
use core_library::models::MediaItem;
use tracing::{info, instrument};

use crate::error::{OssError, Result};
use crate::key::object_key;
use crate::store::ObjectStore;

/// Where a media item's bytes live (or would live) on the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLocation {
    pub exists: bool,
    pub key: String,
}

/// Media traffic against the object store.
pub struct MediaObjects {
    store: Arc<dyn ObjectStore>,
}

impl MediaObjects {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Derive this item's object key and check whether the object exists.
    pub async fn locate(&self, item: &MediaItem) -> MediaLocation {
        let key = object_key(item);
        let exists = self.store.exists(&key).await;
        MediaLocation { exists, key }
    }

    /// Upload a media payload under the item's derived key.
    #[instrument(skip(self, payload), fields(len = payload.len()))]
    pub async fn upload(&self, item: &MediaItem, payload: Bytes) -> Result<()> {
        let key = object_key(item);
        if payload.is_empty() {
            return Err(OssError::EmptyObject(key));
        }

        self.store.put(&key, payload).await?;
        info!(key, "media object uploaded");
        Ok(())
    }

    /// Remove the item's object. `Ok(false)` when nothing was stored.
    #[instrument(skip(self))]
    pub async fn remove(&self, item: &MediaItem) -> Result<bool> {
        let key = object_key(item);
        self.store.delete(&key).await
    }

    /// Presigned playback URL for the item's object.
    pub async fn playback_url(&self, item: &MediaItem) -> Result<String> {
        let key = object_key(item);
        self.store.presign_get(&key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Fingerprint;
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        Store {}

        #[async_trait]
        impl ObjectStore for Store {
            async fn exists(&self, key: &str) -> bool;
            async fn get(&self, key: &str) -> Result<Bytes>;
            async fn get_with_fingerprint(&self, key: &str) -> Result<(Bytes, Option<Fingerprint>)>;
            async fn put(&self, key: &str, body: Bytes) -> Result<Option<Fingerprint>>;
            async fn delete(&self, key: &str) -> Result<bool>;
            async fn head_fingerprint(&self, key: &str) -> Result<Option<Fingerprint>>;
            async fn presign_get(&self, key: &str) -> Result<String>;
        }
    }

    #[tokio::test]
    async fn test_locate_reports_derived_key() {
        let mut store = MockStore::new();
        store
            .expect_exists()
            .withf(|key| key == "data/320k/Song-A.mp3")
            .times(1)
            .returning(|_| true);

        let media = MediaObjects::new(Arc::new(store));
        let item = MediaItem::new("qq", "1", "Song", "A");
        let location = media.locate(&item).await;

        assert!(location.exists);
        assert_eq!(location.key, "data/320k/Song-A.mp3");
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_payload() {
        let store = MockStore::new(); // no expectations: nothing may hit the wire

        let media = MediaObjects::new(Arc::new(store));
        let item = MediaItem::new("qq", "1", "Song", "A");
        let err = media.upload(&item, Bytes::new()).await.unwrap_err();

        assert!(matches!(err, OssError::EmptyObject(_)));
    }

    #[tokio::test]
    async fn test_upload_stores_under_derived_key() {
        let mut store = MockStore::new();
        store
            .expect_put()
            .withf(|key, body| key == "data/320k/Song-A.mp3" && body.len() == 3)
            .times(1)
            .returning(|_, _| Ok(Some(Fingerprint::new("\"x\""))));

        let media = MediaObjects::new(Arc::new(store));
        let item = MediaItem::new("qq", "1", "Song", "A");
        media.upload(&item, Bytes::from_static(b"abc")).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_native_item_uses_raw_id() {
        let mut store = MockStore::new();
        store
            .expect_delete()
            .withf(|key| key == "data/320k/old.mp3")
            .times(1)
            .returning(|_| Ok(true));

        let media = MediaObjects::new(Arc::new(store));
        let item = MediaItem::new("oss", "data/320k/old.mp3", "Old", "A");
        assert!(media.remove(&item).await.unwrap());
    }
}
