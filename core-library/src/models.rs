//! Domain models for curated collections
//!
//! These types cross the backup document wire format, so their serde shapes
//! are pinned: unknown fields round-trip through flattened maps rather than
//! being dropped.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Identity of a media item: the `(platform, id)` pair.
///
/// This is the cache key for play counts and the default object key input
/// for storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaKey {
    pub platform: String,
    pub id: String,
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.platform, self.id)
    }
}

/// A single media item inside a collection.
///
/// Platform-specific fields beyond the identity and display pair are
/// preserved verbatim in `extra` so backup documents survive round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub platform: String,
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl MediaItem {
    pub fn new(
        platform: impl Into<String>,
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            extra: HashMap::new(),
        }
    }

    /// Identity key of this item
    pub fn key(&self) -> MediaKey {
        MediaKey {
            platform: self.platform.clone(),
            id: self.id.clone(),
        }
    }
}

/// A user-curated ordered list of media items (playlist).
///
/// Identity is `id`; uniqueness of `id` across collections is maintained by
/// the host's collection store, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<MediaItem>,
    #[serde(flatten)]
    pub meta: HashMap<String, serde_json::Value>,
}

impl Collection {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            items: Vec::new(),
            meta: HashMap::new(),
        }
    }
}

/// An installed extension as reported by the host's extension manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledExtension {
    pub source_url: String,
    pub version: Option<String>,
}

/// Policy governing how incoming collections combine with local ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeMode {
    /// Incoming collections are added alongside existing ones; duplicate
    /// ids are reconciled by the collection store's own merge policy.
    #[default]
    Append,
    /// Incoming collections replace local ones of the same id.
    Overwrite,
}

impl ResumeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResumeMode::Append => "append",
            ResumeMode::Overwrite => "overwrite",
        }
    }
}

impl FromStr for ResumeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "append" => Ok(ResumeMode::Append),
            "overwrite" => Ok(ResumeMode::Overwrite),
            other => Err(format!("unknown resume mode: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_key_display() {
        let item = MediaItem::new("oss", "track-42", "Song", "Artist");
        assert_eq!(item.key().to_string(), "oss-track-42");
    }

    #[test]
    fn test_media_item_preserves_unknown_fields() {
        let json = r#"{
            "platform": "qq",
            "id": "123",
            "title": "Song",
            "artist": "A",
            "album": "B-sides",
            "duration": 187
        }"#;

        let item: MediaItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.extra.get("album").and_then(|v| v.as_str()), Some("B-sides"));

        let out = serde_json::to_value(&item).unwrap();
        assert_eq!(out["duration"], 187);
    }

    #[test]
    fn test_collection_round_trip_keeps_item_order() {
        let mut collection = Collection::new("sheet-1", "Favorites");
        collection.items.push(MediaItem::new("qq", "1", "First", "A"));
        collection.items.push(MediaItem::new("qq", "2", "Second", "B"));

        let json = serde_json::to_string(&collection).unwrap();
        let back: Collection = serde_json::from_str(&json).unwrap();

        assert_eq!(back, collection);
        assert_eq!(back.items[0].id, "1");
        assert_eq!(back.items[1].id, "2");
    }

    #[test]
    fn test_resume_mode_parse() {
        assert_eq!("append".parse::<ResumeMode>().unwrap(), ResumeMode::Append);
        assert_eq!(
            "overwrite".parse::<ResumeMode>().unwrap(),
            ResumeMode::Overwrite
        );
        assert!("merge".parse::<ResumeMode>().is_err());
    }
}
