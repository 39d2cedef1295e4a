//! Object-key derivation for media items
//!
//! Items already hosted on this backend store under their raw `id`; items
//! from other platforms store under a `title-artist` composite beneath a
//! fixed prefix. Composite keys must always form a valid object path, so
//! path-unsafe characters are replaced.

use core_library::models::MediaItem;

/// Platform tag of items whose `id` already is an object key on this
/// backend.
pub const OSS_PLATFORM: &str = "oss";

/// Prefix for media objects uploaded from other platforms.
const MEDIA_PREFIX: &str = "data/320k";

/// Characters that may not appear in a composite object key.
const UNSAFE_CHARS: &[char] = &['/', '\\', '?', '*', '"', '<', '>', ':'];

/// Whether this item's media object already lives on this backend.
pub fn is_native_item(item: &MediaItem) -> bool {
    item.platform == OSS_PLATFORM
}

/// Derive the object key for a media item.
pub fn object_key(item: &MediaItem) -> String {
    if is_native_item(item) {
        return item.id.clone();
    }
    format!(
        "{}/{}-{}.mp3",
        MEDIA_PREFIX,
        sanitize(&item.title),
        sanitize(&item.artist)
    )
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_item_uses_raw_id() {
        let item = MediaItem::new(OSS_PLATFORM, "data/320k/existing.mp3", "Song", "A");
        assert_eq!(object_key(&item), "data/320k/existing.mp3");
    }

    #[test]
    fn test_foreign_item_uses_composite_key() {
        let item = MediaItem::new("qq", "1", "Song", "A");
        assert_eq!(object_key(&item), "data/320k/Song-A.mp3");
    }

    #[test]
    fn test_composite_key_sanitizes_path_chars() {
        let item = MediaItem::new("qq", "1", "Song", "A/B");
        assert_eq!(object_key(&item), "data/320k/Song-A_B.mp3");

        let item = MediaItem::new("qq", "1", "What? \"Why\"", "C:\\D");
        assert_eq!(object_key(&item), "data/320k/What_ _Why_-C__D.mp3");
    }
}
