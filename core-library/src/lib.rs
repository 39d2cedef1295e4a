//! # Library Domain Module
//!
//! Domain models for curated collections and the collaborator contracts the
//! backup core calls into.
//!
//! ## Overview
//!
//! The collection store and the extension manager live in the host
//! application; this crate only defines their contracts plus the shared
//! model types that cross those seams:
//!
//! - **Models** (`models`): `MediaItem`, `Collection`, `ExtensionRef`,
//!   `InstalledExtension`, `ResumeMode`
//! - **Stores** (`stores`): `CollectionStore`, `ExtensionManager`

pub mod error;
pub mod models;
pub mod stores;

pub use error::{LibraryError, Result};
pub use models::{Collection, InstalledExtension, MediaItem, MediaKey, ResumeMode};
pub use stores::{CollectionStore, ExtensionManager};
