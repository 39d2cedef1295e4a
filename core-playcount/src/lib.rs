//! # Play-Count Module
//!
//! Process-wide, per-collection cache of usage counters with optimistic
//! local updates and asynchronous remote confirmation.
//!
//! ## Overview
//!
//! - **Cache** (`cache`): counts scoped to the currently loaded collection;
//!   swapped whole when the active collection changes, never partially
//!   updated from remote state
//! - **Service** (`service`): the remote count API -- token login, bulk
//!   fetch, fire-and-forget increment
//!
//! Counting is at-least-once: a local bump is never rolled back when the
//! remote confirmation fails, so the server's view converges from below.

pub mod cache;
pub mod error;
pub mod service;

pub use cache::PlayCountCache;
pub use error::{PlayCountError, Result};
pub use service::{CountService, HttpCountService};
