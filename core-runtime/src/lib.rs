//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the backup core:
//! - Composition-root context and builder
//! - User-facing notice bus
//! - Logging and tracing setup
//!
//! ## Overview
//!
//! Every component takes its dependencies from an explicitly constructed
//! [`CoreContext`](context::CoreContext) owned by the process's composition
//! root. There is no module-level mutable state; tests build a fresh
//! context each.

pub mod context;
pub mod error;
pub mod logging;
pub mod notify;

pub use context::{CoreContext, CoreContextBuilder};
pub use error::{Error, Result};
pub use notify::{Notice, NoticeBus};
