//! Workspace placeholder crate.
//!
//! Hosts depend on `tunevault-workspace` and enable the documented features
//! (e.g. `desktop-shims`) instead of wiring each member crate individually.
//! The actual functionality lives in `core-backup`, `core-playcount`,
//! `provider-oss`, and the bridge crates they build on.
