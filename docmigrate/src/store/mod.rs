//! Version history persistence.
//!
//! The engine talks to storage only through [`VersionStoreProvider`]. A provider
//! keeps an append-only history of [`VersionRecord`](crate::record::VersionRecord)s
//! in a named collection. [`VersionStore`] wraps a provider so it can be cloned
//! and shared cheaply.
//!
//! - [`memory`] - in-memory provider, the default backend
//!
//! Persistent providers live in their own crates (`docmigrate_fjall_adapter`,
//! `docmigrate_mongodb_adapter`).

pub mod memory;
mod version_store;

pub use version_store::*;
