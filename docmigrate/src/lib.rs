//! # docmigrate - Versioned Migrations for Document Stores
//!
//! docmigrate applies an ordered registry of migrations to a data store and
//! records every step in an append-only version history, so the current schema
//! version can always be recovered from the latest record.
//!
//! ## Key Features
//!
//! - **Ordered**: migrations run by ascending version, rollbacks by descending version
//! - **Resumable**: one history record per step; a failed run keeps its completed steps
//! - **Placeholders**: reserve a version without executing anything
//! - **Pluggable Storage**: in-memory store built in, fjall and MongoDB stores in adapter crates
//!
//! ## Quick Start
//!
//! ```rust
//! use docmigrate::common::ALL_AVAILABLE;
//! use docmigrate::migration::{FnHandler, Migration};
//! use docmigrate::migrator::Migrator;
//!
//! # fn main() -> docmigrate::errors::MigrateResult<()> {
//! let mut migrator = Migrator::builder()
//!     .add_migration(Migration::new(1, "init", FnHandler::new("schema", || Ok(()), || Ok(()))))
//!     .add_migration(Migration::placeholder(2, "reserved"))
//!     .add_migration(Migration::new(3, "seed", FnHandler::new("data", || Ok(()), || Ok(()))))
//!     .build()?;
//!
//! migrator.up(ALL_AVAILABLE)?;
//! assert_eq!(migrator.version()?.0, 3);
//!
//! migrator.down(ALL_AVAILABLE)?;
//! assert_eq!(migrator.version()?.0, 0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`common`] - Constants and shared utilities
//! - [`errors`] - Error types and result definitions
//! - [`migration`] - Migration descriptors and handlers
//! - [`migrator`] - The orchestrator
//! - [`migrator_builder`] - Builder for migrators
//! - [`migrator_config`] - Migrator configuration
//! - [`record`] - Version history records
//! - [`store`] - Version store abstraction and the in-memory store

pub mod common;
pub mod errors;
pub mod migration;
pub mod migrator;
pub mod migrator_builder;
pub mod migrator_config;
pub mod record;
pub mod store;
