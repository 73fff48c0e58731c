//! Migration descriptors and the handlers they run.
//!
//! A registry is a list of [`Migration`]s. Each entry pairs a version and a
//! description with a [`MigrationAction`]: either an executable
//! [`MigrationHandler`] or a placeholder that only reserves its version.
//!
//! # Creating Migrations
//!
//! ```rust
//! use docmigrate::migration::{FnHandler, Migration};
//!
//! let registry = vec![
//!     Migration::new(1, "init", FnHandler::new("schema", || Ok(()), || Ok(()))),
//!     Migration::placeholder(2, "reserved"),
//!     Migration::new(3, "seed", FnHandler::new("data", || Ok(()), || Ok(()))),
//! ];
//! assert_eq!(registry.len(), 3);
//! ```
//!
//! The [`Migrator`](crate::migrator::Migrator) sorts the registry by version
//! before every run and applies or reverts entries one step at a time.

mod handler;
mod migration;
mod plan;

pub use handler::{FnHandler, MigrationHandler};
pub use migration::{Migration, MigrationAction};
pub use plan::{rollback_target, RollbackTarget};
pub(crate) use plan::{normalize_steps, sort_registry, validate_unique_versions};
