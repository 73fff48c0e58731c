//! Persistent version store for docmigrate on the fjall LSM engine.
//!
//! ```rust,ignore
//! use docmigrate::migrator::Migrator;
//! use docmigrate_fjall_adapter::FjallVersionStore;
//!
//! let store = FjallVersionStore::with_config()
//!     .db_path("/var/lib/app/migrations")
//!     .build()?;
//! let mut migrator = Migrator::builder()
//!     .provider(store)
//!     .migrations(registry)
//!     .build()?;
//! migrator.up(docmigrate::common::ALL_AVAILABLE)?;
//! ```

mod config;
mod module;
mod store;
mod wrapper;

pub use config::*;
pub use module::*;
pub use store::*;
pub use wrapper::{RecordCodecError, RecordCodecResult};
