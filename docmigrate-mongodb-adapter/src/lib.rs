//! MongoDB support for docmigrate.
//!
//! - [`connect`] / [`connect_with`] open a database handle with a bounded
//!   connect timeout (20 seconds unless configured).
//! - [`MongoVersionStore`] keeps the version history in a collection of that
//!   database.
//!
//! Uses the synchronous driver API, so no async runtime is needed by callers.

mod config;
mod connection;
mod document;
mod store;

pub use config::*;
pub use connection::{connect, connect_with};
pub use store::*;
