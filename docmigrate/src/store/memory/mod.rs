mod config;
mod store;

pub use config::*;
pub use store::*;
