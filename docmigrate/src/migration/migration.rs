use crate::migration::MigrationHandler;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// What happens when the engine reaches a registry entry.
#[derive(Clone)]
pub enum MigrationAction {
    /// Run this handler's `up`/`down`.
    Executable(Arc<dyn MigrationHandler>),
    /// Reserve the version slot without running anything.
    Placeholder,
}

impl MigrationAction {
    pub fn handler(&self) -> Option<&Arc<dyn MigrationHandler>> {
        match self {
            MigrationAction::Executable(handler) => Some(handler),
            MigrationAction::Placeholder => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, MigrationAction::Placeholder)
    }
}

impl Debug for MigrationAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationAction::Executable(handler) => {
                write!(f, "Executable({})", handler.migration_type())
            }
            MigrationAction::Placeholder => write!(f, "Placeholder"),
        }
    }
}

/// A registry entry: a version number, a description and what to run.
///
/// Versions order the registry and must be unique within one migrator, but do
/// not have to be contiguous.
///
/// # Examples
///
/// ```rust
/// use docmigrate::migration::{FnHandler, Migration};
///
/// let init = Migration::new(1, "init", FnHandler::new("schema", || Ok(()), || Ok(())));
/// let reserved = Migration::placeholder(2, "reserved for backfill");
/// assert!(!init.is_placeholder());
/// assert!(reserved.is_placeholder());
/// ```
#[derive(Clone, Debug)]
pub struct Migration {
    version: u64,
    description: String,
    action: MigrationAction,
}

impl Migration {
    pub fn new<H: MigrationHandler + 'static>(version: u64, description: &str, handler: H) -> Self {
        Migration::with_handler(version, description, Arc::new(handler))
    }

    /// Creates an executable entry from an already shared handler.
    pub fn with_handler(version: u64, description: &str, handler: Arc<dyn MigrationHandler>) -> Self {
        Migration {
            version,
            description: description.to_string(),
            action: MigrationAction::Executable(handler),
        }
    }

    /// Creates an entry that occupies `version` but is never executed.
    pub fn placeholder(version: u64, description: &str) -> Self {
        Migration {
            version,
            description: description.to_string(),
            action: MigrationAction::Placeholder,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn action(&self) -> &MigrationAction {
        &self.action
    }

    pub fn handler(&self) -> Option<&Arc<dyn MigrationHandler>> {
        self.action.handler()
    }

    pub fn is_placeholder(&self) -> bool {
        self.action.is_placeholder()
    }
}
