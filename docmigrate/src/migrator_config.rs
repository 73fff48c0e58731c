//! Configuration of a [`Migrator`](crate::migrator::Migrator).

use crate::common::DEFAULT_MIGRATIONS_COLLECTION;
use crate::errors::MigrateResult;
use crate::store::validate_collection_name;

/// Settings shared by every run of a migrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratorConfig {
    collection_name: String,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MigratorConfig {
    /// Creates a configuration using the `migrations` collection.
    pub fn new() -> Self {
        MigratorConfig {
            collection_name: DEFAULT_MIGRATIONS_COLLECTION.to_string(),
        }
    }

    /// Name of the collection holding the version history.
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Sets the version history collection.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for blank names.
    pub fn set_collection_name(&mut self, name: &str) -> MigrateResult<()> {
        validate_collection_name(name)?;
        self.collection_name = name.to_string();
        Ok(())
    }
}
