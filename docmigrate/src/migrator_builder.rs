use crate::errors::{MigrateError, MigrateResult};
use crate::migration::Migration;
use crate::migrator::Migrator;
use crate::migrator_config::MigratorConfig;
use crate::store::memory::InMemoryVersionStore;
use crate::store::{VersionStore, VersionStoreProvider};

/// Builder for a [`Migrator`].
///
/// Configuration errors are captured as they happen and returned by
/// [`build`](MigratorBuilder::build); later calls after the first error are
/// ignored.
///
/// Without an explicit store the migrator records its history in an
/// [`InMemoryVersionStore`].
///
/// # Examples
///
/// ```rust
/// use docmigrate::migration::{FnHandler, Migration};
/// use docmigrate::migrator::Migrator;
/// use docmigrate::store::memory::InMemoryVersionStore;
///
/// # fn main() -> docmigrate::errors::MigrateResult<()> {
/// let migrator = Migrator::builder()
///     .provider(InMemoryVersionStore::new())
///     .collection_name("schema_history")
///     .add_migration(Migration::new(1, "init", FnHandler::new("schema", || Ok(()), || Ok(()))))
///     .build()?;
/// assert_eq!(migrator.collection_name(), "schema_history");
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MigratorBuilder {
    error: Option<MigrateError>,
    config: MigratorConfig,
    store: Option<VersionStore>,
    migrations: Vec<Migration>,
}

impl MigratorBuilder {
    pub fn new() -> Self {
        MigratorBuilder {
            error: None,
            config: MigratorConfig::new(),
            store: None,
            migrations: Vec::new(),
        }
    }

    /// Uses an existing store handle.
    pub fn store(mut self, store: VersionStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Wraps `provider` in a [`VersionStore`] and uses it.
    pub fn provider<T: VersionStoreProvider + 'static>(self, provider: T) -> Self {
        self.store(VersionStore::new(provider))
    }

    /// Sets the collection holding the version history.
    ///
    /// A blank name is captured as a `ValidationError` and reported by `build`.
    pub fn collection_name(mut self, name: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_collection_name(name) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn add_migration(mut self, migration: Migration) -> Self {
        self.migrations.push(migration);
        self
    }

    pub fn migrations<I: IntoIterator<Item = Migration>>(mut self, migrations: I) -> Self {
        self.migrations.extend(migrations);
        self
    }

    /// Creates the migrator.
    ///
    /// # Errors
    ///
    /// Returns the first captured configuration error, or a `ValidationError`
    /// if two migrations share a version.
    pub fn build(self) -> MigrateResult<Migrator> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let store = match self.store {
            Some(store) => store,
            None => {
                log::debug!("No version store configured, using in-memory store");
                VersionStore::new(InMemoryVersionStore::new())
            }
        };
        Migrator::with_config(store, self.migrations, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn default_build_uses_in_memory_store() -> MigrateResult<()> {
        let migrator = MigratorBuilder::new().build()?;
        assert_eq!(migrator.collection_name(), "migrations");
        assert!(migrator.migrations().is_empty());
        assert_eq!(migrator.version()?, (0, String::new()));
        Ok(())
    }

    #[test]
    fn migrations_are_collected_in_order_given() -> MigrateResult<()> {
        let migrator = MigratorBuilder::new()
            .add_migration(Migration::placeholder(5, "five"))
            .migrations(vec![Migration::placeholder(1, "one"), Migration::placeholder(3, "three")])
            .build()?;
        let versions: Vec<u64> = migrator.migrations().iter().map(|m| m.version()).collect();
        assert_eq!(versions, vec![5, 1, 3]);
        Ok(())
    }

    #[test]
    fn blank_collection_name_is_reported_at_build() {
        let result = MigratorBuilder::new().collection_name("  ").build();
        assert_eq!(result.err().map(|e| e.kind().clone()), Some(ErrorKind::ValidationError));
    }

    #[test]
    fn first_error_wins() {
        let result = MigratorBuilder::new()
            .collection_name("")
            .collection_name("valid")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn duplicate_versions_fail_build() {
        let result = MigratorBuilder::new()
            .add_migration(Migration::placeholder(2, "a"))
            .add_migration(Migration::placeholder(2, "b"))
            .build();
        let err = result.err().expect("duplicate versions");
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
        assert!(err.message().contains('2'));
    }

    #[test]
    fn explicit_store_is_used() -> MigrateResult<()> {
        let memory = InMemoryVersionStore::new();
        let migrator = MigratorBuilder::new().provider(memory.clone()).build()?;
        migrator.set_version(1, "init", "schema")?;
        assert_eq!(memory.find_current()?.version(), 1);
        Ok(())
    }
}
