//! The migration orchestrator.

use crate::common::INITIAL_VERSION;
use crate::errors::{ErrorKind, MigrateError, MigrateResult};
use crate::migration::{
    normalize_steps, rollback_target, sort_registry, validate_unique_versions, Migration,
    MigrationAction,
};
use crate::migrator_builder::MigratorBuilder;
use crate::migrator_config::MigratorConfig;
use crate::record::VersionRecord;
use crate::store::VersionStore;

/// Applies and reverts a registry of migrations against a version store.
///
/// The current version is the version of the most recently written
/// [`VersionRecord`], or 0 when the history is empty. `up` and `down` move it
/// one registry entry at a time and append a record after every successful
/// step, so an interrupted run resumes where it stopped.
///
/// A run stops at the first failure. Steps already applied in that run stay
/// committed; nothing is compensated or retried.
///
/// Runs take `&mut self`, so one instance never runs concurrently with
/// itself. Separate instances (or processes) sharing a collection are not
/// coordinated.
///
/// # Examples
///
/// ```rust
/// use docmigrate::common::ALL_AVAILABLE;
/// use docmigrate::migration::{FnHandler, Migration};
/// use docmigrate::migrator::Migrator;
///
/// # fn main() -> docmigrate::errors::MigrateResult<()> {
/// let mut migrator = Migrator::builder()
///     .add_migration(Migration::new(1, "init", FnHandler::new("schema", || Ok(()), || Ok(()))))
///     .add_migration(Migration::new(2, "seed", FnHandler::new("data", || Ok(()), || Ok(()))))
///     .build()?;
///
/// migrator.up(ALL_AVAILABLE)?;
/// assert_eq!(migrator.version()?, (2, "seed".to_string()));
///
/// migrator.down(1)?;
/// assert_eq!(migrator.version()?, (1, "init".to_string()));
/// # Ok(())
/// # }
/// ```
pub struct Migrator {
    store: VersionStore,
    migrations: Vec<Migration>,
    config: MigratorConfig,
}

impl Migrator {
    /// Returns a builder with an in-memory store and the default collection.
    pub fn builder() -> MigratorBuilder {
        MigratorBuilder::new()
    }

    /// Creates a migrator over `store` using the default configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if two migrations share a version.
    pub fn new(store: VersionStore, migrations: Vec<Migration>) -> MigrateResult<Self> {
        Migrator::with_config(store, migrations, MigratorConfig::new())
    }

    pub(crate) fn with_config(
        store: VersionStore,
        migrations: Vec<Migration>,
        config: MigratorConfig,
    ) -> MigrateResult<Self> {
        validate_unique_versions(&migrations)?;
        Ok(Migrator {
            store,
            migrations,
            config,
        })
    }

    /// Changes the collection holding the version history.
    pub fn set_migrations_collection(&mut self, name: &str) -> MigrateResult<()> {
        self.config.set_collection_name(name)
    }

    pub fn collection_name(&self) -> &str {
        self.config.collection_name()
    }

    /// The registry, sorted by version once any run has happened.
    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    /// Resolves the current version and its description.
    ///
    /// An empty history resolves to `(0, "")`.
    ///
    /// # Errors
    ///
    /// Fails if the history collection cannot be provisioned, or if reading the
    /// current record fails for any reason other than an empty history.
    pub fn version(&self) -> MigrateResult<(u64, String)> {
        self.store
            .ensure_collection_exists(self.config.collection_name())?;

        match self.store.find_current() {
            Ok(record) => Ok((record.version(), record.description().to_string())),
            Err(err) if err.is_not_found() => {
                log::debug!(
                    "No version record in {}, starting from version {}",
                    self.config.collection_name(),
                    INITIAL_VERSION
                );
                Ok((INITIAL_VERSION, String::new()))
            }
            Err(err) => {
                log::error!("Failed to read current migration version: {}", err);
                Err(err)
            }
        }
    }

    /// Appends a version record stamped with the current UTC time.
    ///
    /// # Errors
    ///
    /// Returns a `PersistenceError` wrapping the store failure.
    pub fn set_version(
        &self,
        version: u64,
        description: &str,
        migration_type: &str,
    ) -> MigrateResult<VersionRecord> {
        let record = VersionRecord::new(version, description, migration_type);
        self.store.insert(record).map_err(|err| {
            log::error!("Failed to record migration version {}: {}", version, err);
            MigrateError::new_with_cause(
                &format!("Failed to record migration version {}", version),
                ErrorKind::PersistenceError,
                err,
            )
        })
    }

    /// Applies up to `n` pending migrations in ascending version order.
    ///
    /// `n <= 0` (see [`ALL_AVAILABLE`](crate::common::ALL_AVAILABLE)) or a
    /// value above the registry size applies everything pending. Entries at
    /// or below the current version and placeholders are skipped.
    ///
    /// Returns the number of migrations applied.
    ///
    /// # Errors
    ///
    /// Stops at the first failing handler (`HandlerError`) or record write
    /// (`PersistenceError`). Earlier steps of the run stay applied.
    pub fn up(&mut self, n: i64) -> MigrateResult<usize> {
        let (current_version, _) = self.version()?;
        let steps = normalize_steps(n, self.migrations.len());
        sort_registry(&mut self.migrations);

        log::info!(
            "Migrating up from version {} ({} step(s) requested)",
            current_version,
            steps
        );

        let mut applied = 0;
        for migration in self.migrations.iter() {
            if applied >= steps {
                break;
            }
            if migration.version() <= current_version {
                continue;
            }
            let handler = match migration.action() {
                MigrationAction::Executable(handler) => handler,
                MigrationAction::Placeholder => {
                    log::debug!("Skipping placeholder migration {}", migration.version());
                    continue;
                }
            };

            applied += 1;
            if let Err(err) = handler.up() {
                log::warn!(
                    "Migration {} ({}) failed, stopping after {} applied step(s)",
                    migration.version(),
                    migration.description(),
                    applied - 1
                );
                return Err(MigrateError::new_with_cause(
                    &format!(
                        "Migration {} ({}) failed to apply",
                        migration.version(),
                        migration.description()
                    ),
                    ErrorKind::HandlerError,
                    err,
                ));
            }

            self.set_version(
                migration.version(),
                migration.description(),
                &handler.migration_type(),
            )?;
            log::info!(
                "Applied migration {} ({})",
                migration.version(),
                migration.description()
            );
        }

        Ok(applied)
    }

    /// Reverts up to `n` applied migrations, most recent first.
    ///
    /// `n` is normalized as in [`up`](Migrator::up). Entries above the current
    /// version and placeholders are skipped. After each rollback the new
    /// record takes its version and description from the preceding registry
    /// entry (or version 0), and its type from the handler just reverted.
    ///
    /// Returns the number of migrations reverted.
    ///
    /// # Errors
    ///
    /// Same as [`up`](Migrator::up).
    pub fn down(&mut self, n: i64) -> MigrateResult<usize> {
        let (current_version, _) = self.version()?;
        let steps = normalize_steps(n, self.migrations.len());
        sort_registry(&mut self.migrations);

        log::info!(
            "Migrating down from version {} ({} step(s) requested)",
            current_version,
            steps
        );

        let mut reverted = 0;
        for (index, migration) in self.migrations.iter().enumerate().rev() {
            if reverted >= steps {
                break;
            }
            if migration.version() > current_version {
                continue;
            }
            let handler = match migration.action() {
                MigrationAction::Executable(handler) => handler,
                MigrationAction::Placeholder => {
                    log::debug!("Skipping placeholder migration {}", migration.version());
                    continue;
                }
            };

            reverted += 1;
            if let Err(err) = handler.down() {
                log::warn!(
                    "Rollback of migration {} ({}) failed, stopping after {} reverted step(s)",
                    migration.version(),
                    migration.description(),
                    reverted - 1
                );
                return Err(MigrateError::new_with_cause(
                    &format!(
                        "Migration {} ({}) failed to roll back",
                        migration.version(),
                        migration.description()
                    ),
                    ErrorKind::HandlerError,
                    err,
                ));
            }

            let target = rollback_target(&self.migrations, index);
            self.set_version(target.version, &target.description, &handler.migration_type())?;
            log::info!(
                "Rolled back migration {} ({}), now at version {}",
                migration.version(),
                migration.description(),
                target.version
            );
        }

        Ok(reverted)
    }

    /// The full version history, oldest first.
    pub fn history(&self) -> MigrateResult<Vec<VersionRecord>> {
        self.store
            .ensure_collection_exists(self.config.collection_name())?;
        self.store.find_all()
    }

    /// Executable migrations above the current version, in the order `up`
    /// would apply them.
    pub fn pending(&self) -> MigrateResult<Vec<(u64, String)>> {
        let (current_version, _) = self.version()?;
        let mut pending: Vec<(u64, String)> = self
            .migrations
            .iter()
            .filter(|migration| !migration.is_placeholder())
            .filter(|migration| migration.version() > current_version)
            .map(|migration| (migration.version(), migration.description().to_string()))
            .collect();
        pending.sort_by_key(|(version, _)| *version);
        Ok(pending)
    }
}
