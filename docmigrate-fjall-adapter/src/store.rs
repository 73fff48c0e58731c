use crate::config::FjallConfig;
use crate::module::FjallVersionStoreBuilder;
use crate::wrapper::{decode_record, decode_sequence, encode_record, encode_sequence, to_migrate_error};
use dashmap::DashMap;
use docmigrate::common::{atomic, Atomic, ReadExecutor, WriteExecutor, DEFAULT_MIGRATIONS_COLLECTION};
use docmigrate::errors::{ErrorKind, MigrateError, MigrateResult};
use docmigrate::record::VersionRecord;
use docmigrate::store::{validate_collection_name, VersionStoreProvider};
use fjall::{Keyspace, PartitionHandle, PersistMode};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Longest partition name fjall accepts.
const MAX_PARTITION_NAME_LEN: usize = 255;

/// Version store backed by the fjall LSM engine.
///
/// Each history collection is a fjall partition inside one keyspace. Records
/// are stored under big-endian sequence numbers, so the last key of a
/// partition is the most recently inserted record.
///
/// Characteristics:
/// - Persistent (survives process restarts)
/// - Thread-safe (Arc-based, cloneable across threads)
/// - Append-only (sequence numbers only grow)
/// - Durable inserts (journal synced after every insert unless disabled)
///
/// Usage: created via `FjallVersionStore::with_config().db_path(..).build()`,
/// then wrapped in a `VersionStore` for the migrator.
#[derive(Clone)]
pub struct FjallVersionStore {
    inner: Arc<FjallVersionStoreInner>,
}

impl FjallVersionStore {
    /// Creates a builder for configuring a fjall version store.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let store = FjallVersionStore::with_config()
    ///     .db_path("/path/to/history")
    ///     .low_memory_preset()
    ///     .build()?;
    /// ```
    #[inline]
    pub fn with_config() -> FjallVersionStoreBuilder {
        FjallVersionStoreBuilder::new()
    }

    /// Opens (or creates) the keyspace described by `config`.
    pub(crate) fn open(config: FjallConfig) -> MigrateResult<FjallVersionStore> {
        config.validate()?;

        let keyspace = Keyspace::open(config.keyspace_config()).map_err(|err| {
            log::error!("Failed to open fjall keyspace at {}: {}", config.db_path(), err);
            to_migrate_error(err)
        })?;
        log::debug!("Opened fjall keyspace at {}", config.db_path());

        Ok(FjallVersionStore {
            inner: Arc::new(FjallVersionStoreInner::new(keyspace, config)),
        })
    }

    #[inline]
    pub fn config(&self) -> &FjallConfig {
        &self.inner.store_config
    }

    /// Returns whether a history collection has been provisioned.
    pub fn has_collection(&self, name: &str) -> MigrateResult<bool> {
        self.inner.check_opened()?;
        Ok(self.inner.keyspace.partition_exists(name))
    }

    /// Syncs the journal to disk.
    pub fn commit(&self) -> MigrateResult<()> {
        self.inner.check_opened()?;
        self.inner.commit()
    }

    /// Commits and closes the store; later operations fail with
    /// `PersistenceError`.
    pub fn close(&self) -> MigrateResult<()> {
        if self.inner.closed.swap(true, Ordering::Relaxed) {
            return Ok(());
        }
        self.inner.partitions.clear();
        self.inner.commit()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Relaxed)
    }
}

impl VersionStoreProvider for FjallVersionStore {
    fn ensure_collection_exists(&self, name: &str) -> MigrateResult<()> {
        self.inner.ensure_collection_exists(name)
    }

    fn insert(&self, record: VersionRecord) -> MigrateResult<VersionRecord> {
        self.inner.insert(record)
    }

    fn find_all(&self) -> MigrateResult<Vec<VersionRecord>> {
        self.inner.find_all()
    }

    fn find_current(&self) -> MigrateResult<VersionRecord> {
        self.inner.find_current()
    }

    fn collection_name(&self) -> String {
        self.inner.active_collection.read_with(|name| name.clone())
    }
}

struct FjallVersionStoreInner {
    keyspace: Keyspace,
    closed: AtomicBool,
    store_config: FjallConfig,
    active_collection: Atomic<String>,
    partitions: DashMap<String, PartitionHandle>,
    write_lock: Mutex<()>,
}

impl FjallVersionStoreInner {
    fn new(keyspace: Keyspace, config: FjallConfig) -> FjallVersionStoreInner {
        FjallVersionStoreInner {
            keyspace,
            closed: AtomicBool::new(false),
            store_config: config,
            active_collection: atomic(DEFAULT_MIGRATIONS_COLLECTION.to_string()),
            partitions: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    #[inline]
    fn check_opened(&self) -> MigrateResult<()> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(MigrateError::new(
                "Fjall version store is closed",
                ErrorKind::PersistenceError,
            ));
        }
        Ok(())
    }

    fn commit(&self) -> MigrateResult<()> {
        self.keyspace.persist(PersistMode::SyncAll).map_err(|err| {
            log::error!("Failed to commit fjall keyspace: {}", err);
            to_migrate_error(err)
        })
    }

    fn active_collection(&self) -> String {
        self.active_collection.read_with(|name| name.clone())
    }

    /// Opens the partition backing `name`, creating it when missing.
    fn open_partition(&self, name: &str) -> MigrateResult<PartitionHandle> {
        if let Some(partition) = self.partitions.get(name) {
            return Ok(partition.value().clone());
        }

        let created = !self.keyspace.partition_exists(name);
        match self
            .keyspace
            .open_partition(name, self.store_config.partition_config())
        {
            Ok(partition) => {
                if created {
                    log::debug!("Created fjall partition for migrations collection {}", name);
                }
                self.partitions.insert(name.to_string(), partition.clone());
                Ok(partition)
            }
            Err(err) => {
                log::error!("Failed to open fjall partition {}: {}", name, err);
                Err(to_migrate_error(err))
            }
        }
    }

    /// Returns the partition of the bound collection if it was ever created.
    fn existing_partition(&self) -> MigrateResult<Option<PartitionHandle>> {
        let name = self.active_collection();
        if self.partitions.contains_key(&name) || self.keyspace.partition_exists(&name) {
            self.open_partition(&name).map(Some)
        } else {
            Ok(None)
        }
    }

    fn ensure_collection_exists(&self, name: &str) -> MigrateResult<()> {
        self.check_opened()?;
        validate_partition_name(name)?;

        self.open_partition(name)?;
        self.active_collection
            .write_with(|active| *active = name.to_string());
        Ok(())
    }

    fn insert(&self, record: VersionRecord) -> MigrateResult<VersionRecord> {
        self.check_opened()?;
        let name = self.active_collection();
        let partition = self.open_partition(&name)?;
        let value = encode_record(&record)?;

        let _guard = self.write_lock.lock();
        let sequence = match partition.last_key_value().map_err(to_migrate_error)? {
            Some((key, _)) => decode_sequence(&key)? + 1,
            None => 1,
        };

        partition
            .insert(encode_sequence(sequence), value)
            .map_err(|err| {
                log::error!("Failed to insert version record into {}: {}", name, err);
                to_migrate_error(err)
            })?;

        if self.store_config.sync_on_insert() {
            self.commit()?;
        }
        Ok(record)
    }

    fn find_all(&self) -> MigrateResult<Vec<VersionRecord>> {
        self.check_opened()?;
        let partition = match self.existing_partition()? {
            Some(partition) => partition,
            None => return Ok(Vec::new()),
        };

        let mut records = Vec::new();
        for entry in partition.iter() {
            let (_, value) = entry.map_err(to_migrate_error)?;
            records.push(decode_record(&value)?);
        }
        Ok(records)
    }

    fn find_current(&self) -> MigrateResult<VersionRecord> {
        self.check_opened()?;
        let not_found = || {
            MigrateError::new(
                &format!("No version record found in collection {}", self.active_collection()),
                ErrorKind::NotFound,
            )
        };

        let partition = self.existing_partition()?.ok_or_else(not_found)?;
        match partition.last_key_value().map_err(to_migrate_error)? {
            Some((_, value)) => Ok(decode_record(&value)?),
            None => Err(not_found()),
        }
    }
}

impl Drop for FjallVersionStoreInner {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::Relaxed) {
            if let Err(e) = self.commit() {
                log::error!("Failed to commit fjall keyspace: {}", e);
            }
        }
    }
}

/// Fjall partition names only allow `a-zA-Z0-9_-.#$`.
fn validate_partition_name(name: &str) -> MigrateResult<()> {
    validate_collection_name(name)?;

    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '#' | '$'));
    if !valid_chars || name.len() > MAX_PARTITION_NAME_LEN {
        return Err(MigrateError::new(
            &format!("Invalid collection name for fjall store: {}", name),
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}
