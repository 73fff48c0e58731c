use crate::common::{atomic, Atomic, ReadExecutor, WriteExecutor};
use crate::errors::{ErrorKind, MigrateError, MigrateResult};
use crate::record::VersionRecord;
use crate::store::memory::InMemoryStoreConfig;
use crate::store::{validate_collection_name, VersionStoreProvider};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// In-memory implementation of a version store.
///
/// # Purpose
/// Keeps every history collection in a process-local map. Suitable for tests,
/// embedded use where the data store itself is ephemeral, and as the default
/// backend of [`MigratorBuilder`](crate::migrator_builder::MigratorBuilder).
///
/// # Characteristics
/// - **Thread-Safe**: collections live in a `DashMap`, the bound collection
///   name behind a `parking_lot` lock
/// - **Append-Only**: records are pushed, never rewritten
/// - **No Persistence**: all history is lost when the last clone is dropped
///
/// # Usage
/// ```text
/// let store = VersionStore::new(InMemoryVersionStore::new());
/// store.ensure_collection_exists("migrations")?;
/// store.insert(VersionRecord::new(1, "init", "schema"))?;
/// ```
#[derive(Clone)]
pub struct InMemoryVersionStore {
    inner: Arc<InMemoryVersionStoreInner>,
}

impl Default for InMemoryVersionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVersionStore {
    /// Creates a writable store bound to the default collection.
    pub fn new() -> InMemoryVersionStore {
        InMemoryVersionStore::with_config(InMemoryStoreConfig::new())
    }

    pub fn with_config(config: InMemoryStoreConfig) -> InMemoryVersionStore {
        InMemoryVersionStore {
            inner: Arc::new(InMemoryVersionStoreInner::new(config)),
        }
    }

    /// Switches read-only mode on or off for every clone of this store.
    pub fn set_read_only(&self, read_only: bool) {
        self.inner.read_only.store(read_only, Ordering::Relaxed);
    }

    /// Closes the store; every later operation fails with `PersistenceError`.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Relaxed);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Relaxed)
    }

    /// Names of all provisioned collections, sorted.
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }
}

impl VersionStoreProvider for InMemoryVersionStore {
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

struct InMemoryVersionStoreInner {
    closed: AtomicBool,
    read_only: AtomicBool,
    active_collection: Atomic<String>,
    collections: DashMap<String, Vec<VersionRecord>>,
}

impl InMemoryVersionStoreInner {
    fn new(config: InMemoryStoreConfig) -> InMemoryVersionStoreInner {
        InMemoryVersionStoreInner {
            closed: AtomicBool::new(false),
            read_only: AtomicBool::new(config.is_read_only()),
            active_collection: atomic(config.initial_collection().to_string()),
            collections: DashMap::new(),
        }
    }

    fn check_opened(&self) -> MigrateResult<()> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(MigrateError::new(
                "In-memory version store is closed",
                ErrorKind::PersistenceError,
            ));
        }
        Ok(())
    }

    fn check_writable(&self, operation: &str) -> MigrateResult<()> {
        if self.read_only.load(Ordering::Relaxed) {
            log::error!("Rejected {} on read-only in-memory version store", operation);
            return Err(MigrateError::new(
                &format!("Cannot {} on a read-only version store", operation),
                ErrorKind::PersistenceError,
            ));
        }
        Ok(())
    }

    fn ensure_collection_exists(&self, name: &str) -> MigrateResult<()> {
        self.check_opened()?;
        validate_collection_name(name)?;

        if !self.collections.contains_key(name) {
            self.check_writable("create a collection")?;
            self.collections.entry(name.to_string()).or_default();
            log::debug!("Created in-memory migrations collection {}", name);
        }

        self.active_collection.write_with(|active| *active = name.to_string());
        Ok(())
    }

    fn insert(&self, record: VersionRecord) -> MigrateResult<VersionRecord> {
        self.check_opened()?;
        self.check_writable("insert a version record")?;

        let name = self.active_collection.read_with(|name| name.clone());
        self.collections
            .entry(name)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    fn find_all(&self) -> MigrateResult<Vec<VersionRecord>> {
        self.check_opened()?;

        let name = self.active_collection.read_with(|name| name.clone());
        Ok(self
            .collections
            .get(&name)
            .map(|records| records.value().clone())
            .unwrap_or_default())
    }

    fn find_current(&self) -> MigrateResult<VersionRecord> {
        self.check_opened()?;

        let name = self.active_collection.read_with(|name| name.clone());
        self.collections
            .get(&name)
            .and_then(|records| records.last().cloned())
            .ok_or_else(|| {
                MigrateError::new(
                    &format!("No version record found in collection {}", name),
                    ErrorKind::NotFound,
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::DEFAULT_MIGRATIONS_COLLECTION;

    #[test]
    fn new_store_is_bound_to_default_collection() {
        let store = InMemoryVersionStore::new();
        assert_eq!(store.collection_name(), DEFAULT_MIGRATIONS_COLLECTION);
        assert!(store.collection_names().is_empty());
    }

    #[test]
    fn ensure_collection_exists_is_idempotent() -> MigrateResult<()> {
        let store = InMemoryVersionStore::new();
        store.ensure_collection_exists("history")?;
        store.insert(VersionRecord::new(1, "init", "schema"))?;
        store.ensure_collection_exists("history")?;

        assert_eq!(store.collection_names(), vec!["history".to_string()]);
        assert_eq!(store.find_all()?.len(), 1);
        Ok(())
    }

    #[test]
    fn ensure_collection_exists_rebinds_store() -> MigrateResult<()> {
        let store = InMemoryVersionStore::new();
        store.ensure_collection_exists("first")?;
        store.insert(VersionRecord::new(1, "init", "schema"))?;

        store.ensure_collection_exists("second")?;
        assert_eq!(store.collection_name(), "second");
        assert!(store.find_all()?.is_empty());
        Ok(())
    }

    #[test]
    fn find_current_on_empty_history_is_not_found() {
        let store = InMemoryVersionStore::new();
        let err = store.find_current().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::NotFound);
    }

    #[test]
    fn find_current_returns_last_inserted() -> MigrateResult<()> {
        let store = InMemoryVersionStore::new();
        store.ensure_collection_exists(DEFAULT_MIGRATIONS_COLLECTION)?;
        store.insert(VersionRecord::new(3, "seed", "data"))?;
        store.insert(VersionRecord::new(1, "init", "schema"))?;

        // last inserted wins, not the highest version
        assert_eq!(store.find_current()?.version(), 1);
        let versions: Vec<u64> = store.find_all()?.iter().map(|r| r.version()).collect();
        assert_eq!(versions, vec![3, 1]);
        Ok(())
    }

    #[test]
    fn insert_without_provisioning_creates_bound_collection() -> MigrateResult<()> {
        let store = InMemoryVersionStore::new();
        store.insert(VersionRecord::new(1, "init", "schema"))?;
        assert_eq!(store.collection_names(), vec![DEFAULT_MIGRATIONS_COLLECTION.to_string()]);
        Ok(())
    }

    #[test]
    fn read_only_store_rejects_insert() -> MigrateResult<()> {
        let store = InMemoryVersionStore::new();
        store.ensure_collection_exists("history")?;
        store.set_read_only(true);

        let err = store.insert(VersionRecord::new(1, "init", "schema")).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::PersistenceError);
        // existing collections can still be bound
        store.ensure_collection_exists("history")?;
        Ok(())
    }

    #[test]
    fn read_only_store_rejects_new_collection() {
        let store = InMemoryVersionStore::with_config(InMemoryStoreConfig::new().read_only(true));
        let err = store.ensure_collection_exists("history").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::PersistenceError);
    }

    #[test]
    fn closed_store_fails_every_operation() {
        let store = InMemoryVersionStore::new();
        store.close();
        assert!(store.is_closed());

        assert_eq!(
            store.ensure_collection_exists("history").unwrap_err().kind(),
            &ErrorKind::PersistenceError
        );
        assert_eq!(
            store.insert(VersionRecord::new(1, "init", "schema")).unwrap_err().kind(),
            &ErrorKind::PersistenceError
        );
        assert_eq!(store.find_all().unwrap_err().kind(), &ErrorKind::PersistenceError);
        assert_eq!(store.find_current().unwrap_err().kind(), &ErrorKind::PersistenceError);
    }

    #[test]
    fn invalid_collection_name_is_rejected() {
        let store = InMemoryVersionStore::new();
        let err = store.ensure_collection_exists("").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn clones_share_history() -> MigrateResult<()> {
        let store = InMemoryVersionStore::new();
        let clone = store.clone();
        store.insert(VersionRecord::new(1, "init", "schema"))?;
        assert_eq!(clone.find_current()?.version(), 1);
        Ok(())
    }
}
