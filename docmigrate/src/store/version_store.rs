use crate::errors::{ErrorKind, MigrateError, MigrateResult};
use crate::record::VersionRecord;
use std::ops::Deref;
use std::sync::Arc;

/// Persistence contract consumed by the migration engine.
///
/// # Purpose
/// A provider stores the version history in a named collection. The history is
/// append-only: the engine only ever inserts records and reads them back.
///
/// # Collection binding
/// A provider starts out bound to
/// [`DEFAULT_MIGRATIONS_COLLECTION`](crate::common::DEFAULT_MIGRATIONS_COLLECTION).
/// [`ensure_collection_exists`](VersionStoreProvider::ensure_collection_exists)
/// provisions a collection and rebinds the provider to it, so the engine calls
/// it before every run with its configured collection name.
///
/// # Implementations
/// - `InMemoryVersionStore`: process-local history
/// - `FjallVersionStore`: persistent history on the fjall LSM engine
/// - `MongoVersionStore`: history kept in a MongoDB collection
///
/// # Thread Safety
/// Implementers must be `Send + Sync`.
pub trait VersionStoreProvider: Send + Sync {
    /// Idempotently makes sure the named history collection exists and binds
    /// the provider to it.
    ///
    /// # Errors
    /// `PersistenceError` if the backend is unreachable or rejects the operation.
    fn ensure_collection_exists(&self, name: &str) -> MigrateResult<()>;

    /// Appends a record to the bound collection and returns it.
    ///
    /// # Errors
    /// `PersistenceError` on write failure.
    fn insert(&self, record: VersionRecord) -> MigrateResult<VersionRecord>;

    /// Returns the whole history of the bound collection in insertion order.
    fn find_all(&self) -> MigrateResult<Vec<VersionRecord>>;

    /// Returns the most recently inserted record.
    ///
    /// # Errors
    /// `NotFound` when the history is empty, `PersistenceError` when the
    /// backend cannot be read.
    fn find_current(&self) -> MigrateResult<VersionRecord>;

    /// Name of the collection the provider is currently bound to.
    fn collection_name(&self) -> String;
}

/// Cloneable handle to a [`VersionStoreProvider`].
///
/// Cloning only bumps a reference count; every clone talks to the same
/// underlying history.
///
/// ```rust
/// use docmigrate::store::VersionStore;
/// use docmigrate::store::memory::InMemoryVersionStore;
///
/// let store = VersionStore::new(InMemoryVersionStore::new());
/// store.ensure_collection_exists("migrations").unwrap();
/// assert!(store.find_all().unwrap().is_empty());
/// ```
#[derive(Clone)]
pub struct VersionStore {
    inner: Arc<dyn VersionStoreProvider>,
}

impl VersionStore {
    pub fn new<T: VersionStoreProvider + 'static>(inner: T) -> Self {
        VersionStore { inner: Arc::new(inner) }
    }
}

impl Deref for VersionStore {
    type Target = Arc<dyn VersionStoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Checks the backend-independent rules for a history collection name.
pub fn validate_collection_name(name: &str) -> MigrateResult<()> {
    if name.trim().is_empty() {
        return Err(MigrateError::new(
            "Migrations collection name cannot be empty",
            ErrorKind::ValidationError,
        ));
    }
    if name.contains('\0') {
        return Err(MigrateError::new(
            &format!("Migrations collection name {:?} contains a null character", name),
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}
