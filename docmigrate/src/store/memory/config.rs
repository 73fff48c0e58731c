use crate::common::DEFAULT_MIGRATIONS_COLLECTION;

/// Configuration for an in-memory version store.
///
/// # Usage
/// ```text
/// let config = InMemoryStoreConfig::new().collection_name("schema_history");
/// let store = InMemoryVersionStore::with_config(config);
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryStoreConfig {
    collection_name: String,
    read_only: bool,
}

impl Default for InMemoryStoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStoreConfig {
    /// Creates a writable configuration bound to the default collection.
    pub fn new() -> InMemoryStoreConfig {
        InMemoryStoreConfig {
            collection_name: DEFAULT_MIGRATIONS_COLLECTION.to_string(),
            read_only: false,
        }
    }

    /// Sets the collection the store is bound to before the engine provisions one.
    pub fn collection_name(mut self, name: &str) -> Self {
        self.collection_name = name.to_string();
        self
    }

    /// Opens the store in read-only mode; inserts and provisioning of new
    /// collections are rejected.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn initial_collection(&self) -> &str {
        &self.collection_name
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}
