use crate::config::MongoConnectionConfig;
use crate::connection::{connect_with, is_namespace_exists, to_migrate_error};
use crate::document::VersionDocument;
use docmigrate::common::{atomic, Atomic, ReadExecutor, WriteExecutor, DEFAULT_MIGRATIONS_COLLECTION};
use docmigrate::errors::{ErrorKind, MigrateError, MigrateResult};
use docmigrate::record::VersionRecord;
use docmigrate::store::{validate_collection_name, VersionStoreProvider};
use mongodb::bson::doc;
use mongodb::options::{FindOneOptions, FindOptions};
use mongodb::sync::{Collection, Database};
use std::sync::Arc;

/// Version store keeping the history in a MongoDB collection.
///
/// The current record is the one with the latest `timestamp`, ties broken by
/// `_id`.
///
/// # Examples
///
/// ```rust,ignore
/// use docmigrate::migrator::Migrator;
/// use docmigrate_mongodb_adapter::{connect, MongoVersionStore};
///
/// let database = connect("mongodb://localhost:27017", "app")?;
/// let mut migrator = Migrator::builder()
///     .provider(MongoVersionStore::new(database))
///     .migrations(registry)
///     .build()?;
/// ```
#[derive(Clone)]
pub struct MongoVersionStore {
    inner: Arc<MongoVersionStoreInner>,
}

impl MongoVersionStore {
    pub fn new(database: Database) -> MongoVersionStore {
        MongoVersionStore {
            inner: Arc::new(MongoVersionStoreInner {
                database,
                active_collection: atomic(DEFAULT_MIGRATIONS_COLLECTION.to_string()),
            }),
        }
    }

    /// Connects with `config` and wraps the resulting database.
    pub fn connect(config: &MongoConnectionConfig) -> MigrateResult<MongoVersionStore> {
        Ok(MongoVersionStore::new(connect_with(config)?))
    }

    pub fn database(&self) -> &Database {
        &self.inner.database
    }
}

impl VersionStoreProvider for MongoVersionStore {
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
        self.inner.active_collection()
    }
}

struct MongoVersionStoreInner {
    database: Database,
    active_collection: Atomic<String>,
}

impl MongoVersionStoreInner {
    fn active_collection(&self) -> String {
        self.active_collection.read_with(|name| name.clone())
    }

    fn collection(&self) -> Collection<VersionDocument> {
        self.database.collection(&self.active_collection())
    }

    fn ensure_collection_exists(&self, name: &str) -> MigrateResult<()> {
        validate_mongo_collection_name(name)?;

        let existing = self
            .database
            .list_collection_names(doc! { "name": name })
            .map_err(|err| to_migrate_error("Failed to list collections", err))?;

        if existing.is_empty() {
            match self.database.create_collection(name, None) {
                Ok(_) => log::debug!("Created MongoDB migrations collection {}", name),
                // created concurrently by another instance
                Err(err) if is_namespace_exists(&err) => {}
                Err(err) => {
                    log::error!("Failed to create collection {}: {}", name, err);
                    return Err(to_migrate_error(
                        &format!("Failed to create collection {}", name),
                        err,
                    ));
                }
            }
        }

        self.active_collection
            .write_with(|active| *active = name.to_string());
        Ok(())
    }

    fn insert(&self, record: VersionRecord) -> MigrateResult<VersionRecord> {
        let document = VersionDocument::from_record(&record).ok_or_else(|| {
            MigrateError::new(
                &format!("Version {} does not fit a BSON int64", record.version()),
                ErrorKind::EncodingError,
            )
        })?;

        self.collection().insert_one(document, None).map_err(|err| {
            log::error!("Failed to insert version record {}: {}", record.version(), err);
            to_migrate_error("Failed to insert version record", err)
        })?;
        Ok(record)
    }

    fn find_all(&self) -> MigrateResult<Vec<VersionRecord>> {
        let options = FindOptions::builder()
            .sort(doc! { "timestamp": 1, "_id": 1 })
            .build();
        let cursor = self
            .collection()
            .find(None, options)
            .map_err(|err| to_migrate_error("Failed to read version history", err))?;

        let mut records = Vec::new();
        for document in cursor {
            let document =
                document.map_err(|err| to_migrate_error("Failed to read version history", err))?;
            records.push(decode(document)?);
        }
        Ok(records)
    }

    fn find_current(&self) -> MigrateResult<VersionRecord> {
        let options = FindOneOptions::builder()
            .sort(doc! { "timestamp": -1, "_id": -1 })
            .build();
        let document = self
            .collection()
            .find_one(None, options)
            .map_err(|err| to_migrate_error("Failed to read current version", err))?;

        match document {
            Some(document) => decode(document),
            None => Err(MigrateError::new(
                &format!("No version record found in collection {}", self.active_collection()),
                ErrorKind::NotFound,
            )),
        }
    }
}

fn decode(document: VersionDocument) -> MigrateResult<VersionRecord> {
    let version = document.version;
    document.into_record().ok_or_else(|| {
        MigrateError::new(
            &format!("Invalid version {} in version history", version),
            ErrorKind::EncodingError,
        )
    })
}

/// MongoDB collection names may not contain `$` and the `system.` prefix is
/// reserved.
fn validate_mongo_collection_name(name: &str) -> MigrateResult<()> {
    validate_collection_name(name)?;
    if name.contains('$') || name.starts_with("system.") {
        return Err(MigrateError::new(
            &format!("Invalid collection name for MongoDB store: {}", name),
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect;

    fn live_store() -> MongoVersionStore {
        let _ = colog::default_builder().is_test(true).try_init();
        let uri = std::env::var("MONGO_URL").unwrap_or_else(|_| "mongodb://localhost:27017".into());
        let database = format!("docmigrate_{}", uuid::Uuid::new_v4().simple());
        MongoVersionStore::new(connect(&uri, &database).unwrap())
    }

    fn drop_database(store: &MongoVersionStore) {
        if let Err(e) = store.database().drop(None) {
            log::error!("Failed to drop test database: {}", e);
        }
    }

    #[test]
    fn test_validate_mongo_collection_name() {
        assert!(validate_mongo_collection_name("migrations").is_ok());
        assert!(validate_mongo_collection_name("schema.history").is_ok());
        for name in ["", "price$", "system.views"] {
            assert_eq!(
                validate_mongo_collection_name(name).unwrap_err().kind(),
                &ErrorKind::ValidationError
            );
        }
    }

    #[test]
    #[ignore = "requires a running MongoDB at MONGO_URL"]
    fn test_ensure_collection_exists_is_idempotent() {
        let store = live_store();
        store.ensure_collection_exists("migrations").unwrap();
        store.ensure_collection_exists("migrations").unwrap();

        let names = store.database().list_collection_names(None).unwrap();
        assert_eq!(names, vec!["migrations".to_string()]);
        drop_database(&store);
    }

    #[test]
    #[ignore = "requires a running MongoDB at MONGO_URL"]
    fn test_insert_and_find_current() {
        let store = live_store();
        store.ensure_collection_exists("migrations").unwrap();
        assert_eq!(store.find_current().unwrap_err().kind(), &ErrorKind::NotFound);

        store.insert(VersionRecord::new(1, "init", "schema")).unwrap();
        store.insert(VersionRecord::new(2, "addIndex", "index")).unwrap();
        store.insert(VersionRecord::new(1, "init", "index")).unwrap();

        let current = store.find_current().unwrap();
        assert_eq!(current.version(), 1);
        assert_eq!(current.migration_type(), "index");

        let versions: Vec<u64> = store.find_all().unwrap().iter().map(|r| r.version()).collect();
        assert_eq!(versions, vec![1, 2, 1]);
        drop_database(&store);
    }
}
