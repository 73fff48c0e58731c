use docmigrate::common::ALL_AVAILABLE;
use docmigrate::migrator::Migrator;
use docmigrate::store::VersionStore;
use docmigrate_int_test::test_util::{init_logging, TestContext};
use docmigrate_mongodb_adapter::{MongoConnectionConfig, MongoVersionStore, MONGO_URL_ENV};
use std::env;

fn live_context() -> (TestContext, MongoVersionStore) {
    init_logging();
    let uri = env::var(MONGO_URL_ENV).unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let database = format!("docmigrate_it_{}", uuid::Uuid::new_v4().simple());
    let config = MongoConnectionConfig::builder()
        .uri(&uri)
        .database(&database)
        .build()
        .expect("Invalid connection config");
    let store = MongoVersionStore::connect(&config).expect("Failed to connect to MongoDB");
    let ctx = TestContext::new(database, VersionStore::new(store.clone()));
    (ctx, store)
}

#[test]
#[ignore = "requires a running MongoDB at MONGO_URL"]
fn test_mongodb_up_and_down() {
    let (ctx, store) = live_context();
    let mut migrator = Migrator::builder()
        .store(ctx.store())
        .migrations(ctx.scenario())
        .build()
        .unwrap();

    migrator.up(2).unwrap();
    assert_eq!(migrator.version().unwrap(), (2, "addIndex".to_string()));

    migrator.down(1).unwrap();
    let current = migrator.history().unwrap().pop().unwrap();
    assert_eq!(current.version(), 1);
    assert_eq!(current.migration_type(), "index");

    migrator.up(ALL_AVAILABLE).unwrap();
    assert_eq!(
        ctx.journal().events(),
        vec!["up:H1", "up:H2", "down:H2", "up:H2", "up:H3"]
    );

    store.database().drop(None).unwrap();
}
