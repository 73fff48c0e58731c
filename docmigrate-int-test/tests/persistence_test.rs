#![cfg(all(feature = "fjall", not(feature = "memory")))]

use docmigrate::common::ALL_AVAILABLE;
use docmigrate::migration::Migration;
use docmigrate::migrator::Migrator;
use docmigrate::store::VersionStore;
use docmigrate_fjall_adapter::FjallVersionStore;
use docmigrate_int_test::test_util::{init_logging, random_path, Journal, TrackingHandler};
use std::fs;

fn open(path: &str) -> FjallVersionStore {
    FjallVersionStore::with_config()
        .db_path(path)
        .low_memory_preset()
        .build()
        .expect("Failed to open fjall version store")
}

fn registry(journal: &Journal) -> Vec<Migration> {
    vec![
        Migration::new(1, "init", TrackingHandler::new("H1", "schema", journal)),
        Migration::new(2, "addIndex", TrackingHandler::new("H2", "index", journal)),
        Migration::new(3, "seed", TrackingHandler::new("H3", "data", journal)),
    ]
}

#[test]
fn test_version_survives_reopen() {
    init_logging();
    let path = random_path();
    let journal = Journal::new();

    {
        let store = open(&path);
        let mut migrator = Migrator::new(VersionStore::new(store.clone()), registry(&journal))
            .expect("Failed to build migrator");
        assert_eq!(migrator.up(2).expect("up failed"), 2);
        store.close().expect("Failed to close store");
    }

    {
        let store = open(&path);
        let mut migrator = Migrator::new(VersionStore::new(store.clone()), registry(&journal))
            .expect("Failed to build migrator");
        assert_eq!(migrator.version().unwrap(), (2, "addIndex".to_string()));

        assert_eq!(migrator.up(ALL_AVAILABLE).unwrap(), 1);
        assert_eq!(journal.events(), vec!["up:H1", "up:H2", "up:H3"]);
        store.close().expect("Failed to close store");
    }

    let _ = fs::remove_dir_all(&path);
}

#[test]
fn test_history_order_survives_reopen() {
    init_logging();
    let path = random_path();
    let journal = Journal::new();

    {
        let store = open(&path);
        let mut migrator = Migrator::new(VersionStore::new(store.clone()), registry(&journal))
            .expect("Failed to build migrator");
        migrator.up(ALL_AVAILABLE).unwrap();
        migrator.down(1).unwrap();
        store.close().unwrap();
    }

    {
        let store = open(&path);
        assert!(store.has_collection("migrations").unwrap());

        let migrator = Migrator::new(VersionStore::new(store.clone()), registry(&journal))
            .expect("Failed to build migrator");
        let versions: Vec<u64> = migrator
            .history()
            .unwrap()
            .iter()
            .map(|record| record.version())
            .collect();
        assert_eq!(versions, vec![1, 2, 3, 2]);
        assert_eq!(migrator.pending().unwrap(), vec![(3, "seed".to_string())]);
        store.close().unwrap();
    }

    let _ = fs::remove_dir_all(&path);
}
