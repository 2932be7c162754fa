//! Tests for FlatStore
//!
//! These tests verify:
//! - Opening/creating store files
//! - In-memory get/set/delete
//! - Whole-table saves and reloads
//! - Save failures leave the previous file intact

use std::fs;
use std::path::PathBuf;

use entitystore::config::{Config, SyncStrategy};
use entitystore::{fields, EntityError, FlatStore, PrimaryKey, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.data");
    (temp_dir, path)
}

// =============================================================================
// Open/Create Tests
// =============================================================================

#[test]
fn test_open_creates_file() {
    let (_temp, path) = setup_temp_store();
    assert!(!path.exists());

    let store = FlatStore::open(&path).unwrap();

    assert!(path.exists());
    assert!(store.is_empty());
    assert!(store.entity_types().is_empty());
    assert_eq!(store.record_count(), 0);
}

#[test]
fn test_open_missing_without_create_fails() {
    let (_temp, path) = setup_temp_store();
    let config = Config::builder()
        .store_path(&path)
        .create_if_missing(false)
        .build();

    let result = FlatStore::open_with(&config);

    assert!(matches!(result, Err(EntityError::StoreAccess { .. })));
    assert!(!path.exists());
}

#[test]
fn test_open_in_missing_directory_fails() {
    let (temp, _) = setup_temp_store();
    let path = temp.path().join("no_such_dir").join("store.data");

    let result = FlatStore::open(&path);

    assert!(matches!(result, Err(EntityError::StoreAccess { .. })));
}

#[test]
fn test_open_garbage_file_is_corrupted() {
    let (_temp, path) = setup_temp_store();
    fs::write(&path, b"definitely not a store").unwrap();

    let result = FlatStore::open(&path);

    assert!(matches!(result, Err(EntityError::Corrupted(_))));
}

// =============================================================================
// In-Memory Operation Tests
// =============================================================================

#[test]
fn test_set_and_get() {
    let (_temp, path) = setup_temp_store();
    let mut store = FlatStore::open(&path).unwrap();

    store.set("Widget", PrimaryKey::from("w1"), fields! { "sku" => "w1", "qty" => 3 });

    let data = store.get("Widget", &PrimaryKey::from("w1")).unwrap();
    assert_eq!(data["qty"], Value::Int(3));
    assert!(store.get("Widget", &PrimaryKey::from("w2")).is_none());
    assert!(store.get("Gadget", &PrimaryKey::from("w1")).is_none());
}

#[test]
fn test_set_replaces_existing_record() {
    let (_temp, path) = setup_temp_store();
    let mut store = FlatStore::open(&path).unwrap();

    store.set("Widget", PrimaryKey::from("w1"), fields! { "qty" => 1 });
    store.set("Widget", PrimaryKey::from("w1"), fields! { "qty" => 2 });

    assert_eq!(store.record_count(), 1);
    assert_eq!(store.get("Widget", &PrimaryKey::from("w1")).unwrap()["qty"], Value::Int(2));
}

#[test]
fn test_set_does_not_touch_disk() {
    let (_temp, path) = setup_temp_store();
    let mut store = FlatStore::open(&path).unwrap();

    store.set("Widget", PrimaryKey::from("w1"), fields! { "qty" => 1 });

    assert_eq!(fs::metadata(&path).unwrap().len(), 0);
}

#[test]
fn test_delete_missing_is_noop() {
    let (_temp, path) = setup_temp_store();
    let mut store = FlatStore::open(&path).unwrap();

    assert!(store.delete("Widget", &PrimaryKey::from("nope")).is_none());

    store.set("Widget", PrimaryKey::from("w1"), fields! { "qty" => 1 });
    assert!(store.delete("Widget", &PrimaryKey::from("nope")).is_none());
    assert_eq!(store.record_count(), 1);
}

#[test]
fn test_delete_last_record_drops_type() {
    let (_temp, path) = setup_temp_store();
    let mut store = FlatStore::open(&path).unwrap();

    store.set("Widget", PrimaryKey::from("w1"), fields! { "qty" => 1 });
    store.set("Gadget", PrimaryKey::Int(7), fields! { "qty" => 1 });

    let removed = store.delete("Widget", &PrimaryKey::from("w1")).unwrap();

    assert_eq!(removed["qty"], Value::Int(1));
    assert_eq!(store.entity_types(), vec!["Gadget".to_string()]);
}

#[test]
fn test_primary_keys_per_type() {
    let (_temp, path) = setup_temp_store();
    let mut store = FlatStore::open(&path).unwrap();

    store.set("Widget", PrimaryKey::from("b"), fields! { "qty" => 1 });
    store.set("Widget", PrimaryKey::from("a"), fields! { "qty" => 1 });
    store.set("Gadget", PrimaryKey::Int(1), fields! { "qty" => 1 });

    assert_eq!(
        store.primary_keys("Widget"),
        vec![PrimaryKey::from("a"), PrimaryKey::from("b")]
    );
    assert_eq!(store.primary_keys("Gadget"), vec![PrimaryKey::Int(1)]);
    assert!(store.primary_keys("Unknown").is_empty());
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_save_and_reopen() {
    let (_temp, path) = setup_temp_store();

    {
        let mut store = FlatStore::open(&path).unwrap();
        store.set("Widget", PrimaryKey::from("w1"), fields! { "sku" => "w1", "price" => 1.25 });
        store.set("Widget", PrimaryKey::from("w2"), fields! { "sku" => "w2", "price" => 9.5 });
        store.save().unwrap();
    }

    let store = FlatStore::open(&path).unwrap();
    assert_eq!(store.record_count(), 2);
    assert_eq!(
        store.get("Widget", &PrimaryKey::from("w2")).unwrap()["price"],
        Value::Float(9.5)
    );
}

#[test]
fn test_save_replaces_whole_file() {
    let (_temp, path) = setup_temp_store();

    {
        let mut store = FlatStore::open(&path).unwrap();
        store.set("Widget", PrimaryKey::from("w1"), fields! { "qty" => 1 });
        store.set("Widget", PrimaryKey::from("w2"), fields! { "qty" => 2 });
        store.save().unwrap();
    }

    {
        let mut store = FlatStore::open(&path).unwrap();
        store.delete("Widget", &PrimaryKey::from("w1"));
        store.save().unwrap();
    }

    let store = FlatStore::open(&path).unwrap();
    assert_eq!(store.primary_keys("Widget"), vec![PrimaryKey::from("w2")]);
}

#[test]
fn test_save_without_sync() {
    let (_temp, path) = setup_temp_store();
    let config = Config::builder()
        .store_path(&path)
        .sync_strategy(SyncStrategy::Never)
        .build();

    let mut store = FlatStore::open_with(&config).unwrap();
    store.set("Widget", PrimaryKey::from("w1"), fields! { "qty" => 1 });
    store.save().unwrap();

    assert_eq!(FlatStore::open(&path).unwrap().record_count(), 1);
}

#[test]
fn test_save_leaves_no_staging_file() {
    let (temp, path) = setup_temp_store();
    let mut store = FlatStore::open(&path).unwrap();
    store.set("Widget", PrimaryKey::from("w1"), fields! { "qty" => 1 });
    store.save().unwrap();

    assert!(!temp.path().join("store.data.tmp").exists());
}

#[test]
fn test_failed_save_keeps_previous_file() {
    let (temp, path) = setup_temp_store();
    let mut store = FlatStore::open(&path).unwrap();
    store.set("Widget", PrimaryKey::from("w1"), fields! { "qty" => 1 });
    store.save().unwrap();

    // A directory where the staging file should go makes the save fail
    let staging = temp.path().join("store.data.tmp");
    fs::create_dir(&staging).unwrap();

    store.set("Widget", PrimaryKey::from("w2"), fields! { "qty" => 2 });
    let result = store.save();
    assert!(matches!(result, Err(EntityError::PersistFailure { .. })));

    let on_disk = FlatStore::open(&path).unwrap();
    assert_eq!(on_disk.primary_keys("Widget"), vec![PrimaryKey::from("w1")]);

    // Retry once the obstacle is gone
    fs::remove_dir(&staging).unwrap();
    store.save().unwrap();
    assert_eq!(FlatStore::open(&path).unwrap().record_count(), 2);
}
