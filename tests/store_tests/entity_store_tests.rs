//! Tests for EntityStore
//!
//! These tests verify:
//! - Lifecycle: uninitialized errors, init, idempotent re-init
//! - CRUD semantics and id assignment
//! - MissingId / NotFound leave the collection untouched
//! - Durability: file mirrors memory after every mutation
//! - Recovery: reload on restart, fail-open on bad files
//! - Write failures in awaited vs best-effort mode
//! - Concurrent creates

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crudstore::config::{Config, DurabilityMode};
use crudstore::entity::Entity;
use crudstore::store::EntityStore;
use crudstore::StoreError;
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn config_for(path: &Path) -> Config {
    Config::builder().storage_path(path).build()
}

async fn setup_temp_store() -> (TempDir, EntityStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = EntityStore::open(config_for(temp_dir.path()), "entity")
        .await
        .unwrap();
    (temp_dir, store)
}

fn entity(value: Value) -> Entity {
    Entity::from_value(value).unwrap()
}

fn read_file(store: &EntityStore) -> Vec<Entity> {
    let bytes = fs::read(store.file_path().unwrap()).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_calls_before_init_fail() {
    let temp_dir = TempDir::new().unwrap();
    let store = EntityStore::new(config_for(temp_dir.path()));

    assert!(!store.is_initialized());
    assert!(matches!(store.get(0), Err(StoreError::Uninitialized)));
    assert!(matches!(store.get_all(), Err(StoreError::Uninitialized)));
    assert!(matches!(
        store.create(Entity::new()).await,
        Err(StoreError::Uninitialized)
    ));
    assert!(matches!(
        store.update(Entity::new().with_id(0)).await,
        Err(StoreError::Uninitialized)
    ));
    assert!(matches!(
        store.delete(&Entity::new().with_id(0)).await,
        Err(StoreError::Uninitialized)
    ));

    // Nothing touched the disk
    assert!(!temp_dir.path().join("entity.json").exists());
}

#[tokio::test]
async fn test_init_creates_empty_collection_file() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("storage");
    let store = EntityStore::new(Config::default());

    store.init("car", &dir).await.unwrap();

    assert!(store.is_initialized());
    assert_eq!(store.entity_name(), Some("car"));
    assert_eq!(store.file_path(), Some(dir.join("car.json").as_path()));
    assert_eq!(fs::read_to_string(dir.join("car.json")).unwrap(), "[]");
    assert!(store.get_all().unwrap().is_empty());
}

#[tokio::test]
async fn test_init_is_idempotent() {
    let (temp_dir, store) = setup_temp_store().await;
    store.create(entity(json!({"a": "b"}))).await.unwrap();

    store.init("entity", temp_dir.path()).await.unwrap();

    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_init_with_other_name_fails() {
    let (temp_dir, store) = setup_temp_store().await;

    let result = store.init("other", temp_dir.path()).await;

    assert!(matches!(result, Err(StoreError::Config(_))));
    assert_eq!(store.entity_name(), Some("entity"));
}

// =============================================================================
// CRUD Tests
// =============================================================================

#[tokio::test]
async fn test_crud_scenario() {
    let (_temp, store) = setup_temp_store().await;

    let created = store.create(entity(json!({"make": "Mercedes"}))).await.unwrap();
    assert_eq!(created.into_value(), json!({"make": "Mercedes", "id": 0}));

    let all: Vec<Value> = store.get_all().unwrap().into_iter().map(Entity::into_value).collect();
    assert_eq!(all, vec![json!({"make": "Mercedes", "id": 0})]);

    let updated = store.update(entity(json!({"id": 0, "make": "BMW"}))).await.unwrap();
    assert_eq!(updated.into_value(), json!({"id": 0, "make": "BMW"}));
    assert_eq!(
        store.get(0).unwrap().map(Entity::into_value),
        Some(json!({"id": 0, "make": "BMW"}))
    );

    store.delete(&entity(json!({"id": 0}))).await.unwrap();
    assert!(store.get_all().unwrap().is_empty());
}

#[tokio::test]
async fn test_crud_two_entities() {
    let (_temp, store) = setup_temp_store().await;

    let e1 = store.create(entity(json!({"a": "b"}))).await.unwrap();
    assert_eq!(e1.id(), Some(0));
    assert_eq!(store.get_all().unwrap().len(), 1);

    let e2 = store.create(entity(json!({"c": "d"}))).await.unwrap();
    assert_eq!(e2.id(), Some(1));

    store.delete(&e2).await.unwrap();
    let all = store.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert!(all.iter().any(|e| e.get("a") == Some(&json!("b"))));
    assert!(!all.iter().any(|e| e.get("c").is_some()));

    store.update(entity(json!({"id": 0, "e": "f"}))).await.unwrap();
    assert_eq!(store.get(0).unwrap().unwrap().get("e"), Some(&json!("f")));

    store.delete(&e1).await.unwrap();
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_ids_strictly_increasing_from_zero() {
    let (_temp, store) = setup_temp_store().await;

    // Past single digits, where string ordering would go wrong
    for expected in 0..25u64 {
        let created = store.create(Entity::new().with("n", expected)).await.unwrap();
        assert_eq!(created.id(), Some(expected));
    }
}

#[tokio::test]
async fn test_create_ignores_supplied_id() {
    let (_temp, store) = setup_temp_store().await;

    let created = store.create(entity(json!({"id": 500, "x": 1}))).await.unwrap();

    assert_eq!(created.id(), Some(0));
    assert!(store.get(500).unwrap().is_none());
}

#[tokio::test]
async fn test_id_after_deleting_max() {
    let (_temp, store) = setup_temp_store().await;
    for _ in 0..3 {
        store.create(Entity::new()).await.unwrap();
    }

    store.delete(&Entity::new().with_id(1)).await.unwrap();
    assert_eq!(store.create(Entity::new()).await.unwrap().id(), Some(3));

    store.delete(&Entity::new().with_id(3)).await.unwrap();
    assert_eq!(store.create(Entity::new()).await.unwrap().id(), Some(3));
}

#[tokio::test]
async fn test_update_replaces_without_merging() {
    let (_temp, store) = setup_temp_store().await;
    store
        .create(entity(json!({"make": "Mercedes", "color": "black"})))
        .await
        .unwrap();

    store.update(entity(json!({"id": 0, "make": "BMW"}))).await.unwrap();

    let stored = store.get(0).unwrap().unwrap();
    assert_eq!(stored.into_value(), json!({"id": 0, "make": "BMW"}));
}

#[tokio::test]
async fn test_update_keeps_position() {
    let (_temp, store) = setup_temp_store().await;
    for n in 0..3 {
        store.create(Entity::new().with("n", n)).await.unwrap();
    }

    store.update(Entity::new().with("n", "changed").with_id(1)).await.unwrap();

    let ids: Vec<_> = store.get_all().unwrap().iter().map(Entity::id).collect();
    assert_eq!(ids, vec![Some(0), Some(1), Some(2)]);
}

#[tokio::test]
async fn test_create_then_delete_restores_size() {
    let (_temp, store) = setup_temp_store().await;
    store.create(entity(json!({"keep": true}))).await.unwrap();
    let before = store.get_all().unwrap();

    let created = store.create(entity(json!({"temp": true}))).await.unwrap();
    store.delete(&created).await.unwrap();

    let after = store.get_all().unwrap();
    assert_eq!(after.len(), before.len());
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_get_unknown_id_is_absent() {
    let (_temp, store) = setup_temp_store().await;

    assert!(store.get(12345).unwrap().is_none());
}

#[tokio::test]
async fn test_returned_entities_are_copies() {
    let (_temp, store) = setup_temp_store().await;
    let mut created = store.create(entity(json!({"make": "Mercedes"}))).await.unwrap();

    created.insert("make", "Trabant");
    let mut all = store.get_all().unwrap();
    all[0].insert("make", "Lada");

    assert_eq!(store.get(0).unwrap().unwrap().get("make"), Some(&json!("Mercedes")));
}

// =============================================================================
// Error Tests
// =============================================================================

#[tokio::test]
async fn test_missing_id_fails_without_io() {
    let (_temp, store) = setup_temp_store().await;
    store.create(entity(json!({"a": "b"}))).await.unwrap();
    let before = fs::read(store.file_path().unwrap()).unwrap();

    assert!(matches!(
        store.update(entity(json!({}))).await,
        Err(StoreError::MissingId)
    ));
    assert!(matches!(
        store.delete(&entity(json!({}))).await,
        Err(StoreError::MissingId)
    ));
    assert!(matches!(
        store.update(entity(json!({"id": null}))).await,
        Err(StoreError::MissingId)
    ));

    assert_eq!(fs::read(store.file_path().unwrap()).unwrap(), before);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_delete_unknown_id_on_empty_store() {
    let (_temp, store) = setup_temp_store().await;

    let result = store.delete(&entity(json!({"id": 12345}))).await;

    assert!(matches!(result, Err(StoreError::NotFound { id: 12345 })));
}

#[tokio::test]
async fn test_unknown_id_leaves_collection_unchanged() {
    let (_temp, store) = setup_temp_store().await;
    store.create(entity(json!({"a": "b"}))).await.unwrap();
    let before = store.get_all().unwrap();

    assert!(matches!(
        store.update(entity(json!({"id": 7, "a": "z"}))).await,
        Err(StoreError::NotFound { id: 7 })
    ));
    assert!(matches!(
        store.delete(&entity(json!({"id": 7}))).await,
        Err(StoreError::NotFound { id: 7 })
    ));

    assert_eq!(store.get_all().unwrap(), before);
    assert_eq!(read_file(&store), before);
}

// =============================================================================
// Durability & Recovery Tests
// =============================================================================

#[tokio::test]
async fn test_file_mirrors_memory_after_each_mutation() {
    let (_temp, store) = setup_temp_store().await;

    store.create(entity(json!({"a": 1}))).await.unwrap();
    assert_eq!(read_file(&store), store.get_all().unwrap());

    store.create(entity(json!({"b": 2}))).await.unwrap();
    assert_eq!(read_file(&store), store.get_all().unwrap());

    store.update(entity(json!({"id": 0, "a": 3}))).await.unwrap();
    assert_eq!(read_file(&store), store.get_all().unwrap());

    store.delete(&Entity::new().with_id(1)).await.unwrap();
    assert_eq!(read_file(&store), store.get_all().unwrap());
}

#[tokio::test]
async fn test_restart_reloads_persisted_entities() {
    let temp_dir = TempDir::new().unwrap();

    let before = {
        let store = EntityStore::open(config_for(temp_dir.path()), "car").await.unwrap();
        store.create(entity(json!({"make": "Mercedes"}))).await.unwrap();
        store.create(entity(json!({"make": "BMW", "extras": ["ac"]}))).await.unwrap();
        store.create(entity(json!({"make": "Audi"}))).await.unwrap();
        store.delete(&Entity::new().with_id(0)).await.unwrap();
        store.get_all().unwrap()
    };

    let store = EntityStore::open(config_for(temp_dir.path()), "car").await.unwrap();

    assert_eq!(store.get_all().unwrap(), before);
    assert_eq!(store.create(Entity::new()).await.unwrap().id(), Some(3));
}

#[tokio::test]
async fn test_load_preserves_file_order() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("car.json"),
        r#"[{"id":10},{"id":9},{"id":2}]"#,
    )
    .unwrap();

    let store = EntityStore::open(config_for(temp_dir.path()), "car").await.unwrap();
    let created = store.create(Entity::new()).await.unwrap();

    assert_eq!(created.id(), Some(11));
    let ids: Vec<_> = store.get_all().unwrap().iter().map(Entity::id).collect();
    assert_eq!(ids, vec![Some(10), Some(9), Some(2), Some(11)]);
}

#[tokio::test]
async fn test_corrupt_file_fails_open() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("car.json"), "{ definitely not json").unwrap();

    let store = EntityStore::open(config_for(temp_dir.path()), "car").await.unwrap();

    assert!(store.get_all().unwrap().is_empty());
    assert_eq!(store.create(Entity::new()).await.unwrap().id(), Some(0));
}

#[tokio::test]
async fn test_non_array_file_fails_open() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("car.json"), r#"{"id": 0}"#).unwrap();

    let store = EntityStore::open(config_for(temp_dir.path()), "car").await.unwrap();

    assert!(store.is_empty());
}

#[tokio::test]
async fn test_create_with_max_id_taken_fails_without_mutation() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("car.json"),
        format!(r#"[{{"id":{},"a":1}}]"#, u64::MAX),
    )
    .unwrap();
    let store = EntityStore::open(config_for(temp_dir.path()), "car").await.unwrap();
    let before = store.get_all().unwrap();

    let result = store.create(entity(json!({"b": 2}))).await;

    assert!(matches!(result, Err(StoreError::IdsExhausted)));
    assert_eq!(store.get_all().unwrap(), before);
    assert_eq!(read_file(&store), before);

    // The single MAX entity stays addressable
    store.delete(&Entity::new().with_id(u64::MAX)).await.unwrap();
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_duplicate_ids_in_file_are_loaded() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("car.json"),
        r#"[{"id":1,"v":"first"},{"id":1,"v":"second"},{"id":2}]"#,
    )
    .unwrap();

    let store = EntityStore::open(config_for(temp_dir.path()), "car").await.unwrap();

    assert_eq!(store.len(), 3);
    assert_eq!(store.get(1).unwrap().unwrap().get("v"), Some(&json!("first")));
    assert_eq!(store.create(Entity::new()).await.unwrap().id(), Some(3));
}

// =============================================================================
// Write Failure Tests
// =============================================================================

/// A directory at the staging path makes every write fail
fn block_writes(dir: &Path, name: &str) {
    fs::create_dir(dir.join(format!("{}.json.tmp", name))).unwrap();
}

#[tokio::test]
async fn test_awaited_write_failure_is_surfaced() {
    let (temp_dir, store) = setup_temp_store().await;
    block_writes(temp_dir.path(), "entity");

    let err = store.create(entity(json!({"a": "b"}))).await.unwrap_err();

    assert!(err.is_persistence());
    // Applied in memory, not on disk
    assert_eq!(store.len(), 1);
    assert_eq!(fs::read_to_string(store.file_path().unwrap()).unwrap(), "[]");
}

#[tokio::test]
async fn test_best_effort_write_failure_is_swallowed() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .storage_path(temp_dir.path())
        .durability(DurabilityMode::BestEffort)
        .build();
    let store = EntityStore::open(config, "entity").await.unwrap();
    block_writes(temp_dir.path(), "entity");

    let created = store.create(entity(json!({"a": "b"}))).await.unwrap();
    store.update(created.clone().with("a", "c")).await.unwrap();
    store.delete(&created).await.unwrap();

    assert!(store.is_empty());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_get_unique_ids() {
    let (_temp, store) = setup_temp_store().await;
    let store = Arc::new(store);

    let mut handles = Vec::new();
    for n in 0..50 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.create(Entity::new().with("n", n)).await.unwrap()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().id().unwrap());
    }
    ids.sort_unstable();

    assert_eq!(ids, (0..50).collect::<Vec<u64>>());
    // Last write reflects every create
    assert_eq!(read_file(&store), store.get_all().unwrap());
}
