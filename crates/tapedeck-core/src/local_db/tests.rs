//! Tests for the LocalDb facade.

use std::{collections::HashSet, sync::Arc, time::Duration};

use jiff::Timestamp;
use tempfile::TempDir;

use super::*;
use crate::{
    db::{Upgrade, VersionChange},
    error::{OpenError, SchemaError},
    models::{NewTreeNode, RecordingInfo, TreeNode, DB_NO_KEY},
    schema::RecorderSchema,
};

/// Helper function to create a test database
fn create_test_db() -> (TempDir, LocalDb) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = LocalDbBuilder::new()
        .with_database_path(Some(temp_dir.path().join("test.db")))
        .build()
        .expect("Failed to create database");
    (temp_dir, db)
}

fn at(second: i64) -> Timestamp {
    Timestamp::from_second(1_700_000_000 + second).unwrap()
}

fn folder(name: &str, parent_key: u64, second: i64) -> NewTreeNode {
    NewTreeNode::folder(name, parent_key).with_date(at(second))
}

#[tokio::test]
async fn test_build_is_lazy() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("test.db");
    let db = LocalDbBuilder::new()
        .with_database_path(Some(&path))
        .build()
        .unwrap();

    assert!(path.parent().unwrap().is_dir());
    assert!(!path.exists());
    assert_eq!(db.state(), ConnectionState::Unopened);

    db.count_nodes().await.unwrap();
    assert!(path.exists());
    assert_eq!(db.state(), ConnectionState::Ready);
}

#[test]
fn test_build_rejects_bad_configuration() {
    let temp_dir = TempDir::new().unwrap();
    let builder = LocalDbBuilder::new().with_database_path(Some(temp_dir.path().join("t.db")));

    let zero = builder.clone().with_version(0).build();
    assert!(matches!(zero, Err(StoreError::Configuration { .. })));

    let unnamed = builder.with_name("  ").build();
    assert!(matches!(unnamed, Err(StoreError::Configuration { .. })));
}

#[tokio::test]
async fn test_open_creates_recorder_stores() {
    let (_temp_dir, db) = create_test_db();
    let connection = db.connection().await.unwrap();

    assert_eq!(connection.name(), "tapedeck-db");
    assert_eq!(connection.version(), 1);
    assert_eq!(
        connection.store_names(),
        vec!["blobTree".to_string(), "dataTable".to_string()]
    );

    let tree = connection.store("blobTree").unwrap();
    assert_eq!(tree.key_path, "id");
    assert!(tree.auto_increment);
    assert!(!tree.index("name").unwrap().unique);
    assert!(!tree.index("parentKey").unwrap().unique);
    assert!(tree.index("date").unwrap().unique);
    assert!(connection.store("dataTable").unwrap().indexes.is_empty());
}

#[tokio::test]
async fn test_concurrent_operations_share_one_open() {
    let (_temp_dir, db) = create_test_db();

    let (a, b, c) = tokio::join!(db.connection(), db.connection(), db.connection());
    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &c));

    let (x, y) = tokio::join!(db.count_nodes(), db.count_chunks());
    assert_eq!((x.unwrap(), y.unwrap()), (0, 0));
    assert_eq!(db.open_count(), 1);
}

#[tokio::test]
async fn test_ids_strictly_increase() {
    let (_temp_dir, db) = create_test_db();

    let mut last = 0;
    for i in 0..5 {
        let id = db.add_node(&folder(&format!("F{i}"), DB_NO_KEY, i)).await.unwrap();
        assert!(id > last);
        last = id;
    }
    assert_eq!(db.count_nodes().await.unwrap(), 5);
}

#[tokio::test]
async fn test_duplicate_date_rejected() {
    let (_temp_dir, db) = create_test_db();

    db.add_node(&folder("First", DB_NO_KEY, 1)).await.unwrap();
    let err = db.add_node(&folder("Second", DB_NO_KEY, 1)).await.unwrap_err();

    assert!(err.is_constraint());
    let nodes = db.all_nodes().await.unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].name, "First");
}

#[tokio::test]
async fn test_get_update_remove_node() {
    let (_temp_dir, db) = create_test_db();
    let id = db.add_node(&folder("Folder A", DB_NO_KEY, 1)).await.unwrap();

    let mut node = db.get_node(id).await.unwrap().unwrap();
    assert_eq!(node.id, id);
    assert_eq!(node.name, "Folder A");
    assert!(node.is_top_level());

    node.name = "Folder B".to_string();
    db.update_node(&node).await.unwrap();
    assert_eq!(db.get_node(id).await.unwrap(), Some(node));

    assert!(db.remove_node(id).await.unwrap());
    assert!(!db.remove_node(id).await.unwrap());
    assert!(db.get_node(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_inserts_missing_node() {
    let (_temp_dir, db) = create_test_db();
    let node = folder("Restored", DB_NO_KEY, 1).into_node(40);

    db.update_node(&node).await.unwrap();
    assert_eq!(db.get_node(40).await.unwrap(), Some(node));
}

#[tokio::test]
async fn test_update_date_collision_rejected() {
    let (_temp_dir, db) = create_test_db();
    db.add_node(&folder("A", DB_NO_KEY, 1)).await.unwrap();
    let b = db.add_node(&folder("B", DB_NO_KEY, 2)).await.unwrap();

    let mut node = db.get_node(b).await.unwrap().unwrap();
    node.date = at(1);
    assert!(db.update_node(&node).await.unwrap_err().is_constraint());
    assert_eq!(db.get_node(b).await.unwrap().unwrap().date, at(2));
}

#[tokio::test]
async fn test_remove_does_not_cascade() {
    let (_temp_dir, db) = create_test_db();
    let parent = db.add_node(&folder("Parent", DB_NO_KEY, 1)).await.unwrap();
    let child = db.add_node(&folder("Child", parent, 2)).await.unwrap();
    assert_eq!((parent, child), (1, 2));

    assert!(db.remove_node(parent).await.unwrap());

    assert_eq!(db.get_node(parent).await.unwrap(), None);
    let kept = db.get_node(child).await.unwrap().expect("child should survive");
    assert_eq!(kept.name, "Child");
    assert_eq!(kept.parent_key, parent);

    let orphans = db.query_by_parent(parent).await.unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].id, child);
}

#[tokio::test]
async fn test_query_by_parent_tracks_mutations() {
    let (_temp_dir, db) = create_test_db();
    let a = db.add_node(&folder("A", DB_NO_KEY, 1)).await.unwrap();
    let b = db.add_node(&folder("B", DB_NO_KEY, 2)).await.unwrap();
    let mut children = Vec::new();
    for i in 0..4 {
        children.push(db.add_node(&folder(&format!("C{i}"), a, 10 + i)).await.unwrap());
    }

    // Move one child to B and remove another.
    let mut moved = db.get_node(children[1]).await.unwrap().unwrap();
    moved.parent_key = b;
    db.update_node(&moved).await.unwrap();
    db.remove_node(children[2]).await.unwrap();

    let all = db.all_nodes().await.unwrap();
    for parent in [DB_NO_KEY, a, b] {
        let expected: Vec<TreeNode> = all
            .iter()
            .filter(|n| n.parent_key == parent)
            .cloned()
            .collect();
        assert_eq!(db.query_by_parent(parent).await.unwrap(), expected);
    }

    let ids: Vec<u64> = db.query_by_parent(a).await.unwrap().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![children[0], children[3]]);
}

#[tokio::test]
async fn test_query_by_name_and_date() {
    let (_temp_dir, db) = create_test_db();
    let first = db.add_node(&folder("Take", DB_NO_KEY, 1)).await.unwrap();
    db.add_node(&folder("Other", DB_NO_KEY, 2)).await.unwrap();
    let second = db.add_node(&folder("Take", DB_NO_KEY, 3)).await.unwrap();

    let named: Vec<u64> = db.query_by_name("Take").await.unwrap().iter().map(|n| n.id).collect();
    assert_eq!(named, vec![first, second]);
    assert!(db.query_by_name("take").await.unwrap().is_empty());

    let dated = db.query_by_date(at(3)).await.unwrap();
    assert_eq!(dated.len(), 1);
    assert_eq!(dated[0].id, second);
    assert!(db.query_by_date(at(4)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_query_by_date_with_subsecond_precision() {
    let (_temp_dir, db) = create_test_db();
    let date = Timestamp::new(1_700_000_000, 123_456_789).unwrap();
    let id = db
        .add_node(&NewTreeNode::folder("Precise", DB_NO_KEY).with_date(date))
        .await
        .unwrap();

    let found = db.query_by_date(date).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, id);
}

#[tokio::test]
async fn test_chunk_round_trip_is_bit_identical() {
    let (_temp_dir, db) = create_test_db();
    let bytes: Vec<u8> = (0..=255).cycle().take(65536).collect();

    let id = db.append_chunk(bytes.clone()).await.unwrap();
    assert_eq!(db.read_chunk(id).await.unwrap(), Some(bytes));
    assert_eq!(db.read_chunk(id + 1).await.unwrap(), None);

    let empty = db.append_chunk(Vec::new()).await.unwrap();
    assert_eq!(db.read_chunk(empty).await.unwrap(), Some(Vec::new()));
}

#[tokio::test]
async fn test_read_run_in_key_order() {
    let (_temp_dir, db) = create_test_db();
    let mut keys = Vec::new();
    for i in 0..4u8 {
        keys.push(db.append_chunk(vec![i; 8]).await.unwrap());
    }

    let run = db.read_run(keys[0], 4).await.unwrap();
    assert_eq!(run, (0..4u8).map(|i| vec![i; 8]).collect::<Vec<_>>());

    let tail = db.read_run(keys[2], 2).await.unwrap();
    assert_eq!(tail, vec![vec![2; 8], vec![3; 8]]);

    assert!(db.read_run(keys[0], 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_read_run_missing_chunk() {
    let (_temp_dir, db) = create_test_db();
    let first = db.append_chunk(vec![1]).await.unwrap();
    db.append_chunk(vec![2]).await.unwrap();

    let err = db.read_run(first, 3).await.unwrap_err();
    assert!(matches!(err, StoreError::MissingChunk { id } if id == first + 2));
}

#[tokio::test]
async fn test_read_run_huge_count_on_empty_store() {
    let (_temp_dir, db) = create_test_db();

    let err = db.read_run(1, u64::MAX).await.unwrap_err();
    assert!(matches!(err, StoreError::MissingChunk { id: 1 }));
}

#[tokio::test]
async fn test_chunk_run_is_lazy() {
    let (_temp_dir, db) = create_test_db();
    let first = db.append_chunk(vec![1]).await.unwrap();
    db.append_chunk(vec![2]).await.unwrap();

    let mut run = db.chunk_run(first, 2);
    assert_eq!(run.remaining(), 2);
    assert_eq!(run.next_chunk().await.unwrap().unwrap(), vec![1]);

    // Chunks appended or removed after the run starts are seen by later reads.
    db.delete_chunks(first + 1, 1).await.unwrap();
    assert!(matches!(
        run.next_chunk().await,
        Some(Err(StoreError::MissingChunk { .. }))
    ));
    assert!(run.next_chunk().await.is_none());
}

#[tokio::test]
async fn test_clear_all_empties_both_stores() {
    let (_temp_dir, db) = create_test_db();
    db.add_node(&folder("A", DB_NO_KEY, 1)).await.unwrap();
    db.append_chunk(vec![1, 2, 3]).await.unwrap();

    assert_eq!(db.clear_all().await.unwrap(), 2);
    assert_eq!(db.count_nodes().await.unwrap(), 0);
    assert_eq!(db.count_chunks().await.unwrap(), 0);
}

fn data_only(change: &VersionChange<'_>) -> std::result::Result<(), SchemaError> {
    change.create_object_store("dataTable", "id", true).map(|_| ())
}

#[tokio::test]
async fn test_clear_all_reports_partial_progress() {
    let temp_dir = TempDir::new().unwrap();
    // Without a tree store the data store clears and the tree store is
    // unknown.
    let db = LocalDbBuilder::new()
        .with_database_path(Some(temp_dir.path().join("test.db")))
        .with_schema(Arc::new(data_only))
        .build()
        .unwrap();

    match db.clear_all().await {
        Err(StoreError::PartialClear { cleared, source }) => {
            assert_eq!(cleared, 1);
            assert!(matches!(*source, StoreError::UnknownStore { .. }));
        }
        other => panic!("expected partial clear, got {other:?}"),
    }
}

#[tokio::test]
async fn test_keys_not_reused_after_clear() {
    let (_temp_dir, db) = create_test_db();
    let first = db.append_chunk(vec![1]).await.unwrap();
    db.clear_data().await.unwrap();
    let second = db.append_chunk(vec![2]).await.unwrap();
    assert!(second > first);

    let node = db.add_node(&folder("A", DB_NO_KEY, 1)).await.unwrap();
    db.clear_tree().await.unwrap();
    assert!(db.add_node(&folder("B", DB_NO_KEY, 2)).await.unwrap() > node);
}

#[tokio::test]
async fn test_delete_database_resets() {
    let (_temp_dir, db) = create_test_db();
    db.add_node(&folder("A", DB_NO_KEY, 1)).await.unwrap();
    db.append_chunk(vec![1]).await.unwrap();
    assert!(db.path().exists());

    db.delete_database().await.unwrap();
    assert!(!db.path().exists());
    assert_eq!(db.state(), ConnectionState::Unopened);

    // The next operation creates and migrates a fresh database.
    assert_eq!(db.count_nodes().await.unwrap(), 0);
    assert_eq!(db.count_chunks().await.unwrap(), 0);
    assert_eq!(db.open_count(), 2);

    // Deleting twice is not an error.
    db.delete_database().await.unwrap();
    db.delete_database().await.unwrap();
}

#[tokio::test]
async fn test_delete_database_by_path() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.db");
    delete_database(&missing).await.unwrap();
}

#[tokio::test]
async fn test_migration_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.db");

    let v1 = LocalDbBuilder::new()
        .with_database_path(Some(&path))
        .build()
        .unwrap();
    let id = v1.add_node(&folder("Kept", DB_NO_KEY, 1)).await.unwrap();
    let chunk = v1.append_chunk(vec![7; 4]).await.unwrap();
    v1.close();

    // Reopening at a higher version re-runs the upgrade over existing stores.
    let v2 = LocalDbBuilder::new()
        .with_database_path(Some(&path))
        .with_version(2)
        .build()
        .unwrap();
    assert_eq!(v2.connection().await.unwrap().version(), 2);
    assert_eq!(v2.get_node(id).await.unwrap().unwrap().name, "Kept");
    assert_eq!(v2.read_chunk(chunk).await.unwrap(), Some(vec![7; 4]));
}

#[tokio::test]
async fn test_version_downgrade_refused() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.db");

    let v2 = LocalDbBuilder::new()
        .with_database_path(Some(&path))
        .with_version(2)
        .build()
        .unwrap();
    v2.count_nodes().await.unwrap();
    v2.close();

    let v1 = LocalDbBuilder::new()
        .with_database_path(Some(&path))
        .build()
        .unwrap();
    let err = v1.count_nodes().await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Connection(OpenError::Version {
            requested: 1,
            found: 2,
            ..
        })
    ));
}

#[tokio::test]
async fn test_schema_failure_surfaces_as_connection_error() {
    let temp_dir = TempDir::new().unwrap();
    struct Broken;
    impl Upgrade for Broken {
        fn upgrade(&self, change: &VersionChange<'_>) -> std::result::Result<(), SchemaError> {
            RecorderSchema.upgrade(change)?;
            change.create_object_store("bad name", "id", true).map(|_| ())
        }
    }
    let db = LocalDbBuilder::new()
        .with_database_path(Some(temp_dir.path().join("test.db")))
        .with_schema(Arc::new(Broken))
        .build()
        .unwrap();

    let err = db.add_node(&folder("A", DB_NO_KEY, 1)).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Connection(OpenError::Schema(SchemaError::InvalidName { .. }))
    ));
    assert!(err.to_string().starts_with("Could not get connection"));
    assert_eq!(db.state(), ConnectionState::Unopened);
}

#[tokio::test]
async fn test_blocked_open() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.db");
    let holder = rusqlite::Connection::open(&path).unwrap();
    holder.execute_batch("BEGIN IMMEDIATE;").unwrap();

    let db = LocalDbBuilder::new()
        .with_database_path(Some(&path))
        .with_busy_timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let err = db.count_nodes().await.unwrap_err();
    assert!(err.is_blocked());

    holder.execute_batch("ROLLBACK;").unwrap();
    assert_eq!(db.count_nodes().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_store() {
    let (_temp_dir, db) = create_test_db();
    let err = db
        .with_store("missing", TransactionMode::ReadOnly, |store| store.count())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownStore { .. }));
}

#[tokio::test]
async fn test_read_only_store_rejects_writes() {
    let (_temp_dir, db) = create_test_db();
    let err = db
        .data_store(TransactionMode::ReadOnly, |store| store.add(vec![1u8].into()))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ReadOnly { .. }));
    assert_eq!(db.count_chunks().await.unwrap(), 0);
}

#[tokio::test]
async fn test_folder_and_song_scenario() {
    let (_temp_dir, db) = create_test_db();

    let folder_id = db.add_node(&folder("Folder A", DB_NO_KEY, 1)).await.unwrap();

    let chunk_length = 4;
    let samples: Vec<i16> = (1..=10).collect();
    let mut keys = Vec::new();
    for chunk in samples.chunks(chunk_length) {
        keys.push(
            db.append_chunk(crate::models::samples_to_bytes(chunk))
                .await
                .unwrap(),
        );
    }
    let info = RecordingInfo {
        db_start_key: keys[0],
        n_samples: samples.len() as u64,
        sample_rate: 8000,
        chunk_length: chunk_length as u32,
    };
    assert_eq!(info.chunk_count(), 3);

    let song = NewTreeNode::recording("Song 1", folder_id, info).with_date(at(2));
    let song_id = db.add_node(&song).await.unwrap();

    let children = db.query_by_parent(folder_id).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, song_id);
    assert_eq!(children[0].name, "Song 1");

    let stored = children[0].recording.unwrap();
    let run = db.read_run(stored.db_start_key, stored.chunk_count()).await.unwrap();
    assert_eq!(run.len(), 3);
    assert_eq!(db.recording_samples(&stored).await.unwrap(), samples);

    let ids: HashSet<u64> = db.all_nodes().await.unwrap().iter().map(|n| n.id).collect();
    assert_eq!(ids, HashSet::from([folder_id, song_id]));

    db.clear_all().await.unwrap();
    assert!(db.query_by_parent(folder_id).await.unwrap().is_empty());
    assert!(db.read_chunk(keys[0]).await.unwrap().is_none());
}

#[tokio::test]
async fn test_query_by_parent_rejects_unstorable_key() {
    let (_temp_dir, db) = create_test_db();

    let err = db.query_by_parent(u64::MAX).await.unwrap_err();
    assert!(matches!(err, StoreError::Data { .. }));
}
