use std::path::PathBuf;

use jiff::Timestamp;
use tapedeck_core::{LocalDb, LocalDbBuilder, NewTreeNode};
use tempfile::TempDir;

/// Helper function to create a test database
pub fn create_test_db() -> (TempDir, LocalDb) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = LocalDbBuilder::new()
        .with_database_path(Some(db_path(&temp_dir)))
        .build()
        .expect("Failed to create database");
    (temp_dir, db)
}

pub fn db_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("test.db")
}

/// A folder with a fixed, distinct creation time.
#[allow(dead_code)]
pub fn folder(name: &str, parent_key: u64, second: i64) -> NewTreeNode {
    NewTreeNode::folder(name, parent_key)
        .with_date(Timestamp::from_second(1_600_000_000 + second).expect("valid timestamp"))
}
