//! The recorder's database schema.
//!
//! Two stores live in the recorder database: the tree store holding folders
//! and items, and the data store holding raw sample chunks. Both are keyed by
//! an auto-incrementing `id`.

use log::warn;

use crate::{
    db::{Upgrade, VersionChange},
    error::SchemaError,
};

/// Name of the recorder database.
pub const DB_NAME: &str = "tapedeck-db";
/// Current schema version of the recorder database.
pub const DB_VERSION: u32 = 1;
/// Store holding folders and items.
pub const DB_TREE_STORE_NAME: &str = "blobTree";
/// Store holding sample chunks.
pub const DB_DATA_STORE_NAME: &str = "dataTable";
/// Property carrying the primary key of tree nodes.
pub const DB_KEY_PATH: &str = "id";

/// Creates the tree and data stores on first open.
///
/// Stores that already exist are left untouched, so the upgrade can be run
/// against a database that has them.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecorderSchema;

impl Upgrade for RecorderSchema {
    fn upgrade(&self, change: &VersionChange<'_>) -> Result<(), SchemaError> {
        match change.create_object_store(DB_TREE_STORE_NAME, DB_KEY_PATH, true) {
            Ok(tree) => {
                tree.create_index("name", "name", false)?
                    .create_index("parentKey", "parentKey", false)?
                    .create_index("date", "date", true)?;
            }
            Err(e) if e.is_already_exists() => skip_existing(&e),
            Err(e) => return Err(e),
        }

        match change.create_object_store(DB_DATA_STORE_NAME, DB_KEY_PATH, true) {
            Ok(_) => {}
            Err(e) if e.is_already_exists() => skip_existing(&e),
            Err(e) => return Err(e),
        }

        Ok(())
    }
}

fn skip_existing(error: &SchemaError) {
    warn!("Skipping schema step: {error}");
}
