//! Version-change transactions and the object-store catalog.
//!
//! Schema objects are only created while a database is being upgraded. The
//! upgrade callback receives a [`VersionChange`] and uses it to create
//! stores and indexes; every store and index is recorded in two catalog
//! tables so later connections know each store's key path and indexes
//! without inspecting SQLite internals.

use std::collections::HashMap;

use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use super::utils::{index_name, quote_ident, store_table, validate_name};
use crate::error::SchemaError;

const CREATE_CATALOG_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS __object_stores (
        name TEXT PRIMARY KEY,
        key_path TEXT NOT NULL,
        auto_increment INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS __object_indexes (
        store TEXT NOT NULL,
        name TEXT NOT NULL,
        key_path TEXT NOT NULL,
        is_unique INTEGER NOT NULL,
        PRIMARY KEY (store, name)
    );
"#;
const SELECT_STORES_SQL: &str = "SELECT name, key_path, auto_increment FROM __object_stores";
const SELECT_INDEXES_SQL: &str = "SELECT store, name, key_path, is_unique FROM __object_indexes";
const STORE_EXISTS_SQL: &str = "SELECT 1 FROM __object_stores WHERE name = ?1";
const INDEX_EXISTS_SQL: &str = "SELECT 1 FROM __object_indexes WHERE store = ?1 AND name = ?2";
const INSERT_STORE_SQL: &str =
    "INSERT INTO __object_stores (name, key_path, auto_increment) VALUES (?1, ?2, ?3)";
const INSERT_INDEX_SQL: &str =
    "INSERT INTO __object_indexes (store, name, key_path, is_unique) VALUES (?1, ?2, ?3, ?4)";
const CATALOG_EXISTS_SQL: &str =
    "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '__object_stores'";

/// Schema callback run when a database is opened at a higher version than
/// the one on disk.
pub trait Upgrade: Send + Sync {
    /// Create or alter schema objects for the move from
    /// `change.old_version()` to `change.new_version()`.
    fn upgrade(&self, change: &VersionChange<'_>) -> Result<(), SchemaError>;
}

impl<F> Upgrade for F
where
    F: Fn(&VersionChange<'_>) -> Result<(), SchemaError> + Send + Sync,
{
    fn upgrade(&self, change: &VersionChange<'_>) -> Result<(), SchemaError> {
        self(change)
    }
}

/// Definition of a secondary index on an object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: String,
    pub key_path: String,
    pub unique: bool,
}

/// Definition of an object store as recorded in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreDef {
    pub name: String,
    /// Property of JSON values that carries the primary key
    pub key_path: String,
    pub auto_increment: bool,
    pub indexes: Vec<IndexDef>,
}

impl StoreDef {
    /// Looks up an index by name.
    pub fn index(&self, name: &str) -> Option<&IndexDef> {
        self.indexes.iter().find(|index| index.name == name)
    }
}

/// Handle on the exclusive transaction that upgrades a database.
pub struct VersionChange<'a> {
    conn: &'a Connection,
    old_version: u32,
    new_version: u32,
}

impl<'a> VersionChange<'a> {
    pub(crate) fn new(conn: &'a Connection, old_version: u32, new_version: u32) -> Self {
        Self {
            conn,
            old_version,
            new_version,
        }
    }

    /// Version found on disk; 0 for a database that did not exist.
    pub fn old_version(&self) -> u32 {
        self.old_version
    }

    /// Version being upgraded to.
    pub fn new_version(&self) -> u32 {
        self.new_version
    }

    /// Whether the named store is already present.
    pub fn has_object_store(&self, name: &str) -> Result<bool, SchemaError> {
        self.conn
            .query_row(STORE_EXISTS_SQL, [name], |_| Ok(()))
            .optional()
            .map(|found| found.is_some())
            .map_err(|e| SchemaError::engine("Failed to query store catalog", &e))
    }

    /// Creates an object store whose primary key is stored under `key_path`.
    ///
    /// Returns [`SchemaError::AlreadyExists`] when the catalog already holds
    /// a store with this name.
    pub fn create_object_store(
        &self,
        name: &str,
        key_path: &str,
        auto_increment: bool,
    ) -> Result<ObjectStoreBuilder<'a>, SchemaError> {
        validate_name(name)?;
        validate_name(key_path)?;
        if self.has_object_store(name)? {
            return Err(SchemaError::AlreadyExists {
                store: name.to_string(),
            });
        }

        let key_column = if auto_increment {
            "id INTEGER PRIMARY KEY AUTOINCREMENT"
        } else {
            "id INTEGER PRIMARY KEY"
        };
        let sql = format!(
            "CREATE TABLE {} ({key_column}, value NOT NULL)",
            quote_ident(&store_table(name))
        );
        self.conn
            .execute_batch(&sql)
            .map_err(|e| SchemaError::engine("Failed to create object store", &e))?;
        self.conn
            .execute(INSERT_STORE_SQL, params![name, key_path, auto_increment])
            .map_err(|e| SchemaError::engine("Failed to record object store", &e))?;

        debug!("Created object store '{}' keyed by '{}'", name, key_path);
        Ok(ObjectStoreBuilder {
            conn: self.conn,
            store: name.to_string(),
        })
    }
}

/// Adds indexes to a store created in the current version change.
pub struct ObjectStoreBuilder<'a> {
    conn: &'a Connection,
    store: String,
}

impl ObjectStoreBuilder<'_> {
    /// Name of the store being built.
    pub fn name(&self) -> &str {
        &self.store
    }

    /// Creates an index over the `key_path` property of the store's values.
    ///
    /// A unique index rejects any write that would give two records the same
    /// indexed value. Records without the property are not indexed.
    pub fn create_index(
        &self,
        name: &str,
        key_path: &str,
        unique: bool,
    ) -> Result<&Self, SchemaError> {
        validate_name(name)?;
        validate_name(key_path)?;
        let exists = self
            .conn
            .query_row(INDEX_EXISTS_SQL, params![self.store, name], |_| Ok(()))
            .optional()
            .map_err(|e| SchemaError::engine("Failed to query index catalog", &e))?
            .is_some();
        if exists {
            return Err(SchemaError::IndexAlreadyExists {
                store: self.store.clone(),
                index: name.to_string(),
            });
        }

        let sql = format!(
            "CREATE {}INDEX {} ON {} (json_extract(value, '$.{key_path}'))",
            if unique { "UNIQUE " } else { "" },
            quote_ident(&index_name(&self.store, name)),
            quote_ident(&store_table(&self.store)),
        );
        self.conn
            .execute_batch(&sql)
            .map_err(|e| SchemaError::engine("Failed to create index", &e))?;
        self.conn
            .execute(INSERT_INDEX_SQL, params![self.store, name, key_path, unique])
            .map_err(|e| SchemaError::engine("Failed to record index", &e))?;

        debug!(
            "Created {}index '{}' on '{}'",
            if unique { "unique " } else { "" },
            name,
            self.store
        );
        Ok(self)
    }
}

/// Reads the schema version stored in the database header.
pub(crate) fn user_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

pub(crate) fn set_user_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.pragma_update(None, "user_version", version)
}

pub(crate) fn ensure_catalog(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_CATALOG_SQL)
}

/// Loads every store definition with its indexes.
pub(crate) fn load_catalog(conn: &Connection) -> rusqlite::Result<HashMap<String, StoreDef>> {
    let mut stores = HashMap::new();
    let has_catalog = conn
        .query_row(CATALOG_EXISTS_SQL, [], |_| Ok(()))
        .optional()?
        .is_some();
    if !has_catalog {
        return Ok(stores);
    }

    let mut stmt = conn.prepare(SELECT_STORES_SQL)?;
    let rows = stmt.query_map([], |row| {
        Ok(StoreDef {
            name: row.get(0)?,
            key_path: row.get(1)?,
            auto_increment: row.get(2)?,
            indexes: Vec::new(),
        })
    })?;
    for def in rows {
        let def = def?;
        stores.insert(def.name.clone(), def);
    }

    let mut stmt = conn.prepare(SELECT_INDEXES_SQL)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            IndexDef {
                name: row.get(1)?,
                key_path: row.get(2)?,
                unique: row.get(3)?,
            },
        ))
    })?;
    for row in rows {
        let (store, index) = row?;
        if let Some(def) = stores.get_mut(&store) {
            def.indexes.push(index);
        }
    }

    Ok(stores)
}
