//! Record operations on one object store inside a transaction.

use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    migrations::StoreDef,
    utils::{quote_ident, store_table},
    value::{inject_key, split_key, IndexKey, Key, Value},
    TransactionMode,
};
use crate::error::{DatabaseResultExt, Result, StoreError};

/// A record read back from a store.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: Key,
    /// JSON values carry their key under the store's key path
    pub value: Value,
}

/// Handle on one object store, valid for the duration of a transaction.
pub struct StoreHandle<'tx> {
    conn: &'tx Connection,
    def: &'tx StoreDef,
    mode: TransactionMode,
    table: String,
}

impl<'tx> StoreHandle<'tx> {
    pub(crate) fn new(conn: &'tx Connection, def: &'tx StoreDef, mode: TransactionMode) -> Self {
        Self {
            conn,
            def,
            mode,
            table: quote_ident(&store_table(&def.name)),
        }
    }

    /// Name of the store.
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Access mode of the enclosing transaction.
    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    /// Adds a new record and returns its key.
    ///
    /// A JSON value may carry an explicit key under the store's key path;
    /// otherwise the store must generate one. Adding a key that already
    /// exists, or a value that collides on a unique index, is a constraint
    /// error.
    pub fn add(&self, value: Value) -> Result<Key> {
        self.ensure_writable()?;
        let (key, value) = self.split(value)?;
        match key {
            Some(key) => {
                self.conn
                    .execute(
                        &format!("INSERT INTO {} (id, value) VALUES (?1, ?2)", self.table),
                        params![self.sql_key(key)?, value],
                    )
                    .db_context(&format!("Failed to add record to '{}'", self.def.name))?;
                Ok(key)
            }
            None if self.def.auto_increment => {
                self.conn
                    .execute(
                        &format!("INSERT INTO {} (value) VALUES (?1)", self.table),
                        params![value],
                    )
                    .db_context(&format!("Failed to add record to '{}'", self.def.name))?;
                let rowid = self.conn.last_insert_rowid();
                let key = Key::try_from(rowid).map_err(|_| {
                    StoreError::data(&self.def.name, format!("generated key {rowid} is negative"))
                })?;
                debug!("Added record {} to '{}'", key, self.def.name);
                Ok(key)
            }
            None => Err(StoreError::data(
                &self.def.name,
                "store has no key generator and the value carries no key",
            )),
        }
    }

    /// Writes the record under `key`, replacing any existing record.
    pub fn put(&self, key: Key, value: Value) -> Result<()> {
        self.ensure_writable()?;
        let (_, value) = self.split(value)?;
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {} (id, value) VALUES (?1, ?2) \
                     ON CONFLICT(id) DO UPDATE SET value = excluded.value",
                    self.table
                ),
                params![self.sql_key(key)?, value],
            )
            .db_context(&format!("Failed to put record {key} in '{}'", self.def.name))?;
        Ok(())
    }

    /// Reads the record stored under `key`.
    pub fn get(&self, key: Key) -> Result<Option<Record>> {
        let value = self
            .conn
            .query_row(
                &format!("SELECT value FROM {} WHERE id = ?1", self.table),
                params![self.sql_key(key)?],
                |row| row.get::<_, Value>(0),
            )
            .optional()
            .db_context(&format!("Failed to get record {key} from '{}'", self.def.name))?;
        Ok(value.map(|value| self.record(key, value)))
    }

    /// Deletes the record under `key`; returns whether one existed.
    pub fn delete(&self, key: Key) -> Result<bool> {
        self.ensure_writable()?;
        let deleted = self
            .conn
            .execute(
                &format!("DELETE FROM {} WHERE id = ?1", self.table),
                params![self.sql_key(key)?],
            )
            .db_context(&format!("Failed to delete record {key} from '{}'", self.def.name))?;
        Ok(deleted > 0)
    }

    /// Removes every record; returns how many were removed.
    ///
    /// The key generator is not reset, so keys are never reused.
    pub fn clear(&self) -> Result<usize> {
        self.ensure_writable()?;
        let removed = self
            .conn
            .execute(&format!("DELETE FROM {}", self.table), [])
            .db_context(&format!("Failed to clear '{}'", self.def.name))?;
        debug!("Cleared {} record(s) from '{}'", removed, self.def.name);
        Ok(removed)
    }

    /// Number of records in the store.
    pub fn count(&self) -> Result<u64> {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|count| count as u64)
            .db_context(&format!("Failed to count records in '{}'", self.def.name))
    }

    /// All records in ascending key order.
    pub fn get_all(&self) -> Result<Vec<Record>> {
        self.collect(
            &format!("SELECT id, value FROM {} ORDER BY id", self.table),
            &[],
        )
    }

    /// All records whose indexed property equals `key`, in index order
    /// (ascending primary key among equal index values).
    pub fn get_all_by_index(&self, index: &str, key: &IndexKey) -> Result<Vec<Record>> {
        let def = self.def.index(index).ok_or_else(|| {
            StoreError::data(&self.def.name, format!("index '{index}' does not exist"))
        })?;
        self.collect(
            &format!(
                "SELECT id, value FROM {} WHERE json_extract(value, '$.{}') = ?1 ORDER BY id",
                self.table, def.key_path
            ),
            &[key],
        )
    }

    fn collect(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Record>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .db_context(&format!("Failed to prepare query on '{}'", self.def.name))?;
        let rows = stmt
            .query_map(params, |row| {
                let id = row.get::<_, i64>(0)?;
                let key = Key::try_from(id)
                    .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, id))?;
                Ok((key, row.get::<_, Value>(1)?))
            })
            .db_context(&format!("Failed to query '{}'", self.def.name))?;

        let mut records = Vec::new();
        for row in rows {
            let (key, value) = row.db_context(&format!("Failed to read row from '{}'", self.def.name))?;
            records.push(self.record(key, value));
        }
        Ok(records)
    }

    fn record(&self, key: Key, value: Value) -> Record {
        let value = match value {
            Value::Json(mut json) => {
                inject_key(&mut json, &self.def.key_path, key);
                Value::Json(json)
            }
            blob => blob,
        };
        Record { key, value }
    }

    fn split(&self, value: Value) -> Result<(Option<Key>, Value)> {
        match value {
            Value::Json(mut json) => {
                let key = split_key(&mut json, &self.def.key_path)
                    .map_err(|reason| StoreError::data(&self.def.name, reason))?;
                Ok((key, Value::Json(json)))
            }
            blob => Ok((None, blob)),
        }
    }

    fn sql_key(&self, key: Key) -> Result<i64> {
        i64::try_from(key).map_err(|_| {
            StoreError::data(&self.def.name, format!("key {key} is beyond the storable range"))
        })
    }

    fn ensure_writable(&self) -> Result<()> {
        match self.mode {
            TransactionMode::ReadWrite => Ok(()),
            TransactionMode::ReadOnly => Err(StoreError::ReadOnly {
                store: self.def.name.clone(),
            }),
        }
    }
}
