//! Tree store operations for LocalDb.

use jiff::Timestamp;

use super::LocalDb;
use crate::{
    db::{IndexKey, Record, TransactionMode, Value},
    error::{Result, StoreError},
    models::{NewTreeNode, TreeNode},
    schema::DB_TREE_STORE_NAME,
};

impl LocalDb {
    /// Adds a folder or item and returns its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Constraint` if another node already has the same
    /// `date`; the store is left unchanged.
    pub async fn add_node(&self, node: &NewTreeNode) -> Result<u64> {
        let value = Value::json(node)?;
        self.tree_store(TransactionMode::ReadWrite, move |store| store.add(value))
            .await
    }

    /// Retrieves a node by its ID.
    pub async fn get_node(&self, id: u64) -> Result<Option<TreeNode>> {
        let record = self
            .tree_store(TransactionMode::ReadOnly, move |store| store.get(id))
            .await?;
        record.map(decode_node).transpose()
    }

    /// Writes `node` under its ID, replacing any stored node with that ID.
    pub async fn update_node(&self, node: &TreeNode) -> Result<()> {
        let id = node.id;
        let value = Value::json(node)?;
        self.tree_store(TransactionMode::ReadWrite, move |store| store.put(id, value))
            .await
    }

    /// Deletes a node by its ID; returns whether it existed.
    ///
    /// Children and recordings are left in place.
    pub async fn remove_node(&self, id: u64) -> Result<bool> {
        self.tree_store(TransactionMode::ReadWrite, move |store| store.delete(id))
            .await
    }

    /// Direct children of `parent_key`, in ascending ID order.
    pub async fn query_by_parent(&self, parent_key: u64) -> Result<Vec<TreeNode>> {
        let key = IndexKey::try_from(parent_key).map_err(|_| {
            StoreError::data(
                DB_TREE_STORE_NAME,
                format!("parent key {parent_key} is beyond the storable range"),
            )
        })?;
        self.query_index("parentKey", key).await
    }

    /// Nodes named exactly `name`, in ascending ID order.
    pub async fn query_by_name(&self, name: &str) -> Result<Vec<TreeNode>> {
        self.query_index("name", IndexKey::from(name)).await
    }

    /// Nodes created at exactly `date`. At most one node can match.
    pub async fn query_by_date(&self, date: Timestamp) -> Result<Vec<TreeNode>> {
        self.query_index("date", date_key(date)?).await
    }

    /// Removes every node; returns how many were removed.
    pub async fn clear_tree(&self) -> Result<usize> {
        self.tree_store(TransactionMode::ReadWrite, |store| store.clear())
            .await
    }

    /// All nodes in ascending ID order.
    pub async fn all_nodes(&self) -> Result<Vec<TreeNode>> {
        let records = self
            .tree_store(TransactionMode::ReadOnly, |store| store.get_all())
            .await?;
        records.into_iter().map(decode_node).collect()
    }

    /// Number of nodes in the tree store.
    pub async fn count_nodes(&self) -> Result<u64> {
        self.tree_store(TransactionMode::ReadOnly, |store| store.count())
            .await
    }

    async fn query_index(&self, index: &'static str, key: IndexKey) -> Result<Vec<TreeNode>> {
        let records = self
            .tree_store(TransactionMode::ReadOnly, move |store| {
                store.get_all_by_index(index, &key)
            })
            .await?;
        records.into_iter().map(decode_node).collect()
    }
}

fn decode_node(record: Record) -> Result<TreeNode> {
    let json = record.value.into_json().ok_or_else(|| {
        StoreError::data(
            DB_TREE_STORE_NAME,
            format!("record {} is not a tree node", record.key),
        )
    })?;
    Ok(serde_json::from_value(json)?)
}

/// Index key for `date`, in the same textual form the node is stored with.
fn date_key(date: Timestamp) -> Result<IndexKey> {
    match serde_json::to_value(date)? {
        serde_json::Value::String(text) => Ok(IndexKey::Text(text)),
        other => Err(StoreError::data(
            DB_TREE_STORE_NAME,
            format!("timestamp serialized as {other}"),
        )),
    }
}
