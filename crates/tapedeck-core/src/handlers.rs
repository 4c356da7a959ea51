//! Handler functions for the recorder's user-facing workflows.
//!
//! Each handler takes a [`LocalDb`] and a parameter struct from
//! [`crate::params`], runs a complete workflow and returns a domain object or
//! a display wrapper the interface can print.
//!
//! ```rust,no_run
//! # use tapedeck_core::{handlers::handle_list_children, params::ListChildren, LocalDbBuilder};
//! # async {
//! let db = LocalDbBuilder::new().build()?;
//! let nodes = handle_list_children(&db, &ListChildren::default()).await?;
//! println!("{nodes}");
//! # Result::<(), tapedeck_core::StoreError>::Ok(())
//! # };
//! ```

use std::io::Write;

use crate::{
    db::TransactionMode,
    display::{DatabaseStatus, DeleteResult, Nodes, UpdateResult},
    error::{Result, StoreError},
    models::{bytes_to_samples, NewTreeNode, TreeNode},
    operations::{add_node_with_free_date, add_recording_node, move_node, remove_subtree, rename_node},
    params::{AddFolder, FindNodes, Id, ImportRecording, ListChildren, MoveNode, RemoveNode, RenameNode},
    schema::DB_TREE_STORE_NAME,
    LocalDb,
};

/// Handle adding a folder; returns the stored folder.
pub async fn handle_add_folder(db: &LocalDb, params: &AddFolder) -> Result<TreeNode> {
    add_node_with_free_date(db, NewTreeNode::folder(&params.name, params.parent_key)).await
}

/// Handle showing a single node.
pub async fn handle_show_node(db: &LocalDb, params: &Id) -> Result<Option<TreeNode>> {
    db.get_node(params.id).await
}

/// Handle listing the direct children of a folder.
pub async fn handle_list_children(db: &LocalDb, params: &ListChildren) -> Result<Nodes> {
    Ok(Nodes(db.query_by_parent(params.parent_key).await?))
}

/// Handle finding nodes by name and/or creation time.
///
/// When both are given, a node must match both.
pub async fn handle_find_nodes(db: &LocalDb, params: &FindNodes) -> Result<Nodes> {
    let nodes = match (&params.name, params.date) {
        (Some(name), Some(date)) => db
            .query_by_date(date)
            .await?
            .into_iter()
            .filter(|node| &node.name == name)
            .collect(),
        (Some(name), None) => db.query_by_name(name).await?,
        (None, Some(date)) => db.query_by_date(date).await?,
        (None, None) => db.all_nodes().await?,
    };
    Ok(Nodes(nodes))
}

/// Handle renaming a node.
pub async fn handle_rename_node(db: &LocalDb, params: &RenameNode) -> Result<UpdateResult<TreeNode>> {
    let node = rename_node(db, params.id, &params.name).await?;
    let change = format!("Renamed to '{}'", params.name);
    Ok(UpdateResult::with_changes(node, vec![change]))
}

/// Handle moving a node to another folder.
pub async fn handle_move_node(db: &LocalDb, params: &MoveNode) -> Result<UpdateResult<TreeNode>> {
    let node = move_node(db, params.id, params.parent_key).await?;
    let change = format!("Moved under {}", params.parent_key);
    Ok(UpdateResult::with_changes(node, vec![change]))
}

/// Handle removing a node, optionally with its whole subtree.
///
/// Returns `None` if the node does not exist.
pub async fn handle_remove_node(
    db: &LocalDb,
    params: &RemoveNode,
) -> Result<Option<DeleteResult<TreeNode>>> {
    let Some(node) = db.get_node(params.id).await? else {
        return Ok(None);
    };
    let removed = if params.recursive {
        remove_subtree(db, params.id).await?
    } else {
        usize::from(db.remove_node(params.id).await?)
    };
    Ok(Some(DeleteResult::new(node, removed)))
}

/// Handle importing raw PCM bytes as a new recording item.
pub async fn handle_import_recording(
    db: &LocalDb,
    params: &ImportRecording,
    pcm: &[u8],
) -> Result<TreeNode> {
    if params.sample_rate == 0 {
        return Err(StoreError::Configuration {
            message: "Sample rate must be greater than zero".to_string(),
        });
    }
    let samples = bytes_to_samples(pcm);
    add_recording_node(db, &params.name, params.parent_key, params.sample_rate, &samples).await
}

/// Handle exporting a recording item's raw PCM to `writer`; returns the
/// number of bytes written.
pub async fn handle_export_recording<W: Write + ?Sized>(
    db: &LocalDb,
    params: &Id,
    writer: &mut W,
) -> Result<u64> {
    let recording = db
        .get_node(params.id)
        .await?
        .and_then(|node| node.recording)
        .ok_or_else(|| {
            StoreError::data(
                DB_TREE_STORE_NAME,
                format!("node {} is not a recording", params.id),
            )
        })?;
    db.export_raw(&recording, writer).await
}

/// Handle summarizing the database: connection details and record counts.
pub async fn handle_status(db: &LocalDb) -> Result<DatabaseStatus> {
    let connection = db.connection().await?;
    let mut stores = Vec::new();
    for store in connection.store_names() {
        let count = db
            .with_store(&store, TransactionMode::ReadOnly, |handle| {
                handle.count()
            })
            .await?;
        stores.push((store, count));
    }
    Ok(DatabaseStatus {
        name: connection.name().to_string(),
        version: connection.version(),
        path: connection.path().to_path_buf(),
        state: db.state(),
        stores,
    })
}
