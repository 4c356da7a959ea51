//! Common workflows built on the storage primitives.
//!
//! The storage layer never cascades: removing a folder leaves its children
//! and their chunks in place. The operations here compose the primitives
//! into the multi-step workflows the recorder needs, each step in its own
//! transaction.

use std::collections::HashSet;

use jiff::{SignedDuration, Timestamp};
use log::{debug, info, warn};

use crate::{
    error::{Result, StoreError},
    models::{NewTreeNode, RecordingInfo, TreeNode, DB_NO_KEY},
    recording::RecordingWriter,
    schema::DB_TREE_STORE_NAME,
    LocalDb,
};

/// Attempts made to find a free creation date before giving up.
const MAX_DATE_ATTEMPTS: u32 = 16;

/// Store `samples` as a new recording and add a leaf item for it.
///
/// The chunks are written first; the item is added only once every chunk
/// is stored. If the item cannot be added, the chunks are deleted again.
///
/// # Arguments
///
/// * `db` - Database to write to
/// * `name` - Name of the new item
/// * `parent_key` - Folder to add the item to, or [`DB_NO_KEY`]
/// * `sample_rate` - Samples per second
/// * `samples` - 16-bit PCM samples
///
/// # Returns
///
/// The new item as stored
pub async fn add_recording_node(
    db: &LocalDb,
    name: &str,
    parent_key: u64,
    sample_rate: u32,
    samples: &[i16],
) -> Result<TreeNode> {
    let mut writer = RecordingWriter::new(db, sample_rate);
    writer.push(samples).await?;
    let info = writer.finish().await?;

    match add_node_with_free_date(db, NewTreeNode::recording(name, parent_key, info)).await {
        Ok(node) => {
            debug!("Added recording '{}' as node {}", name, node.id);
            Ok(node)
        }
        Err(e) => {
            if let Err(cleanup) = remove_recording(db, &info).await {
                warn!(
                    "Chunks {:?} of recording '{}' left behind: {}",
                    info.chunk_keys(),
                    name,
                    cleanup
                );
            }
            Err(e)
        }
    }
}

/// Add `node`, moving its date forward by one nanosecond each time it
/// collides with the date of a stored node.
///
/// # Errors
///
/// Returns the constraint error once `MAX_DATE_ATTEMPTS` dates were taken,
/// and any other error from the store as is.
pub async fn add_node_with_free_date(db: &LocalDb, mut node: NewTreeNode) -> Result<TreeNode> {
    let mut attempt = 1;
    loop {
        match db.add_node(&node).await {
            Ok(id) => return Ok(node.into_node(id)),
            Err(e) if e.is_constraint() && attempt < MAX_DATE_ATTEMPTS => {
                debug!("Date {} is taken, retrying '{}'", node.date, node.name);
                node.date = next_date(node.date)?;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn next_date(date: Timestamp) -> Result<Timestamp> {
    date.checked_add(SignedDuration::from_nanos(1)).map_err(|e| {
        StoreError::data(DB_TREE_STORE_NAME, format!("cannot move date {date} forward: {e}"))
    })
}

/// Remove a node, everything below it and the chunks of every recording in
/// that subtree.
///
/// Nodes are removed children first, so an interrupted removal never leaves
/// a child whose parent is already gone.
///
/// # Returns
///
/// The number of nodes removed; zero if `id` does not exist
pub async fn remove_subtree(db: &LocalDb, id: u64) -> Result<usize> {
    let Some(root) = db.get_node(id).await? else {
        return Ok(0);
    };

    let mut visited = HashSet::from([root.id]);
    let mut order = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        for child in db.query_by_parent(node.id).await? {
            if visited.insert(child.id) {
                stack.push(child);
            }
        }
        order.push(node);
    }

    let mut removed = 0;
    for node in order.into_iter().rev() {
        if let Some(recording) = node.recording {
            remove_recording(db, &recording).await?;
        }
        if db.remove_node(node.id).await? {
            removed += 1;
        }
    }
    info!("Removed {} node(s) under {}", removed, id);
    Ok(removed)
}

async fn remove_recording(db: &LocalDb, recording: &RecordingInfo) -> Result<()> {
    if recording.chunk_count() == 0 {
        return Ok(());
    }
    db.delete_chunks(recording.db_start_key, recording.chunk_count())
        .await?;
    Ok(())
}

/// The chain of nodes from the top level down to `id`.
///
/// The walk stops at the first missing parent, so an orphaned node's path
/// starts at the orphan. Returns an empty path if `id` does not exist.
pub async fn node_path(db: &LocalDb, id: u64) -> Result<Vec<TreeNode>> {
    let mut path = Vec::new();
    let mut seen = HashSet::new();
    let mut next = id;
    while next != DB_NO_KEY && seen.insert(next) {
        match db.get_node(next).await? {
            Some(node) => {
                next = node.parent_key;
                path.push(node);
            }
            None => break,
        }
    }
    path.reverse();
    Ok(path)
}

/// Renders a node path as `/Folder A/Song 1`.
pub fn format_path(path: &[TreeNode]) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.iter().fold(String::new(), |mut out, node| {
        out.push('/');
        out.push_str(&node.name);
        out
    })
}

/// Give a node a new name; returns the updated node.
pub async fn rename_node(db: &LocalDb, id: u64, name: &str) -> Result<TreeNode> {
    let mut node = existing_node(db, id).await?;
    node.name = name.to_string();
    db.update_node(&node).await?;
    Ok(node)
}

/// Move a node under `new_parent`; returns the updated node.
///
/// # Errors
///
/// Returns `StoreError::Data` if `new_parent` does not exist, or is the node
/// itself or one of its descendants.
pub async fn move_node(db: &LocalDb, id: u64, new_parent: u64) -> Result<TreeNode> {
    let mut node = existing_node(db, id).await?;

    if new_parent != DB_NO_KEY {
        let ancestry = node_path(db, new_parent).await?;
        if ancestry.is_empty() {
            return Err(StoreError::data(
                DB_TREE_STORE_NAME,
                format!("parent {new_parent} does not exist"),
            ));
        }
        if ancestry.iter().any(|ancestor| ancestor.id == id) {
            return Err(StoreError::data(
                DB_TREE_STORE_NAME,
                format!("cannot move node {id} into its own subtree"),
            ));
        }
    }

    node.parent_key = new_parent;
    db.update_node(&node).await?;
    Ok(node)
}

async fn existing_node(db: &LocalDb, id: u64) -> Result<TreeNode> {
    db.get_node(id).await?.ok_or_else(|| {
        StoreError::data(DB_TREE_STORE_NAME, format!("node {id} does not exist"))
    })
}
