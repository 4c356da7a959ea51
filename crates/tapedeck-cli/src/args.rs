//! Command-line argument definitions using clap's derive API.
//!
//! Each command's arguments live in a clap `Args` struct that converts into
//! the matching core parameter structure from `tapedeck_core::params`, so
//! clap attributes never leak into the core crate.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jiff::Timestamp;
use tapedeck_core::{
    params::{AddFolder, FindNodes, Id, ImportRecording, ListChildren, MoveNode, RemoveNode, RenameNode},
    DB_NO_KEY,
};

/// Command-line front end for the tapedeck recording store
///
/// Recordings are kept in a tree of folders and items, with each item's
/// samples stored as a run of fixed-size chunks.
#[derive(Parser)]
#[command(version, about, name = "tape")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/tapedeck/tapedeck-db.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands. Without a command the top-level nodes are listed.
#[derive(Subcommand)]
pub enum Commands {
    /// Manage folders and items
    #[command(alias = "n")]
    Node {
        #[command(subcommand)]
        command: NodeCommands,
    },
    /// Inspect and append raw data chunks
    #[command(alias = "c")]
    Chunk {
        #[command(subcommand)]
        command: ChunkCommands,
    },
    /// Import and export recordings as raw PCM
    #[command(alias = "r")]
    Record {
        #[command(subcommand)]
        command: RecordCommands,
    },
    /// Remove every node and chunk, keeping the database
    Clear(ConfirmArgs),
    /// Delete the database file; the next command starts from scratch
    Reset(ConfirmArgs),
    /// Show the database location, version and record counts
    Status,
}

#[derive(Subcommand)]
pub enum NodeCommands {
    /// Add a folder
    #[command(alias = "a")]
    Add(AddFolderArgs),
    /// Show a node and its path
    #[command(alias = "s")]
    Show(ShowNodeArgs),
    /// List the children of a folder
    #[command(aliases = ["l", "list"])]
    Ls(ListChildrenArgs),
    /// Find nodes by name and/or creation time
    #[command(alias = "f")]
    Find(FindNodesArgs),
    /// Rename a node
    Rename(RenameNodeArgs),
    /// Move a node to another folder
    #[command(alias = "mv")]
    Move(MoveNodeArgs),
    /// Remove a node
    #[command(aliases = ["remove", "delete"])]
    Rm(RemoveNodeArgs),
}

#[derive(Subcommand)]
pub enum ChunkCommands {
    /// Append the contents of a file as one chunk
    Append(AppendChunkArgs),
    /// Show the size of a chunk
    Show(ShowChunkArgs),
    /// Count the stored chunks
    Count,
}

#[derive(Subcommand)]
pub enum RecordCommands {
    /// Import a raw 16-bit little-endian PCM file as a new item
    Import(ImportRecordingArgs),
    /// Export an item's samples as raw 16-bit little-endian PCM
    Export(ExportRecordingArgs),
}

/// Add a folder under another folder or at the top level
#[derive(clap::Args)]
pub struct AddFolderArgs {
    /// Name of the folder
    pub name: String,
    /// ID of the parent folder; 0 for the top level
    #[arg(short, long, default_value_t = DB_NO_KEY)]
    pub parent: u64,
}

impl From<AddFolderArgs> for AddFolder {
    fn from(val: AddFolderArgs) -> Self {
        AddFolder {
            name: val.name,
            parent_key: val.parent,
        }
    }
}

#[derive(clap::Args)]
pub struct ShowNodeArgs {
    /// ID of the node to show
    pub id: u64,
}

impl From<ShowNodeArgs> for Id {
    fn from(val: ShowNodeArgs) -> Self {
        Id { id: val.id }
    }
}

#[derive(clap::Args)]
pub struct ListChildrenArgs {
    /// ID of the folder to list; 0 for the top level
    #[arg(default_value_t = DB_NO_KEY)]
    pub parent: u64,
}

impl From<ListChildrenArgs> for ListChildren {
    fn from(val: ListChildrenArgs) -> Self {
        ListChildren {
            parent_key: val.parent,
        }
    }
}

/// Find nodes; with no filter every node is listed
#[derive(clap::Args)]
pub struct FindNodesArgs {
    /// Exact node name
    #[arg(short, long)]
    pub name: Option<String>,
    /// Exact creation time, e.g. 2024-05-01T12:00:00Z
    #[arg(short, long)]
    pub date: Option<Timestamp>,
}

impl From<FindNodesArgs> for FindNodes {
    fn from(val: FindNodesArgs) -> Self {
        FindNodes {
            name: val.name,
            date: val.date,
        }
    }
}

#[derive(clap::Args)]
pub struct RenameNodeArgs {
    /// ID of the node to rename
    pub id: u64,
    /// New name
    pub name: String,
}

impl From<RenameNodeArgs> for RenameNode {
    fn from(val: RenameNodeArgs) -> Self {
        RenameNode {
            id: val.id,
            name: val.name,
        }
    }
}

#[derive(clap::Args)]
pub struct MoveNodeArgs {
    /// ID of the node to move
    pub id: u64,
    /// ID of the new parent folder; 0 for the top level
    pub parent: u64,
}

impl From<MoveNodeArgs> for MoveNode {
    fn from(val: MoveNodeArgs) -> Self {
        MoveNode {
            id: val.id,
            parent_key: val.parent,
        }
    }
}

/// Remove a node. Children and chunks are kept unless --recursive is given
#[derive(clap::Args)]
pub struct RemoveNodeArgs {
    /// ID of the node to remove
    pub id: u64,
    /// Also remove everything below the node and the chunks of its
    /// recordings
    #[arg(short, long)]
    pub recursive: bool,
}

impl From<RemoveNodeArgs> for RemoveNode {
    fn from(val: RemoveNodeArgs) -> Self {
        RemoveNode {
            id: val.id,
            recursive: val.recursive,
        }
    }
}

#[derive(clap::Args)]
pub struct AppendChunkArgs {
    /// File whose bytes become the chunk
    pub file: PathBuf,
}

#[derive(clap::Args)]
pub struct ShowChunkArgs {
    /// Key of the chunk
    pub id: u64,
}

#[derive(clap::Args)]
pub struct ImportRecordingArgs {
    /// Raw PCM file to import
    pub file: PathBuf,
    /// Name of the new item; defaults to the file name
    #[arg(short, long)]
    pub name: Option<String>,
    /// ID of the folder to add the item to; 0 for the top level
    #[arg(short, long, default_value_t = DB_NO_KEY)]
    pub parent: u64,
    /// Samples per second
    #[arg(long, default_value_t = 44100)]
    pub rate: u32,
}

impl ImportRecordingArgs {
    /// Core parameters, naming the item after the file when no name is
    /// given.
    pub fn to_params(&self) -> ImportRecording {
        let name = self.name.clone().unwrap_or_else(|| {
            self.file
                .file_stem()
                .map_or_else(|| "Recording".to_string(), |s| s.to_string_lossy().into_owned())
        });
        ImportRecording {
            name,
            parent_key: self.parent,
            sample_rate: self.rate,
        }
    }
}

#[derive(clap::Args)]
pub struct ExportRecordingArgs {
    /// ID of the item to export
    pub id: u64,
    /// File to write the samples to
    pub file: PathBuf,
}

/// Destructive commands require an explicit confirmation flag
#[derive(clap::Args)]
pub struct ConfirmArgs {
    /// Confirm the operation
    #[arg(long)]
    pub confirm: bool,
}
