//! Command execution for the tapedeck CLI.
//!
//! [`Cli`] runs parsed commands against a [`LocalDb`] through the core
//! handlers and renders their markdown output.

use std::{fs, io::BufWriter, path::Path};

use anyhow::{bail, Context, Result};
use log::info;
use tapedeck_core::{
    handlers::{
        handle_add_folder, handle_export_recording, handle_find_nodes, handle_import_recording,
        handle_list_children, handle_move_node, handle_remove_node, handle_rename_node,
        handle_show_node, handle_status,
    },
    operations::{format_path, node_path},
    params::{Id, ListChildren},
    CreateResult, LocalDb, OperationStatus,
};

use crate::{
    args::{ChunkCommands, ConfirmArgs, NodeCommands, RecordCommands},
    renderer::TerminalRenderer,
};

pub struct Cli {
    db: LocalDb,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(db: LocalDb, renderer: TerminalRenderer) -> Self {
        Self { db, renderer }
    }

    pub async fn handle_node_command(&self, command: NodeCommands) -> Result<()> {
        match command {
            NodeCommands::Add(args) => {
                let node = handle_add_folder(&self.db, &args.into())
                    .await
                    .context("Failed to add folder")?;
                self.renderer.render(&CreateResult::new(node).to_string())
            }
            NodeCommands::Show(args) => {
                let params: Id = args.into();
                let node = handle_show_node(&self.db, &params)
                    .await
                    .context("Failed to read node")?
                    .with_context(|| format!("Node {} not found", params.id))?;
                let path = node_path(&self.db, node.id)
                    .await
                    .context("Failed to resolve node path")?;
                self.renderer
                    .render(&format!("Path: {}\n\n{node}", format_path(&path)))
            }
            NodeCommands::Ls(args) => self.list_children(&args.into()).await,
            NodeCommands::Find(args) => {
                let nodes = handle_find_nodes(&self.db, &args.into())
                    .await
                    .context("Failed to find nodes")?;
                self.renderer.render(&nodes.to_string())
            }
            NodeCommands::Rename(args) => {
                let result = handle_rename_node(&self.db, &args.into())
                    .await
                    .context("Failed to rename node")?;
                self.renderer.render(&result.to_string())
            }
            NodeCommands::Move(args) => {
                let result = handle_move_node(&self.db, &args.into())
                    .await
                    .context("Failed to move node")?;
                self.renderer.render(&result.to_string())
            }
            NodeCommands::Rm(args) => {
                let id = args.id;
                match handle_remove_node(&self.db, &args.into())
                    .await
                    .context("Failed to remove node")?
                {
                    Some(result) => self.renderer.render(&result.to_string()),
                    None => bail!("Node {id} not found"),
                }
            }
        }
    }

    pub async fn handle_chunk_command(&self, command: ChunkCommands) -> Result<()> {
        match command {
            ChunkCommands::Append(args) => {
                let bytes = read_file(&args.file)?;
                let len = bytes.len();
                let id = self
                    .db
                    .append_chunk(bytes)
                    .await
                    .context("Failed to append chunk")?;
                self.renderer
                    .render(&format!("Appended chunk {id} ({len} bytes)\n"))
            }
            ChunkCommands::Show(args) => {
                let bytes = self
                    .db
                    .read_chunk(args.id)
                    .await
                    .context("Failed to read chunk")?
                    .with_context(|| format!("Chunk {} not found", args.id))?;
                self.renderer
                    .render(&format!("Chunk {}: {} bytes\n", args.id, bytes.len()))
            }
            ChunkCommands::Count => {
                let count = self
                    .db
                    .count_chunks()
                    .await
                    .context("Failed to count chunks")?;
                self.renderer.render(&format!("{count} chunk(s)\n"))
            }
        }
    }

    pub async fn handle_record_command(&self, command: RecordCommands) -> Result<()> {
        match command {
            RecordCommands::Import(args) => {
                let pcm = read_file(&args.file)?;
                let node = handle_import_recording(&self.db, &args.to_params(), &pcm)
                    .await
                    .context("Failed to import recording")?;
                self.renderer.render(&CreateResult::new(node).to_string())
            }
            RecordCommands::Export(args) => {
                let file = fs::File::create(&args.file)
                    .with_context(|| format!("Failed to create {}", args.file.display()))?;
                let mut writer = BufWriter::new(file);
                let written = handle_export_recording(&self.db, &Id { id: args.id }, &mut writer)
                    .await
                    .context("Failed to export recording")?;
                self.renderer.render(&format!(
                    "Exported {written} bytes to {}\n",
                    args.file.display()
                ))
            }
        }
    }

    pub async fn clear(&self, args: &ConfirmArgs) -> Result<()> {
        require_confirmation(args, "clear")?;
        let cleared = self.db.clear_all().await.context("Failed to clear database")?;
        let status = OperationStatus::success(format!("Cleared {cleared} store(s)"));
        self.renderer.render(&status.to_string())
    }

    pub async fn reset(&self, args: &ConfirmArgs) -> Result<()> {
        require_confirmation(args, "reset")?;
        self.db
            .delete_database()
            .await
            .context("Failed to delete database")?;
        info!("Database at {} deleted", self.db.path().display());
        let status = OperationStatus::success(format!(
            "Deleted database at {}",
            self.db.path().display()
        ));
        self.renderer.render(&status.to_string())
    }

    pub async fn status(&self) -> Result<()> {
        let status = handle_status(&self.db)
            .await
            .context("Failed to read database status")?;
        self.renderer.render(&status.to_string())
    }

    pub async fn list_children(&self, params: &ListChildren) -> Result<()> {
        let nodes = handle_list_children(&self.db, params)
            .await
            .context("Failed to list nodes")?;
        self.renderer.render(&nodes.to_string())
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn require_confirmation(args: &ConfirmArgs, command: &str) -> Result<()> {
    if !args.confirm {
        bail!("Refusing to {command} without --confirm");
    }
    Ok(())
}
