//! Tree entity CLI commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use projtree_core::config::AppConfig;
use projtree_core::error::AppError;
use projtree_core::types::id::EntityId;
use projtree_entity::EntityType;

use super::{Cli, cli_context};
use crate::output::{self, OutputFormat};

/// Arguments for entity commands
#[derive(Debug, Args)]
pub struct EntityArgs {
    /// Entity subcommand
    #[command(subcommand)]
    pub command: EntityCommand,
}

/// Entity subcommands
#[derive(Debug, Subcommand)]
pub enum EntityCommand {
    /// Create a doc, optionally seeded from a local text file
    AddDoc {
        /// Doc name
        #[arg(short, long)]
        name: String,
        /// Parent folder id (root folder when omitted)
        #[arg(long)]
        folder: Option<EntityId>,
        /// Local file whose lines become the doc content
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// Upload a local file into the tree
    AddFile {
        /// File name in the tree
        #[arg(short, long)]
        name: String,
        /// Parent folder id (root folder when omitted)
        #[arg(long)]
        folder: Option<EntityId>,
        /// Local file to upload
        #[arg(long)]
        from: PathBuf,
    },
    /// Create an empty folder
    AddFolder {
        /// Folder name
        #[arg(short, long)]
        name: String,
        /// Parent folder id (root folder when omitted)
        #[arg(long)]
        parent: Option<EntityId>,
    },
    /// Create every missing folder of a path
    Mkdirp {
        /// Path such as `chapters/appendix`
        path: String,
        /// Reuse existing folders whose names differ only in case
        #[arg(long)]
        ignore_case: bool,
    },
    /// Move an entity into a folder
    Mv {
        /// Entity id
        #[arg(long)]
        id: EntityId,
        /// Entity type: doc, file, or folder
        #[arg(long = "type")]
        entity_type: EntityType,
        /// Destination folder id
        #[arg(long)]
        to: EntityId,
    },
    /// Rename an entity in place
    Rename {
        /// Entity id
        #[arg(long)]
        id: EntityId,
        /// Entity type: doc, file, or folder
        #[arg(long = "type")]
        entity_type: EntityType,
        /// New name
        #[arg(short, long)]
        name: String,
    },
    /// Delete an entity by id, or by path
    Rm {
        /// Entity id
        #[arg(long, requires = "entity_type", conflicts_with = "path")]
        id: Option<EntityId>,
        /// Entity type: doc, file, or folder
        #[arg(long = "type")]
        entity_type: Option<EntityType>,
        /// Exact-case path of the entity
        #[arg(long)]
        path: Option<String>,
    },
    /// Turn a doc into a binary file
    ConvertDoc {
        /// Doc id
        #[arg(long)]
        id: EntityId,
    },
}

/// Execute entity commands
pub async fn execute(args: &EntityArgs, cli: &Cli, config: AppConfig) -> Result<(), AppError> {
    let ws = cli.workspace(config).await?;
    let project_id = ws.project_id()?;
    let ctx = cli_context();
    let format = cli.format;

    match &args.command {
        EntityCommand::AddDoc { name, folder, from } => {
            let lines = match from {
                Some(path) => read_lines(path).await?,
                None => Vec::new(),
            };
            let added = ws
                .handler
                .add_doc(project_id, *folder, name, lines, &ctx)
                .await?;
            report(format, &added.doc, &format!("Doc {} added", added.path));
        }
        EntityCommand::AddFile { name, folder, from } => {
            let added = ws
                .handler
                .add_file(project_id, *folder, name, from, None, &ctx)
                .await?;
            report(format, &added.file, &format!("File {} added", added.path));
        }
        EntityCommand::AddFolder { name, parent } => {
            let added = ws
                .handler
                .add_folder(project_id, *parent, name, &ctx)
                .await?;
            report(
                format,
                &added.folder,
                &format!("Folder '{}' added ({})", added.folder.name, added.folder.id),
            );
        }
        EntityCommand::Mkdirp { path, ignore_case } => {
            let outcome = if *ignore_case {
                ws.handler
                    .mkdirp_case_insensitive(project_id, path, &ctx)
                    .await?
            } else {
                ws.handler.mkdirp(project_id, path, &ctx).await?
            };
            report(
                format,
                &outcome.folder,
                &format!(
                    "{} folders created, last is {}",
                    outcome.new_folders.len(),
                    outcome.folder.id
                ),
            );
        }
        EntityCommand::Mv {
            id,
            entity_type,
            to,
        } => {
            let outcome = ws
                .handler
                .move_entity(project_id, *id, *to, *entity_type, &ctx)
                .await?;
            output::print_success(&format!(
                "Moved {} to {}",
                outcome.start_path, outcome.end_path
            ));
        }
        EntityCommand::Rename {
            id,
            entity_type,
            name,
        } => {
            let outcome = ws
                .handler
                .rename_entity(project_id, *id, *entity_type, name, &ctx)
                .await?;
            output::print_success(&format!(
                "Renamed {} to {}",
                outcome.start_path, outcome.end_path
            ));
        }
        EntityCommand::Rm {
            id,
            entity_type,
            path,
        } => {
            let deleted = match (id, entity_type, path) {
                (Some(id), Some(entity_type), _) => {
                    ws.handler
                        .delete_entity(project_id, *id, *entity_type, &ctx)
                        .await?
                }
                (None, _, Some(path)) => {
                    ws.handler
                        .delete_entity_with_path(project_id, path, &ctx)
                        .await?
                }
                _ => {
                    return Err(AppError::validation(
                        "pass --id with --type, or --path",
                    ));
                }
            };
            output::print_success(&format!("Deleted {deleted}"));
        }
        EntityCommand::ConvertDoc { id } => {
            let file = ws.handler.convert_doc_to_file(project_id, *id, &ctx).await?;
            report(format, &file, &format!("Doc converted to file {}", file.id));
        }
    }

    ws.save().await
}

fn report<T: serde::Serialize + std::fmt::Debug>(format: OutputFormat, item: &T, msg: &str) {
    match format {
        OutputFormat::Json => output::print_item(item, format),
        OutputFormat::Table => output::print_success(msg),
    }
}

async fn read_lines(path: &std::path::Path) -> Result<Vec<String>, AppError> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(text.lines().map(str::to_string).collect())
}
