//! Project-level CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use projtree_core::config::AppConfig;
use projtree_core::error::AppError;
use projtree_core::types::id::{ProjectId, UserId};
use projtree_database::ProjectStore;
use projtree_entity::{Project, TreeEntity};
use projtree_service::entities::list_all;
use projtree_service::locator::find_element_by_path;
use projtree_service::NameValidator;

use super::{Cli, cli_context};
use crate::output::{self, OutputFormat};
use crate::workspace::{Workspace, write_snapshot};

/// Arguments for project commands
#[derive(Debug, Args)]
pub struct ProjectArgs {
    /// Project subcommand
    #[command(subcommand)]
    pub command: ProjectCommand,
}

/// Project subcommands
#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// Create an empty project
    Init {
        /// Project name
        #[arg(short, long)]
        name: String,
        /// History id, enables history resync
        #[arg(long)]
        history_id: Option<String>,
    },
    /// Show project metadata
    Show,
    /// List every doc, file, and folder with its path
    Tree,
    /// Look up the entity at a path
    Find {
        /// Path such as `chapters/intro.tex`
        path: String,
        /// Match names regardless of case
        #[arg(long)]
        ignore_case: bool,
    },
    /// Check whether a name or path is acceptable
    CheckName {
        /// Name or slash-separated path
        name: String,
    },
    /// Make a doc the root doc
    SetRootDoc {
        /// Doc id
        id: projtree_core::types::id::EntityId,
    },
    /// Clear the root doc
    UnsetRootDoc,
    /// Repair names and resynchronize history
    Resync,
    /// Soft-delete the project
    Delete,
    /// Restore a soft-deleted project
    Restore {
        /// Id of the deleted project
        id: ProjectId,
    },
    /// Expire deleted projects older than the retention window
    ExpireDeleted,
}

/// Tree listing row
#[derive(Debug, Serialize, Tabled)]
struct EntityRow {
    /// Entity type
    #[tabled(rename = "Type")]
    entity_type: String,
    /// Entity ID
    #[tabled(rename = "ID")]
    id: String,
    /// Path
    #[tabled(rename = "Path")]
    path: String,
}

/// Resync rename row
#[derive(Debug, Serialize, Tabled)]
struct RenameRow {
    #[tabled(rename = "Type")]
    entity_type: String,
    #[tabled(rename = "Old name")]
    old_name: String,
    #[tabled(rename = "New path")]
    path: String,
}

/// Execute project commands
pub async fn execute(args: &ProjectArgs, cli: &Cli, config: AppConfig) -> Result<(), AppError> {
    let format = cli.format;

    if let ProjectCommand::Init { name, history_id } = &args.command {
        return init(cli, config, name, history_id.as_deref(), format).await;
    }
    if let ProjectCommand::CheckName { name } = &args.command {
        check_name(&config, name);
        return Ok(());
    }

    let ws = cli.workspace(config).await?;
    let ctx = cli_context();

    match &args.command {
        ProjectCommand::Init { .. } | ProjectCommand::CheckName { .. } => {}
        ProjectCommand::Show => show(&ws.project().await?, format),
        ProjectCommand::Tree => {
            let project = ws.project().await?;
            output::print_list(&tree_rows(&project), format);
        }
        ProjectCommand::Find { path, ignore_case } => {
            let project = ws.project().await?;
            let found = find_element_by_path(&project, path, !*ignore_case)?;
            let row = EntityRow {
                entity_type: found.entity_type.to_string(),
                id: found.element.id().to_string(),
                path: found.path.file_system,
            };
            output::print_list(&[row], format);
        }
        ProjectCommand::SetRootDoc { id } => {
            ws.handler.set_root_doc(ws.project_id()?, *id).await?;
            ws.save().await?;
            output::print_success(&format!("Root doc set to {id}"));
        }
        ProjectCommand::UnsetRootDoc => {
            ws.handler.unset_root_doc(ws.project_id()?).await?;
            ws.save().await?;
            output::print_success("Root doc cleared");
        }
        ProjectCommand::Resync => {
            let report = ws
                .handler
                .resync_project_history(ws.project_id()?, &ctx)
                .await?;
            ws.save().await?;
            let rows: Vec<RenameRow> = report
                .renamed
                .iter()
                .map(|r| RenameRow {
                    entity_type: r.entity_type.to_string(),
                    old_name: r.old_name.clone(),
                    path: r.path.clone(),
                })
                .collect();
            output::print_list(&rows, format);
            output::print_success(&format!(
                "Resynced {} docs and {} files",
                report.docs.len(),
                report.files.len()
            ));
        }
        ProjectCommand::Delete => delete(&ws, &ctx).await?,
        ProjectCommand::Restore { id } => {
            let project = ws.deleter.undelete_project(*id).await?;
            output::print_success(&format!("Restored as '{}'", project.name));
        }
        ProjectCommand::ExpireDeleted => {
            let expired = ws.deleter.expire_deleted_projects_after_duration().await?;
            output::print_success(&format!("Expired {expired} deleted projects"));
        }
    }

    Ok(())
}

async fn init(
    cli: &Cli,
    config: AppConfig,
    name: &str,
    history_id: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let mut project = Project::new(name, UserId::new());
    if let Some(history_id) = history_id {
        project = project.with_history(history_id);
    }

    match &cli.snapshot {
        Some(path) => write_snapshot(path, &project).await?,
        None => {
            let stores = projtree_database::StoreManager::new(&config.database).await?;
            stores.projects.insert(&project).await?;
        }
    }

    show(&project, format);
    output::print_success(&format!("Project '{name}' created"));
    Ok(())
}

async fn delete(ws: &Workspace, ctx: &projtree_service::RequestContext) -> Result<(), AppError> {
    let deleted = ws.deleter.delete_project(ws.project_id()?, ctx).await?;
    if ws.config.database.provider == "memory" {
        output::print_warning("The in-memory store does not outlive this command");
    }
    output::print_success(&format!(
        "Project {} deleted",
        deleted.deleter_data.deleted_project_id
    ));
    Ok(())
}

fn check_name(config: &AppConfig, name: &str) {
    let validator = NameValidator::from_config(&config.project);
    let ok = if name.contains('/') {
        validator.is_clean_path(name)
    } else {
        validator.is_clean_filename(name)
    };
    if ok {
        output::print_success(&format!("'{name}' is a valid name"));
    } else {
        output::print_warning(&format!("'{name}' is not a valid name"));
    }
}

fn show(project: &Project, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_item(project, format),
        OutputFormat::Table => {
            println!("Project");
            output::print_kv("id", &project.id.to_string());
            output::print_kv("name", &project.name);
            output::print_kv("version", &project.version.to_string());
            output::print_kv("entities", &project.entity_count().to_string());
            output::print_kv(
                "root doc",
                &project
                    .root_doc_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            );
            output::print_kv("history", project.history_id().unwrap_or("-"));
            output::print_kv("last updated", &project.last_updated.to_rfc3339());
        }
    }
}

fn tree_rows(project: &Project) -> Vec<EntityRow> {
    let all = list_all(project);
    let folders = all.folders.into_iter().map(|f| EntityRow {
        entity_type: "folder".to_string(),
        id: f.folder.id.to_string(),
        path: f.path,
    });
    let docs = all.docs.into_iter().map(|d| EntityRow {
        entity_type: "doc".to_string(),
        id: d.doc.id.to_string(),
        path: d.path,
    });
    let files = all.files.into_iter().map(|f| EntityRow {
        entity_type: "file".to_string(),
        id: f.file.id.to_string(),
        path: f.path,
    });
    let mut rows: Vec<EntityRow> = folders.chain(docs).chain(files).collect();
    rows.sort_by(|a, b| a.path.cmp(&b.path));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use projtree_entity::{Doc, FileRef, Folder};

    #[test]
    fn test_tree_rows_sorted_by_path() {
        let mut project = Project::new("thesis", UserId::new());
        let mut chapters = Folder::new("chapters");
        chapters.docs.push(Doc::new("intro.tex"));
        project.root_folder.folders.push(chapters);
        project.root_folder.docs.push(Doc::new("main.tex"));
        project.root_folder.file_refs.push(FileRef::new("a.png"));

        let rows = tree_rows(&project);
        let paths: Vec<&str> = rows.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["a.png", "chapters", "chapters/intro.tex", "main.tex"]);
        assert_eq!(rows[1].entity_type, "folder");
    }
}
