//! CLI command definitions and dispatch.

pub mod entity;
pub mod project;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use projtree_core::config::AppConfig;
use projtree_core::error::AppError;
use projtree_core::types::id::ProjectId;
use projtree_service::RequestContext;

use crate::output::OutputFormat;
use crate::workspace::Workspace;

/// ProjTree: inspect and edit project file trees
#[derive(Debug, Parser)]
#[command(name = "projtree", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding `default.toml` and environment overlays
    #[arg(short, long, default_value = "config")]
    pub config: String,

    /// Configuration environment overlay to apply
    #[arg(short, long, env = "PROJTREE_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Project snapshot file to load and write back
    #[arg(short, long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Project id in the configured store (ignored with --snapshot)
    #[arg(short, long, global = true)]
    pub project: Option<ProjectId>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Project-level commands
    Project(project::ProjectArgs),
    /// Add, move, rename, and delete tree entities
    Entity(entity::EntityArgs),
}

impl Cli {
    /// Load the configuration this invocation asks for.
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        AppConfig::load_from(&self.config, &self.env)
    }

    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Project(args) => project::execute(args, self, config).await,
            Commands::Entity(args) => entity::execute(args, self, config).await,
        }
    }

    /// Open the workspace selected by the global flags.
    pub async fn workspace(&self, config: AppConfig) -> Result<Workspace, AppError> {
        Workspace::open(config, self.snapshot.as_deref(), self.project).await
    }
}

/// Context for changes made from the command line.
pub fn cli_context() -> RequestContext {
    RequestContext::system("cli")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entity_move() {
        let cli = Cli::try_parse_from([
            "projtree",
            "--snapshot",
            "p.json",
            "entity",
            "mv",
            "--id",
            "6f1c8a52-3c2c-4a4f-9d65-2b1e3f0a9c11",
            "--type",
            "docs",
            "--to",
            "0b7d2f1e-8a4c-4f3e-9b2d-1c6e5a4f3d21",
        ])
        .unwrap();
        assert_eq!(cli.snapshot, Some(PathBuf::from("p.json")));
        assert!(matches!(cli.command, Commands::Entity(_)));
    }

    #[test]
    fn test_bad_entity_type_is_rejected() {
        let parsed = Cli::try_parse_from([
            "projtree",
            "entity",
            "rm",
            "--id",
            "6f1c8a52-3c2c-4a4f-9d65-2b1e3f0a9c11",
            "--type",
            "widget",
        ]);
        assert!(parsed.is_err());
    }
}
