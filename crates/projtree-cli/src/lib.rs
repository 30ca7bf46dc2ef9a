//! # projtree-cli
//!
//! Command-line front end for ProjTree. Commands run against either a
//! project snapshot file or a project in the configured store.

pub mod commands;
pub mod output;
pub mod workspace;

pub use commands::Cli;
