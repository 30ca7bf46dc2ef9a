//! Table and JSON output for CLI commands.
//!
//! Results go to stdout. Status lines go to stderr so `--format json`
//! output stays machine-readable.

use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::warn;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Print tree rows in the selected format
pub fn print_list<T: Serialize + Tabled>(rows: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table if rows.is_empty() => eprintln!("(empty)"),
        OutputFormat::Table => {
            let mut table = Table::new(rows);
            table.with(Style::sharp());
            println!("{table}");
        }
        OutputFormat::Json => print_json(&rows),
    }
}

/// Print one entity or project in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => println!("{item:#?}"),
        OutputFormat::Json => print_json(item),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => warn!(error = %e, "Failed to serialize output"),
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    eprintln!("✓ {msg}");
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    eprintln!("⚠ {msg}");
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<14} {value}", format!("{key}:"));
}
