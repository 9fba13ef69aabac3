//! Helpers shared by commands

use anyhow::{Context, Result};
use sb_core::Project;
use sb_db::DuckDbStore;
use std::path::Path;

use crate::cli::GlobalArgs;

/// Load a project from the directory specified in global CLI arguments.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    Project::load(Path::new(&global.project_dir)).context("Failed to load project")
}

/// Open the project database, honouring `--target`.
pub(crate) fn open_store(project: &Project, global: &GlobalArgs) -> Result<DuckDbStore> {
    let db_path = global
        .target
        .as_deref()
        .unwrap_or(&project.config.database.path);
    if global.verbose {
        eprintln!("[verbose] Opening database: {}", db_path);
    }
    DuckDbStore::new(db_path).context("Failed to connect to database")
}

/// Resolve the progress default once: `--quiet`/`SEEDBED_QUIET` or config.
pub(crate) fn resolve_quiet(project: &Project, global: &GlobalArgs) -> bool {
    global.quiet || project.config.quiet
}

/// Calculate column widths for a table given headers and row data.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }
    widths
}

/// Print a left-aligned table to stdout, columns separated by two spaces.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);

    let header_parts: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, &w)| format!("{:<width$}", h, width = w))
        .collect();
    println!("{}", header_parts.join("  ").trim_end());

    let sep_parts: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep_parts.join("  "));

    for row in rows {
        let row_parts: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect();
        println!("{}", row_parts.join("  ").trim_end());
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
