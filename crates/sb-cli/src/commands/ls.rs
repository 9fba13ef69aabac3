//! List command implementation

use anyhow::{Context, Result};
use sb_core::{Project, SeedDocument};
use serde::Serialize;

use crate::cli::{GlobalArgs, LsArgs, LsOutput};
use crate::commands::common::{load_project, print_table};

/// Seed information for display
#[derive(Debug, Serialize)]
struct SeedInfo {
    name: String,
    table: String,
    constraints: Vec<String>,
    rows: usize,
    insert_only: bool,
    enabled: bool,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl SeedInfo {
    fn new(seed: &SeedDocument, project: &Project) -> Self {
        let path = seed
            .path
            .strip_prefix(&project.root)
            .unwrap_or(seed.path.as_path())
            .display()
            .to_string();
        Self {
            name: seed.name.to_string(),
            table: seed
                .qualified_table(Some(project.config.database.schema.as_str()))
                .to_string(),
            constraints: seed.constraints.clone(),
            rows: seed.rows.len(),
            insert_only: seed.insert_only,
            enabled: seed.is_enabled(),
            path,
            description: seed.description.clone(),
        }
    }
}

/// Execute the ls command
pub(crate) fn execute(args: &LsArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;

    if global.verbose {
        eprintln!(
            "[verbose] Found {} seeds in project '{}'",
            project.seeds.len(),
            project.config.name
        );
    }

    let seeds: Vec<SeedInfo> = project
        .seeds
        .iter()
        .map(|s| SeedInfo::new(s, &project))
        .collect();

    match args.output {
        LsOutput::Table => print_seed_table(&seeds),
        LsOutput::Json => {
            let json =
                serde_json::to_string_pretty(&seeds).context("Failed to serialize seeds")?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn table_rows(seeds: &[SeedInfo]) -> Vec<Vec<String>> {
    seeds
        .iter()
        .map(|s| {
            let constraints = if s.constraints.is_empty() {
                "(primary key)".to_string()
            } else {
                s.constraints.join(", ")
            };
            let mode = match (s.enabled, s.insert_only) {
                (false, _) => "disabled",
                (true, true) => "insert-only",
                (true, false) => "upsert",
            };
            vec![
                s.name.clone(),
                s.table.clone(),
                constraints,
                s.rows.to_string(),
                mode.to_string(),
            ]
        })
        .collect()
}

fn print_seed_table(seeds: &[SeedInfo]) {
    if seeds.is_empty() {
        println!("No seed files found in seed_paths.");
        return;
    }
    print_table(
        &["NAME", "TABLE", "CONSTRAINTS", "ROWS", "MODE"],
        &table_rows(seeds),
    );
    println!("\n{} seeds found", seeds.len());
}
