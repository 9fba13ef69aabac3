//! Seed command implementation

use anyhow::Result;
use sb_core::{Project, SeedDocument};
use sb_db::{DuckDbStore, Store};
use sb_seed::{ReconcileOptions, SeedReconciler, SequenceRepair};
use std::collections::HashSet;

use crate::cli::{GlobalArgs, SeedArgs};
use crate::commands::common::{load_project, open_store, resolve_quiet};

/// Totals across one `seedbed seed` invocation
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct SeedSummary {
    pub(crate) succeeded: usize,
    pub(crate) failed: usize,
    pub(crate) inserted: usize,
    pub(crate) updated: usize,
    pub(crate) skipped: usize,
    pub(crate) warnings: usize,
}

/// Execute the seed command
pub(crate) fn execute(args: &SeedArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let store = open_store(&project, global)?;

    let summary = seed_project(&project, &store, args, global);

    if summary.failed > 0 {
        // Exit code 4 = Database error (seed reconciliation failures)
        std::process::exit(4);
    }
    Ok(())
}

/// Select the seeds named by `--seeds`, or all enabled seeds.
fn select_seeds<'a>(project: &'a Project, args: &SeedArgs) -> Vec<&'a SeedDocument> {
    let filter: Option<HashSet<&str>> = args
        .seeds
        .as_ref()
        .map(|f| f.split(',').map(str::trim).filter(|s| !s.is_empty()).collect());

    project
        .seeds
        .iter()
        .filter(|s| s.is_enabled())
        .filter(|s| {
            filter
                .as_ref()
                .map_or(true, |names| names.contains(s.name.as_str()))
        })
        .collect()
}

/// Reconcile every selected seed, reporting each one.
pub(crate) fn seed_project(
    project: &Project,
    store: &DuckDbStore,
    args: &SeedArgs,
    global: &GlobalArgs,
) -> SeedSummary {
    let mut summary = SeedSummary::default();

    if project.seeds.is_empty() {
        println!("No seed files found in seed_paths.");
        return summary;
    }

    let seeds = select_seeds(project, args);
    if seeds.is_empty() {
        println!("No matching seed files found.");
        return summary;
    }

    let quiet = resolve_quiet(project, global);
    if global.verbose {
        eprintln!(
            "[verbose] Reconciling {} seeds from paths: {:?} (store: {}, quiet: {})",
            seeds.len(),
            project.config.seed_paths,
            store.store_type(),
            quiet
        );
    }

    println!("Seeding {} tables...\n", seeds.len());

    for seed in seeds {
        let table = seed.qualified_table(Some(project.config.database.schema.as_str()));
        let options = ReconcileOptions {
            quiet,
            insert_only: args.insert_only || seed.insert_only,
        };
        if global.verbose {
            eprintln!(
                "[verbose] {} -> {} ({} rows, constraints: {:?}, insert_only: {})",
                seed.name,
                table,
                seed.rows.len(),
                seed.constraints,
                options.insert_only
            );
        }

        let result = SeedReconciler::for_table(
            store,
            &table,
            seed.constraints.as_slice(),
            seed.rows.clone(),
            options,
        )
        .and_then(|reconciler| reconciler.reconcile(store));

        match result {
            Ok(outcome) => {
                summary.succeeded += 1;
                summary.inserted += outcome.inserted;
                summary.updated += outcome.updated;
                summary.skipped += outcome.skipped;
                println!(
                    "  ✓ {} ({} inserted, {} updated, {} skipped)",
                    seed.name, outcome.inserted, outcome.updated, outcome.skipped
                );
                match &outcome.sequence {
                    SequenceRepair::Failed(warning) => {
                        summary.warnings += 1;
                        println!("    ⚠ {}", warning);
                    }
                    SequenceRepair::Resynced {
                        max_seeded_id,
                        previous,
                    } if global.verbose => {
                        eprintln!(
                            "[verbose] Resynced sequence of {} to {} (was {:?})",
                            table, max_seeded_id, previous
                        );
                    }
                    _ => {}
                }
            }
            Err(e) => {
                summary.failed += 1;
                println!("  ✗ {} - {}", seed.name, e);
            }
        }
    }

    println!();
    println!(
        "Seeded {} tables ({} inserted, {} updated, {} skipped)",
        summary.succeeded, summary.inserted, summary.updated, summary.skipped
    );
    if summary.failed > 0 {
        println!("{} seeds failed", summary.failed);
    }

    summary
}

#[cfg(test)]
#[path = "seed_test.rs"]
mod tests;
