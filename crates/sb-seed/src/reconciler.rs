//! The seed reconciler.

use crate::error::ReconcileError;
use crate::sequence::{repair_sequence, SequenceRepair};
use sb_core::{DesiredRow, EntityType, Record, TableName, Value};
use sb_db::{DbError, Store};
use std::io::Write;
use std::sync::Arc;

/// Reconciliation options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Suppress the per-row progress lines
    pub quiet: bool,
    /// Never modify rows that already exist; only insert missing ones
    pub insert_only: bool,
}

/// Result of a successful reconciliation
#[derive(Debug)]
pub struct ReconcileOutcome {
    /// Persisted records in input order; rows skipped under `insert_only`
    /// are not included
    pub records: Vec<Record>,
    /// Rows that had no match and were inserted
    pub inserted: usize,
    /// Existing rows that were overwritten
    pub updated: usize,
    /// Existing rows left alone because of `insert_only`
    pub skipped: usize,
    /// What happened to the primary-key sequence after commit
    pub sequence: SequenceRepair,
}

#[derive(Debug, Default)]
struct Tally {
    inserted: usize,
    updated: usize,
    skipped: usize,
}

/// Reconciles a fixed set of desired rows into one table.
///
/// Construction validates everything that can be checked without the store:
/// the constraint attributes, non-empty input, and that every row only names
/// declared attributes. Row keys are normalized to attribute names here, so
/// [`reconcile`](Self::reconcile) works on canonical rows.
#[derive(Debug, Clone)]
pub struct SeedReconciler {
    entity: Arc<EntityType>,
    constraints: Vec<String>,
    rows: Vec<DesiredRow>,
    options: ReconcileOptions,
}

impl SeedReconciler {
    /// Validate input and build a reconciler.
    ///
    /// An empty `constraints` list means "match on the primary key".
    pub fn new<C: AsRef<str>>(
        entity: Arc<EntityType>,
        constraints: &[C],
        rows: Vec<DesiredRow>,
        options: ReconcileOptions,
    ) -> Result<Self, ReconcileError> {
        let configuration_error = |message: String| ReconcileError::Configuration {
            entity: entity.name().to_string(),
            message,
        };

        let mut names: Vec<String> = Vec::with_capacity(constraints.len().max(1));
        for name in constraints {
            let name = name.as_ref().to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        if names.is_empty() {
            match entity.primary_key() {
                Some(pk) => names.push(pk.to_string()),
                None => {
                    return Err(configuration_error(format!(
                        "no constraints given and {} has no primary key",
                        entity.name()
                    )))
                }
            }
        }

        let unknown: Vec<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|n| !entity.has_attribute(n))
            .collect();
        if !unknown.is_empty() {
            return Err(configuration_error(format!(
                "constraint attribute(s) {} not found; valid attributes are: {}",
                unknown.join(", "),
                entity.known_attributes().join(", ")
            )));
        }

        if rows.is_empty() {
            return Err(configuration_error(
                "no seed rows were supplied".to_string(),
            ));
        }

        let rows = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                entity
                    .normalize_row(row)
                    .map_err(|e| configuration_error(format!("row {index}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            entity,
            constraints: names,
            rows,
            options,
        })
    }

    /// Describe `table` through the store, then build a reconciler for it.
    pub fn for_table<S: Store, C: AsRef<str>>(
        store: &S,
        table: &TableName,
        constraints: &[C],
        rows: Vec<DesiredRow>,
        options: ReconcileOptions,
    ) -> Result<Self, ReconcileError> {
        let entity = Arc::new(store.describe(table)?);
        Self::new(entity, constraints, rows, options)
    }

    /// Entity type being seeded
    pub fn entity(&self) -> &Arc<EntityType> {
        &self.entity
    }

    /// Resolved constraint attributes
    pub fn constraints(&self) -> &[String] {
        &self.constraints
    }

    /// Normalized desired rows
    pub fn rows(&self) -> &[DesiredRow] {
        &self.rows
    }

    /// Options in effect
    pub fn options(&self) -> ReconcileOptions {
        self.options
    }

    /// Reconcile against `store`, writing progress lines to stdout.
    pub fn reconcile<S: Store>(&self, store: &S) -> Result<ReconcileOutcome, ReconcileError> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.reconcile_with_output(store, &mut out)
    }

    /// Reconcile against `store`, writing progress lines to `out`.
    pub fn reconcile_with_output<S: Store, W: Write>(
        &self,
        store: &S,
        out: &mut W,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let entity = &self.entity;
        let (records, tally) = store.transaction(entity, |store| {
            let mut records = Vec::with_capacity(self.rows.len());
            let mut tally = Tally::default();

            for (index, row) in self.rows.iter().enumerate() {
                let predicate = self.predicate(row);
                let existing = store.find_one(entity, &predicate).map_err(|source| {
                    ReconcileError::Lookup {
                        entity: entity.name().to_string(),
                        index,
                        row: format_row(row),
                        source,
                    }
                })?;

                let mut record = match existing {
                    Some(_) if self.options.insert_only => {
                        log::debug!("{} row {index} exists, skipping (insert only)", entity.name());
                        tally.skipped += 1;
                        continue;
                    }
                    Some(record) => record,
                    None => store.new_record(entity),
                };
                let inserting = store.is_new_record(&record);

                let persistence_error = |source: DbError| ReconcileError::Persistence {
                    entity: entity.name().to_string(),
                    index,
                    row: format_row(row),
                    source,
                };
                store.assign(&mut record, row).map_err(persistence_error)?;

                if !self.options.quiet {
                    if let Err(e) = writeln!(out, " - {} {}", entity.name(), format_row(row)) {
                        log::warn!("Failed to write seed progress: {e}");
                    }
                }

                store.persist(&mut record, false).map_err(persistence_error)?;

                if inserting {
                    tally.inserted += 1;
                } else {
                    tally.updated += 1;
                }
                records.push(record);
            }
            Ok::<_, ReconcileError>((records, tally))
        })?;

        let sequence = repair_sequence(store, entity, &self.rows);

        Ok(ReconcileOutcome {
            records,
            inserted: tally.inserted,
            updated: tally.updated,
            skipped: tally.skipped,
            sequence,
        })
    }

    /// Equality on every constraint attribute; missing values match null.
    fn predicate(&self, row: &DesiredRow) -> Vec<(String, Value)> {
        self.constraints
            .iter()
            .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
            .collect()
    }
}

/// Reconcile `rows` into `entity` in one call.
pub fn reconcile<S: Store, C: AsRef<str>>(
    store: &S,
    entity: Arc<EntityType>,
    constraints: &[C],
    rows: Vec<DesiredRow>,
    options: ReconcileOptions,
) -> Result<ReconcileOutcome, ReconcileError> {
    SeedReconciler::new(entity, constraints, rows, options)?.reconcile(store)
}

/// Render a row as `{attr: value, ...}` for progress lines and errors.
fn format_row(row: &DesiredRow) -> String {
    let fields = row
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{fields}}}")
}

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod tests;
