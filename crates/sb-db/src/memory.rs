//! In-memory store implementation
//!
//! Tables live in a `BTreeMap` behind a mutex. Transactions snapshot every
//! table on begin and restore the snapshot on rollback. The store enforces
//! NOT NULL, column types, primary key uniqueness and any extra unique keys
//! registered with [`MemoryStore::add_unique_key`], but keeps no sequences,
//! so it does not offer [`SequenceAware`](crate::SequenceAware).

use crate::error::{DbError, DbResult};
use crate::traits::{check_record, Store};
use sb_core::{EntityType, Record, TableName, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

type Row = BTreeMap<String, Value>;

#[derive(Debug, Clone)]
struct MemoryTable {
    entity: EntityType,
    unique_keys: Vec<Vec<String>>,
    rows: BTreeMap<i64, Row>,
    next_row_id: i64,
}

impl MemoryTable {
    fn check_constraints(&self, row: &Row, row_id: Option<i64>) -> DbResult<()> {
        let name = self.entity.name();
        for column in self.entity.columns() {
            let value = row.get(&column.name).unwrap_or(&Value::Null);
            if value.is_null() && !column.nullable {
                return Err(DbError::ConstraintViolation(format!(
                    "NOT NULL constraint failed: {name}.{}",
                    column.name
                )));
            }
            if !column.kind().accepts(value) {
                return Err(DbError::ConstraintViolation(format!(
                    "cannot store {} value {value} in {name}.{} ({})",
                    value.kind(),
                    column.name,
                    column.data_type
                )));
            }
        }

        let primary = self.entity.primary_key().map(|pk| vec![pk.to_string()]);
        for key in primary.iter().chain(self.unique_keys.iter()) {
            let candidate: Vec<&Value> = key
                .iter()
                .map(|a| row.get(a).unwrap_or(&Value::Null))
                .collect();
            // NULLs never collide, as in SQL.
            if candidate.iter().any(|v| v.is_null()) {
                continue;
            }
            let duplicate = self.rows.iter().any(|(id, other)| {
                Some(*id) != row_id
                    && key
                        .iter()
                        .zip(&candidate)
                        .all(|(a, v)| other.get(a).is_some_and(|o| o.matches(v)))
            });
            if duplicate {
                return Err(DbError::ConstraintViolation(format!(
                    "duplicate key ({}) = ({}) violates unique constraint on {name}",
                    key.join(", "),
                    candidate
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: BTreeMap<String, MemoryTable>,
    snapshot: Option<BTreeMap<String, MemoryTable>>,
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Create (or replace) a table
    pub fn create_table(&self, entity: EntityType) -> DbResult<()> {
        let mut state = self.lock()?;
        state.tables.insert(
            entity.name().to_string(),
            MemoryTable {
                entity,
                unique_keys: Vec::new(),
                rows: BTreeMap::new(),
                next_row_id: 0,
            },
        );
        Ok(())
    }

    /// Register a unique key over `attributes`
    pub fn add_unique_key(&self, table: &str, attributes: &[&str]) -> DbResult<()> {
        let mut state = self.lock()?;
        let table = state
            .tables
            .get_mut(table)
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))?;
        table
            .unique_keys
            .push(attributes.iter().map(|a| a.to_string()).collect());
        Ok(())
    }

    /// Insert a row directly, bypassing records. Constraints still apply.
    pub fn insert_row(&self, table: &str, row: Row) -> DbResult<i64> {
        let mut state = self.lock()?;
        let table = state
            .tables
            .get_mut(table)
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))?;
        let row = table.entity.normalize_row(&row)?;
        table.check_constraints(&row, None)?;
        let row_id = table.next_row_id;
        table.next_row_id += 1;
        table.rows.insert(row_id, row);
        Ok(row_id)
    }

    /// All rows of a table in insertion order
    pub fn rows(&self, table: &str) -> DbResult<Vec<Row>> {
        let state = self.lock()?;
        let table = state
            .tables
            .get(table)
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))?;
        Ok(table.rows.values().cloned().collect())
    }

    /// Number of rows in a table
    pub fn row_count(&self, table: &str) -> DbResult<usize> {
        Ok(self.rows(table)?.len())
    }
}

impl Store for MemoryStore {
    fn store_type(&self) -> &'static str {
        "memory"
    }

    fn describe(&self, table: &TableName) -> DbResult<EntityType> {
        let state = self.lock()?;
        state
            .tables
            .get(table.as_str())
            .map(|t| t.entity.clone())
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))
    }

    fn find_one(
        &self,
        entity: &Arc<EntityType>,
        predicate: &[(String, Value)],
    ) -> DbResult<Option<Record>> {
        for (attribute, _) in predicate {
            if !entity.has_attribute(attribute) {
                return Err(DbError::Record(entity.unknown_attribute(attribute)));
            }
        }

        let state = self.lock()?;
        let table = state
            .tables
            .get(entity.name().as_str())
            .ok_or_else(|| DbError::TableNotFound(entity.name().to_string()))?;
        let found = table.rows.iter().find(|(_, row)| {
            predicate
                .iter()
                .all(|(a, v)| row.get(a).unwrap_or(&Value::Null).matches(v))
        });
        Ok(found.map(|(id, row)| Record::loaded(Arc::clone(entity), Some(*id), row.clone())))
    }

    fn persist(&self, record: &mut Record, validate: bool) -> DbResult<()> {
        if validate {
            check_record(record)?;
        }

        let mut state = self.lock()?;
        let name = record.entity().name().to_string();
        let table = state
            .tables
            .get_mut(&name)
            .ok_or_else(|| DbError::TableNotFound(name.clone()))?;

        let mut row: Row = table
            .entity
            .columns()
            .iter()
            .map(|c| (c.name.clone(), Value::Null))
            .collect();
        row.extend(record.values().iter().map(|(k, v)| (k.clone(), v.clone())));

        if record.is_new_record() {
            table.check_constraints(&row, None)?;
            let row_id = table.next_row_id;
            table.next_row_id += 1;
            table.rows.insert(row_id, row.clone());
            record.mark_persisted(Some(row_id), Some(row));
        } else {
            let row_id = record.row_id().ok_or_else(|| {
                DbError::Internal(format!("cannot update {name} record without row identity"))
            })?;
            if !table.rows.contains_key(&row_id) {
                return Err(DbError::Internal(format!(
                    "{name} row {row_id} no longer exists"
                )));
            }
            table.check_constraints(&row, Some(row_id))?;
            table.rows.insert(row_id, row);
            record.mark_persisted(None, None);
        }
        Ok(())
    }

    fn transaction<T, E, F>(&self, entity: &EntityType, body: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<DbError>,
    {
        {
            let mut state = self.lock()?;
            if state.snapshot.is_some() {
                return Err(DbError::TransactionError(format!(
                    "transaction already open ({})",
                    entity.name()
                ))
                .into());
            }
            state.snapshot = Some(state.tables.clone());
        }

        let result = body(self);

        let mut state = self.lock()?;
        let snapshot = state.snapshot.take();
        if result.is_err() {
            if let Some(tables) = snapshot {
                state.tables = tables;
            }
        }
        result
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
