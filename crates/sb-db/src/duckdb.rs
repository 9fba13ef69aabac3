//! DuckDB store implementation

use crate::error::{DbError, DbResult};
use crate::sql::{param_expr, parse_sequence_default, quote_ident, quote_literal, quote_table, read_expr};
use crate::traits::{check_record, SequenceAware, Store};
use duckdb::types::Value as DuckValue;
use duckdb::{params_from_iter, Connection};
use sb_core::{Column, EntityType, Record, TableName, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const DEFAULT_SCHEMA: &str = "main";

/// Upper bound on `nextval` calls a single sequence resync may issue
const MAX_RESYNC_STEPS: i64 = 10_000_000;

/// DuckDB-backed store
///
/// Rows are identified by DuckDB's `rowid` pseudo-column, so tables without a
/// primary key can be reconciled too.
pub struct DuckDbStore {
    conn: Mutex<Connection>,
}

/// Sequence metadata from `duckdb_sequences()`
struct SequenceInfo {
    start_value: i64,
    increment_by: i64,
    last_value: Option<i64>,
}

impl DuckDbStore {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute one or more SQL statements
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(DbError::from)
    }

    /// Count the rows a query returns
    pub fn query_count(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM ({sql})"), [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }

    fn schema_and_table(name: &TableName) -> (&str, &str) {
        let (schema, table) = name.parts();
        (schema.unwrap_or(DEFAULT_SCHEMA), table)
    }

    fn primary_key_columns(conn: &Connection, schema: &str, table: &str) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT unnest(constraint_column_names) FROM duckdb_constraints() \
             WHERE database_name = current_database() \
               AND lower(schema_name) = lower(?) AND lower(table_name) = lower(?) \
               AND constraint_type = 'PRIMARY KEY'",
        )?;
        let columns = stmt
            .query_map(duckdb::params![schema, table], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    fn sequence_info(&self, entity: &EntityType, sequence: &str) -> DbResult<SequenceInfo> {
        let (schema, name) = match sequence.rsplit_once('.') {
            Some((schema, name)) => (schema, name),
            None => (Self::schema_and_table(entity.name()).0, sequence),
        };
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT start_value, increment_by, last_value FROM duckdb_sequences() \
             WHERE database_name = current_database() \
               AND lower(schema_name) = lower(?) AND lower(sequence_name) = lower(?)",
        )?;
        let mut rows = stmt.query(duckdb::params![schema, name])?;
        match rows.next()? {
            Some(row) => Ok(SequenceInfo {
                start_value: row.get(0)?,
                increment_by: row.get(1)?,
                last_value: row.get(2)?,
            }),
            None => Err(DbError::Internal(format!(
                "sequence '{sequence}' of {} not found",
                entity.name()
            ))),
        }
    }

    fn insert(&self, record: &mut Record) -> DbResult<()> {
        let entity = Arc::clone(record.entity());
        let set: Vec<&Column> = entity
            .columns()
            .iter()
            .filter(|c| record.get(&c.name).is_some())
            .collect();
        let returning = entity
            .columns()
            .iter()
            .map(read_expr)
            .collect::<Vec<_>>()
            .join(", ");

        let sql = if set.is_empty() {
            format!(
                "INSERT INTO {} DEFAULT VALUES RETURNING {returning}",
                quote_table(entity.name())
            )
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING {returning}",
                quote_table(entity.name()),
                set.iter()
                    .map(|c| quote_ident(&c.name))
                    .collect::<Vec<_>>()
                    .join(", "),
                set.iter()
                    .map(|c| param_expr(c))
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        };
        let params: Vec<DuckValue> = set
            .iter()
            .map(|c| to_duck(record.get(&c.name).unwrap_or(&Value::Null)))
            .collect();
        log::debug!("{sql}");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(params))?;
        let row = rows
            .next()?
            .ok_or_else(|| DbError::Internal(format!("INSERT into {} returned no row", entity.name())))?;
        let stored = read_values(row, entity.columns(), 0)?;
        record.mark_persisted(None, Some(stored));
        Ok(())
    }

    fn update(&self, record: &mut Record) -> DbResult<()> {
        if !record.has_changes() {
            return Ok(());
        }
        let entity = Arc::clone(record.entity());
        let changed: Vec<&Column> = record
            .changed_attributes()
            .filter_map(|a| entity.column(a))
            .collect();

        let (identity_sql, identity) = match (record.row_id(), record.primary_key_value()) {
            (Some(row_id), _) => ("rowid = ?".to_string(), DuckValue::BigInt(row_id)),
            (None, Some(pk)) => {
                let column = entity.primary_key().unwrap_or_default();
                (format!("{} = ?", quote_ident(column)), to_duck(pk))
            }
            (None, None) => {
                return Err(DbError::Internal(format!(
                    "cannot update {} record without row identity",
                    entity.name()
                )))
            }
        };

        let sql = format!(
            "UPDATE {} SET {} WHERE {identity_sql}",
            quote_table(entity.name()),
            changed
                .iter()
                .map(|c| format!("{} = {}", quote_ident(&c.name), param_expr(c)))
                .collect::<Vec<_>>()
                .join(", "),
        );
        let mut params: Vec<DuckValue> = changed
            .iter()
            .map(|c| to_duck(record.get(&c.name).unwrap_or(&Value::Null)))
            .collect();
        params.push(identity);
        log::debug!("{sql}");

        let affected = {
            let conn = self.lock()?;
            conn.execute(&sql, params_from_iter(params))?
        };
        if affected != 1 {
            return Err(DbError::Internal(format!(
                "UPDATE of {} record affected {affected} rows",
                entity.name()
            )));
        }
        record.mark_persisted(None, None);
        Ok(())
    }
}

impl Store for DuckDbStore {
    fn store_type(&self) -> &'static str {
        "duckdb"
    }

    fn describe(&self, table: &TableName) -> DbResult<EntityType> {
        let (schema, bare) = Self::schema_and_table(table);
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT column_name, data_type, is_nullable, column_default \
             FROM information_schema.columns \
             WHERE table_catalog = current_database() \
               AND lower(table_schema) = lower(?) AND lower(table_name) = lower(?) \
             ORDER BY ordinal_position",
        )?;
        let rows = stmt
            .query_map(duckdb::params![schema, bare], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        if rows.is_empty() {
            return Err(DbError::TableNotFound(table.to_string()));
        }

        let mut columns = Vec::with_capacity(rows.len());
        let mut defaults = BTreeMap::new();
        for (name, data_type, is_nullable, default) in rows {
            columns.push(Column {
                name: name.clone(),
                data_type,
                nullable: is_nullable.eq_ignore_ascii_case("YES"),
                has_default: default.is_some(),
            });
            if let Some(default) = default {
                defaults.insert(name, default);
            }
        }

        let mut entity = EntityType::new(table.clone(), columns);
        let key = Self::primary_key_columns(&conn, schema, bare)?;
        // Composite keys have no single attribute to seed or sequence.
        if let [pk] = key.as_slice() {
            entity = entity.with_primary_key(pk.clone());
            if let Some(sequence) = defaults.get(pk).and_then(|d| parse_sequence_default(d)) {
                entity = entity.with_sequence(sequence);
            }
        }
        Ok(entity)
    }

    fn find_one(
        &self,
        entity: &Arc<EntityType>,
        predicate: &[(String, Value)],
    ) -> DbResult<Option<Record>> {
        let mut clauses = Vec::with_capacity(predicate.len());
        let mut params = Vec::with_capacity(predicate.len());
        for (attribute, value) in predicate {
            let column = entity
                .column(attribute)
                .ok_or_else(|| DbError::Record(entity.unknown_attribute(attribute)))?;
            clauses.push(format!("{} IS NOT DISTINCT FROM ?", read_expr(column)));
            params.push(to_duck(value));
        }

        let select = entity
            .columns()
            .iter()
            .map(read_expr)
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("SELECT rowid, {select} FROM {}", quote_table(entity.name()));
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" LIMIT 1");
        log::debug!("{sql}");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(params))?;
        match rows.next()? {
            Some(row) => {
                let row_id: i64 = row.get(0)?;
                let values = read_values(row, entity.columns(), 1)?;
                Ok(Some(Record::loaded(Arc::clone(entity), Some(row_id), values)))
            }
            None => Ok(None),
        }
    }

    fn persist(&self, record: &mut Record, validate: bool) -> DbResult<()> {
        if validate {
            check_record(record)?;
        }
        if record.is_new_record() {
            self.insert(record)
        } else {
            self.update(record)
        }
    }

    fn transaction<T, E, F>(&self, entity: &EntityType, body: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<DbError>,
    {
        log::debug!("BEGIN TRANSACTION ({})", entity.name());
        self.lock()?
            .execute_batch("BEGIN TRANSACTION")
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;

        let result = body(self);

        let conn = self.lock()?;
        match &result {
            Ok(_) => {
                if let Err(commit_err) = conn.execute_batch("COMMIT") {
                    let _ = conn.execute_batch("ROLLBACK");
                    return Err(DbError::TransactionError(format!("COMMIT failed: {commit_err}")).into());
                }
            }
            Err(_) => {
                log::debug!("ROLLBACK ({})", entity.name());
                let _ = conn.execute_batch("ROLLBACK");
            }
        }
        result
    }

    fn sequence_support(&self) -> Option<&dyn SequenceAware> {
        Some(self)
    }
}

impl SequenceAware for DuckDbStore {
    fn last_sequence_value(&self, entity: &EntityType) -> DbResult<Option<i64>> {
        match entity.sequence() {
            Some(sequence) => Ok(self.sequence_info(entity, sequence)?.last_value),
            None => Ok(None),
        }
    }

    fn resync_sequence_to_table_max(&self, entity: &EntityType) -> DbResult<()> {
        let (Some(pk), Some(sequence)) = (entity.primary_key(), entity.sequence()) else {
            return Ok(());
        };

        let max_id: Option<i64> = {
            let conn = self.lock()?;
            conn.query_row(
                &format!(
                    "SELECT MAX({}) FROM {}",
                    quote_ident(pk),
                    quote_table(entity.name())
                ),
                [],
                |row| row.get(0),
            )?
        };
        let Some(max_id) = max_id else {
            return Ok(());
        };

        let info = self.sequence_info(entity, sequence)?;
        let Some(steps) = resync_steps(&info, sequence, max_id)? else {
            return Ok(());
        };

        // DuckDB has no setval; advance the counter until it reaches the
        // table max.
        let sql = format!(
            "SELECT max(nextval({})) FROM range({steps})",
            quote_literal(sequence)
        );
        log::debug!("{sql}");
        let last: Option<i64> = {
            let conn = self.lock()?;
            conn.query_row(&sql, [], |row| row.get(0))?
        };
        log::debug!("Advanced sequence '{sequence}' by {steps} to {last:?}");
        Ok(())
    }
}

/// Number of `nextval` calls that move `info` to at least `max_id`, or
/// `None` when the sequence is already there.
fn resync_steps(info: &SequenceInfo, sequence: &str, max_id: i64) -> DbResult<Option<i64>> {
    let overflow = || {
        DbError::Internal(format!(
            "sequence '{sequence}' cannot be advanced to {max_id}: arithmetic overflow"
        ))
    };
    if info.increment_by <= 0 {
        return Err(DbError::Internal(format!(
            "sequence '{sequence}' has non-positive increment {}",
            info.increment_by
        )));
    }
    let current = match info.last_value {
        Some(last) => last,
        None => info
            .start_value
            .checked_sub(info.increment_by)
            .ok_or_else(overflow)?,
    };
    if current >= max_id {
        return Ok(None);
    }

    let distance = max_id.checked_sub(current).ok_or_else(overflow)?;
    let steps = distance / info.increment_by + i64::from(distance % info.increment_by != 0);
    if steps > MAX_RESYNC_STEPS {
        return Err(DbError::Internal(format!(
            "sequence '{sequence}' would need {steps} nextval calls to reach {max_id} \
             (limit {MAX_RESYNC_STEPS}); advance it manually"
        )));
    }
    Ok(Some(steps))
}

fn to_duck(value: &Value) -> DuckValue {
    match value {
        Value::Null => DuckValue::Null,
        Value::Bool(b) => DuckValue::Boolean(*b),
        Value::Int(n) => DuckValue::BigInt(*n),
        Value::Float(x) => DuckValue::Double(*x),
        Value::Text(s) => DuckValue::Text(s.clone()),
    }
}

fn from_duck(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(n) => Value::Int(i64::from(n)),
        DuckValue::SmallInt(n) => Value::Int(i64::from(n)),
        DuckValue::Int(n) => Value::Int(i64::from(n)),
        DuckValue::BigInt(n) => Value::Int(n),
        DuckValue::UTinyInt(n) => Value::Int(i64::from(n)),
        DuckValue::USmallInt(n) => Value::Int(i64::from(n)),
        DuckValue::UInt(n) => Value::Int(i64::from(n)),
        DuckValue::UBigInt(n) => i64::try_from(n).map_or_else(|_| Value::Text(n.to_string()), Value::Int),
        DuckValue::HugeInt(n) => i64::try_from(n).map_or_else(|_| Value::Text(n.to_string()), Value::Int),
        DuckValue::Float(x) => Value::Float(f64::from(x)),
        DuckValue::Double(x) => Value::Float(x),
        DuckValue::Text(s) => Value::Text(s),
        other => Value::Text(format!("{other:?}")),
    }
}

/// Read `columns` from `row`, starting at column index `offset`
fn read_values(
    row: &duckdb::Row<'_>,
    columns: &[Column],
    offset: usize,
) -> DbResult<BTreeMap<String, Value>> {
    let mut values = BTreeMap::new();
    for (i, column) in columns.iter().enumerate() {
        let raw: DuckValue = row.get(offset + i)?;
        values.insert(column.name.clone(), from_duck(raw));
    }
    Ok(values)
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
