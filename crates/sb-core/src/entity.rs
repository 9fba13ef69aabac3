//! Entity type descriptors.
//!
//! An [`EntityType`] describes one table as the storage layer sees it: its
//! columns, an optional single-column primary key, and an optional
//! auto-increment sequence feeding that key. Descriptors are produced by a
//! store adapter and only read by the reconciler.

use crate::error::{CoreError, CoreResult};
use crate::record::{DesiredRow, Record};
use crate::table_name::TableName;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Broad storage class of a column, derived from its SQL type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Integer types (INTEGER, BIGINT, ...)
    Integer,
    /// Floating point and fixed-point types
    Float,
    /// BOOLEAN
    Boolean,
    /// Character types
    Text,
    /// Anything else (dates, blobs, nested types); not type-checked
    Other,
}

impl ColumnKind {
    /// Classify a SQL type name such as `VARCHAR` or `DECIMAL(10,2)`.
    pub fn from_sql_type(data_type: &str) -> Self {
        let upper = data_type.trim().to_ascii_uppercase();
        let base = upper.split('(').next().unwrap_or("").trim();
        match base {
            "TINYINT" | "SMALLINT" | "INTEGER" | "INT" | "BIGINT" | "HUGEINT" | "UTINYINT"
            | "USMALLINT" | "UINTEGER" | "UBIGINT" | "INT1" | "INT2" | "INT4" | "INT8"
            | "SERIAL" | "BIGSERIAL" => ColumnKind::Integer,
            "DOUBLE" | "FLOAT" | "REAL" | "DECIMAL" | "NUMERIC" | "FLOAT4" | "FLOAT8" => {
                ColumnKind::Float
            }
            "BOOLEAN" | "BOOL" => ColumnKind::Boolean,
            "VARCHAR" | "TEXT" | "STRING" | "CHAR" | "BPCHAR" | "CHARACTER" => ColumnKind::Text,
            _ => ColumnKind::Other,
        }
    }

    /// Whether a non-null value of this kind can be stored in the column.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (ColumnKind::Other, _) => true,
            (ColumnKind::Integer, Value::Int(_)) => true,
            (ColumnKind::Float, Value::Int(_) | Value::Float(_)) => true,
            (ColumnKind::Boolean, Value::Bool(_)) => true,
            (ColumnKind::Text, Value::Text(_)) => true,
            _ => false,
        }
    }
}

/// One column of an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column (attribute) name
    pub name: String,
    /// SQL type name as reported by the store
    pub data_type: String,
    /// Whether NULL is allowed
    pub nullable: bool,
    /// Whether the store fills the column when no value is supplied
    pub has_default: bool,
}

impl Column {
    /// Create a nullable column without a default.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            has_default: false,
        }
    }

    /// Mark the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Mark the column as having a store-side default.
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// Storage class of this column.
    pub fn kind(&self) -> ColumnKind {
        ColumnKind::from_sql_type(&self.data_type)
    }
}

/// A problem found by [`EntityType::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Offending attribute
    pub attribute: String,
    /// Human-readable description
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.attribute, self.message)
    }
}

/// Descriptor of a table/collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    name: TableName,
    columns: Vec<Column>,
    primary_key: Option<String>,
    sequence: Option<String>,
}

impl EntityType {
    /// Create a descriptor with no primary key and no sequence.
    pub fn new(name: TableName, columns: Vec<Column>) -> Self {
        Self {
            name,
            columns,
            primary_key: None,
            sequence: None,
        }
    }

    /// Set the primary key attribute.
    pub fn with_primary_key(mut self, attribute: impl Into<String>) -> Self {
        self.primary_key = Some(attribute.into());
        self
    }

    /// Set the sequence that generates primary key values.
    pub fn with_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.sequence = Some(sequence.into());
        self
    }

    /// Table name
    pub fn name(&self) -> &TableName {
        &self.name
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by exact name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary key attribute name, if the table has a single-column key
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Auto-increment sequence name, if any
    pub fn sequence(&self) -> Option<&str> {
        self.sequence.as_deref()
    }

    /// Known attribute names in declaration order.
    pub fn known_attributes(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Whether `name` is exactly a declared attribute.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Resolve a caller-supplied key to a declared attribute name.
    ///
    /// Exact matches win; otherwise an ASCII case-insensitive match is used,
    /// mirroring how SQL folds unquoted identifiers.
    pub fn resolve_attribute(&self, key: &str) -> Option<&str> {
        let key = key.trim();
        self.column(key)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(key))
            })
            .map(|c| c.name.as_str())
    }

    /// Rewrite a row's keys to declared attribute names.
    pub fn normalize_row(&self, row: &DesiredRow) -> CoreResult<DesiredRow> {
        let mut normalized = DesiredRow::new();
        for (key, value) in row {
            let attribute = self
                .resolve_attribute(key)
                .ok_or_else(|| self.unknown_attribute(key))?;
            if normalized
                .insert(attribute.to_string(), value.clone())
                .is_some()
            {
                return Err(CoreError::DuplicateAttribute {
                    entity: self.name.to_string(),
                    attribute: attribute.to_string(),
                });
            }
        }
        Ok(normalized)
    }

    /// Build the [`CoreError::UnknownAttribute`] error for `attribute`.
    pub fn unknown_attribute(&self, attribute: &str) -> CoreError {
        CoreError::UnknownAttribute {
            entity: self.name.to_string(),
            attribute: attribute.to_string(),
            known: self.known_attributes().join(", "),
        }
    }

    /// Allocate a fresh, unpersisted record of this type.
    pub fn new_record(self: &Arc<Self>) -> Record {
        Record::new(Arc::clone(self))
    }

    /// Check a record against column nullability and types.
    ///
    /// Only attributes the store will actually receive are type-checked; a
    /// NOT NULL column is reported when the record leaves it null and the
    /// store has no default to fill it. The primary key of a new record is
    /// exempt when a sequence supplies it.
    pub fn validate(&self, record: &Record) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for column in &self.columns {
            let value = record.get(&column.name).unwrap_or(&Value::Null);
            let generated = record.is_new_record()
                && self.primary_key() == Some(column.name.as_str())
                && self.sequence.is_some();
            if value.is_null() && !column.nullable && !column.has_default && !generated {
                issues.push(ValidationIssue {
                    attribute: column.name.clone(),
                    message: "can't be null".to_string(),
                });
            } else if !column.kind().accepts(value) {
                issues.push(ValidationIssue {
                    attribute: column.name.clone(),
                    message: format!(
                        "expects {} but got {} value {}",
                        column.data_type,
                        value.kind(),
                        value
                    ),
                });
            }
        }
        issues
    }
}

#[cfg(test)]
#[path = "entity_test.rs"]
mod tests;
