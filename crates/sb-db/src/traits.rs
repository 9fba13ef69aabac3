//! Store trait definitions
//!
//! [`Store`] is the minimal CRUD + transaction surface the seed reconciler
//! needs. Stores that keep an explicit auto-increment sequence per table
//! additionally expose [`SequenceAware`] through
//! [`Store::sequence_support`].

use crate::error::{DbError, DbResult};
use sb_core::{DesiredRow, EntityType, Record, TableName, Value};
use std::sync::Arc;

/// Storage abstraction for Seedbed
///
/// Implementations must be Send + Sync.
pub trait Store: Send + Sync {
    /// Store type identifier for logging
    fn store_type(&self) -> &'static str;

    /// Describe a table: its attributes, primary key and sequence
    fn describe(&self, table: &TableName) -> DbResult<EntityType>;

    /// Find one record whose attributes equal `predicate`.
    ///
    /// `Value::Null` in the predicate matches a null attribute. When several
    /// records match, the first in store-native order is returned.
    fn find_one(
        &self,
        entity: &Arc<EntityType>,
        predicate: &[(String, Value)],
    ) -> DbResult<Option<Record>>;

    /// Allocate a new, unpersisted record with every attribute unset
    fn new_record(&self, entity: &Arc<EntityType>) -> Record {
        entity.new_record()
    }

    /// Overwrite attributes on `record`; only declared attributes are accepted
    fn assign(&self, record: &mut Record, values: &DesiredRow) -> DbResult<()> {
        record.assign(values).map_err(DbError::from)
    }

    /// Write `record`, inserting or updating as needed.
    ///
    /// With `validate` false only the store's own constraints apply.
    fn persist(&self, record: &mut Record, validate: bool) -> DbResult<()>;

    /// Run `body` in a transaction: commit on `Ok`, roll back on `Err`.
    fn transaction<T, E, F>(&self, entity: &EntityType, body: F) -> Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<DbError>;

    /// Whether `record` has never been written
    fn is_new_record(&self, record: &Record) -> bool {
        record.is_new_record()
    }

    /// Sequence capability, if this store keeps explicit sequences
    fn sequence_support(&self) -> Option<&dyn SequenceAware> {
        None
    }
}

/// Optional capability for stores with explicit auto-increment sequences
pub trait SequenceAware {
    /// Last value the entity's sequence emitted, `None` if it never has
    fn last_sequence_value(&self, entity: &EntityType) -> DbResult<Option<i64>>;

    /// Move the entity's sequence so its next value follows the table's
    /// current maximum primary key
    fn resync_sequence_to_table_max(&self, entity: &EntityType) -> DbResult<()>;
}

/// Fail with a validation error if `record` does not satisfy its entity type
pub(crate) fn check_record(record: &Record) -> DbResult<()> {
    let entity = record.entity();
    let issues = entity.validate(record);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(DbError::ValidationFailed {
            entity: entity.name().to_string(),
            issues,
        })
    }
}
