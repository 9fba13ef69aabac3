//! Typed records bound to an entity type.

use crate::entity::EntityType;
use crate::error::CoreResult;
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Target attribute values for one logical seed record.
pub type DesiredRow = BTreeMap<String, Value>;

/// Whether a record exists in the store yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Allocated in memory, never written
    New,
    /// Loaded from or written to the store
    Persisted,
}

/// A single row of an [`EntityType`].
///
/// Records only hold attributes declared on their entity type; [`assign`]
/// rejects anything else. Changes since the last load or write are tracked so
/// a store can update only the columns that moved.
///
/// [`assign`]: Record::assign
#[derive(Debug, Clone)]
pub struct Record {
    entity: Arc<EntityType>,
    values: BTreeMap<String, Value>,
    state: RecordState,
    row_id: Option<i64>,
    changed: BTreeSet<String>,
}

impl Record {
    /// A new, empty record. All attributes read as unset.
    pub fn new(entity: Arc<EntityType>) -> Self {
        Self {
            entity,
            values: BTreeMap::new(),
            state: RecordState::New,
            row_id: None,
            changed: BTreeSet::new(),
        }
    }

    /// A record that already exists in the store.
    ///
    /// `row_id` is the store's physical row identity, when it has one.
    pub fn loaded(
        entity: Arc<EntityType>,
        row_id: Option<i64>,
        values: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            entity,
            values,
            state: RecordState::Persisted,
            row_id,
            changed: BTreeSet::new(),
        }
    }

    /// Entity type this record belongs to
    pub fn entity(&self) -> &Arc<EntityType> {
        &self.entity
    }

    /// Current state
    pub fn state(&self) -> RecordState {
        self.state
    }

    /// True until the record has been written
    pub fn is_new_record(&self) -> bool {
        self.state == RecordState::New
    }

    /// Store row identity
    pub fn row_id(&self) -> Option<i64> {
        self.row_id
    }

    /// Read one attribute. Unset attributes return `None`.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }

    /// All set attributes.
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Value of the primary key attribute, if the entity has one and it is set.
    pub fn primary_key_value(&self) -> Option<&Value> {
        self.entity.primary_key().and_then(|pk| self.values.get(pk))
    }

    /// Attributes assigned since the record was loaded or last persisted.
    pub fn changed_attributes(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }

    /// Whether anything needs writing.
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Overwrite attributes with `values`.
    ///
    /// Keys are resolved against the entity's declared attributes first, so
    /// either every key is applied or none is. Assigning an equal value to a
    /// persisted record does not mark it changed.
    pub fn assign(&mut self, values: &BTreeMap<String, Value>) -> CoreResult<()> {
        let normalized = self.entity.normalize_row(values)?;
        for (attribute, value) in normalized {
            let unchanged = !self.is_new_record()
                && self.values.get(&attribute).is_some_and(|v| *v == value);
            if !unchanged {
                self.changed.insert(attribute.clone());
                self.values.insert(attribute, value);
            }
        }
        Ok(())
    }

    /// Record a successful write.
    ///
    /// `stored` replaces the in-memory values when the store reports the row
    /// it actually wrote (generated keys, defaults).
    pub fn mark_persisted(&mut self, row_id: Option<i64>, stored: Option<BTreeMap<String, Value>>) {
        if let Some(values) = stored {
            self.values = values;
        }
        if row_id.is_some() {
            self.row_id = row_id;
        }
        self.state = RecordState::Persisted;
        self.changed.clear();
    }
}

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;
