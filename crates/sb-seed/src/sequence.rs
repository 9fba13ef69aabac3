//! Post-commit sequence repair.
//!
//! Seed rows may carry explicit primary-key values. A store that generates
//! keys from a sequence does not notice those values, so after seeding its
//! next generated key can collide with a seeded one. Repair moves the
//! sequence past the table's maximum key whenever a seeded key is ahead of
//! what the sequence has emitted.

use crate::error::SequenceRepairWarning;
use sb_core::{DesiredRow, EntityType};
use sb_db::{DbError, Store};

/// What sequence repair did after a reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceRepair {
    /// Store has no sequence capability, or the entity has no key/sequence
    NotApplicable,
    /// No desired row supplied a primary key value
    NoSeededIds,
    /// The sequence was already at or past every seeded key
    Unchanged { last_value: i64 },
    /// The sequence was moved to the table's maximum key
    Resynced {
        max_seeded_id: i64,
        previous: Option<i64>,
    },
    /// Repair failed; the reconciled rows stay committed
    Failed(SequenceRepairWarning),
}

impl SequenceRepair {
    /// The warning, if repair failed
    pub fn warning(&self) -> Option<&SequenceRepairWarning> {
        match self {
            SequenceRepair::Failed(warning) => Some(warning),
            _ => None,
        }
    }
}

/// Largest integer primary key value supplied across `rows`.
///
/// Rows are expected to carry declared attribute names. Rows without the
/// key, or with a non-integer value under it, do not count.
pub fn max_seeded_id(entity: &EntityType, rows: &[DesiredRow]) -> Option<i64> {
    let pk = entity.primary_key()?;
    rows.iter()
        .filter_map(|row| row.get(pk).and_then(|v| v.as_i64()))
        .max()
}

/// Repair `entity`'s sequence after `rows` were committed.
pub(crate) fn repair_sequence<S: Store>(
    store: &S,
    entity: &EntityType,
    rows: &[DesiredRow],
) -> SequenceRepair {
    let Some(sequences) = store.sequence_support() else {
        return SequenceRepair::NotApplicable;
    };
    let (Some(_), Some(sequence)) = (entity.primary_key(), entity.sequence()) else {
        return SequenceRepair::NotApplicable;
    };
    let Some(max_seeded_id) = max_seeded_id(entity, rows) else {
        return SequenceRepair::NoSeededIds;
    };

    let previous = match sequences.last_sequence_value(entity) {
        Ok(value) => value,
        Err(e) => return failed(entity, sequence, e),
    };
    // A sequence that never emitted a value is always resynced.
    if let Some(last_value) = previous {
        if max_seeded_id <= last_value {
            return SequenceRepair::Unchanged { last_value };
        }
    }

    match sequences.resync_sequence_to_table_max(entity) {
        Ok(()) => {
            log::debug!(
                "Resynced sequence {sequence} of {} (seeded up to {max_seeded_id}, was {previous:?})",
                entity.name()
            );
            SequenceRepair::Resynced {
                max_seeded_id,
                previous,
            }
        }
        Err(e) => failed(entity, sequence, e),
    }
}

fn failed(entity: &EntityType, sequence: &str, err: DbError) -> SequenceRepair {
    let warning = SequenceRepairWarning {
        entity: entity.name().to_string(),
        sequence: sequence.to_string(),
        message: err.to_string(),
    };
    log::warn!("{warning}");
    SequenceRepair::Failed(warning)
}

#[cfg(test)]
#[path = "sequence_test.rs"]
mod tests;
