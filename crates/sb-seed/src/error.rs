//! Error types for sb-seed

use sb_db::DbError;
use thiserror::Error;

/// Reconciliation errors
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Invalid reconciler input, raised before the store is touched (S001)
    #[error("[S001] Invalid seed configuration for {entity}: {message}")]
    Configuration { entity: String, message: String },

    /// The store rejected a write; the whole batch was rolled back (S002)
    #[error("[S002] Failed to persist {entity} row {index} {row}: {source}")]
    Persistence {
        entity: String,
        index: usize,
        row: String,
        #[source]
        source: DbError,
    },

    /// Looking up an existing row failed; the batch was rolled back (S003)
    #[error("[S003] Failed to look up {entity} row {index} {row}: {source}")]
    Lookup {
        entity: String,
        index: usize,
        row: String,
        #[source]
        source: DbError,
    },

    /// Store failure outside a single row (describe, begin, commit) (S004)
    #[error("[S004] {0}")]
    Store(#[from] DbError),
}

/// Non-fatal failure of the post-commit sequence repair
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[W001] Sequence repair failed for {entity} ({sequence}): {message}")]
pub struct SequenceRepairWarning {
    /// Entity whose sequence could not be repaired
    pub entity: String,
    /// Sequence name
    pub sequence: String,
    /// Underlying store error
    pub message: String,
}
