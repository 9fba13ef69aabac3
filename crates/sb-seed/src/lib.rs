//! sb-seed - Seed reconciliation for Seedbed
//!
//! Given a table, the attributes that identify a seed row, and the desired
//! rows, [`SeedReconciler`] updates matching rows in place and inserts the
//! rest inside one transaction, then repairs the table's primary-key
//! sequence when the store keeps one.

pub mod error;
pub mod reconciler;
pub mod sequence;

pub use error::{ReconcileError, SequenceRepairWarning};
pub use reconciler::{reconcile, ReconcileOptions, ReconcileOutcome, SeedReconciler};
pub use sequence::{max_seeded_id, SequenceRepair};
