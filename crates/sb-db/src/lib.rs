//! sb-db - Storage abstraction layer for Seedbed
//!
//! This crate provides the [`Store`] trait the seed reconciler runs against,
//! the optional [`SequenceAware`] capability, and two implementations: a
//! DuckDB-backed store and an in-memory store.

pub mod duckdb;
pub mod error;
pub mod memory;
pub(crate) mod sql;
pub mod traits;

pub use crate::duckdb::DuckDbStore;
pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use traits::{SequenceAware, Store};
