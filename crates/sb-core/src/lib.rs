//! sb-core - Core library for Seedbed
//!
//! This crate provides the shared types used across all Seedbed components:
//! entity descriptors, typed records and values, project configuration, and
//! seed document discovery.

pub mod config;
pub mod entity;
pub mod error;
mod newtype_string;
pub mod project;
pub mod record;
pub mod seed;
pub mod seed_name;
pub mod table_name;
pub mod value;

pub use config::{Config, DatabaseConfig};
pub use entity::{Column, ColumnKind, EntityType, ValidationIssue};
pub use error::{CoreError, CoreResult};
pub use project::Project;
pub use record::{DesiredRow, Record, RecordState};
pub use seed::{discover_seeds, SeedDocument};
pub use seed_name::SeedName;
pub use table_name::TableName;
pub use value::Value;
