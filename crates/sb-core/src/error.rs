//! Error types for sb-core

use thiserror::Error;

/// Core error type for Seedbed
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Invalid configuration value
    #[error("[E002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E003: Project directory not found
    #[error("[E003] Project directory not found: {path}")]
    ProjectNotFound { path: String },

    /// E004: Attribute is not declared on the entity type
    #[error("[E004] Unknown attribute '{attribute}' on {entity} (known attributes: {known})")]
    UnknownAttribute {
        entity: String,
        attribute: String,
        known: String,
    },

    /// E005: Two keys of one row resolve to the same attribute
    #[error("[E005] Attribute '{attribute}' supplied more than once for {entity}")]
    DuplicateAttribute { entity: String, attribute: String },

    /// E006: Seed document could not be interpreted
    #[error("[E006] Invalid seed file {path}: {message}")]
    SeedParseError { path: String, message: String },

    /// E007: Two seed documents share a name
    #[error("[E007] Duplicate seed name '{name}' in {path1} and {path2}")]
    DuplicateSeed {
        name: String,
        path1: String,
        path2: String,
    },

    /// E008: IO error
    #[error("[E008] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E009: IO error with file path context
    #[error("[E009] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E010: YAML parse error
    #[error("[E010] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
