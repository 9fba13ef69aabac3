//! Seed document representation and discovery
//!
//! A seed document is a YAML or JSON file describing the desired rows of one
//! table together with how those rows are matched against existing data.
//!
//! ```yaml
//! table: countries
//! constraints: [code]
//! rows:
//!   - { code: US, name: United States }
//!   - { code: CA, name: Canada }
//! ```

use crate::error::{CoreError, CoreResult};
use crate::record::DesiredRow;
use crate::seed_name::SeedName;
use crate::table_name::TableName;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SEED_EXTENSIONS: [&str; 3] = ["yml", "yaml", "json"];

/// On-disk shape of a seed document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedFile {
    #[serde(default)]
    table: Option<String>,
    #[serde(default)]
    schema: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    constraints: Vec<String>,
    #[serde(default)]
    insert_only: bool,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    rows: Vec<DesiredRow>,
}

fn default_true() -> bool {
    true
}

/// A loaded seed document
#[derive(Debug, Clone, Serialize)]
pub struct SeedDocument {
    /// Seed name (file stem)
    pub name: SeedName,

    /// Path to the source file
    pub path: PathBuf,

    /// Target table; defaults to the seed name
    pub table: Option<String>,

    /// Target schema override
    pub schema: Option<String>,

    /// Free-form description
    pub description: Option<String>,

    /// Attributes that identify a row; empty means "primary key"
    pub constraints: Vec<String>,

    /// Never modify rows that already exist
    pub insert_only: bool,

    /// Enable/disable this seed
    pub enabled: bool,

    /// Desired rows in file order
    pub rows: Vec<DesiredRow>,
}

impl SeedDocument {
    /// Load a seed document, choosing the parser from the file extension.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(SeedName::try_new)
            .ok_or_else(|| CoreError::SeedParseError {
                path: path.display().to_string(),
                message: "Invalid file name".to_string(),
            })?;

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;

        let parse_error = |message: String| CoreError::SeedParseError {
            path: path.display().to_string(),
            message,
        };
        let file: SeedFile = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
            _ => serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        };

        if file.table.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(parse_error("'table' cannot be empty".to_string()));
        }

        Ok(Self {
            name,
            path: path.to_path_buf(),
            table: file.table,
            schema: file.schema,
            description: file.description,
            constraints: file.constraints,
            insert_only: file.insert_only,
            enabled: file.enabled,
            rows: file.rows,
        })
    }

    /// Check if this seed is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Target table name without schema
    pub fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(self.name.as_str())
    }

    /// Get the qualified table name (schema.table or just table)
    ///
    /// A table already written as `schema.table` is used verbatim.
    pub fn qualified_table(&self, default_schema: Option<&str>) -> TableName {
        let table = self.table_name();
        if table.contains('.') {
            return TableName::new(table);
        }
        TableName::qualified(self.schema.as_deref().or(default_schema), table)
    }
}

/// Discover all seed documents in the given paths, sorted by name
pub fn discover_seeds(seed_paths: &[PathBuf]) -> CoreResult<Vec<SeedDocument>> {
    let mut files = Vec::new();
    for seed_path in seed_paths {
        if !seed_path.exists() {
            log::debug!("Seed path {} does not exist, skipping", seed_path.display());
            continue;
        }
        collect_seed_files(seed_path, &mut files);
    }

    let mut seeds = files
        .iter()
        .map(|p| SeedDocument::load(p))
        .collect::<CoreResult<Vec<_>>>()?;
    seeds.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));

    for pair in seeds.windows(2) {
        if pair[0].name == pair[1].name {
            return Err(CoreError::DuplicateSeed {
                name: pair[0].name.to_string(),
                path1: pair[0].path.display().to_string(),
                path2: pair[1].path.display().to_string(),
            });
        }
    }
    Ok(seeds)
}

fn collect_seed_files(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot read {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_seed_files(&path, files);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SEED_EXTENSIONS.contains(&e))
        {
            files.push(path);
        }
    }
}

#[cfg(test)]
#[path = "seed_test.rs"]
mod tests;
