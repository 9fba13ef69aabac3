//! Configuration types and parsing for seedbed.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main project configuration from seedbed.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Directories containing seed documents
    #[serde(default = "default_seed_paths")]
    pub seed_paths: Vec<String>,

    /// Process-wide default for suppressing per-row progress output
    #[serde(default)]
    pub quiet: bool,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or :memory:)
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Schema that unqualified seed tables live in
    #[serde(default = "default_schema")]
    pub schema: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            schema: default_schema(),
        }
    }
}

const DEFAULT_DB_PATH: &str = ":memory:";

const DEFAULT_SCHEMA: &str = "main";

const CONFIG_FILE_NAMES: [&str; 2] = ["seedbed.yml", "seedbed.yaml"];

fn default_seed_paths() -> Vec<String> {
    vec!["seeds".to_string()]
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for seedbed.yml or seedbed.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for file_name in CONFIG_FILE_NAMES {
            let path = dir.join(file_name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        Err(CoreError::ConfigNotFound {
            path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
        })
    }

    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        if self.seed_paths.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "At least one seed_paths entry must be specified".to_string(),
            });
        }

        if self.database.path.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "database.path cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Seed directories resolved against the project root
    pub fn seed_paths_absolute(&self, root: &Path) -> Vec<PathBuf> {
        self.seed_paths.iter().map(|p| root.join(p)).collect()
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
