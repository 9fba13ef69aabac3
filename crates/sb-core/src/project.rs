//! Project discovery and loading

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::seed::{discover_seeds, SeedDocument};
use std::path::{Path, PathBuf};

/// Represents a Seedbed project
#[derive(Debug)]
pub struct Project {
    /// Project root directory
    pub root: PathBuf,

    /// Project configuration
    pub config: Config,

    /// Seed documents discovered under `seed_paths`, sorted by name
    pub seeds: Vec<SeedDocument>,
}

impl Project {
    /// Load a project from its root directory
    pub fn load(root: &Path) -> CoreResult<Self> {
        if !root.is_dir() {
            return Err(CoreError::ProjectNotFound {
                path: root.display().to_string(),
            });
        }

        let config = Config::load_from_dir(root)?;
        let seeds = discover_seeds(&config.seed_paths_absolute(root))?;
        log::debug!(
            "Loaded project '{}' with {} seed documents",
            config.name,
            seeds.len()
        );

        Ok(Self {
            root: root.to_path_buf(),
            config,
            seeds,
        })
    }

    /// Look up a seed by name
    pub fn get_seed(&self, name: &str) -> Option<&SeedDocument> {
        self.seeds.iter().find(|s| s.name == name)
    }

    /// Seed names in load order
    pub fn seed_names(&self) -> Vec<&str> {
        self.seeds.iter().map(|s| s.name.as_str()).collect()
    }
}
