//! Settings resolved from flags, environment and config file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::output::Output;
use crate::storage::{Config, Dataset};

/// Environment variable older tooling used for the dataset root
pub const LEGACY_DATAPACK_ENV: &str = "ATM10_PATH";

/// Where to read data from and where to keep the item index
#[derive(Debug, Clone)]
pub struct Settings {
    pub datapack_path: PathBuf,
    pub index_dir: PathBuf,
    pub search_limit: usize,
}

impl Settings {
    /// Applies precedence: flag or env var, then config file, then defaults
    pub fn resolve(
        config: &Config,
        datapack_path: Option<&Path>,
        index_dir: Option<&Path>,
    ) -> Self {
        let legacy = std::env::var_os(LEGACY_DATAPACK_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        let datapack_path = datapack_path.map(Path::to_path_buf).or(legacy);

        Self {
            datapack_path: config.resolve_datapack_path(datapack_path.as_deref()),
            index_dir: config.resolve_index_dir(index_dir),
            search_limit: config.resolve_search_limit(None),
        }
    }

    /// Loads the dataset under `datapack_path`
    pub fn load_dataset(&self, output: &Output) -> Result<Dataset> {
        output.verbose_ctx(
            "dataset",
            &format!("Loading documents from: {}", self.datapack_path.display()),
        );

        let start = std::time::Instant::now();
        let dataset = Dataset::open(&self.datapack_path).with_context(|| {
            format!("Failed to load dataset from {}", self.datapack_path.display())
        })?;

        let report = dataset.report();
        output.verbose_ctx(
            "dataset",
            &format!(
                "Loaded {} documents in {:?}: {} recipes for {} items, {} tags, {} warnings",
                report.documents,
                start.elapsed(),
                report.recipes,
                report.craftable_items,
                report.tags,
                report.warnings.len()
            ),
        );

        Ok(dataset)
    }
}
