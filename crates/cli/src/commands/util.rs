use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use memusage_core::catalog::{discover_modules, ModuleCatalog};
use memusage_core::config::{load_config, CliOverrides, MemoryUsageConfig};

use crate::canonicalize_or_current;

/// Resolve the effective configuration: defaults, then the optional config
/// file, then command-line values.
///
/// Directory paths are made absolute so excluded folders compare equal to the
/// roots they name.
pub fn load_run_config(
    config_path: Option<&Path>,
    overrides: CliOverrides,
) -> Result<MemoryUsageConfig> {
    let base = match config_path {
        Some(path) => load_config(path)?,
        None => MemoryUsageConfig::default(),
    };
    let mut config = base.merge_cli(overrides);
    config.directories = absolutize(&config.directories)?;
    config.exclude_folders = absolutize(&config.exclude_folders)?;
    debug!("effective configuration: {:?}", config);
    Ok(config)
}

fn absolutize(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    paths.iter().map(|p| canonicalize_or_current(p)).collect()
}

/// Discover modules under every configured directory, in order.
pub fn build_catalog(config: &MemoryUsageConfig) -> Result<ModuleCatalog> {
    let options = config.discovery_options();
    let mut modules = Vec::new();
    for dir in &config.directories {
        let found = discover_modules(dir, &options)
            .with_context(|| format!("Failed to discover modules under {}", dir.display()))?;
        info!("{} module(s) under {}", found.len(), dir.display());
        modules.extend(found);
    }
    Ok(ModuleCatalog::new(modules))
}

/// Read the map file as text. Invalid UTF-8 is replaced rather than rejected.
pub fn read_map_text(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read map file {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
