use std::path::Path;

use anyhow::{Context, Result};
use memusage_core::catalog::DuplicateLibrary;
use memusage_core::config::CliOverrides;
use serde::Serialize;

use crate::commands::{build_catalog, load_run_config};

#[derive(Debug, Serialize)]
pub struct ModuleListing {
    pub name: String,
    pub libraries: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogListing {
    pub modules: Vec<ModuleListing>,
    pub duplicates: Vec<DuplicateLibrary>,
}

/// Print the module catalog discovered under the configured directories.
pub fn modules_command(
    config_path: Option<&Path>,
    overrides: CliOverrides,
    json: bool,
) -> Result<()> {
    let config = load_run_config(config_path, overrides)?;
    let catalog = build_catalog(&config)?;
    let listing = CatalogListing {
        duplicates: catalog.duplicate_libraries(),
        modules: catalog
            .modules()
            .iter()
            .map(|m| ModuleListing {
                name: m.name.clone(),
                libraries: m.libraries.iter().cloned().collect(),
            })
            .collect(),
    };

    if json {
        let serialized = serde_json::to_string_pretty(&listing)
            .context("Failed to serialize modules to JSON")?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("Modules ({}):", listing.modules.len());
    if listing.modules.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    for module in &listing.modules {
        println!("  - {} [{}]", module.name, module.libraries.join(", "));
    }
    for dup in &listing.duplicates {
        println!(
            "warning: {} is listed by {} and {}; {} gets the attribution",
            dup.library, dup.owner, dup.shadowed, dup.owner
        );
    }
    Ok(())
}
