use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use memusage_core::config::{CliOverrides, MemoryUsageConfig};
use memusage_core::demangle::select_demangler;
use memusage_core::model::MemoryUsage;
use memusage_core::report::{csv, format_kib, html, json};
use memusage_core::scanner::scan_map_str;
use memusage_core::totals::{share, MemoryCapacity};

use crate::commands::{build_catalog, load_run_config, read_map_text};
use crate::write_output;

/// Scan a map file and write the configured reports.
pub fn report_command(config_path: Option<&Path>, overrides: CliOverrides) -> Result<()> {
    let config = load_run_config(config_path, overrides)?;
    let map_file = config.require_map_file()?.to_path_buf();

    let catalog = build_catalog(&config)?;
    let demangler = select_demangler(config.demangler, config.cxxfilt.clone());
    let text = read_map_text(&map_file)?;
    let usage = scan_map_str(&text, catalog, demangler.as_ref())
        .with_context(|| format!("Failed to scan map file {}", map_file.display()))?;
    let capacity = MemoryCapacity::scan(&text);

    write_reports(&config, &usage, &capacity, &text)?;
    print_summary(&usage, &capacity);
    Ok(())
}

/// Render and write each report the configuration asks for.
pub fn write_reports(
    config: &MemoryUsageConfig,
    usage: &MemoryUsage,
    capacity: &MemoryCapacity,
    map_text: &str,
) -> Result<()> {
    if let Some(path) = &config.html {
        write_output(path, &html::render(usage, capacity, &config.title))?;
        info!("wrote HTML report to {}", path.display());
    }
    if let Some(path) = &config.csv {
        write_output(path, &csv::render(&usage.used()))?;
        info!("wrote CSV summary to {}", path.display());
    }
    if let Some(path) = &config.json {
        let body = json::render(usage, *capacity, map_text)
            .context("Failed to serialize usage report to JSON")?;
        write_output(path, &body)?;
        info!("wrote JSON report to {}", path.display());
    }
    Ok(())
}

fn print_summary(usage: &MemoryUsage, capacity: &MemoryCapacity) {
    let used = usage.used();
    println!("Memory usage:");
    println!(
        "  RAM:   {} KB ({:.2}%)",
        format_kib(used.ram),
        share(used.ram, capacity.ram)
    );
    println!(
        "  Flash: {} KB ({:.2}%)",
        format_kib(used.flash),
        share(used.flash, capacity.flash)
    );
    println!(
        "  EXRAM: {} KB ({:.2}%)",
        format_kib(used.exram),
        share(used.exram, capacity.exram)
    );
    println!("Tasks ({}):", usage.tasks.len());
    for task in &usage.tasks {
        println!(
            "  - {} [modules: {}] ram={} flash={} stack={} exram={}",
            task.name,
            task.modules.len(),
            task.total_ram(),
            task.total_flash(),
            task.stack,
            task.exram
        );
    }
}
