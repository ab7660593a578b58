use std::path::Path;

use anyhow::{Context, Result};
use memusage_core::catalog::ModuleCatalog;
use memusage_core::demangle::RawNames;
use memusage_core::model::UsedMemory;
use memusage_core::report::format_kib;
use memusage_core::scanner::scan_map_str;
use memusage_core::totals::{share, MemoryCapacity};
use serde::Serialize;

use crate::commands::read_map_text;

#[derive(Debug, Serialize)]
pub struct TotalsSummary {
    pub capacity: MemoryCapacity,
    pub used: UsedMemory,
}

/// Print declared capacity and used totals for a map file.
///
/// No module catalog is needed: totals do not depend on attribution, so every
/// contribution lands in the placeholder module.
pub fn totals_command(map_file: &Path, json: bool) -> Result<()> {
    let text = read_map_text(map_file)?;
    let usage = scan_map_str(&text, ModuleCatalog::default(), &RawNames)
        .with_context(|| format!("Failed to scan map file {}", map_file.display()))?;
    let summary = TotalsSummary { capacity: MemoryCapacity::scan(&text), used: usage.used() };

    if json {
        let serialized = serde_json::to_string_pretty(&summary)
            .context("Failed to serialize totals to JSON")?;
        println!("{}", serialized);
        return Ok(());
    }

    let TotalsSummary { capacity, used } = summary;
    println!("{:<6} {:>12} {:>12} {:>8}", "", "used (KB)", "total (KB)", "share");
    for (label, part, whole) in [
        ("RAM", used.ram, capacity.ram),
        ("Flash", used.flash, capacity.flash),
        ("EXRAM", used.exram, capacity.exram),
    ] {
        println!(
            "{:<6} {:>12} {:>12} {:>7.2}%",
            label,
            format_kib(part),
            format_kib(whole),
            share(part, whole)
        );
    }
    Ok(())
}
