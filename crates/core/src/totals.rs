//! Memory capacity declared by the map file's memory-region table.
//!
//! This is independent of task attribution: it reads every line of the file
//! looking for region declarations such as
//! `RAM              0x0000000020000000 0x0000000000020000 xrw`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use crate::model::UsedMemory;

static REGION_SIZE: Lazy<Regex> = Lazy::new(|| {
    match Regex::new(
        r"^(?P<memory>APPLICATION|APPLICATION_DATA_INIT|RAM|PSRAM)\s+0x[0-9a-f]+\s+0x(?P<size>[0-9a-f]+)",
    ) {
        Ok(re) => re,
        Err(err) => panic!("invalid built-in pattern REGION_SIZE: {err}"),
    }
});

/// Total flash, RAM and external RAM available to the image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCapacity {
    pub flash: u64,
    pub ram: u64,
    pub exram: u64,
}

impl MemoryCapacity {
    /// Sum all region declarations found in `text`.
    ///
    /// `APPLICATION` and `APPLICATION_DATA_INIT` count as flash, `RAM` as RAM
    /// and `PSRAM` as external RAM.
    pub fn scan(text: &str) -> Self {
        let mut capacity = Self::default();
        for line in text.lines() {
            capacity.add_line(line);
        }
        capacity
    }

    /// Account for a single line; lines that declare no region are ignored.
    pub fn add_line(&mut self, line: &str) {
        let Some(caps) = REGION_SIZE.captures(line) else {
            return;
        };
        let Some(size) = caps.name("size").and_then(|m| u64::from_str_radix(m.as_str(), 16).ok())
        else {
            return;
        };
        match caps.name("memory").map(|m| m.as_str()) {
            Some("APPLICATION") | Some("APPLICATION_DATA_INIT") => self.flash += size,
            Some("RAM") => self.ram += size,
            Some("PSRAM") => self.exram += size,
            _ => {}
        }
    }
}

/// Percentage of `whole` taken by `part`; zero when there is no capacity.
pub fn share(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Bytes as KiB.
pub fn kib(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}
