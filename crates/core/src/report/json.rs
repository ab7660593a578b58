//! Machine-readable report: capacity, totals and the whole task tree.

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::model::{MemoryUsage, UsedMemory};
use crate::totals::MemoryCapacity;

#[derive(Debug, Clone, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: String,
    pub tool_version: &'static str,
    /// SHA-256 of the map file text, to tie the report to its input.
    pub map_sha256: String,
    pub capacity: MemoryCapacity,
    pub used: UsedMemory,
    pub usage: &'a MemoryUsage,
}

impl<'a> JsonReport<'a> {
    pub fn new(usage: &'a MemoryUsage, capacity: MemoryCapacity, map_text: &str) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            tool_version: crate::version(),
            map_sha256: sha256_hex(map_text.as_bytes()),
            capacity,
            used: usage.used(),
            usage,
        }
    }
}

/// Render the report as pretty-printed JSON.
pub fn render(
    usage: &MemoryUsage,
    capacity: MemoryCapacity,
    map_text: &str,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport::new(usage, capacity, map_text))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
