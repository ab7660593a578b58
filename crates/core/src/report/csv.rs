//! One-row CSV summary of used memory, for CI trend plots.

use crate::model::UsedMemory;
use crate::report::format_kib;

pub const HEADER: &str = "\"Total Ram\", \"Total Exram\", \"Total Flash\"";

/// Render used RAM, external RAM and flash in KiB.
pub fn render(used: &UsedMemory) -> String {
    format!(
        "{HEADER}\n{}, {}, {}",
        format_kib(used.ram),
        format_kib(used.exram),
        format_kib(used.flash)
    )
}
