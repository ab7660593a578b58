//! Report renderers. All of them are pure functions over a finished
//! [`MemoryUsage`](crate::model::MemoryUsage); writing the output is up to the caller.

pub mod csv;
pub mod html;
pub mod json;

/// KiB with two decimals, written the shortest way (`1.5`, `12.25`, `3.0`).
pub fn format_kib(bytes: u64) -> String {
    let fixed = format!("{:.2}", crate::totals::kib(bytes));
    let trimmed = fixed.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}
