//! memusage-core
//!
//! Core library for reconstructing per-task memory usage from linker map files.
//!
//! A map file is scanned once, line by line, and every size contribution is
//! attributed to a firmware task, to the module (static library group) that
//! produced it and, where the map names one, to the individual symbol. The
//! resulting tree is consumed read-only by the report renderers.
//!
//! The goal is to keep all substantive logic here so it is fully testable and
//! reusable from multiple frontends (CLI, build-system hooks, etc.).

pub mod catalog;
pub mod config;
pub mod demangle;
pub mod model;
pub mod report;
pub mod scanner;
pub mod totals;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
