//! Symbol-name demangling used for function display names.
//!
//! Demangling is best-effort: a [`Demangler`] never fails, it hands back the
//! raw name when it cannot do better.

#[cfg(feature = "cpp-demangle")]
mod cpp;
mod cxxfilt;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[cfg(feature = "cpp-demangle")]
pub use cpp::CppDemangler;
pub use cxxfilt::{resolve_cxxfilt_path, CxxFiltDemangler};

/// Turns a raw (possibly mangled) symbol name into a display name.
pub trait Demangler: Send + Sync {
    /// Return the display form of `raw`, or `raw` unchanged on any failure.
    fn demangle(&self, raw: &str) -> String;

    /// Returns a human-readable name for the demangler.
    fn name(&self) -> &'static str;
}

/// Identity demangler: names are reported exactly as the map file spells them.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawNames;

impl Demangler for RawNames {
    fn demangle(&self, raw: &str) -> String {
        raw.to_string()
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Which demangler a run should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemanglerKind {
    /// Built-in demangler when compiled in, else c++filt when available, else raw names.
    #[default]
    Auto,
    Cpp,
    Cxxfilt,
    None,
}

impl DemanglerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DemanglerKind::Auto => "auto",
            DemanglerKind::Cpp => "cpp",
            DemanglerKind::Cxxfilt => "cxxfilt",
            DemanglerKind::None => "none",
        }
    }
}

impl fmt::Display for DemanglerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DemanglerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(DemanglerKind::Auto),
            "cpp" => Ok(DemanglerKind::Cpp),
            "cxxfilt" | "c++filt" => Ok(DemanglerKind::Cxxfilt),
            "none" | "raw" => Ok(DemanglerKind::None),
            other => Err(format!(
                "Invalid demangler '{}'. Allowed: auto, cpp, cxxfilt, none",
                other
            )),
        }
    }
}

/// Build the demangler for `kind`.
///
/// `tool` overrides the c++filt executable; when absent the path comes from
/// [`resolve_cxxfilt_path`].
pub fn select_demangler(kind: DemanglerKind, tool: Option<PathBuf>) -> Box<dyn Demangler> {
    let tool = tool.unwrap_or_else(resolve_cxxfilt_path);
    let selected: Box<dyn Demangler> = match kind {
        DemanglerKind::None => Box::new(RawNames),
        DemanglerKind::Cxxfilt => Box::new(CxxFiltDemangler::new(tool)),
        DemanglerKind::Cpp => cpp_or_raw(),
        DemanglerKind::Auto => {
            if cfg!(feature = "cpp-demangle") {
                cpp_or_raw()
            } else {
                let filt = CxxFiltDemangler::new(tool);
                if filt.probe() {
                    Box::new(filt)
                } else {
                    warn!("{} not found; function names stay mangled", filt.tool().display());
                    Box::new(RawNames)
                }
            }
        }
    };
    debug!("using {} demangler", selected.name());
    selected
}

#[cfg(feature = "cpp-demangle")]
fn cpp_or_raw() -> Box<dyn Demangler> {
    Box::new(CppDemangler)
}

#[cfg(not(feature = "cpp-demangle"))]
fn cpp_or_raw() -> Box<dyn Demangler> {
    warn!("built without the cpp-demangle feature; function names stay mangled");
    Box::new(RawNames)
}
