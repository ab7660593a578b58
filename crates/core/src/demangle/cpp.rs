use cpp_demangle::{DemangleOptions, Symbol};

use crate::demangle::Demangler;

/// In-process Itanium C++ ABI demangler.
#[derive(Debug, Clone, Copy, Default)]
pub struct CppDemangler;

impl Demangler for CppDemangler {
    fn demangle(&self, raw: &str) -> String {
        Symbol::new(raw)
            .ok()
            .and_then(|sym| sym.demangle(&DemangleOptions::default()).ok())
            .unwrap_or_else(|| raw.to_string())
    }

    fn name(&self) -> &'static str {
        "cpp"
    }
}
