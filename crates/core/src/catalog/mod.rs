//! Module catalog: the ordered list of modules a map file is attributed to.
//!
//! The catalog is built before scanning (usually by [`discover_modules`]) and
//! is then owned by the scanner, which mutates the modules in place. Library
//! lookups are first-match in catalog order.

mod discovery;

use std::path::PathBuf;

use log::warn;
use serde::Serialize;
use thiserror::Error;

use crate::model::Module;

pub use discovery::{discover_modules, DiscoveryOptions};

/// Error type for catalog construction.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A directory could not be listed while looking for modules.
    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An exclude-files pattern is not a valid regular expression.
    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Index of a module inside a [`ModuleCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub usize);

/// A library file name claimed by more than one module.
///
/// Attribution always goes to `owner`; `shadowed` never sees contributions
/// for this library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateLibrary {
    pub library: String,
    pub owner: String,
    pub shadowed: String,
}

/// Ordered collection of modules with first-match library lookup.
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    modules: Vec<Module>,
}

impl ModuleCatalog {
    /// Build a catalog, logging a warning for every library that more than
    /// one module claims.
    pub fn new(modules: Vec<Module>) -> Self {
        let catalog = Self { modules };
        for dup in catalog.duplicate_libraries() {
            warn!(
                "library {} is listed by both {} and {}; attributing to {}",
                dup.library, dup.owner, dup.shadowed, dup.owner
            );
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn get(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub fn get_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0]
    }

    /// Find the first module whose library set contains `library`.
    pub fn lookup(&self, library: &str) -> Option<ModuleId> {
        self.modules.iter().position(|m| m.has_library(library)).map(ModuleId)
    }

    /// Libraries listed by more than one module, in catalog order.
    pub fn duplicate_libraries(&self) -> Vec<DuplicateLibrary> {
        let mut out = Vec::new();
        for (idx, module) in self.modules.iter().enumerate() {
            for library in &module.libraries {
                if let Some(owner) = self.modules[..idx].iter().find(|m| m.has_library(library)) {
                    out.push(DuplicateLibrary {
                        library: library.clone(),
                        owner: owner.name.clone(),
                        shadowed: module.name.clone(),
                    });
                }
            }
        }
        out
    }

    pub fn into_modules(self) -> Vec<Module> {
        self.modules
    }
}

impl From<Vec<Module>> for ModuleCatalog {
    fn from(modules: Vec<Module>) -> Self {
        Self::new(modules)
    }
}
