use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use regex::{Regex, RegexBuilder};

use crate::catalog::CatalogError;
use crate::model::Module;

/// Build-directory name that never holds a module.
const CMAKE_FILES_DIR: &str = "CMakeFiles";

/// Filters applied while walking a build tree for modules.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Folders that are skipped entirely when passed as a scan root.
    pub exclude_folders: Vec<PathBuf>,
    /// Regexes (matched case-insensitively anywhere in the name) of library
    /// files to ignore.
    pub exclude_files: Vec<String>,
    /// Optional allow-list of module directory names (case-insensitive).
    pub modules: Option<Vec<String>>,
}

impl DiscoveryOptions {
    fn compile_excludes(&self) -> Result<Vec<Regex>, CatalogError> {
        self.exclude_files
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern).case_insensitive(true).build().map_err(|source| {
                    CatalogError::InvalidPattern { pattern: pattern.clone(), source }
                })
            })
            .collect()
    }

    fn wants_module(&self, name: &str) -> bool {
        match &self.modules {
            Some(allowed) => allowed.iter().any(|m| m.eq_ignore_ascii_case(name)),
            None => true,
        }
    }

    fn is_excluded_folder(&self, dir: &Path) -> bool {
        self.exclude_folders.iter().any(|f| f == dir)
    }
}

/// Walk a build tree and return one module per directory holding static libraries.
///
/// The directory itself and its `src/` child are searched for module
/// directories; an `external/` child is treated as another build tree and
/// walked recursively. A root that is missing or excluded yields no modules.
pub fn discover_modules(
    dir: impl AsRef<Path>,
    options: &DiscoveryOptions,
) -> Result<Vec<Module>, CatalogError> {
    let excludes = options.compile_excludes()?;
    walk_build_tree(dir.as_ref(), options, &excludes)
}

fn walk_build_tree(
    dir: &Path,
    options: &DiscoveryOptions,
    excludes: &[Regex],
) -> Result<Vec<Module>, CatalogError> {
    if !dir.is_dir() || options.is_excluded_folder(dir) {
        return Ok(Vec::new());
    }

    let mut modules = modules_in(dir, options, excludes)?;
    let src = dir.join("src");
    if src.is_dir() {
        modules.extend(modules_in(&src, options, excludes)?);
    }
    let external = dir.join("external");
    if external.is_dir() {
        debug!("descending into externals at {}", external.display());
        modules.extend(walk_build_tree(&external, options, excludes)?);
    }
    Ok(modules)
}

fn modules_in(
    dir: &Path,
    options: &DiscoveryOptions,
    excludes: &[Regex],
) -> Result<Vec<Module>, CatalogError> {
    let mut candidates = Vec::new();
    for entry in read_dir(dir)? {
        if !entry.is_dir() {
            continue;
        }
        let name = match entry.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        if name == CMAKE_FILES_DIR || !options.wants_module(&name) {
            continue;
        }
        candidates.push((name, entry));
    }
    candidates.sort_by(|a, b| a.0.cmp(&b.0));

    let mut modules = Vec::new();
    for (name, path) in candidates {
        let libraries = libraries_in(&path, excludes)?;
        if libraries.is_empty() {
            continue;
        }
        debug!("module {} -> {:?}", name, libraries);
        modules.push(Module::new(name).with_libraries(libraries));
    }
    Ok(modules)
}

fn libraries_in(dir: &Path, excludes: &[Regex]) -> Result<Vec<String>, CatalogError> {
    let mut libraries: Vec<String> = read_dir(dir)?
        .into_iter()
        .filter(|p| p.is_file())
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .filter(|name| name.ends_with(".a"))
        .filter(|name| !excludes.iter().any(|re| re.is_match(name)))
        .collect();
    libraries.sort();
    Ok(libraries)
}

fn read_dir(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let entries = fs::read_dir(dir)
        .map_err(|source| CatalogError::ReadDir { path: dir.to_path_buf(), source })?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|source| CatalogError::ReadDir { path: dir.to_path_buf(), source })?;
        paths.push(entry.path());
    }
    Ok(paths)
}
