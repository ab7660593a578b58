//! Run configuration: which build trees to search, which map to scan and
//! which reports to write.
//!
//! The same shape is read from an optional YAML/JSON file and then overridden
//! by command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::DiscoveryOptions;
use crate::demangle::DemanglerKind;

/// Default report heading prefix.
pub const DEFAULT_TITLE: &str = "TestApp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryUsageConfig {
    /// Build directories searched for modules.
    pub directories: Vec<PathBuf>,
    pub exclude_folders: Vec<PathBuf>,
    /// Regexes of library files to ignore (case-insensitive).
    pub exclude_files: Vec<String>,
    /// Only these module names, when set (case-insensitive).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<PathBuf>,
    pub title: String,
    pub demangler: DemanglerKind,
    /// Explicit c++filt executable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cxxfilt: Option<PathBuf>,
}

impl Default for MemoryUsageConfig {
    fn default() -> Self {
        Self {
            directories: vec![PathBuf::from(".")],
            exclude_folders: Vec::new(),
            exclude_files: Vec::new(),
            modules: None,
            map_file: None,
            html: None,
            csv: None,
            json: None,
            title: DEFAULT_TITLE.to_string(),
            demangler: DemanglerKind::Auto,
            cxxfilt: None,
        }
    }
}

/// Flag values given on the command line; `None`/empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub directories: Vec<PathBuf>,
    pub exclude_folders: Vec<PathBuf>,
    pub exclude_files: Vec<String>,
    pub modules: Option<Vec<String>>,
    pub map_file: Option<PathBuf>,
    pub html: Option<PathBuf>,
    pub csv: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub title: Option<String>,
    pub demangler: Option<DemanglerKind>,
    pub cxxfilt: Option<PathBuf>,
}

impl MemoryUsageConfig {
    /// Apply command-line values on top of this configuration.
    pub fn merge_cli(mut self, cli: CliOverrides) -> Self {
        if !cli.directories.is_empty() {
            self.directories = cli.directories;
        }
        if !cli.exclude_folders.is_empty() {
            self.exclude_folders = cli.exclude_folders;
        }
        if !cli.exclude_files.is_empty() {
            self.exclude_files = cli.exclude_files;
        }
        self.modules = cli.modules.or(self.modules);
        self.map_file = cli.map_file.or(self.map_file);
        self.html = cli.html.or(self.html);
        self.csv = cli.csv.or(self.csv);
        self.json = cli.json.or(self.json);
        if let Some(title) = cli.title {
            self.title = title;
        }
        if let Some(kind) = cli.demangler {
            self.demangler = kind;
        }
        self.cxxfilt = cli.cxxfilt.or(self.cxxfilt);
        self
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            exclude_folders: self.exclude_folders.clone(),
            exclude_files: self.exclude_files.clone(),
            modules: self.modules.clone(),
        }
    }

    /// The map file, which has no default.
    pub fn require_map_file(&self) -> Result<&Path> {
        self.map_file.as_deref().ok_or_else(|| {
            anyhow!("No map file given (use --map-file or set map_file in the config)")
        })
    }
}

/// Load a configuration file; `.json` is parsed as JSON, anything else as YAML.
pub fn load_config(path: &Path) -> Result<MemoryUsageConfig> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let is_json = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e == "json");
    let config = if is_json {
        serde_json::from_str(&body).context("Failed to parse config JSON")?
    } else {
        serde_yaml::from_str(&body).context("Failed to parse config YAML")?
    };
    Ok(config)
}
