use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use log::trace;
use thiserror::Error;

use crate::demangle::Demangler;

/// Default toolchain demangler looked up on `PATH`.
const DEFAULT_CXXFILT: &str = "arm-none-eabi-c++filt";

/// Resolve the c++filt executable, honoring `MEMUSAGE_CXXFILT`.
pub fn resolve_cxxfilt_path() -> PathBuf {
    std::env::var_os("MEMUSAGE_CXXFILT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CXXFILT))
}

/// Why a single c++filt invocation gave no usable name.
#[derive(Debug, Error)]
pub(crate) enum DemangleError {
    #[error("failed to spawn {tool}: {source}")]
    Spawn { tool: PathBuf, source: io::Error },

    #[error("{tool} exited with {status}")]
    Status { tool: PathBuf, status: ExitStatus },

    #[error("{tool} produced no output")]
    Empty { tool: PathBuf },
}

/// Demangler that shells out to a toolchain `c++filt` once per name.
#[derive(Debug, Clone)]
pub struct CxxFiltDemangler {
    tool: PathBuf,
}

impl CxxFiltDemangler {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self { tool: tool.into() }
    }

    pub fn tool(&self) -> &Path {
        &self.tool
    }

    /// True when the tool can be spawned at all.
    pub fn probe(&self) -> bool {
        Command::new(&self.tool).arg("--version").output().is_ok()
    }

    fn run(&self, raw: &str) -> Result<String, DemangleError> {
        let output = Command::new(&self.tool)
            .arg(raw)
            .output()
            .map_err(|source| DemangleError::Spawn { tool: self.tool.clone(), source })?;
        if !output.status.success() {
            return Err(DemangleError::Status { tool: self.tool.clone(), status: output.status });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let demangled = stdout.trim_end_matches(['\r', '\n']);
        if demangled.is_empty() {
            Err(DemangleError::Empty { tool: self.tool.clone() })
        } else {
            Ok(demangled.to_string())
        }
    }
}

impl Demangler for CxxFiltDemangler {
    fn demangle(&self, raw: &str) -> String {
        match self.run(raw) {
            Ok(name) => name,
            Err(err) => {
                trace!("keeping raw name {raw}: {err}");
                raw.to_string()
            }
        }
    }

    fn name(&self) -> &'static str {
        "cxxfilt"
    }
}
