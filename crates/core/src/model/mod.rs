//! Memory usage tree: tasks own modules, modules own functions.
//!
//! Sizes are plain byte counts. Nothing here knows about map-file syntax; the
//! scanner builds these values and the report renderers only read them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Name of the distinguished default task.
pub const COMMON_TASK: &str = "common";

/// Name of the placeholder module that collects contributions whose library
/// is not part of the module catalog.
pub const STANDARD_LIBRARY: &str = "Standard Library";

/// A single symbol inside a module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub flash_size: u64,
    pub ram_size: u64,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), flash_size: 0, ram_size: 0 }
    }
}

/// A logical component backed by one or more static libraries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    /// Library archive file names (e.g. `libworker.a`) that belong to this module.
    pub libraries: BTreeSet<String>,
    /// Symbols in the order they were first attributed.
    pub functions: Vec<Function>,
    /// Owning task; `"common"` until a named task claims the module.
    pub task_name: String,
    pub flash_size: u64,
    pub ram_size: u64,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            libraries: BTreeSet::new(),
            functions: Vec::new(),
            task_name: COMMON_TASK.to_string(),
            flash_size: 0,
            ram_size: 0,
        }
    }

    /// Builder-style helper to attach library file names.
    ///
    /// `Module::new("Worker").with_libraries(["libworker.a"])`
    pub fn with_libraries<I, S>(mut self, libraries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.libraries.extend(libraries.into_iter().map(Into::into));
        self
    }

    pub fn has_library(&self, library: &str) -> bool {
        self.libraries.contains(library)
    }

    /// True once a named task has taken ownership of this module.
    pub fn is_claimed(&self) -> bool {
        self.task_name != COMMON_TASK
    }

    /// A module with neither flash nor RAM contributions.
    pub fn is_empty(&self) -> bool {
        self.flash_size == 0 && self.ram_size == 0
    }

    /// Flash bytes not accounted for by any listed function.
    pub fn unattributed_flash(&self) -> u64 {
        let listed = saturating_sum(self.functions.iter().map(|f| f.flash_size));
        self.flash_size.saturating_sub(listed)
    }

    /// RAM bytes not accounted for by any listed function.
    pub fn unattributed_ram(&self) -> u64 {
        let listed = saturating_sum(self.functions.iter().map(|f| f.ram_size));
        self.ram_size.saturating_sub(listed)
    }
}

/// A firmware execution context with its own memory partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub modules: Vec<Module>,
    pub exram: u64,
    pub stack: u64,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), modules: Vec::new(), exram: 0, stack: 0 }
    }

    pub fn is_common(&self) -> bool {
        self.name == COMMON_TASK
    }

    pub fn total_flash(&self) -> u64 {
        saturating_sum(self.modules.iter().map(|m| m.flash_size))
    }

    /// Module RAM plus the task's stack reservation.
    pub fn total_ram(&self) -> u64 {
        saturating_sum(self.modules.iter().map(|m| m.ram_size)).saturating_add(self.stack)
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }
}

/// Summed usage across every task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedMemory {
    pub flash: u64,
    pub ram: u64,
    pub exram: u64,
}

/// The finalized task tree produced by one scan of a map file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub tasks: Vec<Task>,
}

impl MemoryUsage {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn common_task(&self) -> Option<&Task> {
        self.task(COMMON_TASK)
    }

    /// Look up a module by name in whichever task owns it.
    pub fn module(&self, name: &str) -> Option<(&Task, &Module)> {
        self.tasks.iter().find_map(|t| t.module(name).map(|m| (t, m)))
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.tasks.iter().flat_map(|t| t.modules.iter())
    }

    pub fn used(&self) -> UsedMemory {
        self.tasks.iter().fold(UsedMemory::default(), |acc, t| UsedMemory {
            flash: acc.flash.saturating_add(t.total_flash()),
            ram: acc.ram.saturating_add(t.total_ram()),
            exram: acc.exram.saturating_add(t.exram),
        })
    }

    /// Drop modules without contributions and then tasks without modules.
    ///
    /// The placeholder module of the common task and the common task itself
    /// always survive. Running this on an already pruned tree changes nothing.
    pub fn prune(&mut self) {
        for task in &mut self.tasks {
            let common = task.is_common();
            task.modules.retain(|m| !m.is_empty() || (common && m.name == STANDARD_LIBRARY));
        }
        self.tasks.retain(|t| t.is_common() || !t.modules.is_empty());
    }
}

/// Byte totals clamp at `u64::MAX` instead of wrapping.
fn saturating_sum(sizes: impl Iterator<Item = u64>) -> u64 {
    sizes.fold(0, u64::saturating_add)
}
