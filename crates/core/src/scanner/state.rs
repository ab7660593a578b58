//! Scanner state threaded from one line to the next.

use crate::catalog::ModuleId;
use crate::model::Function;
use crate::scanner::lines::MemoryKind;

/// Index of a task inside the scan ledger; `TaskId(0)` is always the common task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub usize);

impl TaskId {
    pub const COMMON: TaskId = TaskId(0);
}

/// Module a contribution lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The "Standard Library" module of the common task.
    Placeholder,
    Catalog(ModuleId),
}

/// Where in the file the scanner is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Before the "Linker script and memory map" line; everything is ignored.
    #[default]
    Seeking,
    InMap,
    /// `/DISCARD/` was reached and the tree has been finalized.
    Finished,
}

/// A COMMON symbol whose size is known only once the next address shows up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSymbol {
    pub name: String,
    pub address: u64,
    pub target: Target,
}

/// How lines inside the map are currently interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Mode {
    /// Only headers are recognized.
    #[default]
    Idle,
    /// A header was seen; symbol and size lines are attributed.
    Attributing,
    /// Inside a COMMON block; sizes come from address deltas.
    Common { library: String, open: Option<OpenSymbol> },
    /// Inside `.privileged_*`; sizes go straight to modules.
    Privileged,
}

/// Everything the scanner remembers between two lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannerState {
    pub phase: Phase,
    pub task: Option<TaskId>,
    pub memory: Option<MemoryKind>,
    pub mode: Mode,
    /// Symbol named on an earlier line whose size has not been seen yet.
    pub pending: Option<Function>,
}

impl ScannerState {
    pub fn in_common_block(&self) -> bool {
        matches!(self.mode, Mode::Common { .. })
    }

    pub fn in_privileged_block(&self) -> bool {
        self.mode == Mode::Privileged
    }

    pub fn awaiting_attribution(&self) -> bool {
        self.mode == Mode::Attributing
    }
}
