//! Map-file scanner: a single-pass state machine over the lines of a GNU ld map.
//!
//! Every line inside the memory map is classified (see [`lines`]) and applied
//! to the [`ScannerState`] carried over from the previous line. Size-bearing
//! lines are attributed to the task, module and function the state points at.
//! Reaching `/DISCARD/` finalizes the tree; running out of input before that
//! is an error, because the tree would be missing the common-task modules.

pub mod lines;
mod ledger;
pub mod state;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{debug, trace, warn};
use thiserror::Error;

use crate::catalog::ModuleCatalog;
use crate::demangle::Demangler;
use crate::model::{Function, MemoryUsage};
use ledger::Ledger;
use lines::{
    classify_attribution, classify_common, classify_header, classify_privileged, is_discard,
    is_map_start, AttributionLine, CommonLine, Contribution, Header, MemoryKind,
    TASK_SECTION_MARKER,
};
pub use state::{Mode, OpenSymbol, Phase, ScannerState, Target, TaskId};

/// Error type for map scanning.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The map file could not be opened; no scanning took place.
    #[error("Failed to open map file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading failed part-way through the input.
    #[error("Failed to read map file: {0}")]
    Read(#[from] io::Error),

    /// The memory-map section never started.
    #[error("No \"Linker script and memory map\" line found in {lines} lines of input")]
    MissingMemoryMap { lines: usize },

    /// The memory map started but `/DISCARD/` never came, so the tree was never finalized.
    #[error("Map file ended after {lines} lines without reaching /DISCARD/; the memory map is incomplete")]
    MissingDiscard { lines: usize },
}

/// Whether the scanner wants more input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Done,
}

/// Incremental scanner; feed it lines in file order.
pub struct MapScanner<'d> {
    state: ScannerState,
    ledger: Ledger,
    result: Option<MemoryUsage>,
    demangler: &'d dyn Demangler,
    lines: usize,
}

impl<'d> MapScanner<'d> {
    pub fn new(catalog: ModuleCatalog, demangler: &'d dyn Demangler) -> Self {
        Self {
            state: ScannerState::default(),
            ledger: Ledger::new(catalog),
            result: None,
            demangler,
            lines: 0,
        }
    }

    pub fn state(&self) -> &ScannerState {
        &self.state
    }

    /// Number of lines fed so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Process one line (without its line terminator).
    pub fn feed(&mut self, line: &str) -> Step {
        if self.state.phase == Phase::Finished {
            return Step::Done;
        }
        self.lines += 1;

        let state = std::mem::take(&mut self.state);
        self.state = match state.phase {
            Phase::Seeking if is_map_start(line) => {
                debug!("memory map starts at line {}", self.lines);
                ScannerState { phase: Phase::InMap, ..state }
            }
            Phase::InMap => classify_and_apply(state, line, &mut self.ledger, self.demangler),
            _ => state,
        };

        if self.state.phase == Phase::Finished {
            debug!("/DISCARD/ reached at line {}", self.lines);
            let ledger = std::mem::replace(&mut self.ledger, Ledger::new(ModuleCatalog::default()));
            self.result = Some(ledger.finalize());
            Step::Done
        } else {
            Step::Continue
        }
    }

    /// Return the finalized tree, or why there is none.
    pub fn finish(self) -> Result<MemoryUsage, ScanError> {
        match (self.result, self.state.phase) {
            (Some(usage), _) => Ok(usage),
            (None, Phase::Seeking) => Err(ScanError::MissingMemoryMap { lines: self.lines }),
            (None, _) => Err(ScanError::MissingDiscard { lines: self.lines }),
        }
    }
}

/// Scan a whole map from a reader. Invalid UTF-8 is replaced, not rejected.
pub fn scan_map<R: BufRead>(
    mut reader: R,
    catalog: ModuleCatalog,
    demangler: &dyn Demangler,
) -> Result<MemoryUsage, ScanError> {
    let mut scanner = MapScanner::new(catalog, demangler);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        if scanner.feed(line.trim_end_matches(['\r', '\n'])) == Step::Done {
            break;
        }
    }
    scanner.finish()
}

/// Scan map text held in memory.
pub fn scan_map_str(
    text: &str,
    catalog: ModuleCatalog,
    demangler: &dyn Demangler,
) -> Result<MemoryUsage, ScanError> {
    scan_map(text.as_bytes(), catalog, demangler)
}

/// Open and scan a map file.
pub fn scan_map_file(
    path: impl AsRef<Path>,
    catalog: ModuleCatalog,
    demangler: &dyn Demangler,
) -> Result<MemoryUsage, ScanError> {
    let path = path.as_ref();
    let file =
        File::open(path).map_err(|source| ScanError::Open { path: path.to_path_buf(), source })?;
    scan_map(BufReader::new(file), catalog, demangler)
}

/// Apply one memory-map line to `state`.
///
/// Priority: `/DISCARD/`, COMMON sub-grammar, region headers, then the
/// attribution or privileged rules of the current mode.
fn classify_and_apply(
    mut state: ScannerState,
    line: &str,
    ledger: &mut Ledger,
    demangler: &dyn Demangler,
) -> ScannerState {
    if is_discard(line) {
        if let Mode::Common { open, .. } = std::mem::replace(&mut state.mode, Mode::Idle) {
            close_symbol(open, None, ledger);
        }
        state.pending = None;
        state.phase = Phase::Finished;
        return state;
    }

    match std::mem::take(&mut state.mode) {
        Mode::Common { library, open } => match classify_common(line) {
            CommonLine::Filler => {
                state.mode = Mode::Common { library, open };
                return state;
            }
            CommonLine::Library { address, library } => {
                close_symbol(open, Some(address), ledger);
                state.mode = Mode::Common { library: library.to_string(), open: None };
                return state;
            }
            CommonLine::Symbol { address, name } => {
                close_symbol(open, Some(address), ledger);
                if name.contains(TASK_SECTION_MARKER) {
                    debug!("COMMON block closed by {name}");
                    return state;
                }
                let target = ledger.resolve_or_placeholder(&library, state.task);
                let open = Some(OpenSymbol { name: name.to_string(), address, target });
                state.mode = Mode::Common { library, open };
                return state;
            }
            CommonLine::End => {
                // The block ends here; the line itself still goes through the normal rules.
                close_symbol(open, None, ledger);
                debug!("COMMON block ended");
            }
        },
        other => state.mode = other,
    }

    if let Some(header) = classify_header(line) {
        match header {
            Header::Privileged(memory) => {
                state.task = Some(TaskId::COMMON);
                state.memory = Some(memory);
                state.mode = Mode::Privileged;
                return state;
            }
            Header::TaskSection { task, memory } => {
                let id = ledger.find_or_create_task(task);
                if id == TaskId::COMMON && memory == MemoryKind::Flash {
                    state.pending = None;
                }
                state.task = Some(id);
                state.memory = Some(memory);
                state.mode = Mode::Attributing;
                return state;
            }
            Header::Region(memory) => {
                state.task = None;
                state.memory = Some(memory);
                state.mode = Mode::Attributing;
            }
        }
    }

    match state.mode {
        Mode::Attributing => attribute_line(state, line, ledger, demangler),
        Mode::Privileged => {
            if let (Some(c), Some(memory)) = (classify_privileged(line), state.memory) {
                let target = ledger.resolve_or_placeholder(c.library, None);
                let module = ledger.module_mut(target);
                if memory.is_flash() {
                    module.flash_size = module.flash_size.saturating_add(c.length);
                } else {
                    module.ram_size = module.ram_size.saturating_add(c.length);
                }
                trace!("privileged {:?} +{} -> {}", memory, c.length, module.name);
            }
            state
        }
        _ => state,
    }
}

fn attribute_line(
    mut state: ScannerState,
    line: &str,
    ledger: &mut Ledger,
    demangler: &dyn Demangler,
) -> ScannerState {
    match classify_attribution(line) {
        AttributionLine::CommonStart { library } => {
            debug!("COMMON block for {library}");
            state.mode = Mode::Common { library: library.to_string(), open: None };
            state
        }
        AttributionLine::Symbol { raw_name, contribution, trailing } => {
            state.pending = Some(Function::new(demangler.demangle(raw_name)));
            match contribution {
                Some(c) => apply_contribution(state, c, ledger),
                None => {
                    // Text after the name without a size still ends a stack block.
                    if trailing && state.memory == Some(MemoryKind::Stack) {
                        state.memory = Some(MemoryKind::Ram);
                    }
                    state
                }
            }
        }
        AttributionLine::Contribution(c) => apply_contribution(state, c, ledger),
        AttributionLine::Unrecognized => {
            if state.memory == Some(MemoryKind::Stack) {
                state.memory = Some(MemoryKind::Ram);
            }
            state
        }
    }
}

fn apply_contribution(
    mut state: ScannerState,
    c: Contribution<'_>,
    ledger: &mut Ledger,
) -> ScannerState {
    let Some(memory) = state.memory else {
        return state;
    };
    let task = state.task.unwrap_or(TaskId::COMMON);

    match memory {
        MemoryKind::Stack => {
            ledger.resolve(c.library, state.task);
            let slot = ledger.task_mut(task);
            slot.stack = slot.stack.saturating_add(c.length);
            // Stack sections are followed by the task's RAM in the same block.
            state.memory = Some(MemoryKind::Ram);
        }
        MemoryKind::Exram => {
            ledger.resolve(c.library, state.task);
            let slot = ledger.task_mut(task);
            slot.exram = slot.exram.saturating_add(c.length);
        }
        MemoryKind::Ram => {
            let target = ledger.resolve_or_placeholder(c.library, state.task);
            let module = ledger.module_mut(target);
            module.ram_size = module.ram_size.saturating_add(c.length);
            if let Some(mut function) = state.pending.take() {
                function.ram_size = c.length;
                module.functions.push(function);
            }
        }
        _ => {
            let target = ledger.resolve_or_placeholder(c.library, state.task);
            let module = ledger.module_mut(target);
            module.flash_size = module.flash_size.saturating_add(c.length);
            if let Some(mut function) = state.pending.take() {
                function.flash_size = c.length;
                module.functions.push(function);
            }
        }
    }
    trace!("{:?} +{} from {}", memory, c.length, c.library);
    state
}

/// Commit an open COMMON symbol, sized by the distance to `end`.
///
/// Without an end address the symbol is kept with a RAM size of zero.
fn close_symbol(open: Option<OpenSymbol>, end: Option<u64>, ledger: &mut Ledger) {
    let Some(symbol) = open else {
        return;
    };
    let size = match end.map(|end| end.checked_sub(symbol.address)) {
        Some(Some(size)) => size,
        Some(None) => {
            warn!("COMMON symbol {} is followed by a lower address; size set to 0", symbol.name);
            0
        }
        None => 0,
    };
    let module = ledger.module_mut(symbol.target);
    module.ram_size = module.ram_size.saturating_add(size);
    module.functions.push(Function { name: symbol.name, flash_size: 0, ram_size: size });
}
