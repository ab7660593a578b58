//! Line classifiers for the GNU ld map-file grammar.
//!
//! Each classifier tests one line against an ordered list of patterns and
//! returns a typed variant for the first one that matches. Which classifier
//! applies depends on the scanner's current mode; the priority order between
//! them lives in [`super::MapScanner`].

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

macro_rules! static_regex {
    ($name:ident, $str:expr) => {
        static $name: Lazy<Regex> = Lazy::new(|| match Regex::new($str) {
            Ok(re) => re,
            Err(err) => panic!("invalid built-in pattern {}: {err}", stringify!($name)),
        });
    };
}

/// Line that opens the memory-map part of the file.
pub const MAP_START: &str = "Linker script and memory map";
/// Line that ends the memory-map part we attribute.
pub const DISCARD: &str = "/DISCARD/";
/// Symbol marker that bounds a task section inside a COMMON block.
pub const TASK_SECTION_MARKER: &str = "__task_section";

// Region headers
static_regex!(PRIVILEGED_HEADER, r"^\.privileged_(?P<memory>ram|functions)$");
static_regex!(
    TASK_SECTION_HEADER,
    r"^ *\.task_section_(?P<name>.+?)_(?P<memory>ram|exram|stack|flash)"
);
static_regex!(REGION_HEADER, r"^ *\.(?P<memory>text|rodata|init_array)\.");

// Attribution lines
static_regex!(
    COMMON_START,
    r"COMMON[ \t]+0x[0-9a-f]+\s+0x[0-9a-f]+[ \t]+.*(?P<library>lib.+?\.a)"
);
static_regex!(SYMBOL_NAME, r"^[ \t]*\.(?:text|bss|data|rodata)\.(?P<mangle>\S*)(?P<rest>.+)?");
static_regex!(
    CONTRIBUTION,
    r"0x[0-9a-f]+\s+0x(?P<length>[0-9a-f]+)[ \t]+.*(?P<library>lib.+?\.a)"
);
static_regex!(
    PRIVILEGED_CONTRIBUTION,
    r"0x[0-9a-f]{16}\s+0x(?P<length>[0-9a-f]+)[ \t]+.*(?P<library>lib.+?\.a)"
);

// COMMON block sub-grammar
static_regex!(COMMON_LIBRARY, r"COMMON\s+0x(?P<address>[0-9a-f]{16}).*(?P<library>lib.*?\.a)");
static_regex!(COMMON_SYMBOL, r"0x(?P<address>[0-9a-f]{16})\s+(?P<name>[^0-9\s]\S*)");

/// Kind of memory the current block of lines describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    Flash,
    Ram,
    Stack,
    Exram,
    Text,
    Rodata,
    InitArray,
}

impl MemoryKind {
    /// Kinds whose sizes count toward a module's flash usage.
    pub fn is_flash(self) -> bool {
        matches!(
            self,
            MemoryKind::Flash | MemoryKind::Text | MemoryKind::Rodata | MemoryKind::InitArray
        )
    }

    fn from_section(tag: &str) -> Option<Self> {
        match tag {
            "flash" | "functions" => Some(MemoryKind::Flash),
            "ram" => Some(MemoryKind::Ram),
            "stack" => Some(MemoryKind::Stack),
            "exram" => Some(MemoryKind::Exram),
            "text" => Some(MemoryKind::Text),
            "rodata" => Some(MemoryKind::Rodata),
            "init_array" => Some(MemoryKind::InitArray),
            _ => None,
        }
    }
}

/// Lines that change which region is being described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header<'a> {
    /// `.privileged_functions` / `.privileged_ram`
    Privileged(MemoryKind),
    /// `.task_section_<task>_<ram|exram|stack|flash>`
    TaskSection { task: &'a str, memory: MemoryKind },
    /// `.text.*` / `.rodata.*` / `.init_array.*` input sections.
    Region(MemoryKind),
}

/// `length` bytes placed from the archive `library`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contribution<'a> {
    pub length: u64,
    pub library: &'a str,
}

/// What a line means while sizes are being attributed after a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributionLine<'a> {
    /// `COMMON 0x.. 0x.. .../lib<name>.a`: the block switches to the COMMON sub-format.
    CommonStart { library: &'a str },
    /// `.text.<sym>` / `.bss.<sym>` / ...; the size may follow on the same line.
    /// `trailing` is set when more text follows the section name.
    Symbol { raw_name: &'a str, contribution: Option<Contribution<'a>>, trailing: bool },
    /// `0x<addr> 0x<length> ... lib<name>.a`
    Contribution(Contribution<'a>),
    Unrecognized,
}

/// What a line means inside a COMMON block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonLine<'a> {
    Filler,
    Library { address: u64, library: &'a str },
    Symbol { address: u64, name: &'a str },
    /// Anything else ends the block.
    End,
}

/// True for the line that opens the memory map.
pub fn is_map_start(line: &str) -> bool {
    line.trim() == MAP_START
}

/// True for the line that ends attribution.
pub fn is_discard(line: &str) -> bool {
    line.trim() == DISCARD
}

/// True for linker padding lines.
pub fn is_filler(line: &str) -> bool {
    line.contains("*fill*")
}

/// Classify a region header, in priority order privileged, task section, region.
pub fn classify_header(line: &str) -> Option<Header<'_>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(caps) = PRIVILEGED_HEADER.captures(line) {
        return memory(&caps).map(Header::Privileged);
    }
    if let Some(caps) = TASK_SECTION_HEADER.captures(line) {
        let task = caps.name("name")?.as_str();
        return memory(&caps).map(|memory| Header::TaskSection { task, memory });
    }
    if let Some(caps) = REGION_HEADER.captures(line) {
        return memory(&caps).map(Header::Region);
    }
    None
}

/// Classify a line read while a header is awaiting attribution.
pub fn classify_attribution(line: &str) -> AttributionLine<'_> {
    if let Some(caps) = COMMON_START.captures(line) {
        if let Some(library) = caps.name("library") {
            return AttributionLine::CommonStart { library: library.as_str() };
        }
    }
    if let Some(caps) = SYMBOL_NAME.captures(line) {
        let mangle = caps.name("mangle").map(|m| m.as_str()).unwrap_or_default();
        let raw_name = mangle.trim().split('.').next().unwrap_or_default();
        let trailing = caps.name("rest").is_some();
        let contribution = if trailing { contribution(line) } else { None };
        return AttributionLine::Symbol { raw_name, contribution, trailing };
    }
    match contribution(line) {
        Some(c) => AttributionLine::Contribution(c),
        None => AttributionLine::Unrecognized,
    }
}

/// Size line inside a privileged block (full 64-bit address column required).
pub fn classify_privileged(line: &str) -> Option<Contribution<'_>> {
    PRIVILEGED_CONTRIBUTION.captures(line).and_then(|caps| contribution_from(&caps))
}

/// Classify a line inside a COMMON block.
pub fn classify_common(line: &str) -> CommonLine<'_> {
    if is_filler(line) {
        return CommonLine::Filler;
    }
    if let Some(caps) = COMMON_LIBRARY.captures(line) {
        if let (Some(address), Some(library)) = (hex(caps.name("address")), caps.name("library"))
        {
            return CommonLine::Library { address, library: library.as_str() };
        }
    }
    if let Some(caps) = COMMON_SYMBOL.captures(line) {
        if let (Some(address), Some(name)) = (hex(caps.name("address")), caps.name("name")) {
            return CommonLine::Symbol { address, name: name.as_str() };
        }
    }
    CommonLine::End
}

fn contribution(line: &str) -> Option<Contribution<'_>> {
    CONTRIBUTION.captures(line).and_then(|caps| contribution_from(&caps))
}

fn contribution_from<'a>(caps: &Captures<'a>) -> Option<Contribution<'a>> {
    let length = hex(caps.name("length"))?;
    let library = caps.name("library")?.as_str();
    Some(Contribution { length, library })
}

fn memory(caps: &Captures<'_>) -> Option<MemoryKind> {
    caps.name("memory").and_then(|m| MemoryKind::from_section(m.as_str()))
}

fn hex(m: Option<regex::Match<'_>>) -> Option<u64> {
    m.and_then(|m| u64::from_str_radix(m.as_str(), 16).ok())
}
