use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use memusage::commands::{modules_command, report_command, totals_command};
use memusage::init_logging;
use memusage_core::config::CliOverrides;
use memusage_core::demangle::DemanglerKind;

/// Per-task memory usage reports from GNU ld map files.
///
/// This CLI is a thin wrapper around `memusage-core` (exposed in code as
/// `memusage_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "memusage",
    version,
    about = "Per-task memory usage reports from linker map files",
    long_about = None
)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Where to look for modules.
#[derive(Args, Debug, Clone, Default)]
struct CatalogArgs {
    /// YAML or JSON configuration file; flags given here override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Build directory to search for modules (repeatable). Defaults to the current directory.
    #[arg(long = "directory", short = 'd', num_args = 1..)]
    directories: Vec<PathBuf>,

    /// Folder to skip when it is given as a search root (repeatable).
    #[arg(long = "exclude-folders", num_args = 1..)]
    exclude_folders: Vec<PathBuf>,

    /// Regex of library files to ignore, matched case-insensitively (repeatable).
    #[arg(long = "exclude-files", num_args = 1..)]
    exclude_files: Vec<String>,

    /// Only include these module directories (case-insensitive).
    #[arg(long, num_args = 1..)]
    modules: Option<Vec<String>>,
}

impl CatalogArgs {
    fn overrides(self) -> (Option<PathBuf>, CliOverrides) {
        let overrides = CliOverrides {
            directories: self.directories,
            exclude_folders: self.exclude_folders,
            exclude_files: self.exclude_files,
            modules: self.modules,
            ..CliOverrides::default()
        };
        (self.config, overrides)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a map file and write HTML, CSV and/or JSON reports.
    ///
    /// Modules are discovered from the build directories, the map file is
    /// attributed to tasks and modules, and a short summary is printed.
    Report {
        #[command(flatten)]
        catalog: CatalogArgs,

        /// Linker map file to analyse.
        #[arg(long = "map-file", short = 'm')]
        map_file: Option<PathBuf>,

        /// Write the HTML report here.
        #[arg(long)]
        html: Option<PathBuf>,

        /// Write the CSV summary here.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the JSON report here.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Report heading prefix.
        #[arg(long)]
        title: Option<String>,

        /// Symbol demangler: auto, cpp, cxxfilt or none.
        #[arg(long)]
        demangler: Option<DemanglerKind>,

        /// c++filt executable used by the cxxfilt demangler.
        #[arg(long)]
        cxxfilt: Option<PathBuf>,
    },

    /// List the modules discovered in the build directories.
    Modules {
        #[command(flatten)]
        catalog: CatalogArgs,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show memory capacity and used totals of a map file.
    Totals {
        /// Linker map file to analyse.
        #[arg(long = "map-file", short = 'm')]
        map_file: PathBuf,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Report { catalog, map_file, html, csv, json, title, demangler, cxxfilt } => {
            let (config, mut overrides) = catalog.overrides();
            overrides.map_file = map_file;
            overrides.html = html;
            overrides.csv = csv;
            overrides.json = json;
            overrides.title = title;
            overrides.demangler = demangler;
            overrides.cxxfilt = cxxfilt;
            report_command(config.as_deref(), overrides)
        }
        Command::Modules { catalog, json } => {
            let (config, overrides) = catalog.overrides();
            modules_command(config.as_deref(), overrides, json)
        }
        Command::Totals { map_file, json } => totals_command(&map_file, json),
    }
}
