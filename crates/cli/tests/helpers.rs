use std::fs;
use std::path::Path;

use log::LevelFilter;
use memusage::{canonicalize_or_current, level_for_verbosity, write_output};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_returns_cwd_for_dot() {
    let cwd = std::env::current_dir().expect("cwd");
    let result = canonicalize_or_current(Path::new(".")).expect("canonicalize");
    assert_eq!(result, cwd);
}

#[test]
fn canonicalize_or_current_resolves_existing_paths() {
    let tmp = tempdir().expect("tempdir");
    let nested = tmp.path().join("nested");
    fs::create_dir_all(&nested).expect("create nested");

    let result = canonicalize_or_current(&nested).expect("canonicalize nested");
    assert_eq!(result, nested.canonicalize().expect("canonicalize subdir"));
}

#[test]
fn canonicalize_or_current_keeps_missing_absolute_paths() {
    let tmp = tempdir().expect("tempdir");
    let missing = tmp.path().join("not-built-yet");
    assert_eq!(canonicalize_or_current(&missing).expect("missing"), missing);
}

#[test]
fn verbosity_raises_the_log_level() {
    assert_eq!(level_for_verbosity(0), LevelFilter::Warn);
    assert_eq!(level_for_verbosity(1), LevelFilter::Info);
    assert_eq!(level_for_verbosity(2), LevelFilter::Debug);
    assert_eq!(level_for_verbosity(9), LevelFilter::Trace);
}

#[test]
fn write_output_creates_parent_directories() {
    let tmp = tempdir().expect("tempdir");
    let target = tmp.path().join("reports/nightly/usage.csv");
    write_output(&target, "data").expect("write");
    assert_eq!(fs::read_to_string(&target).unwrap(), "data");
}

#[test]
fn write_output_reports_the_failing_path() {
    let tmp = tempdir().expect("tempdir");
    let blocker = tmp.path().join("file");
    fs::write(&blocker, "x").unwrap();
    let err = write_output(&blocker.join("out.html"), "data").unwrap_err();
    assert!(err.to_string().contains("Failed to create directory"), "unexpected error: {err}");
}
