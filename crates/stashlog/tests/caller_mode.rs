//! Caller locations found by walking the stack.

use stashlog::{CallerMode, Config, Logger, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn backtrace_logger(dir: &Path) -> Logger {
    let logger = Logger::open(Config {
        directory: Some(dir.to_path_buf()),
        console_output: false,
        ..Default::default()
    })
    .unwrap();
    logger.set_caller_mode(CallerMode::Backtrace { skip: 0 });
    logger
}

fn last_record(dir: &Path) -> serde_json::Map<String, Value> {
    let contents = fs::read_to_string(dir.join("log.log")).unwrap();
    serde_json::from_str(contents.lines().last().unwrap()).unwrap()
}

/// Returns the line of its own log call.
#[inline(never)]
fn log_from_helper(logger: &Logger) -> u32 {
    let line = line!() + 1;
    logger.info("from helper");
    line
}

#[inline(never)]
fn log_entry_from_helper(logger: &Logger) -> u32 {
    let line = line!() + 1;
    logger.with_field("k", 1).warn("entry from helper");
    line
}

#[test]
fn backtrace_reports_the_function_that_logged() {
    let dir = TempDir::new().unwrap();
    let logger = backtrace_logger(dir.path());

    let expected = log_from_helper(&logger);

    let record = last_record(dir.path());
    assert_eq!(record["file"], Value::from("caller_mode.rs"));
    assert_eq!(record["line"], Value::from(expected));
}

#[test]
fn backtrace_reports_entry_call_site() {
    let dir = TempDir::new().unwrap();
    let logger = backtrace_logger(dir.path());

    let expected = log_entry_from_helper(&logger);

    let record = last_record(dir.path());
    assert_eq!(record["file"], Value::from("caller_mode.rs"));
    assert_eq!(record["line"], Value::from(expected));
}
