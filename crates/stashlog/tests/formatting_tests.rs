//! Integration tests for entry construction and the JSON-lines output.
//!
//! Tests cover:
//! - Level filtering (property-based)
//! - JSON record shape and reserved keys
//! - Value types and special characters
//! - Console rendering through a custom writer
//! - Thread safety of concurrent appends

#![allow(clippy::uninlined_format_args)]

use proptest::prelude::*;
use stashlog::prelude::*;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use tempfile::TempDir;

fn file_logger(dir: &Path) -> Logger {
    Logger::open(Config {
        directory: Some(dir.to_path_buf()),
        filename_prefix: "t".to_string(),
        console_output: false,
        ..Default::default()
    })
    .unwrap()
}

fn read_lines(path: &Path) -> Vec<serde_json::Map<String, Value>> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ===========================================================================
// 1. Level Filtering
// ===========================================================================

fn any_level() -> impl Strategy<Value = Level> {
    prop::sample::select(Level::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn minimum_level_filters_lower_levels(low in any_level(), high in any_level()) {
        prop_assume!(low < high && high != Level::Panic);

        let dir = TempDir::new().unwrap();
        let logger = file_logger(dir.path());
        logger.set_level(high);

        logger.log(low, "below", Fields::new());
        logger.log(high, "at", Fields::new());

        let lines = read_lines(&dir.path().join("t.log"));
        prop_assert_eq!(lines.len(), 1);
        prop_assert_eq!(&lines[0]["msg"], &Value::from("at"));
        prop_assert_eq!(&lines[0]["level"], &Value::from(high.as_str()));
    }
}

#[test]
fn filtered_entries_do_not_count_as_writes() {
    let dir = TempDir::new().unwrap();
    let logger = file_logger(dir.path());
    logger.set_level(Level::Warn);
    logger.debug("no");
    logger.info("no");
    logger.warn("yes");
    assert_eq!(logger.write_count(), 1);
}

// ===========================================================================
// 2. JSON Records
// ===========================================================================

#[test]
fn json_record_contains_fields_and_system_keys() {
    let dir = TempDir::new().unwrap();
    let logger = file_logger(dir.path());
    logger.with_fields([("name", "tosone")]).error("test");

    let lines = read_lines(&dir.path().join("t.log"));
    assert_eq!(lines.len(), 1);
    let record = &lines[0];
    assert_eq!(record["name"], Value::from("tosone"));
    assert_eq!(record["msg"], Value::from("test"));
    assert_eq!(record["level"], Value::from("error"));
    assert_eq!(record["file"], Value::from("formatting_tests.rs"));
    assert!(record["line"].as_u64().unwrap() > 0);
    assert!(record["time"].is_string());
    assert_eq!(record.len(), 6);
}

#[test]
fn caller_line_points_at_call_site() {
    let dir = TempDir::new().unwrap();
    let logger = file_logger(dir.path());
    let expected = line!() + 1;
    logger.info("here");

    let lines = read_lines(&dir.path().join("t.log"));
    assert_eq!(lines[0]["line"], Value::from(expected));
}

#[test]
fn reserved_keys_are_overwritten() {
    let dir = TempDir::new().unwrap();
    let logger = file_logger(dir.path());
    logger
        .with_field("file", "user-supplied.txt")
        .with_field("line", "not a number")
        .info("collision");

    let lines = read_lines(&dir.path().join("t.log"));
    assert_eq!(lines[0]["file"], Value::from("formatting_tests.rs"));
    assert!(lines[0]["line"].is_u64());
}

#[test]
fn identical_calls_differ_only_in_time() {
    fn fixed() -> chrono::DateTime<chrono::Local> {
        use chrono::TimeZone;
        chrono::Local.with_ymd_and_hms(2024, 1, 2, 15, 4, 5).unwrap()
    }

    let dir = TempDir::new().unwrap();
    let logger = file_logger(dir.path());
    logger.set_time_function(fixed);

    let mut fields = Fields::new();
    fields.insert("k".to_string(), Value::from(1));
    for _ in 0..2 {
        logger.log_at(
            Level::Info,
            "same",
            fields.clone(),
            CallerInfo::new("app.rs", 7),
        );
    }

    let mut lines = read_lines(&dir.path().join("t.log"));
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["time"], Value::from("Jan 2 15:04:05"));
    for line in &mut lines {
        line.remove("time");
    }
    assert_eq!(lines[0], lines[1]);
}

#[test]
fn nested_values_round_trip() {
    let dir = TempDir::new().unwrap();
    let logger = file_logger(dir.path());
    logger
        .with_field("tags", vec!["a", "b"])
        .with_field("ratio", 0.25)
        .with_field("nothing", Value::Null)
        .with_field("nan", f64::NAN)
        .debug("values");

    let record = &read_lines(&dir.path().join("t.log"))[0];
    assert_eq!(record["tags"], serde_json::json!(["a", "b"]));
    assert_eq!(record["ratio"], serde_json::json!(0.25));
    assert!(record["nothing"].is_null());
    assert!(record["nan"].is_null());
}

#[test]
fn special_characters_stay_on_one_line() {
    let dir = TempDir::new().unwrap();
    let logger = file_logger(dir.path());
    logger
        .with_field("quote", "say \"hi\"\nbye")
        .info("line1\nline2\t\u{1F600}");

    let raw = fs::read_to_string(dir.path().join("t.log")).unwrap();
    assert_eq!(raw.lines().count(), 1);
    let record = &read_lines(&dir.path().join("t.log"))[0];
    assert_eq!(record["msg"], Value::from("line1\nline2\t\u{1F600}"));
}

#[test]
fn fatal_does_not_exit() {
    let dir = TempDir::new().unwrap();
    let logger = file_logger(dir.path());
    logger.fatal("still running");
    logger.info("after fatal");
    assert_eq!(read_lines(&dir.path().join("t.log")).len(), 2);
}

// ===========================================================================
// 3. Console
// ===========================================================================

#[test]
fn console_and_file_receive_same_entry() {
    let dir = TempDir::new().unwrap();
    let logger = Logger::open(Config {
        directory: Some(dir.path().to_path_buf()),
        color: false,
        ..Default::default()
    })
    .unwrap();
    let buffer = SharedBuffer::default();
    logger.set_console_writer(buffer.clone());

    logger.with_field("port", 8080).warn("listening");

    let console = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    assert!(console.starts_with("WARN["), "{}", console);
    assert!(console.contains("port=8080 file=formatting_tests.rs line="));

    let lines = read_lines(&dir.path().join("log.log"));
    assert_eq!(lines[0]["port"], Value::from(8080));
}

// ===========================================================================
// 4. Thread Safety
// ===========================================================================

#[test]
fn logger_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Logger>();
    assert_send_sync::<StashLayer>();
}

#[test]
fn concurrent_appends_produce_whole_lines() {
    let dir = TempDir::new().unwrap();
    let logger = file_logger(dir.path());
    let barrier = Arc::new(Barrier::new(4));
    let mut handles = vec![];

    for i in 0..4 {
        let l = logger.clone();
        let b = barrier.clone();
        handles.push(thread::spawn(move || {
            b.wait();
            for n in 0..50 {
                l.with_field("tid", i).with_field("n", n).info("concurrent");
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let lines = read_lines(&dir.path().join("t.log"));
    assert_eq!(lines.len(), 200);
    assert_eq!(logger.write_count(), 200);
    for tid in 0..4 {
        let count = lines.iter().filter(|l| l["tid"] == Value::from(tid)).count();
        assert_eq!(count, 50, "thread {}", tid);
    }
}
