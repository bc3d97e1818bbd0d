//! Console and JSON rendering of a single entry.

use crate::caller::CallerInfo;
use crate::error::Result;
use crate::{Level, keys};
use chrono::{DateTime, Local};
use colored::Colorize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Context fields attached to an entry.
pub type Fields = BTreeMap<String, Value>;

/// Timestamp format: `Jan 2 15:04:05`, no year and no zone.
pub const DEFAULT_TIME_FORMAT: &str = "%b %-d %H:%M:%S";

/// Column width the console message is padded to.
pub const MESSAGE_WIDTH: usize = 40;

/// Written to the file in place of an entry that could not be serialized.
///
/// Fixed bytes so that reporting a serialization failure can never fail
/// the same way again.
pub const LAST_RESORT_LINE: &[u8] = b"{\"level\":\"fatal\",\"msg\":\"cannot convert fields to string\"}\n";

/// Type alias for the clock used to stamp entries.
pub type TimeFunction = fn() -> DateTime<Local>;

/// Returns the current wall-clock time.
#[must_use]
pub fn now_local() -> DateTime<Local> {
    Local::now()
}

/// Formats a time the way entries are stamped.
#[must_use]
pub fn format_timestamp(time: &DateTime<Local>) -> String {
    time.format(DEFAULT_TIME_FORMAT).to_string()
}

/// A finalized entry, ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Severity.
    pub level: Level,
    /// Message text.
    pub message: String,
    /// Caller-supplied fields.
    pub fields: Fields,
    /// Source location of the log call.
    pub caller: CallerInfo,
    /// Render-time timestamp.
    pub timestamp: String,
}

impl Record {
    /// Stamps a new record with `time`.
    #[must_use]
    pub fn new(
        level: Level,
        message: impl Into<String>,
        fields: Fields,
        caller: CallerInfo,
        time: &DateTime<Local>,
    ) -> Self {
        Self {
            level,
            message: message.into(),
            fields,
            caller,
            timestamp: format_timestamp(time),
        }
    }

    /// Renders the human-readable console line, without a trailing newline.
    ///
    /// `LEVL[Mon D HH:MM:SS] message<padding> key=value ... file=x.rs line=N`
    ///
    /// Caller fields come first with green keys; the reserved `file` and
    /// `line` fields close the line with red keys. A caller field named
    /// `file` or `line` is replaced by the caller location.
    #[must_use]
    pub fn console_line(&self, color: bool) -> String {
        let label = self.level.as_upper_str();
        let mut line = if color {
            format!("{}", self.level.color_band().paint(label))
        } else {
            label.to_string()
        };
        line.push('[');
        line.push_str(&self.timestamp);
        line.push_str("] ");
        line.push_str(&format!("{:<width$}", self.message, width = MESSAGE_WIDTH));

        for (key, value) in &self.fields {
            if is_reserved(key) {
                continue;
            }
            let key = if color {
                key.green().to_string()
            } else {
                key.clone()
            };
            push_pair(&mut line, &key, &display_value(value));
        }

        let (file_key, line_key) = if color {
            (keys::FILE.red().to_string(), keys::LINE.red().to_string())
        } else {
            (keys::FILE.to_string(), keys::LINE.to_string())
        };
        push_pair(&mut line, &file_key, &self.caller.file);
        push_pair(&mut line, &line_key, &self.caller.line.to_string());
        line
    }

    /// Builds the flat JSON object written to the file.
    ///
    /// System keys (`file`, `line`, `time`, `level`, `msg`) overwrite
    /// caller fields of the same name.
    #[must_use]
    pub fn json_object(&self) -> Map<String, Value> {
        let mut object: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        object.insert(keys::FILE.to_string(), Value::from(self.caller.file.clone()));
        object.insert(keys::LINE.to_string(), Value::from(self.caller.line));
        object.insert(keys::TIMESTAMP.to_string(), Value::from(self.timestamp.clone()));
        object.insert(keys::LEVEL.to_string(), Value::from(self.level.as_str()));
        object.insert(keys::MESSAGE.to_string(), Value::from(self.message.clone()));
        object
    }

    /// Serializes the record as one JSON-lines record, newline included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialize`](crate::Error::Serialize) when the
    /// encoder rejects the object.
    pub fn to_json_line(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec(&self.json_object())?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

fn is_reserved(key: &str) -> bool {
    key == keys::FILE || key == keys::LINE
}

fn push_pair(line: &mut String, key: &str, value: &str) {
    line.push(' ');
    line.push_str(key);
    line.push('=');
    line.push_str(value);
}

/// Strings print bare; everything else prints as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
