// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task-set TOML parsing
//!
//! The document is a `[[task]]` array of tables. A document that fails to
//! parse is an error; a record that fails validation is dropped with a
//! diagnostic while the rest of the document is kept.

use pacer_core::channel::ChannelConfig;
use pacer_core::task::TaskConfig;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

const DEFAULT_INTERVAL_MS: i64 = 1000;
const DEFAULT_TOLERANCE: i64 = 10;
const DEFAULT_REPEAT: i64 = 0;

/// Errors that fail the whole document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors that drop a single task record.
#[derive(Debug, Error)]
enum RecordError {
    #[error("task record is not a table")]
    NotATable,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("field {field} has the wrong type (expected {expected})")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field {field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },
    #[error("unknown task kind: {0}")]
    UnknownKind(String),
    #[error("field {field} is not a boolean: {value}")]
    NotABool { field: &'static str, value: String },
}

/// Which routine a task record instantiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskKind {
    #[serde(rename = "SensorTask")]
    Sensor,
    #[serde(rename = "ActuatorTask")]
    Actuator,
}

impl TaskKind {
    fn from_wire(value: &str) -> Option<Self> {
        match value {
            "SensorTask" => Some(Self::Sensor),
            "ActuatorTask" => Some(Self::Actuator),
            _ => None,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor => write!(f, "SensorTask"),
            Self::Actuator => write!(f, "ActuatorTask"),
        }
    }
}

/// One validated task record: the routine kind plus the full task config.
///
/// The reconciler compares specs field by field to decide whether a task
/// changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSpec {
    pub kind: TaskKind,
    pub config: TaskConfig,
}

impl fmt::Display for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) interval={}ms signal[tol={} rep={} allow={}] action[tol={} rep={} allow={}]",
            self.config.name,
            self.kind,
            self.config.interval_ms,
            self.config.signal.tolerance,
            self.config.signal.repeat,
            self.config.signal.allow,
            self.config.action.tolerance,
            self.config.action.repeat,
            self.config.action.allow,
        )
    }
}

/// Parse a task-set document from a file.
pub fn parse_file(path: &Path) -> Result<Vec<TaskSpec>, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_tasks(&content)
}

/// Parse a task-set document.
///
/// Invalid records are dropped with a warning; an empty or task-less
/// document yields an empty set.
pub fn parse_tasks(content: &str) -> Result<Vec<TaskSpec>, ParseError> {
    let raw: toml::Value = toml::from_str(content)?;

    let Some(records) = raw.get("task") else {
        return Ok(Vec::new());
    };
    let Some(records) = records.as_array() else {
        tracing::warn!("`task` is not an array of tables; treating document as empty");
        return Ok(Vec::new());
    };

    let mut specs = Vec::new();
    for (index, record) in records.iter().enumerate() {
        match parse_record(record) {
            Ok(spec) => specs.push(spec),
            Err(e) => tracing::warn!(index, error = %e, "dropping invalid task record"),
        }
    }
    Ok(specs)
}

fn parse_record(record: &toml::Value) -> Result<TaskSpec, RecordError> {
    let table = record.as_table().ok_or(RecordError::NotATable)?;

    let name = str_field(table, "name")?.ok_or(RecordError::MissingField("name"))?;
    if name.is_empty() {
        return Err(RecordError::MissingField("name"));
    }
    let kind = str_field(table, "kind")?.ok_or(RecordError::MissingField("kind"))?;
    let kind = TaskKind::from_wire(kind).ok_or_else(|| RecordError::UnknownKind(kind.to_string()))?;

    let interval_ms = int_field(table, "interval_ms", DEFAULT_INTERVAL_MS)?;
    if interval_ms <= 0 {
        return Err(RecordError::OutOfRange {
            field: "interval_ms",
            value: interval_ms,
        });
    }

    let config = TaskConfig {
        name: name.to_string(),
        interval_ms: interval_ms as u64,
        signal: ChannelConfig {
            tolerance: counter_field(table, "sig_tolerance", DEFAULT_TOLERANCE)?,
            repeat: counter_field(table, "sig_repeat", DEFAULT_REPEAT)?,
            allow: bool_field(table, "allow_signal", true)?,
        },
        action: ChannelConfig {
            tolerance: counter_field(table, "act_tolerance", DEFAULT_TOLERANCE)?,
            repeat: counter_field(table, "act_repeat", DEFAULT_REPEAT)?,
            allow: bool_field(table, "allow_action", true)?,
        },
    };

    Ok(TaskSpec { kind, config })
}

fn str_field<'a>(
    table: &'a toml::value::Table,
    field: &'static str,
) -> Result<Option<&'a str>, RecordError> {
    match table.get(field) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or(RecordError::WrongType {
                field,
                expected: "string",
            }),
    }
}

fn int_field(
    table: &toml::value::Table,
    field: &'static str,
    default: i64,
) -> Result<i64, RecordError> {
    match table.get(field) {
        None => Ok(default),
        Some(value) => value.as_integer().ok_or(RecordError::WrongType {
            field,
            expected: "integer",
        }),
    }
}

/// A tolerance or repeat value: non-negative, within `u32`.
fn counter_field(
    table: &toml::value::Table,
    field: &'static str,
    default: i64,
) -> Result<u32, RecordError> {
    let value = int_field(table, field, default)?;
    u32::try_from(value).map_err(|_| RecordError::OutOfRange { field, value })
}

/// A gate flag. Accepts TOML booleans, the integers 0/1, and the strings
/// true/false/1/0/yes/no in any case.
fn bool_field(
    table: &toml::value::Table,
    field: &'static str,
    default: bool,
) -> Result<bool, RecordError> {
    let Some(value) = table.get(field) else {
        return Ok(default);
    };
    match value {
        toml::Value::Boolean(b) => Ok(*b),
        toml::Value::Integer(0) => Ok(false),
        toml::Value::Integer(1) => Ok(true),
        toml::Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(RecordError::NotABool {
                field,
                value: s.clone(),
            }),
        },
        other => Err(RecordError::NotABool {
            field,
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
