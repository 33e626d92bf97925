//! Flattened log records and batches
//!
//! Every record handed to the ingestion endpoint is a flat mapping of string
//! keys to string values. Nested source entries are re-encoded verbatim into a
//! single field so downstream tables need no knowledge of the source schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Timestamp layout used for `TimeGenerated` and the `fromDateTime` query parameter
pub const ISO8601_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Field carrying the flatten time of every record
pub const TIME_GENERATED: &str = "TimeGenerated";

/// Format a UTC timestamp with second precision and a literal `Z` suffix
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(ISO8601_FORMAT).to_string()
}

/// A single flattened log record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct LogRecord(BTreeMap<String, String>);

impl LogRecord {
    /// Create a record stamped with the given `TimeGenerated` value
    pub fn new(time_generated: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(TIME_GENERATED.to_string(), time_generated.to_string());
        Self(fields)
    }

    /// Builder-style field insertion
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn time_generated(&self) -> Option<&str> {
        self.get(TIME_GENERATED)
    }

}

/// An ordered sequence of records produced by one collector
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct LogBatch {
    records: Vec<LogRecord>,
}

impl LogBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every record of `other`, keeping its order
    pub fn extend(&mut self, other: LogBatch) {
        self.records.extend(other.records);
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<LogRecord>> for LogBatch {
    fn from(records: Vec<LogRecord>) -> Self {
        Self { records }
    }
}

impl FromIterator<LogRecord> for LogBatch {
    fn from_iter<I: IntoIterator<Item = LogRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
