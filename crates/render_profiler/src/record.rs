//! The recording table: per-instance render counters.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProfilerResult;
use crate::sink::LogSink;

/// Key of a row in the recording table: `"<component>: <identifier>"`.
pub type RecordKey = String;

const INDEX_LABEL: &str = "(index)";
const OWNER_LABEL: &str = "Owner > component";
const RENDERS_LABEL: &str = "Renders";
const RE_RENDERS_LABEL: &str = "Re-renders";
const WASTED_RENDERS_LABEL: &str = "Wasted renders";
const WASTED_TIME_LABEL: &str = "Wasted time (ms)";

/// Build the record key for an instance.
pub fn record_key(component_name: &str, identifier: &str) -> RecordKey {
    format!("{component_name}: {identifier}")
}

/// Build the owner description for an instance.
///
/// The owner name is left empty when the host cannot tell who rendered the
/// component.
pub fn owner_description(owner: Option<&str>, component_name: &str) -> String {
    format!("{} > {}", owner.unwrap_or_default(), component_name)
}

/// Counters for one wrapped instance.
///
/// `wasted_renders <= re_renders <= renders` always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    /// `"<owner> > <component>"`
    #[serde(rename = "Owner > component")]
    pub owner: String,
    /// Render cycles observed while recording, mounts included
    #[serde(rename = "Renders")]
    pub renders: u64,
    /// Update cycles observed while recording
    #[serde(rename = "Re-renders")]
    pub re_renders: u64,
    /// Update cycles in which no prop changed
    #[serde(rename = "Wasted renders")]
    pub wasted_renders: u64,
    /// Total render time of wasted cycles, in milliseconds
    #[serde(rename = "Wasted time (ms)")]
    pub wasted_time_ms: f64,
}

impl RecordRow {
    /// Create a zeroed row.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            ..Self::default()
        }
    }

    /// Zero all counters, keeping the owner description.
    pub fn reset(&mut self) {
        self.renders = 0;
        self.re_renders = 0;
        self.wasted_renders = 0;
        self.wasted_time_ms = 0.0;
    }

    /// Whether every counter is zero.
    pub fn is_zeroed(&self) -> bool {
        self.renders == 0
            && self.re_renders == 0
            && self.wasted_renders == 0
            && self.wasted_time_ms == 0.0
    }
}

/// Whether the table is currently accumulating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// Updates are ignored
    #[default]
    Idle,
    /// Updates accumulate into rows
    Recording,
}

/// Table of render counters keyed by [`RecordKey`].
///
/// Rows are created when an instance mounts and only accumulate between
/// [`start`](Self::start) and [`stop`](Self::stop).
#[derive(Debug, Default)]
pub struct RecordTable {
    rows: BTreeMap<RecordKey, RecordRow>,
    state: RecordingState,
}

impl RecordTable {
    /// Create an empty, idle table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or overwrite) a zeroed row and return its key.
    pub fn create_row(&mut self, key: impl Into<RecordKey>, owner: impl Into<String>) -> RecordKey {
        let key = key.into();
        self.rows.insert(key.clone(), RecordRow::new(owner));
        key
    }

    /// Count a mount. No-op unless recording or if the key is unknown.
    pub fn record_mount(&mut self, key: &str) {
        if self.state != RecordingState::Recording {
            return;
        }
        if let Some(row) = self.rows.get_mut(key) {
            row.renders += 1;
        }
    }

    /// Count an update cycle.
    ///
    /// No-op unless recording. Unknown keys are ignored and never create a
    /// row. Negative or non-finite elapsed times count as zero.
    pub fn update(&mut self, key: &str, has_changes: bool, elapsed_ms: f64) {
        if self.state != RecordingState::Recording {
            return;
        }
        let Some(row) = self.rows.get_mut(key) else {
            tracing::trace!(
                target: "render_profiler::record",
                key,
                "update for unknown record ignored"
            );
            return;
        };

        row.renders += 1;
        row.re_renders += 1;
        if !has_changes {
            row.wasted_renders += 1;
            if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
                row.wasted_time_ms += elapsed_ms;
            }
        }

        tracing::trace!(
            target: "render_profiler::record",
            key,
            has_changes,
            elapsed_ms,
            "render recorded"
        );
    }

    /// Begin recording, zeroing every row.
    pub fn start(&mut self) {
        self.state = RecordingState::Recording;
        self.reset();
        tracing::debug!(
            target: "render_profiler::record",
            rows = self.rows.len(),
            "recording started"
        );
    }

    /// Stop recording, emit the table to the sink, then zero every row.
    ///
    /// Returns the dump that was emitted.
    pub fn stop(&mut self, sink: &dyn LogSink) -> RecordDump {
        self.state = RecordingState::Idle;
        let dump = self.snapshot();
        sink.table(&dump);
        self.reset();
        tracing::debug!(target: "render_profiler::record", rows = dump.len(), "recording stopped");
        dump
    }

    /// Zero every row's counters.
    pub fn reset(&mut self) {
        self.rows.values_mut().for_each(RecordRow::reset);
    }

    /// Copy of all rows.
    pub fn snapshot(&self) -> RecordDump {
        RecordDump(self.rows.clone())
    }

    /// Get a row.
    pub fn row(&self, key: &str) -> Option<&RecordRow> {
        self.rows.get(key)
    }

    /// Current recording state.
    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// Whether updates currently accumulate.
    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Snapshot of the recording table, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordDump(BTreeMap<RecordKey, RecordRow>);

impl RecordDump {
    /// Get a row.
    pub fn get(&self, key: &str) -> Option<&RecordRow> {
        self.0.get(key)
    }

    /// Iterate rows in key order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &RecordRow)> {
        self.0.iter().map(|(key, row)| (key.as_str(), row))
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the dump has no rows.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every row's counters are zero.
    pub fn is_zeroed(&self) -> bool {
        self.0.values().all(RecordRow::is_zeroed)
    }

    /// Wasted time summed over all rows.
    pub fn total_wasted_time_ms(&self) -> f64 {
        self.0.values().map(|row| row.wasted_time_ms).sum()
    }

    /// Serialize to pretty-printed JSON keyed by record key.
    pub fn to_json(&self) -> ProfilerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for RecordDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = [
            INDEX_LABEL,
            OWNER_LABEL,
            RENDERS_LABEL,
            RE_RENDERS_LABEL,
            WASTED_RENDERS_LABEL,
            WASTED_TIME_LABEL,
        ]
        .map(String::from);

        let cells: Vec<[String; 6]> = self
            .0
            .iter()
            .map(|(key, row)| {
                [
                    key.clone(),
                    row.owner.clone(),
                    row.renders.to_string(),
                    row.re_renders.to_string(),
                    row.wasted_renders.to_string(),
                    format!("{:.3}", row.wasted_time_ms),
                ]
            })
            .collect();

        let mut widths = header.clone().map(|cell| cell.chars().count());
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        write_table_row(f, &header, &widths)?;
        let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
        write_table_row(f, &rule, &widths)?;
        for row in &cells {
            write_table_row(f, row, &widths)?;
        }
        Ok(())
    }
}

fn write_table_row(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    let last = cells.len().saturating_sub(1);
    for (index, (cell, &width)) in cells.iter().zip(widths).enumerate() {
        if index > 0 {
            f.write_str(" | ")?;
        }
        if index == last {
            f.write_str(cell)?;
        } else {
            write!(f, "{cell:<width$}")?;
        }
    }
    writeln!(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{MemorySink, SinkEvent};
    use proptest::prelude::*;

    fn recording_table() -> RecordTable {
        let mut table = RecordTable::new();
        table.create_row("Foo: id1", "Bar > Foo");
        table.start();
        table
    }

    #[test]
    fn test_keys_and_owner() {
        assert_eq!(record_key("Foo", "id1"), "Foo: id1");
        assert_eq!(owner_description(Some("Bar"), "Foo"), "Bar > Foo");
        assert_eq!(owner_description(None, "Foo"), " > Foo");
    }

    #[test]
    fn test_updates_ignored_while_idle() {
        let mut table = RecordTable::new();
        table.create_row("Foo: id1", "Bar > Foo");
        table.update("Foo: id1", false, 4.0);
        table.record_mount("Foo: id1");
        assert!(table.row("Foo: id1").unwrap().is_zeroed());
        assert_eq!(table.state(), RecordingState::Idle);
    }

    #[test]
    fn test_wasted_render_accounting() {
        let mut table = recording_table();
        table.update("Foo: id1", true, 5.0);
        table.update("Foo: id1", false, 1.5);
        table.update("Foo: id1", false, 2.0);

        let row = table.row("Foo: id1").unwrap();
        assert_eq!(row.renders, 3);
        assert_eq!(row.re_renders, 3);
        assert_eq!(row.wasted_renders, 2);
        assert_eq!(row.wasted_time_ms, 3.5);
    }

    #[test]
    fn test_mount_counts_as_render_only() {
        let mut table = recording_table();
        table.record_mount("Foo: id1");
        table.update("Foo: id1", false, 1.0);

        let row = table.row("Foo: id1").unwrap();
        assert_eq!(row.renders, 2);
        assert_eq!(row.re_renders, 1);
        assert_eq!(row.wasted_renders, 1);
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let mut table = recording_table();
        table.update("Missing: x", false, 3.0);
        table.record_mount("Missing: x");
        assert!(table.row("Missing: x").is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_invalid_elapsed_is_clamped() {
        let mut table = recording_table();
        table.update("Foo: id1", false, -2.0);
        table.update("Foo: id1", false, f64::NAN);

        let row = table.row("Foo: id1").unwrap();
        assert_eq!(row.wasted_renders, 2);
        assert_eq!(row.wasted_time_ms, 0.0);
    }

    #[test]
    fn test_create_row_overwrites() {
        let mut table = recording_table();
        table.update("Foo: id1", false, 3.0);
        let key = table.create_row("Foo: id1", "Baz > Foo");
        assert_eq!(key, "Foo: id1");

        let row = table.row("Foo: id1").unwrap();
        assert_eq!(row.owner, "Baz > Foo");
        assert!(row.is_zeroed());
    }

    #[test]
    fn test_start_resets_but_keeps_owner() {
        let mut table = recording_table();
        table.update("Foo: id1", false, 3.0);
        table.start();

        let row = table.row("Foo: id1").unwrap();
        assert!(row.is_zeroed());
        assert_eq!(row.owner, "Bar > Foo");
    }

    #[test]
    fn test_stop_dumps_then_resets() {
        let sink = MemorySink::new();
        let mut table = recording_table();
        table.update("Foo: id1", false, 2.0);

        let dump = table.stop(&sink);
        assert_eq!(dump.get("Foo: id1").unwrap().wasted_renders, 1);
        assert_eq!(sink.events(), vec![SinkEvent::Table(dump)]);
        assert!(table.row("Foo: id1").unwrap().is_zeroed());
        assert!(!table.is_recording());
    }

    #[test]
    fn test_stop_twice_is_idempotent() {
        let sink = MemorySink::new();
        let mut table = recording_table();

        let first = table.stop(&sink);
        let second = table.stop(&sink);
        assert_eq!(first, second);
        assert!(first.is_zeroed());
        assert_eq!(table.state(), RecordingState::Idle);
    }

    #[test]
    fn test_dump_json_labels() {
        let mut table = recording_table();
        table.update("Foo: id1", false, 2.0);
        let json = table.snapshot().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let row = &value["Foo: id1"];
        assert_eq!(row["Owner > component"], "Bar > Foo");
        assert_eq!(row["Renders"], 1);
        assert_eq!(row["Re-renders"], 1);
        assert_eq!(row["Wasted renders"], 1);
        assert_eq!(row["Wasted time (ms)"], 2.0);
    }

    #[test]
    fn test_dump_display() {
        let mut table = recording_table();
        table.update("Foo: id1", false, 2.0);
        let text = table.snapshot().to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("(index)"));
        assert!(lines[0].contains("Wasted time (ms)"));
        assert!(lines[1].starts_with("---"));
        assert!(lines[2].starts_with("Foo: id1"));
        assert!(lines[2].contains("Bar > Foo"));
        assert!(lines[2].ends_with("2.000"));
    }

    proptest! {
        #[test]
        fn counters_stay_consistent(
            cycles in prop::collection::vec((any::<bool>(), any::<bool>(), 0.0f64..50.0), 0..40)
        ) {
            let mut table = recording_table();
            let mut last_wasted_time = 0.0;
            for (is_mount, has_changes, elapsed_ms) in cycles {
                if is_mount {
                    table.record_mount("Foo: id1");
                } else {
                    table.update("Foo: id1", has_changes, elapsed_ms);
                }
                let row = table.row("Foo: id1").unwrap();
                prop_assert!(row.wasted_renders <= row.re_renders);
                prop_assert!(row.re_renders <= row.renders);
                prop_assert!(row.wasted_time_ms >= last_wasted_time);
                last_wasted_time = row.wasted_time_ms;
            }
        }
    }
}
