//! Log sinks receiving grouped render reports and recording dumps.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::time::Duration;

use crate::record::RecordDump;

/// Tracing target used by [`TracingSink`].
pub const TARGET: &str = "render_profiler";

/// Console-like destination for profiler output.
///
/// Groups nest: every [`group_start`](Self::group_start) is paired with a
/// [`group_end`](Self::group_end). Methods take `&self`, sinks use interior
/// mutability for their state.
pub trait LogSink {
    /// Open a group. `highlighted` marks headers of renders with changes.
    fn group_start(&self, collapsed: bool, highlighted: bool, message: &str);

    /// Close the innermost group.
    fn group_end(&self);

    /// A named interval started.
    fn time(&self, label: &str);

    /// A named interval ended after `elapsed`.
    fn time_end(&self, label: &str, elapsed: Duration);

    /// Begin a named performance profile.
    fn profile(&self, label: &str);

    /// End the named performance profile.
    fn profile_end(&self, label: &str);

    /// A single log line.
    fn log(&self, message: &str);

    /// A tabular dump of the recording table.
    fn table(&self, dump: &RecordDump);
}

/// Sink emitting `tracing` events.
///
/// Group nesting is reported through a `depth` field. Profiles open a
/// `render_profile` span that stays entered until the profile ends.
#[derive(Default)]
pub struct TracingSink {
    depth: Cell<usize>,
    profiles: RefCell<Vec<tracing::span::EnteredSpan>>,
}

impl TracingSink {
    /// Create a sink at depth zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current group nesting depth.
    pub fn depth(&self) -> usize {
        self.depth.get()
    }
}

impl fmt::Debug for TracingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracingSink")
            .field("depth", &self.depth.get())
            .field("open_profiles", &self.profiles.borrow().len())
            .finish()
    }
}

impl LogSink for TracingSink {
    fn group_start(&self, collapsed: bool, highlighted: bool, message: &str) {
        let depth = self.depth.get();
        tracing::info!(target: TARGET, depth, collapsed, highlighted, "{message}");
        self.depth.set(depth + 1);
    }

    fn group_end(&self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }

    fn time(&self, label: &str) {
        tracing::trace!(target: TARGET, depth = self.depth.get(), label, "timer started");
    }

    fn time_end(&self, label: &str, elapsed: Duration) {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        tracing::info!(
            target: TARGET,
            depth = self.depth.get(),
            elapsed_ms,
            "{label}: {elapsed_ms:.3}ms"
        );
    }

    fn profile(&self, label: &str) {
        let span = tracing::debug_span!(target: TARGET, "render_profile", label).entered();
        self.profiles.borrow_mut().push(span);
    }

    fn profile_end(&self, label: &str) {
        if self.profiles.borrow_mut().pop().is_none() {
            tracing::warn!(target: TARGET, label, "profile ended without a matching start");
        }
    }

    fn log(&self, message: &str) {
        tracing::info!(target: TARGET, depth = self.depth.get(), "{message}");
    }

    fn table(&self, dump: &RecordDump) {
        tracing::info!(
            target: TARGET,
            rows = dump.len(),
            wasted_time_ms = dump.total_wasted_time_ms(),
            "render recording"
        );
        for line in dump.to_string().lines() {
            tracing::info!(target: TARGET, "{line}");
        }
    }
}

/// One call received by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    GroupStart {
        collapsed: bool,
        highlighted: bool,
        message: String,
    },
    GroupEnd,
    Time(String),
    TimeEnd { label: String, elapsed: Duration },
    Profile(String),
    ProfileEnd(String),
    Log(String),
    Table(RecordDump),
}

/// Sink that records every call, for inspecting profiler output in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: RefCell<Vec<SinkEvent>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events received so far.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.borrow().clone()
    }

    /// Take all events received so far, leaving the sink empty.
    pub fn take(&self) -> Vec<SinkEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Number of events received.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Whether no events were received.
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Messages of every [`SinkEvent::Log`] event.
    pub fn log_lines(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Log(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    /// The last table dump received, if any.
    pub fn last_table(&self) -> Option<RecordDump> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            SinkEvent::Table(dump) => Some(dump.clone()),
            _ => None,
        })
    }

    fn push(&self, event: SinkEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl LogSink for MemorySink {
    fn group_start(&self, collapsed: bool, highlighted: bool, message: &str) {
        self.push(SinkEvent::GroupStart {
            collapsed,
            highlighted,
            message: message.to_string(),
        });
    }

    fn group_end(&self) {
        self.push(SinkEvent::GroupEnd);
    }

    fn time(&self, label: &str) {
        self.push(SinkEvent::Time(label.to_string()));
    }

    fn time_end(&self, label: &str, elapsed: Duration) {
        self.push(SinkEvent::TimeEnd {
            label: label.to_string(),
            elapsed,
        });
    }

    fn profile(&self, label: &str) {
        self.push(SinkEvent::Profile(label.to_string()));
    }

    fn profile_end(&self, label: &str) {
        self.push(SinkEvent::ProfileEnd(label.to_string()));
    }

    fn log(&self, message: &str) {
        self.push(SinkEvent::Log(message.to_string()));
    }

    fn table(&self, dump: &RecordDump) {
        self.push(SinkEvent::Table(dump.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_sink_depth() {
        let sink = TracingSink::new();
        sink.group_start(true, true, "Mounted Foo");
        sink.group_start(false, false, "Rendered Bar");
        assert_eq!(sink.depth(), 2);
        sink.group_end();
        sink.group_end();
        sink.group_end();
        assert_eq!(sink.depth(), 0);
    }

    #[test]
    fn test_tracing_sink_profiles_pair() {
        let sink = TracingSink::new();
        sink.profile("render");
        assert_eq!(sink.profiles.borrow().len(), 1);
        sink.profile_end("render");
        sink.profile_end("render");
        assert!(sink.profiles.borrow().is_empty());
    }

    #[test]
    fn test_memory_sink_records_calls() {
        let sink = MemorySink::new();
        sink.group_start(true, false, "Rendered Foo");
        sink.log("no changed props");
        sink.group_end();

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.log_lines(), vec!["no changed props".to_string()]);
        assert!(sink.last_table().is_none());

        let events = sink.take();
        assert_eq!(events[2], SinkEvent::GroupEnd);
        assert!(sink.is_empty());
    }
}
