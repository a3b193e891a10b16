//! The profiler context shared by every measured component.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::component::Component;
use crate::config::{MeasureOptions, ProfilerConfig};
use crate::error::ProfilerResult;
use crate::identifier::IdentifierStrategy;
use crate::measure::{self, MeasureHook, Wrapped};
use crate::record::{RecordDump, RecordKey, RecordRow, RecordTable, RecordingState};
use crate::sink::{LogSink, TracingSink};

/// Handle to the recording table, log sink and configuration.
///
/// Construct one at the application entry point and clone it into every
/// wrapped component; clones share the same table. The handle is
/// single-threaded (`!Send`), matching a UI render loop.
///
/// # Example
///
/// ```rust
/// use render_profiler::{Component, FnComponent, Profiler, ProfilerConfig};
///
/// let profiler = Profiler::new(ProfilerConfig::development());
/// let mut title = profiler.wrap("main", FnComponent::new("Title", |text: &String| text.len()));
///
/// profiler.start();
/// title.render(&"Hello".to_string());
/// title.render(&"Hello".to_string());
/// let dump = profiler.stop();
///
/// // without the `instrument` feature, wrapping is a pass-through
/// if profiler.is_active() {
///     assert_eq!(dump.get("Title: main").unwrap().wasted_renders, 1);
/// } else {
///     assert!(dump.is_empty());
/// }
/// ```
#[derive(Clone)]
pub struct Profiler {
    inner: Rc<ProfilerInner>,
}

struct ProfilerInner {
    config: ProfilerConfig,
    table: RefCell<RecordTable>,
    sink: Rc<dyn LogSink>,
}

impl Profiler {
    /// Create a profiler logging through `tracing`.
    pub fn new(config: ProfilerConfig) -> Self {
        Self::with_sink(config, Rc::new(TracingSink::new()))
    }

    /// Create a profiler writing to a custom sink.
    pub fn with_sink(config: ProfilerConfig, sink: Rc<dyn LogSink>) -> Self {
        tracing::debug!(
            target: "render_profiler",
            environment = ?config.environment,
            active = config.environment.is_development(),
            "profiler created"
        );
        Self {
            inner: Rc::new(ProfilerInner {
                config,
                table: RefCell::new(RecordTable::new()),
                sink,
            }),
        }
    }

    /// Create a profiler configured from the process environment.
    pub fn from_env() -> ProfilerResult<Self> {
        Ok(Self::new(ProfilerConfig::from_env()?))
    }

    /// The configuration.
    pub fn config(&self) -> &ProfilerConfig {
        &self.inner.config
    }

    /// Whether wrapping instruments components.
    pub fn is_active(&self) -> bool {
        self.inner.config.environment.is_development()
    }

    /// The log sink.
    pub fn sink(&self) -> &dyn LogSink {
        self.inner.sink.as_ref()
    }

    /// Wrap a component using the configured default options.
    pub fn wrap<C>(&self, strategy: impl Into<IdentifierStrategy>, component: C) -> Wrapped<C>
    where
        C: Component,
        C::Props: Serialize,
    {
        measure::wrap(self, strategy, component, self.inner.config.options)
    }

    /// Wrap a component with explicit options.
    pub fn wrap_with<C>(
        &self,
        strategy: impl Into<IdentifierStrategy>,
        component: C,
        options: MeasureOptions,
    ) -> Wrapped<C>
    where
        C: Component,
        C::Props: Serialize,
    {
        measure::wrap(self, strategy, component, options)
    }

    /// Instrumentation for a function component using the configured default
    /// options, or `None` when inactive.
    pub fn hook(
        &self,
        component_name: impl Into<String>,
        strategy: impl Into<IdentifierStrategy>,
    ) -> Option<MeasureHook> {
        self.hook_with(component_name, strategy, self.inner.config.options)
    }

    /// Instrumentation for a function component with explicit options, or
    /// `None` when inactive.
    pub fn hook_with(
        &self,
        component_name: impl Into<String>,
        strategy: impl Into<IdentifierStrategy>,
        options: MeasureOptions,
    ) -> Option<MeasureHook> {
        if !self.is_active() {
            return None;
        }
        Some(MeasureHook::new(self.clone(), component_name, strategy.into(), options))
    }

    /// Start recording, zeroing all rows.
    pub fn start(&self) {
        self.inner.table.borrow_mut().start();
    }

    /// Stop recording: dump the table to the sink, zero all rows, and return
    /// the dump.
    pub fn stop(&self) -> RecordDump {
        self.inner.table.borrow_mut().stop(self.sink())
    }

    /// Current recording state.
    pub fn state(&self) -> RecordingState {
        self.inner.table.borrow().state()
    }

    /// Whether updates currently accumulate.
    pub fn is_recording(&self) -> bool {
        self.inner.table.borrow().is_recording()
    }

    /// Copy of the table without stopping.
    pub fn snapshot(&self) -> RecordDump {
        self.inner.table.borrow().snapshot()
    }

    /// Copy of one row.
    pub fn row(&self, key: &str) -> Option<RecordRow> {
        self.inner.table.borrow().row(key).cloned()
    }

    /// Create (or overwrite) a zeroed row.
    pub fn create_row(&self, key: impl Into<RecordKey>, owner: impl Into<String>) -> RecordKey {
        self.inner.table.borrow_mut().create_row(key, owner)
    }

    /// Count a mount while recording.
    pub fn record_mount(&self, key: &str) {
        self.inner.table.borrow_mut().record_mount(key);
    }

    /// Count an update cycle while recording.
    pub fn update(&self, key: &str, has_changes: bool, elapsed_ms: f64) {
        self.inner.table.borrow_mut().update(key, has_changes, elapsed_ms);
    }
}

impl fmt::Debug for Profiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profiler")
            .field("config", &self.inner.config)
            .field("table", &self.inner.table)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    #[test]
    fn test_clones_share_table() {
        let profiler = Profiler::new(ProfilerConfig::development());
        let other = profiler.clone();
        other.create_row("Foo: id1", "Bar > Foo");
        profiler.start();
        other.update("Foo: id1", false, 1.0);

        assert!(other.is_recording());
        assert_eq!(profiler.row("Foo: id1").unwrap().wasted_renders, 1);
    }

    #[test]
    fn test_stop_emits_to_sink() {
        let sink = Rc::new(MemorySink::new());
        let profiler = Profiler::with_sink(ProfilerConfig::development(), sink.clone());
        profiler.create_row("Foo: id1", "Bar > Foo");
        profiler.start();
        profiler.update("Foo: id1", true, 1.0);

        let dump = profiler.stop();
        assert_eq!(sink.last_table(), Some(dump));
        assert_eq!(profiler.state(), RecordingState::Idle);
        assert!(profiler.snapshot().is_zeroed());
    }

    #[test]
    fn test_hook_inactive_in_production() {
        let profiler = Profiler::new(ProfilerConfig::production());
        assert!(!profiler.is_active());
        assert!(profiler.hook("Foo", "main").is_none());
        assert!(profiler.hook_with("Foo", "main", MeasureOptions::default()).is_none());
    }

    #[cfg(feature = "instrument")]
    #[test]
    fn test_hook_with_overrides_default_options() {
        let sink = Rc::new(MemorySink::new());
        let profiler = Profiler::with_sink(ProfilerConfig::development(), sink.clone());
        let mut loud = profiler.hook("Loud", "main").unwrap();
        let mut quiet = profiler
            .hook_with("Quiet", "main", MeasureOptions::default().muted(true))
            .unwrap();

        assert!(!loud.state().options().is_muted);
        assert!(quiet.state().options().is_muted);

        quiet.measure(&1, |n| n + 1);
        quiet.measure(&1, |n| n + 1);
        assert!(sink.is_empty());

        loud.measure(&1, |n| n + 1);
        assert!(!sink.is_empty());
    }

    #[test]
    fn test_debug_output() {
        let profiler = Profiler::new(ProfilerConfig::production());
        let debug = format!("{:?}", profiler);
        assert!(debug.starts_with("Profiler"));
        assert!(debug.contains("Production"));
    }
}
