//! Render Profiling
//!
//! Development-time instrumentation for component-based UIs:
//! - Times every mount and re-render of a wrapped component
//! - Diffs previous and current props to detect wasted re-renders
//! - Accumulates per-instance counters into a recording table that can be
//!   started, stopped and dumped on demand
//!
//! # Feature Flags
//!
//! - `instrument` (default): Enables instrumentation. Without it, wrapping is
//!   always a pass-through.
//!
//! # Example
//!
//! ```rust
//! use render_profiler::{Component, FnComponent, IdentifierStrategy, Profiler, ProfilerConfig};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct RowProps {
//!     id: u32,
//!     label: String,
//! }
//!
//! let profiler = Profiler::new(ProfilerConfig::development());
//! let row = FnComponent::new("Row", |props: &RowProps| props.label.clone());
//! let mut row = profiler.wrap(IdentifierStrategy::from_prop("id"), row).with_owner("Table");
//!
//! profiler.start();
//! let props = RowProps { id: 1, label: "first".to_string() };
//! row.render(&props);
//! row.render(&props);
//! let dump = profiler.stop();
//!
//! if profiler.is_active() {
//!     let counters = dump.get("Row: 1").unwrap();
//!     assert_eq!(counters.wasted_renders, 1);
//! } else {
//!     assert!(dump.is_empty());
//! }
//! ```

mod component;
mod config;
mod error;
mod identifier;
mod measure;
mod profiler;
mod props;
mod record;
mod sink;
mod timing;

pub use component::{Component, FnComponent, LifecycleHooks};
pub use config::{Environment, MeasureOptions, ProfilerConfig, ENVIRONMENT_VAR};
pub use error::{ProfilerError, ProfilerResult};
pub use identifier::{IdentifierStrategy, UNIDENTIFIED};
pub use measure::{
    wrap, MeasureHook, MeasureState, Measured, RenderScope, Wrapped, PROFILING_PROP,
    WASTED_RENDER_MESSAGE,
};
pub use profiler::Profiler;
pub use props::{change_details, has_changes, ChangeDetail, PropMap, VALUE_KEY};
pub use record::{
    owner_description, record_key, RecordDump, RecordKey, RecordRow, RecordTable, RecordingState,
};
pub use sink::{LogSink, MemorySink, SinkEvent, TracingSink};
pub use timing::RenderTimer;
