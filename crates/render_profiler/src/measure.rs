//! Render instrumentation: timing, change logging and wasted-render recording
//! around a wrapped component.
//!
//! Two host adapters drive the same [`MeasureState`]:
//!
//! - [`Measured`] wraps a [`Component`] and runs the lifecycle around each
//!   call to `render`, like a class component overriding its lifecycle.
//! - [`MeasureHook`] is for function components: a [`RenderScope`] guard is
//!   opened before the body runs and reports when dropped.

use serde::Serialize;

use crate::component::{Component, LifecycleHooks};
use crate::config::MeasureOptions;
use crate::identifier::{IdentifierStrategy, UNIDENTIFIED};
use crate::profiler::Profiler;
use crate::props::{change_details, ChangeDetail, PropMap};
use crate::record::{owner_description, record_key, RecordKey};
use crate::timing::RenderTimer;

/// Prop that, when `true`, opens a sink profile around each render.
pub const PROFILING_PROP: &str = "_isProfilingPerf";

/// Line logged for a re-render in which no prop changed.
pub const WASTED_RENDER_MESSAGE: &str = "🚨 Wasted render (no changed props)";

/// Snapshot props for diffing. Props that fail to serialize snapshot as empty.
fn snapshot_props<P: Serialize + ?Sized>(props: &P) -> PropMap {
    PropMap::from_props(props).unwrap_or_else(|err| {
        tracing::warn!(
            target: "render_profiler::measure",
            error = %err,
            "failed to snapshot props"
        );
        PropMap::new()
    })
}

/// Per-instance measurement state.
///
/// Implements [`LifecycleHooks`]; host adapters call into it at the four
/// lifecycle points.
#[derive(Debug)]
pub struct MeasureState {
    profiler: Profiler,
    strategy: IdentifierStrategy,
    component_name: String,
    options: MeasureOptions,
    identifier: String,
    record_key: RecordKey,
    timer: RenderTimer,
    profiling: bool,
}

impl MeasureState {
    /// Create state for an instance of `component_name`.
    ///
    /// The identifier stays [`UNIDENTIFIED`] until `will_mount`.
    pub fn new(
        profiler: Profiler,
        component_name: impl Into<String>,
        strategy: IdentifierStrategy,
        options: MeasureOptions,
    ) -> Self {
        Self {
            profiler,
            strategy,
            component_name: component_name.into(),
            options,
            identifier: UNIDENTIFIED.to_string(),
            record_key: UNIDENTIFIED.to_string(),
            timer: RenderTimer::new(timer_text(UNIDENTIFIED)),
            profiling: false,
        }
    }

    /// Resolved identifier of this instance.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Key of this instance's row in the recording table.
    pub fn record_key(&self) -> &str {
        &self.record_key
    }

    /// Name of the measured component.
    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    /// Reporting options.
    pub fn options(&self) -> MeasureOptions {
        self.options
    }

    /// Timer of the current or last render cycle.
    pub fn timer(&self) -> &RenderTimer {
        &self.timer
    }

    fn start_timer(&mut self, props: &PropMap) {
        self.timer.start();
        if self.options.is_muted {
            return;
        }
        let sink = self.profiler.sink();
        sink.time(self.timer.label());
        if props.flag(PROFILING_PROP) {
            sink.profile(self.timer.label());
            self.profiling = true;
        }
    }

    fn end_timer(&mut self) {
        let elapsed = self.timer.stop();
        if self.options.is_muted {
            return;
        }
        let sink = self.profiler.sink();
        sink.time_end(self.timer.label(), elapsed);
        if self.profiling {
            sink.profile_end(self.timer.label());
            self.profiling = false;
        }
    }

    fn log_changes(&self, changes: &[ChangeDetail]) {
        let sink = self.profiler.sink();
        if changes.is_empty() {
            sink.log(WASTED_RENDER_MESSAGE);
            return;
        }
        for change in changes {
            sink.log(&change.to_string());
        }
    }
}

impl LifecycleHooks for MeasureState {
    fn will_mount(&mut self, props: &PropMap, owner: Option<&str>) {
        self.identifier = self.strategy.resolve(props);
        self.record_key = self.profiler.create_row(
            record_key(&self.component_name, &self.identifier),
            owner_description(owner, &self.component_name),
        );
        self.timer.set_label(timer_text(&self.identifier));
        self.start_timer(props);
    }

    fn did_mount(&mut self) {
        if self.options.is_muted {
            self.end_timer();
        } else {
            let sink = self.profiler.sink();
            sink.group_start(
                self.options.is_collapsed,
                true,
                &format!("Mounted {}", self.component_name),
            );
            self.end_timer();
            self.profiler.sink().group_end();
        }
        self.profiler.record_mount(&self.record_key);
    }

    fn will_update(&mut self, props: &PropMap) {
        self.start_timer(props);
    }

    fn did_update(&mut self, previous: &PropMap, current: &PropMap) {
        let changes = change_details(current, previous);
        let has_changes = !changes.is_empty();

        if self.options.is_muted {
            self.end_timer();
        } else {
            self.profiler.sink().group_start(
                self.options.is_collapsed,
                has_changes,
                &format!("Rendered {}", self.component_name),
            );
            self.end_timer();
            self.log_changes(&changes);
            self.profiler.sink().group_end();
        }

        self.profiler
            .update(&self.record_key, has_changes, self.timer.elapsed_ms());
    }
}

fn timer_text(identifier: &str) -> String {
    format!("Identifier: {identifier}\nRender time")
}

/// A component wrapped with render instrumentation.
///
/// Props are forwarded unchanged and the inner output is returned as is.
#[derive(Debug)]
pub struct Measured<C> {
    inner: C,
    state: MeasureState,
    display_name: String,
    owner: Option<String>,
    previous: Option<PropMap>,
}

impl<C: Component> Measured<C> {
    /// Wrap `component`, reporting to `profiler`.
    pub fn new(
        profiler: Profiler,
        strategy: IdentifierStrategy,
        component: C,
        options: MeasureOptions,
    ) -> Self {
        let component_name = component.display_name().to_string();
        Self {
            display_name: format!("Measured({component_name})"),
            state: MeasureState::new(profiler, component_name, strategy, options),
            inner: component,
            owner: None,
            previous: None,
        }
    }

    /// Set the name of the component rendering this one.
    ///
    /// Only takes effect before the first render.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Measurement state of this instance.
    pub fn state(&self) -> &MeasureState {
        &self.state
    }

    /// Whether the first render has happened.
    pub fn is_mounted(&self) -> bool {
        self.previous.is_some()
    }

    /// The wrapped component.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Unwrap the component.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C> Component for Measured<C>
where
    C: Component,
    C::Props: Serialize,
{
    type Props = C::Props;
    type Output = C::Output;

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn render(&mut self, props: &C::Props) -> C::Output {
        let current = snapshot_props(props);
        // `previous` stays in place until the inner render returns, so a
        // panicking render leaves the instance mounted with its last props.
        let output = match &self.previous {
            None => {
                self.state.will_mount(&current, self.owner.as_deref());
                let output = self.inner.render(props);
                self.state.did_mount();
                output
            }
            Some(previous) => {
                self.state.will_update(&current);
                let output = self.inner.render(props);
                self.state.did_update(previous, &current);
                output
            }
        };
        self.previous = Some(current);
        output
    }
}

/// Result of [`wrap`]: the instrumented component, or the original one when
/// instrumentation is inactive.
#[derive(Debug)]
pub enum Wrapped<C> {
    /// Instrumentation inactive, renders go straight to the component
    Passthrough(C),
    /// Instrumentation active
    Measured(Measured<C>),
}

impl<C: Component> Wrapped<C> {
    /// Set the owner name on a measured component. No-op for pass-through.
    pub fn with_owner(self, owner: impl Into<String>) -> Self {
        match self {
            Self::Measured(measured) => Self::Measured(measured.with_owner(owner)),
            passthrough => passthrough,
        }
    }

    /// Whether renders are instrumented.
    pub fn is_measured(&self) -> bool {
        matches!(self, Self::Measured(_))
    }

    /// Measurement state, when instrumented.
    pub fn state(&self) -> Option<&MeasureState> {
        match self {
            Self::Measured(measured) => Some(measured.state()),
            Self::Passthrough(_) => None,
        }
    }

    /// Unwrap the component.
    pub fn into_inner(self) -> C {
        match self {
            Self::Passthrough(component) => component,
            Self::Measured(measured) => measured.into_inner(),
        }
    }
}

impl<C> Component for Wrapped<C>
where
    C: Component,
    C::Props: Serialize,
{
    type Props = C::Props;
    type Output = C::Output;

    fn display_name(&self) -> &str {
        match self {
            Self::Passthrough(component) => component.display_name(),
            Self::Measured(measured) => measured.display_name(),
        }
    }

    fn render(&mut self, props: &C::Props) -> C::Output {
        match self {
            Self::Passthrough(component) => component.render(props),
            Self::Measured(measured) => measured.render(props),
        }
    }
}

/// Wrap `component` with render instrumentation.
///
/// Outside a development environment the component is returned untouched
/// inside [`Wrapped::Passthrough`].
pub fn wrap<C>(
    profiler: &Profiler,
    strategy: impl Into<IdentifierStrategy>,
    component: C,
    options: MeasureOptions,
) -> Wrapped<C>
where
    C: Component,
    C::Props: Serialize,
{
    if !profiler.is_active() {
        return Wrapped::Passthrough(component);
    }
    Wrapped::Measured(Measured::new(profiler.clone(), strategy.into(), component, options))
}

/// Instrumentation for a function component.
///
/// Open a [`RenderScope`] at the top of each render; it reports when it is
/// dropped at the end of the render.
#[derive(Debug)]
pub struct MeasureHook {
    state: MeasureState,
    owner: Option<String>,
    previous: Option<PropMap>,
}

impl MeasureHook {
    /// Create a hook for `component_name`.
    pub fn new(
        profiler: Profiler,
        component_name: impl Into<String>,
        strategy: IdentifierStrategy,
        options: MeasureOptions,
    ) -> Self {
        Self {
            state: MeasureState::new(profiler, component_name, strategy, options),
            owner: None,
            previous: None,
        }
    }

    /// Set the name of the component rendering this one.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Measurement state of this instance.
    pub fn state(&self) -> &MeasureState {
        &self.state
    }

    /// Begin a render with `props`. The render ends when the scope drops.
    pub fn render_scope<P: Serialize + ?Sized>(&mut self, props: &P) -> RenderScope<'_> {
        let current = snapshot_props(props);
        if self.previous.is_none() {
            self.state.will_mount(&current, self.owner.as_deref());
        } else {
            self.state.will_update(&current);
        }
        RenderScope {
            hook: self,
            current: Some(current),
        }
    }

    /// Run `render` inside a render scope.
    pub fn measure<P, R>(&mut self, props: &P, render: impl FnOnce(&P) -> R) -> R
    where
        P: Serialize + ?Sized,
    {
        let _scope = self.render_scope(props);
        render(props)
    }
}

/// Guard spanning one render of a [`MeasureHook`].
#[derive(Debug)]
pub struct RenderScope<'a> {
    hook: &'a mut MeasureHook,
    current: Option<PropMap>,
}

impl Drop for RenderScope<'_> {
    fn drop(&mut self) {
        // An unwinding render never completed; report nothing for it.
        if std::thread::panicking() {
            return;
        }
        let Some(current) = self.current.take() else {
            return;
        };
        let hook = &mut *self.hook;
        match &hook.previous {
            None => hook.state.did_mount(),
            Some(previous) => hook.state.did_update(previous, &current),
        }
        hook.previous = Some(current);
    }
}
