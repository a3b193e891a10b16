//! Host framework seams: the component contract and lifecycle hooks.

use std::fmt;
use std::marker::PhantomData;

use crate::props::PropMap;

/// A renderable UI component as seen by the profiler.
///
/// Host bindings implement this for their component types. The profiler only
/// needs a display name and a way to render with a set of props.
pub trait Component {
    /// Props accepted by [`render`](Self::render)
    type Props;
    /// Whatever the host produces from a render
    type Output;

    /// Name shown in logs and record keys.
    fn display_name(&self) -> &str;

    /// Render with the given props.
    fn render(&mut self, props: &Self::Props) -> Self::Output;
}

/// The four lifecycle points at which a measured instance is notified.
///
/// For every instance the host calls `will_mount`, then `did_mount` after the
/// first render, then `will_update`/`did_update` around each re-render.
pub trait LifecycleHooks {
    /// Before the first render. `owner` names the logical parent when the
    /// host can tell.
    fn will_mount(&mut self, props: &PropMap, owner: Option<&str>);

    /// After the first render completed.
    fn did_mount(&mut self);

    /// Before a re-render.
    fn will_update(&mut self, props: &PropMap);

    /// After a re-render completed.
    fn did_update(&mut self, previous: &PropMap, current: &PropMap);
}

/// A component backed by a render closure.
pub struct FnComponent<P, O, F> {
    name: String,
    render: F,
    _marker: PhantomData<fn(&P) -> O>,
}

impl<P, O, F> FnComponent<P, O, F>
where
    F: FnMut(&P) -> O,
{
    /// Create a named component from a render closure.
    pub fn new(name: impl Into<String>, render: F) -> Self {
        Self {
            name: name.into(),
            render,
            _marker: PhantomData,
        }
    }
}

impl<P, O, F> Component for FnComponent<P, O, F>
where
    F: FnMut(&P) -> O,
{
    type Props = P;
    type Output = O;

    fn display_name(&self) -> &str {
        &self.name
    }

    fn render(&mut self, props: &P) -> O {
        (self.render)(props)
    }
}

impl<P, O, F> fmt::Debug for FnComponent<P, O, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnComponent").field("name", &self.name).finish()
    }
}
