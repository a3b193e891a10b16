//! Render cycle timing.

use std::time::{Duration, Instant};

/// Timer for a single render cycle.
///
/// Started before a render and stopped after it completes. The start and end
/// instants are kept so the last cycle's duration stays readable after the
/// timer stops.
///
/// # Example
///
/// ```rust
/// use render_profiler::RenderTimer;
///
/// let mut timer = RenderTimer::new("Identifier: row-1\nRender time");
/// timer.start();
/// // ... render ...
/// let elapsed = timer.stop();
/// assert_eq!(elapsed, timer.elapsed());
/// ```
#[derive(Debug, Clone)]
pub struct RenderTimer {
    label: String,
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
}

impl RenderTimer {
    /// Create a stopped timer with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            started_at: None,
            ended_at: None,
        }
    }

    /// Label reported alongside the elapsed time.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Replace the label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Start (or restart) the timer from now.
    #[inline]
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
        self.ended_at = None;
    }

    /// Stop the timer and return the elapsed time of this cycle.
    ///
    /// Stopping a timer that never started yields zero.
    #[inline]
    pub fn stop(&mut self) -> Duration {
        self.ended_at = Some(Instant::now());
        self.elapsed()
    }

    /// Whether the timer has started and not yet stopped.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.ended_at.is_none()
    }

    /// Elapsed time of the current or last cycle.
    pub fn elapsed(&self) -> Duration {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            (Some(start), None) => start.elapsed(),
            (None, _) => Duration::ZERO,
        }
    }

    /// Elapsed time in milliseconds.
    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_timer_elapsed() {
        let mut timer = RenderTimer::new("test");
        timer.start();
        sleep(Duration::from_millis(10));
        let elapsed = timer.stop();
        assert!(
            elapsed >= Duration::from_millis(9),
            "elapsed should be at least 9ms, got {:?}",
            elapsed
        );
        assert!(timer.elapsed_ms() >= 9.0);
    }

    #[test]
    fn test_stopped_timer_is_frozen() {
        let mut timer = RenderTimer::new("test");
        timer.start();
        let elapsed = timer.stop();
        sleep(Duration::from_millis(5));
        assert_eq!(timer.elapsed(), elapsed);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_restart_clears_end() {
        let mut timer = RenderTimer::new("test");
        timer.start();
        timer.stop();
        timer.start();
        assert!(timer.is_running());
    }

    #[test]
    fn test_never_started() {
        let mut timer = RenderTimer::new("test");
        assert_eq!(timer.stop(), Duration::ZERO);
        assert_eq!(timer.label(), "test");
    }
}
