//! Progress reporting for long-running simulations
//!
//! The engine reports progress through a consumer-provided [`ProgressSink`].
//! The sink is fire-and-forget: it is called at batch, scenario and
//! optimization-probe boundaries, must not block, and is never retained past
//! the call. Cancellation is polled at batch boundaries through a shared
//! [`RunControl`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A single progress notification.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub task_id: String,
    pub step_name: String,
    /// Completion of the current step, in [0, 100].
    pub percent: f64,
    pub message: String,
    pub done: bool,
}

/// Consumer-provided observer for progress updates.
pub trait ProgressSink: Sync {
    fn update(&self, update: &ProgressUpdate);
}

/// Sink that discards every update.
#[derive(Debug, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn update(&self, _update: &ProgressUpdate) {}
}

/// Shared counters for polling completion and requesting cancellation.
///
/// A UI thread keeps a reference to the same `RunControl` it hands to the
/// engine; `completed()` can be polled while the run is in flight and
/// `cancel()` stops the run at the next batch boundary. No fine-grained
/// interruption happens within a path.
#[derive(Debug)]
pub struct RunControl {
    completed: AtomicUsize,
    cancelled: AtomicBool,
}

impl RunControl {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            completed: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Number of completed Monte Carlo paths across the current run.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub(crate) fn add_completed(&self, n: usize) {
        self.completed.fetch_add(n, Ordering::Relaxed);
    }

    /// Request cancellation; honored at the next batch boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.completed.store(0, Ordering::Relaxed);
        self.cancelled.store(false, Ordering::Relaxed);
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

static NULL_SINK: NullProgress = NullProgress;
static NULL_CONTROL: RunControl = RunControl::new();

/// Bundles the sink, the task identity and the cancellation handle for one
/// engine invocation.
#[derive(Clone, Copy)]
pub struct ProgressReporter<'a> {
    sink: &'a dyn ProgressSink,
    control: &'a RunControl,
    task_id: &'a str,
}

impl<'a> ProgressReporter<'a> {
    #[must_use]
    pub fn new(sink: &'a dyn ProgressSink, control: &'a RunControl, task_id: &'a str) -> Self {
        Self {
            sink,
            control,
            task_id,
        }
    }

    /// Reporter that swallows updates and never cancels.
    #[must_use]
    pub fn disabled() -> ProgressReporter<'static> {
        ProgressReporter {
            sink: &NULL_SINK,
            control: &NULL_CONTROL,
            task_id: "",
        }
    }

    pub(crate) fn report(&self, step_name: &str, percent: f64, message: String, done: bool) {
        self.sink.update(&ProgressUpdate {
            task_id: self.task_id.to_string(),
            step_name: step_name.to_string(),
            percent: percent.clamp(0.0, 100.0),
            message,
            done,
        });
    }

    pub(crate) fn add_completed(&self, n: usize) {
        self.control.add_completed(n);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.control.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_control_cancellation() {
        let control = RunControl::new();
        assert!(!control.is_cancelled());
        control.cancel();
        assert!(control.is_cancelled());
        control.reset();
        assert!(!control.is_cancelled());
    }

    #[test]
    fn test_disabled_reporter_is_inert() {
        let reporter = ProgressReporter::disabled();
        reporter.report("step", 50.0, "message".to_string(), false);
        reporter.add_completed(10);
        assert!(!reporter.is_cancelled());
    }
}
