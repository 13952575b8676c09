//! # Transition Reporting
//!
//! State machines report each transition they actually apply. Requests that
//! leave a process unchanged report nothing.

use crate::ProcessKind;
use parking_lot::Mutex;

/// Receives applied protocol state transitions, e.g. to export metrics.
pub trait TransitionObserver: Send + Sync {
    /// `process` entered `state`, either by creation or by a transition.
    fn entered(&self, process: ProcessKind, state: &str);
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTransitionObserver;

impl TransitionObserver for NoopTransitionObserver {
    fn entered(&self, _process: ProcessKind, _state: &str) {}
}

/// Keeps every reported transition, in order. For tests.
#[derive(Debug, Default)]
pub struct RecordingTransitionObserver {
    entered: Mutex<Vec<(ProcessKind, String)>>,
}

impl RecordingTransitionObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// States entered so far.
    pub fn states(&self) -> Vec<String> {
        self.entered.lock().iter().map(|(_, s)| s.clone()).collect()
    }
}

impl TransitionObserver for RecordingTransitionObserver {
    fn entered(&self, process: ProcessKind, state: &str) {
        self.entered.lock().push((process, state.to_string()));
    }
}
