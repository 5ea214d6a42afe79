//! Per-worker lifecycle state.

use serde::{Deserialize, Serialize};

/// Lifecycle state of one remote worker within a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerState {
    /// Handle created, no remote side effect yet.
    #[default]
    NotStarted,
    /// Remote launch command succeeded and returned a pid.
    Started,
    /// The worker's RPC port accepted a connection.
    Ready,
    /// Launch command failed, pid output was unparseable, or the
    /// readiness probe timed out.
    Failed,
}

impl WorkerState {
    /// Returns true if the remote process was launched, i.e. teardown may
    /// have something to kill.
    pub fn reached_started(&self) -> bool {
        matches!(self, Self::Started | Self::Ready)
    }
}

/// One remote worker's lifecycle for one run.
///
/// Handles are created fresh per invocation from the enabled-host subset
/// of the configuration and are never reused across runs. Only the
/// owning cluster run mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerHandle {
    /// Host address, immutable for the handle's lifetime.
    pub address: String,

    /// Remote process id, set once the launch command returns a
    /// parseable value. Taken out again when teardown issues its kill so
    /// a second teardown pass is a no-op.
    pub remote_pid: Option<u32>,

    /// Current lifecycle state.
    pub state: WorkerState,

    /// Diagnostic from the most recent failure, if any.
    pub last_error: Option<String>,
}

impl WorkerHandle {
    /// Create a handle in `NotStarted` for the given host.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            remote_pid: None,
            state: WorkerState::NotStarted,
            last_error: None,
        }
    }

    /// Record a successful remote launch.
    pub fn mark_started(&mut self, pid: u32) {
        self.remote_pid = Some(pid);
        self.state = WorkerState::Started;
    }

    /// Record a successful readiness probe.
    pub fn mark_ready(&mut self) {
        self.state = WorkerState::Ready;
    }

    /// Record a failure with a diagnostic.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.state = WorkerState::Failed;
        self.last_error = Some(error.into());
    }

    /// Take the pid for a teardown kill, if the worker was launched and
    /// has not been killed yet.
    pub fn take_pid_for_teardown(&mut self) -> Option<u32> {
        if self.state.reached_started() {
            self.remote_pid.take()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        let mut handle = WorkerHandle::new("10.0.0.1");
        assert_eq!(handle.state, WorkerState::NotStarted);
        assert!(handle.remote_pid.is_none());

        handle.mark_started(4242);
        assert_eq!(handle.state, WorkerState::Started);
        assert_eq!(handle.remote_pid, Some(4242));

        handle.mark_ready();
        assert_eq!(handle.state, WorkerState::Ready);
    }

    #[test]
    fn test_failed_records_diagnostic() {
        let mut handle = WorkerHandle::new("10.0.0.1");
        handle.mark_failed("ssh exited with status 255");
        assert_eq!(handle.state, WorkerState::Failed);
        assert_eq!(
            handle.last_error.as_deref(),
            Some("ssh exited with status 255")
        );
    }

    #[test]
    fn test_teardown_pid_taken_at_most_once() {
        let mut handle = WorkerHandle::new("10.0.0.1");
        handle.mark_started(4242);
        handle.mark_ready();

        assert_eq!(handle.take_pid_for_teardown(), Some(4242));
        assert_eq!(handle.take_pid_for_teardown(), None);
    }

    #[test]
    fn test_teardown_skips_workers_that_never_started() {
        let mut handle = WorkerHandle::new("10.0.0.1");
        assert_eq!(handle.take_pid_for_teardown(), None);

        handle.mark_failed("launch failed");
        assert_eq!(handle.take_pid_for_teardown(), None);
    }
}
