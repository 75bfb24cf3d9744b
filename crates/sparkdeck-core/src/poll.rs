//! Cancellable periodic tasks
//!
//! Each polling loop (telemetry, calibration sensor) runs as a spawned task
//! whose handle lives in a [`PollHandle`]. Stopping aborts the loop; no
//! in-flight request is cancelled, a late response is simply never read
//! because the loop is gone.

use tokio::task::JoinHandle;

/// Handle to a spawned polling loop
#[derive(Debug)]
pub struct PollHandle {
    handle: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Stop the loop. Idempotent: stopping an already-stopped handle is a
    /// no-op.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether the loop is still scheduled
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
