//! Deferred "run before next repaint" scheduling.
//!
//! The scheduler is the only point where a logical wait occurs between a
//! scroll correction and the size check it triggers. Scheduling is
//! best-effort with no failure path; cancelling an unknown or already-run
//! token is a no-op.

use crate::lock;
use std::sync::{Arc, Mutex};

/// A deferred task to run at the next frame boundary.
pub type FrameTask = Box<dyn FnOnce() + Send + 'static>;

/// Token identifying one scheduled task, usable for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Cancellable deferral to the next paint frame.
pub trait FrameScheduler {
    /// Queue `task` for the next frame and return its cancellation token.
    fn schedule(&self, task: FrameTask) -> FrameToken;

    /// Drop a scheduled task before it runs.
    fn cancel(&self, token: FrameToken);
}

/// Reference scheduler: pending tasks run when the driver pumps a frame.
///
/// Tasks scheduled while a frame is running land in the following frame,
/// matching the before-repaint callback cadence of the host environment.
#[derive(Clone, Default)]
pub struct FrameQueue {
    inner: Arc<Mutex<FrameQueueState>>,
}

#[derive(Default)]
struct FrameQueueState {
    next_token: u64,
    pending: Vec<(FrameToken, FrameTask)>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks awaiting the next frame.
    pub fn len(&self) -> usize {
        lock(&self.inner).pending.len()
    }

    /// Whether no task is awaiting the next frame.
    pub fn is_empty(&self) -> bool {
        lock(&self.inner).pending.is_empty()
    }

    /// Run every task that was pending when this frame began. Tasks
    /// scheduled by the running tasks are left for the next frame.
    pub fn run_frame(&self) {
        let batch = std::mem::take(&mut lock(&self.inner).pending);
        for (_, task) in batch {
            task();
        }
    }
}

impl FrameScheduler for FrameQueue {
    fn schedule(&self, task: FrameTask) -> FrameToken {
        let mut state = lock(&self.inner);
        let token = FrameToken(state.next_token);
        state.next_token += 1;
        state.pending.push((token, task));
        token
    }

    fn cancel(&self, token: FrameToken) {
        lock(&self.inner)
            .pending
            .retain(|(pending, _)| *pending != token);
    }
}
