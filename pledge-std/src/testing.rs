//! Testing utilities for Pledge.
//!
//! # Features
//!
//! - [`RecordingListener`]: A listener that records every trigger it receives
//! - [`ManualScheduler`]: A scheduler that only runs tasks when told to

use crate::sync::lock;
use futures::{
    StreamExt,
    stream::FuturesUnordered,
    task::{self, ArcWake},
};
use pledge_core::{BoxError, Listener, Message, Scheduler, Task};
use std::{
    fmt,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    task::{Context, Poll},
};

// ============================================================================
// Recording Listener
// ============================================================================

/// A listener that records all arguments it receives.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingListener::<u32>::new();
/// action.completed().unwrap().listen_with(recorder.clone());
///
/// // ... trigger and run the scheduler ...
///
/// assert_eq!(recorder.calls(), vec![42]);
/// ```
pub struct RecordingListener<A> {
    calls: Arc<Mutex<Vec<A>>>,
    failure: Option<String>,
}

impl<A: Message> RecordingListener<A> {
    /// Create a recording listener that always succeeds.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failure: None,
        }
    }

    /// Create a recording listener that records, then fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failure: Some(message.into()),
        }
    }

    /// Get a clone of the recorded arguments.
    pub fn calls(&self) -> Vec<A> {
        lock(&self.calls).clone()
    }

    /// Get the number of recorded triggers.
    pub fn count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Clear all recorded arguments.
    pub fn clear(&self) {
        lock(&self.calls).clear();
    }
}

impl<A: Message> Default for RecordingListener<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for RecordingListener<A> {
    fn clone(&self) -> Self {
        Self {
            calls: self.calls.clone(),
            failure: self.failure.clone(),
        }
    }
}

impl<A: Message> Listener<A> for RecordingListener<A> {
    fn on_trigger(&self, args: &A) -> Result<(), BoxError> {
        lock(&self.calls).push(args.clone());
        match &self.failure {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Manual Scheduler
// ============================================================================

/// A scheduler that queues everything until [`run_until_stalled`] is called.
///
/// Lets tests observe the state between a `trigger_promise` call and its
/// deferred tick, and poll promises with `now_or_never` afterwards.
///
/// [`run_until_stalled`]: ManualScheduler::run_until_stalled
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<ManualInner>,
}

#[derive(Default)]
struct ManualInner {
    queued: Mutex<Vec<Task>>,
    running: Mutex<FuturesUnordered<Task>>,
    woken: Arc<WakeFlag>,
}

#[derive(Default)]
struct WakeFlag(AtomicBool);

impl ArcWake for WakeFlag {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.0.store(true, Ordering::SeqCst);
    }
}

impl ManualScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks spawned but not yet finished.
    pub fn queued(&self) -> usize {
        lock(&self.inner.queued).len() + lock(&self.inner.running).len()
    }

    /// Poll every task, including ones spawned along the way, until none of
    /// them can make progress. Returns the number of tasks that finished.
    pub fn run_until_stalled(&self) -> usize {
        let waker = task::waker(Arc::clone(&self.inner.woken));
        let mut cx = Context::from_waker(&waker);
        let mut running = std::mem::take(&mut *lock(&self.inner.running));
        let mut finished = 0;

        loop {
            running.extend(std::mem::take(&mut *lock(&self.inner.queued)));
            self.inner.woken.0.store(false, Ordering::SeqCst);

            while let Poll::Ready(Some(())) = running.poll_next_unpin(&mut cx) {
                finished += 1;
            }

            let spawned = !lock(&self.inner.queued).is_empty();
            if !spawned && !self.inner.woken.0.load(Ordering::SeqCst) {
                break;
            }
        }

        lock(&self.inner.running).extend(running);
        finished
    }
}

impl Scheduler for ManualScheduler {
    fn spawn(&self, task: Task) {
        lock(&self.inner.queued).push(task);
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("queued", &self.queued())
            .finish()
    }
}
