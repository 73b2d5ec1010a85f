//! # Scheduler
//!
//! The event-loop abstraction the bridge runs on. It is used for two things:
//!
//! - **Deferred ticks**: `trigger_promise` on an action with live producers
//!   postpones its redirection install and dispatch to a later turn of the
//!   loop ([`Scheduler::defer`]).
//! - **Settlement watchers**: wiring a producer's future to a trigger promise
//!   or to the `completed`/`failed` children means awaiting it somewhere
//!   ([`Scheduler::spawn`]).
//!
//! A scheduler that runs one task at a time (a current-thread runtime, or a
//! manual test scheduler) keeps every deferred tick isolated from the others.

use std::{future::Future, pin::Pin, sync::Arc};

/// A unit of work handed to a [`Scheduler`].
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Runs tasks on a later turn of an event loop.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Scheduler`",
    label = "missing `Scheduler` implementation",
    note = "Schedulers must implement `spawn`; `defer` has a default."
)]
pub trait Scheduler: Send + Sync + 'static {
    /// Queue `task` to be driven to completion. Must not poll it inline.
    fn spawn(&self, task: Task);

    /// Run `tick` on a later turn, after the current call stack unwinds.
    fn defer(&self, tick: Box<dyn FnOnce() + Send + 'static>) {
        self.spawn(Box::pin(async move { tick() }));
    }
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn spawn(&self, task: Task) {
        (**self).spawn(task)
    }

    fn defer(&self, tick: Box<dyn FnOnce() + Send + 'static>) {
        (**self).defer(tick)
    }
}

impl<S: Scheduler + ?Sized> Scheduler for Box<S> {
    fn spawn(&self, task: Task) {
        (**self).spawn(task)
    }

    fn defer(&self, tick: Box<dyn FnOnce() + Send + 'static>) {
        (**self).defer(tick)
    }
}
