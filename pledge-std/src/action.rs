//! Async actions.
//!
//! An [`AsyncAction`] is a publisher of trigger arguments `A` that can
//! declare child publishers. The two children that matter here are
//! [`COMPLETED`] (fired with a `T`) and [`FAILED`] (fired with an `E`); they
//! are the outcome channels of whatever asynchronous work the trigger starts.
//!
//! Three operations bridge the action to futures:
//!
//! - [`AsyncAction::trigger_promise`]: trigger and get a future for the outcome.
//! - [`AsyncAction::promise`]: wire an existing future to `completed`/`failed`.
//! - [`AsyncAction::listen_and_promise`]: register a producer whose returned
//!   future becomes the outcome of the trigger that invoked it.
//!
//! # Example
//!
//! ```rust,ignore
//! let add = bridge.async_action::<(i32, i32), i32, String>("add");
//! add.listen_and_promise(|&(x, y): &(i32, i32)| future::ready(Ok(x + y)));
//!
//! assert_eq!(add.trigger_promise((2, 3)).await.unwrap(), Some(5));
//! ```

use crate::{
    bridge::Bridge,
    promise::{self, Promise, Resolver, TriggerPromise},
    publisher::{Publisher, Subscription},
    redirect::RedirectStack,
    sync::lock,
};
use pledge_core::{BoxError, ConfigError, DispatchError, Message, PromiseError};
use std::{
    fmt,
    future::Future,
    marker::PhantomData,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Name of the child fired when the outcome is a value.
pub const COMPLETED: &str = "completed";

/// Name of the child fired when the outcome is a rejection.
pub const FAILED: &str = "failed";

/// Declares an [`AsyncAction`]. Obtained from [`Bridge::action`].
pub struct ActionBuilder<A, T, E> {
    bridge: Bridge,
    name: String,
    children: Vec<String>,
    _marker: PhantomData<fn() -> (A, T, E)>,
}

impl<A: Message, T: Message, E: Message> ActionBuilder<A, T, E> {
    pub(crate) fn new(bridge: Bridge, name: String) -> Self {
        Self {
            bridge,
            name,
            children: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Declare the `completed` and `failed` children.
    pub fn async_result(self) -> Self {
        self.child(COMPLETED).child(FAILED)
    }

    /// Declare a child. Declaring the same name twice has no effect.
    pub fn child(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.children.contains(&name) {
            self.children.push(name);
        }
        self
    }

    /// Declare several children.
    pub fn children<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .fold(self, |builder, name| builder.child(name))
    }

    /// Build the action.
    pub fn build(self) -> AsyncAction<A, T, E> {
        let declared = |child: &str| self.children.iter().any(|name| name == child);
        let completed =
            declared(COMPLETED).then(|| Publisher::new(format!("{}.{COMPLETED}", self.name)));
        let failed = declared(FAILED).then(|| Publisher::new(format!("{}.{FAILED}", self.name)));

        AsyncAction {
            inner: Arc::new(ActionInner {
                publisher: Publisher::new(self.name),
                children: self.children,
                completed,
                failed,
                redirects: RedirectStack::new(),
                ticks: Mutex::new(()),
                pending_producers: Arc::new(AtomicUsize::new(0)),
                bridge: self.bridge,
            }),
        }
    }
}

/// A publisher with `completed`/`failed` outcome channels and the
/// promise bridge operations.
pub struct AsyncAction<A: Message, T: Message, E: Message> {
    inner: Arc<ActionInner<A, T, E>>,
}

struct ActionInner<A: Message, T: Message, E: Message> {
    publisher: Publisher<A>,
    children: Vec<String>,
    completed: Option<Publisher<T>>,
    failed: Option<Publisher<E>>,
    redirects: RedirectStack<T, E>,
    // Held for the whole of a deferred tick, so one layer is live at a time.
    ticks: Mutex<()>,
    pending_producers: Arc<AtomicUsize>,
    bridge: Bridge,
}

impl<A: Message, T: Message, E: Message> AsyncAction<A, T, E> {
    /// The action's name.
    pub fn name(&self) -> &str {
        self.inner.publisher.name()
    }

    /// Declared child names, in declaration order.
    pub fn children(&self) -> &[String] {
        &self.inner.children
    }

    /// Whether `name` was declared as a child.
    pub fn has_child(&self, name: &str) -> bool {
        self.inner.children.iter().any(|child| child == name)
    }

    /// The `completed` child, if declared.
    pub fn completed(&self) -> Option<&Publisher<T>> {
        self.inner.completed.as_ref()
    }

    /// The `failed` child, if declared.
    pub fn failed(&self) -> Option<&Publisher<E>> {
        self.inner.failed.as_ref()
    }

    /// The underlying publisher of trigger arguments.
    pub fn publisher(&self) -> &Publisher<A> {
        &self.inner.publisher
    }

    /// Number of live producer registrations.
    pub fn pending_producers(&self) -> usize {
        self.inner.pending_producers.load(Ordering::SeqCst)
    }

    /// Depth of the redirection stack, counting the default entry.
    pub fn redirect_depth(&self) -> usize {
        self.inner.redirects.depth()
    }

    /// Register a plain listener on the action.
    pub fn listen<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&A) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.inner.publisher.listen(callback)
    }

    /// Trigger the action synchronously.
    pub fn trigger(&self, args: A) -> Result<(), DispatchError> {
        self.inner.publisher.trigger(args)
    }

    /// Trigger the action and return a future for the outcome of this call.
    ///
    /// - With a producer registered, the dispatch is deferred to the next
    ///   scheduler tick and the future follows the producer's result.
    /// - Otherwise, with `completed` and `failed` declared, the future
    ///   follows whichever of the two fires first.
    /// - Otherwise the future resolves to `None` once the dispatch is done.
    ///
    /// A failing dispatch settles the future with [`PromiseError::Dispatch`].
    /// Deferred ticks of one action never overlap, whichever scheduler runs
    /// them.
    #[doc(alias = "trigger_async")]
    pub fn trigger_promise(&self, args: A) -> TriggerPromise<T, E> {
        let (resolver, promise) = promise::channel();

        if self.pending_producers() > 0 {
            let action = self.clone();
            self.inner
                .bridge
                .defer(Box::new(move || action.redirect_and_trigger(args, resolver)));
            return promise;
        }

        let settle = {
            let resolver = resolver.clone();
            move |outcome: Result<T, E>| {
                resolver.complete(outcome);
            }
        };
        match self.listen_for_outcome(settle) {
            Some(outcome) => {
                if let Err(err) = self.trigger(args) {
                    outcome.release();
                    resolver.fail(PromiseError::Dispatch(err));
                }
            }
            None => {
                let settled = match self.trigger(args) {
                    Ok(()) => Ok(None),
                    Err(err) => Err(PromiseError::Dispatch(err)),
                };
                resolver.settle(settled);
            }
        }
        promise
    }

    /// Wire `input`'s outcome to the `completed` and `failed` children.
    ///
    /// Fails without attaching anything if either child is missing.
    pub fn promise<F>(&self, input: F) -> Result<(), ConfigError>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.attach(promise::share(input))
    }

    /// Register `producer` to run on every trigger. The future it returns
    /// becomes the outcome of that trigger.
    pub fn listen_and_promise<P, Fut>(&self, producer: P) -> Unsubscribe
    where
        P: Fn(&A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.listen_and_promise_with((), move |_: &(), args: &A| producer(args))
    }

    /// Like [`listen_and_promise`](Self::listen_and_promise), handing
    /// `context` to the producer on every call.
    pub fn listen_and_promise_with<C, P, Fut>(&self, context: C, producer: P) -> Unsubscribe
    where
        C: Send + Sync + 'static,
        P: Fn(&C, &A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        // Weak: the listener lives inside the action it points back to.
        let action = Arc::downgrade(&self.inner);
        self.inner.pending_producers.fetch_add(1, Ordering::SeqCst);

        let subscription = self.inner.publisher.listen(move |args: &A| {
            let Some(inner) = action.upgrade() else {
                return Ok(());
            };
            let produced = promise::share(producer(&context, args));
            AsyncAction { inner }.route(&produced)?;
            Ok(())
        });

        Unsubscribe {
            subscription,
            pending: Arc::clone(&self.inner.pending_producers),
        }
    }

    // Deferred tick of `trigger_promise`.
    fn redirect_and_trigger(&self, args: A, resolver: Resolver<T, E>) {
        let _tick = lock(&self.inner.ticks);

        let layer = {
            let bridge = self.inner.bridge.clone();
            let resolver = resolver.clone();
            self.inner.redirects.push(move |produced: &Promise<T, E>| {
                bridge.spawn(Box::pin(resolver.follow(produced.clone())));
            })
        };

        #[cfg(feature = "tracing")]
        {
            tracing::debug!(
                publisher = %self.name(),
                depth = self.redirect_depth(),
                "Redirection installed"
            );
        }

        // Attached before dispatch so an outcome fired by a synchronous
        // listener is not missed if no producer takes the layer.
        let gate = Arc::new(Mutex::new(Gate::Closed(None)));
        let fallback = {
            let gate = Arc::clone(&gate);
            let resolver = resolver.clone();
            self.listen_for_outcome(move |outcome: Result<T, E>| {
                let mut state = lock(&gate);
                match &mut *state {
                    Gate::Closed(held) => {
                        held.get_or_insert(outcome);
                    }
                    Gate::Open => {
                        resolver.complete(outcome);
                    }
                }
            })
        };

        let dispatched = self.trigger(args);

        if !self.inner.redirects.remove(layer) {
            // A producer took the layer; the promise follows its result.
            if let Some(fallback) = fallback {
                fallback.release();
            }
            if let Err(err) = dispatched {
                #[cfg(feature = "tracing")]
                {
                    tracing::warn!(
                        publisher = %self.name(),
                        error = %err,
                        "Dispatch failed after the producer result was captured"
                    );
                }
                #[cfg(not(feature = "tracing"))]
                {
                    let _ = err;
                }
            }
            return;
        }

        match (dispatched, fallback) {
            (Err(err), fallback) => {
                if let Some(fallback) = fallback {
                    fallback.release();
                }
                resolver.fail(PromiseError::Dispatch(err));
            }
            (Ok(()), Some(_)) => {
                // The producer went away before the tick ran.
                #[cfg(feature = "tracing")]
                {
                    tracing::warn!(
                        publisher = %self.name(),
                        "No producer consumed the redirection; falling back to outcome children"
                    );
                }
                let held = std::mem::replace(&mut *lock(&gate), Gate::Open);
                if let Gate::Closed(Some(outcome)) = held {
                    resolver.complete(outcome);
                }
            }
            (Ok(()), None) => {
                resolver.resolve(None);
            }
        }
    }

    // One-shot listeners on `completed`/`failed`; the first to fire removes
    // both and hands its outcome to `sink`.
    fn listen_for_outcome<S>(&self, sink: S) -> Option<OneShot>
    where
        S: Fn(Result<T, E>) + Send + Sync + 'static,
    {
        let (completed, failed) = self.outcome_children()?;
        let once = OneShot::default();
        let sink = Arc::new(sink);

        let on_completed = {
            let once = once.clone();
            let sink = Arc::clone(&sink);
            move |value: &T| -> Result<(), BoxError> {
                once.release();
                sink(Ok(value.clone()));
                Ok(())
            }
        };
        let on_failed = {
            let once = once.clone();
            move |reason: &E| -> Result<(), BoxError> {
                once.release();
                sink(Err(reason.clone()));
                Ok(())
            }
        };

        once.hold([completed.listen(on_completed), failed.listen(on_failed)]);
        Some(once)
    }

    fn outcome_children(&self) -> Option<(&Publisher<T>, &Publisher<E>)> {
        self.inner.completed.as_ref().zip(self.inner.failed.as_ref())
    }

    // Producer wrapper: pending layers first, then the default entry.
    fn route(&self, produced: &Promise<T, E>) -> Result<(), ConfigError> {
        let captured = self.inner.redirects.route(produced);

        #[cfg(feature = "tracing")]
        {
            tracing::debug!(publisher = %self.name(), captured, "Routing producer result");
        }
        #[cfg(not(feature = "tracing"))]
        {
            let _ = captured;
        }

        self.attach(produced.clone())
    }

    fn attach(&self, input: Promise<T, E>) -> Result<(), ConfigError> {
        let (completed, failed) =
            self.outcome_children()
                .ok_or_else(|| ConfigError::MissingOutcomeChildren {
                    publisher: self.name().to_owned(),
                })?;
        let (completed, failed) = (completed.clone(), failed.clone());
        let bridge = self.inner.bridge.clone();
        let name = self.name().to_owned();

        self.inner.bridge.spawn(Box::pin(async move {
            let fired = match input.await {
                Ok(value) => completed.trigger(value),
                Err(reason) => {
                    bridge.report_rejection(&name, &reason);
                    failed.trigger(reason)
                }
            };
            if let Err(err) = fired {
                #[cfg(feature = "tracing")]
                {
                    tracing::warn!(publisher = %name, error = %err, "Outcome dispatch failed");
                }
                #[cfg(not(feature = "tracing"))]
                {
                    let _ = err;
                }
            }
        }));
        Ok(())
    }
}

impl<A: Message, T: Message, E: Message> Clone for AsyncAction<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Message, T: Message, E: Message> fmt::Debug for AsyncAction<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncAction")
            .field("name", &self.name())
            .field("children", &self.inner.children)
            .field("pending_producers", &self.pending_producers())
            .field("redirect_depth", &self.redirect_depth())
            .finish()
    }
}

/// Handle returned by producer registration.
#[derive(Debug)]
pub struct Unsubscribe {
    subscription: Subscription,
    pending: Arc<AtomicUsize>,
}

impl Unsubscribe {
    /// Stop the producer from receiving further triggers. Futures it already
    /// returned are unaffected.
    pub fn unsubscribe(self) -> bool {
        let _ = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));

        #[cfg(feature = "tracing")]
        {
            tracing::debug!(
                pending = self.pending.load(Ordering::SeqCst),
                "Producer unsubscribed"
            );
        }

        self.subscription.unsubscribe()
    }
}

// Outcome of a fallback tick: held while the tick's own dispatch runs.
enum Gate<T, E> {
    Closed(Option<Result<T, E>>),
    Open,
}

// Pair of outcome listeners that remove each other on first use.
#[derive(Clone, Default)]
struct OneShot {
    subscriptions: Arc<Mutex<Vec<Subscription>>>,
}

impl OneShot {
    fn hold(&self, subscriptions: impl IntoIterator<Item = Subscription>) {
        lock(&self.subscriptions).extend(subscriptions);
    }

    fn release(&self) {
        let subscriptions = std::mem::take(&mut *lock(&self.subscriptions));
        for subscription in subscriptions {
            subscription.unsubscribe();
        }
    }
}
