//! Futures on both sides of the bridge.
//!
//! - [`Promise`] is what producers hand back. It is shared, so a redirection
//!   layer and the `completed`/`failed` children can each observe the same
//!   result.
//! - [`TriggerPromise`] is what a consumer of `trigger_promise` awaits. It
//!   settles exactly once, through a [`Resolver`].

use crate::sync::lock;
use futures::{
    FutureExt,
    channel::oneshot,
    future::{BoxFuture, Shared},
};
use pledge_core::{Message, PromiseError};
use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll},
};

/// A producer result that can be awaited by any number of observers.
pub type Promise<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

/// Final value of a [`TriggerPromise`].
///
/// `Ok(None)` means the promise resolved without a value: the action has no
/// outcome children to wait for.
pub type Settlement<T, E> = Result<Option<T>, PromiseError<E>>;

/// Box and share a producer future.
pub fn share<F, T, E>(future: F) -> Promise<T, E>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Message,
    E: Message,
{
    future.boxed().shared()
}

/// Create a pending [`TriggerPromise`] and the [`Resolver`] that settles it.
pub fn channel<T, E>() -> (Resolver<T, E>, TriggerPromise<T, E>) {
    let (sender, receiver) = oneshot::channel();
    (
        Resolver {
            sender: Arc::new(Mutex::new(Some(sender))),
        },
        TriggerPromise { receiver },
    )
}

/// Settles a [`TriggerPromise`]. Clones share the same slot; the first
/// settlement wins and later ones return `false`.
pub struct Resolver<T, E> {
    sender: Arc<Mutex<Option<oneshot::Sender<Settlement<T, E>>>>>,
}

impl<T, E> Resolver<T, E> {
    /// Resolve with `value`.
    pub fn resolve(&self, value: Option<T>) -> bool {
        self.settle(Ok(value))
    }

    /// Reject with `reason`.
    pub fn reject(&self, reason: E) -> bool {
        self.settle(Err(PromiseError::Rejected(reason)))
    }

    /// Settle with an error other than a rejection.
    pub fn fail(&self, error: PromiseError<E>) -> bool {
        self.settle(Err(error))
    }

    /// Resolve with the value or reject with the reason of `outcome`.
    pub fn complete(&self, outcome: Result<T, E>) -> bool {
        match outcome {
            Ok(value) => self.resolve(Some(value)),
            Err(reason) => self.reject(reason),
        }
    }

    /// Settle with `settlement` unless already settled.
    pub fn settle(&self, settlement: Settlement<T, E>) -> bool {
        match lock(&self.sender).take() {
            Some(sender) => {
                // The consumer may have dropped its promise; that's fine.
                let _ = sender.send(settlement);
                true
            }
            None => false,
        }
    }

    /// Whether some clone of this resolver has already settled.
    pub fn is_settled(&self) -> bool {
        lock(&self.sender).is_none()
    }
}

impl<T: Message, E: Message> Resolver<T, E> {
    /// Wait for `source` and settle with its outcome.
    pub async fn follow(self, source: Promise<T, E>) {
        self.complete(source.await);
    }
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// The future returned by `trigger_promise`.
///
/// Completes with [`PromiseError::Abandoned`] if every [`Resolver`] is
/// dropped before settling.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct TriggerPromise<T, E> {
    receiver: oneshot::Receiver<Settlement<T, E>>,
}

impl<T, E> Future for TriggerPromise<T, E> {
    type Output = Settlement<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.receiver
            .poll_unpin(cx)
            .map(|received| received.unwrap_or(Err(PromiseError::Abandoned)))
    }
}

impl<T, E> fmt::Debug for TriggerPromise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerPromise").finish_non_exhaustive()
    }
}
