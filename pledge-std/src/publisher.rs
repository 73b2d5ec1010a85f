//! Multicast publisher.
//!
//! A [`Publisher`] keeps an ordered list of [`Listener`]s and calls all of
//! them, synchronously, every time it is triggered. Dispatch works on a
//! snapshot of the list and holds no lock while user code runs, so listeners
//! may subscribe, unsubscribe or trigger other publishers reentrantly.

use crate::sync::lock;
use pledge_core::{BoxError, DispatchError, Listener, Message};
use std::{
    fmt,
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

/// An invocable, multicast-subscribable entity.
pub struct Publisher<A: Message> {
    inner: Arc<Inner<A>>,
}

struct Inner<A: Message> {
    name: String,
    next_id: AtomicU64,
    listeners: Mutex<Vec<Entry<A>>>,
}

struct Entry<A: Message> {
    id: u64,
    listener: Arc<dyn Listener<A>>,
}

impl<A: Message> Publisher<A> {
    /// Create a publisher with no listeners.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                next_id: AtomicU64::new(0),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The name used in logs and errors.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Register a closure listener.
    pub fn listen<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&A) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.listen_with(callback)
    }

    /// Register any [`Listener`] implementation.
    pub fn listen_with<L: Listener<A>>(&self, listener: L) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.listeners).push(Entry {
            id,
            listener: Arc::new(listener),
        });
        let source = Arc::downgrade(&self.inner);
        let source: Weak<dyn Unlisten> = source;
        Subscription { id, source }
    }

    /// Dispatch `args` to every listener registered at call time, in
    /// registration order.
    ///
    /// The first listener error stops the dispatch and is returned.
    pub fn trigger(&self, args: A) -> Result<(), DispatchError> {
        let listeners: Vec<Arc<dyn Listener<A>>> = lock(&self.inner.listeners)
            .iter()
            .map(|entry| Arc::clone(&entry.listener))
            .collect();

        #[cfg(feature = "tracing")]
        {
            tracing::debug!(
                publisher = %self.inner.name,
                listeners = listeners.len(),
                ?args,
                "Triggering publisher"
            );
        }

        for listener in listeners {
            listener
                .on_trigger(&args)
                .map_err(|source| DispatchError::Listener {
                    publisher: self.inner.name.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        lock(&self.inner.listeners).len()
    }
}

impl<A: Message> Clone for Publisher<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Message> fmt::Debug for Publisher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("name", &self.inner.name)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

// Type-erased removal, so a Subscription doesn't carry the payload type.
trait Unlisten: Send + Sync {
    fn unlisten(&self, id: u64) -> bool;
    fn is_listening(&self, id: u64) -> bool;
}

impl<A: Message> Unlisten for Inner<A> {
    fn unlisten(&self, id: u64) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        listeners.len() != before
    }

    fn is_listening(&self, id: u64) -> bool {
        lock(&self.listeners).iter().any(|entry| entry.id == id)
    }
}

/// Handle for a listener registered with [`Publisher::listen`].
///
/// Dropping the handle leaves the listener registered.
pub struct Subscription {
    id: u64,
    source: Weak<dyn Unlisten>,
}

impl Subscription {
    /// Remove the listener. Returns `false` if it was already gone.
    pub fn unsubscribe(self) -> bool {
        self.source
            .upgrade()
            .is_some_and(|source| source.unlisten(self.id))
    }

    /// Whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.source
            .upgrade()
            .is_some_and(|source| source.is_listening(self.id))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(
        order: Arc<Mutex<Vec<&'static str>>>,
        tag: &'static str,
    ) -> impl Fn(&u32) -> Result<(), BoxError> + Send + Sync + 'static {
        move |_| {
            order.lock().unwrap().push(tag);
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let publisher = Publisher::<u32>::new("tick");
        let order = Arc::new(Mutex::new(Vec::new()));
        let _a = publisher.listen(recorder(order.clone(), "a"));
        let _b = publisher.listen(recorder(order.clone(), "b"));
        let _c = publisher.listen(recorder(order.clone(), "c"));

        publisher.trigger(1).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let publisher = Publisher::<u32>::new("tick");
        let order = Arc::new(Mutex::new(Vec::new()));
        let a = publisher.listen(recorder(order.clone(), "a"));
        let _b = publisher.listen(recorder(order.clone(), "b"));

        assert!(a.is_active());
        assert!(a.unsubscribe());
        assert_eq!(publisher.listener_count(), 1);

        publisher.trigger(1).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["b"]);
    }

    #[test]
    fn test_listener_error_stops_dispatch() {
        let publisher = Publisher::<u32>::new("save");
        let order = Arc::new(Mutex::new(Vec::new()));
        let _a = publisher.listen(recorder(order.clone(), "a"));
        let _fail = publisher.listen(|n: &u32| -> Result<(), BoxError> {
            Err(format!("rejected {n}").into())
        });
        let _c = publisher.listen(recorder(order.clone(), "c"));

        let err = publisher.trigger(7).unwrap_err();
        assert_eq!(err.publisher(), "save");
        assert_eq!(
            std::error::Error::source(&err).unwrap().to_string(),
            "rejected 7"
        );
        assert_eq!(*order.lock().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_listener_can_unsubscribe_itself() {
        let publisher = Publisher::<u32>::new("once");
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(Mutex::new(0));

        let subscription = {
            let slot = slot.clone();
            let calls = calls.clone();
            publisher.listen(move |_| {
                *calls.lock().unwrap() += 1;
                if let Some(own) = slot.lock().unwrap().take() {
                    own.unsubscribe();
                }
                Ok(())
            })
        };
        *slot.lock().unwrap() = Some(subscription);

        publisher.trigger(1).unwrap();
        publisher.trigger(2).unwrap();
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(publisher.listener_count(), 0);
    }

    #[test]
    fn test_subscription_outlives_publisher() {
        let publisher = Publisher::<u32>::new("gone");
        let subscription = publisher.listen(|_| Ok(()));
        drop(publisher);
        assert!(!subscription.is_active());
        assert!(!subscription.unsubscribe());
    }
}
