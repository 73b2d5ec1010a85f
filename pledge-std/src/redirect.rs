//! Redirection stack.
//!
//! When a producer's wrapper runs, the [`Promise`] it got back has to reach
//! whichever consumer is waiting for it. Each deferred `trigger_promise` tick
//! pushes one layer right before it dispatches; the wrapper pops layers from
//! the top, hands the promise to each, and then falls through to the
//! implicit bottom entry, which wires the promise to the `completed`/`failed`
//! children.
//!
//! Layers are only ever pushed and popped (or removed by the tick that owns
//! them), never overwritten, so sequential and nested triggers compose.

use crate::{promise::Promise, sync::lock};
use pledge_core::Message;
use std::{
    fmt,
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

/// A one-shot consumer of a producer result.
pub type Capture<T, E> = Box<dyn FnOnce(&Promise<T, E>) + Send + 'static>;

/// Identifies a pushed layer so its owner can take it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(u64);

struct Layer<T, E> {
    id: LayerId,
    capture: Capture<T, E>,
}

/// Stack of pending redirections for one action.
pub struct RedirectStack<T, E> {
    layers: Mutex<Vec<Layer<T, E>>>,
    next_id: AtomicU64,
}

impl<T: Message, E: Message> RedirectStack<T, E> {
    /// An empty stack; only the default entry is present.
    pub fn new() -> Self {
        Self {
            layers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Push a layer on top.
    pub fn push<F>(&self, capture: F) -> LayerId
    where
        F: FnOnce(&Promise<T, E>) + Send + 'static,
    {
        let id = LayerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.layers).push(Layer {
            id,
            capture: Box::new(capture),
        });
        id
    }

    /// Pop the top layer.
    pub fn pop(&self) -> Option<Capture<T, E>> {
        lock(&self.layers).pop().map(|layer| layer.capture)
    }

    /// Remove a layer that was never consumed. Returns `false` if it was
    /// already popped.
    pub fn remove(&self, id: LayerId) -> bool {
        let mut layers = lock(&self.layers);
        match layers.iter().position(|layer| layer.id == id) {
            Some(index) => {
                layers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of entries including the default one, so never less than 1.
    pub fn depth(&self) -> usize {
        lock(&self.layers).len() + 1
    }

    /// Hand `produced` to every pushed layer, top first, popping each.
    ///
    /// Returns how many layers captured it. The caller is responsible for the
    /// default entry.
    pub fn route(&self, produced: &Promise<T, E>) -> usize {
        let mut captured = 0;
        // No lock is held while a capture runs.
        while let Some(capture) = self.pop() {
            capture(produced);
            captured += 1;
        }
        captured
    }
}

impl<T: Message, E: Message> Default for RedirectStack<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for RedirectStack<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedirectStack")
            .field("layers", &lock(&self.layers).len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promise::share;
    use futures::{FutureExt, future};
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<(&'static str, Option<Result<u32, String>>)>>>;

    fn capture_into(log: Log, tag: &'static str) -> impl FnOnce(&Promise<u32, String>) + Send {
        move |produced| {
            let value = produced.clone().now_or_never();
            log.lock().unwrap().push((tag, value));
        }
    }

    #[test]
    fn test_depth_starts_at_one() {
        let stack = RedirectStack::<u32, String>::new();
        assert_eq!(stack.depth(), 1);
        assert!(stack.pop().is_none());
    }

    #[test]
    fn test_route_drains_top_first() {
        let stack = RedirectStack::<u32, String>::new();
        let log: Log = Arc::default();
        stack.push(capture_into(log.clone(), "outer"));
        stack.push(capture_into(log.clone(), "inner"));
        assert_eq!(stack.depth(), 3);

        let produced = share(future::ready(Ok::<u32, String>(4)));
        assert_eq!(stack.route(&produced), 2);
        assert_eq!(stack.depth(), 1);
        assert_eq!(
            *log.lock().unwrap(),
            vec![("inner", Some(Ok(4))), ("outer", Some(Ok(4)))]
        );
    }

    #[test]
    fn test_remove_unconsumed_layer() {
        let stack = RedirectStack::<u32, String>::new();
        let log: Log = Arc::default();
        let first = stack.push(capture_into(log.clone(), "first"));
        stack.push(capture_into(log.clone(), "second"));

        assert!(stack.remove(first));
        assert!(!stack.remove(first));
        assert_eq!(stack.depth(), 2);

        let produced = share(future::ready(Err::<u32, String>("no".into())));
        assert_eq!(stack.route(&produced), 1);
        assert_eq!(
            *log.lock().unwrap(),
            vec![("second", Some(Err("no".to_string())))]
        );
    }
}
