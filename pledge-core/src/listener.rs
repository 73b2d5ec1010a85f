//! # Listener
//!
//! The unit a publisher dispatches to. Listeners are synchronous: a
//! publisher calls every registered listener, in registration order, before
//! `trigger` returns. Returning an error stops the dispatch and surfaces as a
//! [`DispatchError`](crate::DispatchError) to whoever triggered the publisher.
//!
//! Closures of the shape `Fn(&A) -> Result<(), BoxError>` are listeners
//! through a blanket implementation; implement the trait directly for
//! listeners that carry state worth naming (see `pledge_std::testing`).

use crate::{error::BoxError, message::Message};

/// A synchronous subscriber to a publisher of `A`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Listener` for `{A}`",
    label = "missing `Listener` implementation",
    note = "Listeners must implement `on_trigger` or be a `Fn(&{A}) -> Result<(), BoxError>`."
)]
pub trait Listener<A: Message>: Send + Sync + 'static {
    /// Called once per dispatch with the triggered arguments.
    fn on_trigger(&self, args: &A) -> Result<(), BoxError>;
}

impl<A, F> Listener<A> for F
where
    A: Message,
    F: Fn(&A) -> Result<(), BoxError> + Send + Sync + 'static,
{
    fn on_trigger(&self, args: &A) -> Result<(), BoxError> {
        self(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    struct Threshold(usize);

    impl Listener<usize> for Threshold {
        fn on_trigger(&self, args: &usize) -> Result<(), BoxError> {
            if *args > self.0 {
                return Err(format!("{args} exceeds {}", self.0).into());
            }
            Ok(())
        }
    }

    #[test]
    fn test_closure_is_listener() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let listener = move |n: &usize| -> Result<(), BoxError> {
            counter.fetch_add(*n, Ordering::SeqCst);
            Ok(())
        };
        listener.on_trigger(&3).unwrap();
        listener.on_trigger(&4).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_struct_listener_error() {
        let listener = Threshold(10);
        assert!(listener.on_trigger(&5).is_ok());
        let err = listener.on_trigger(&11).unwrap_err();
        assert_eq!(err.to_string(), "11 exceeds 10");
    }
}
