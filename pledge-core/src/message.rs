//! Message trait for trigger arguments and outcome payloads.

use std::fmt::Debug;

/// A marker trait for everything that travels through a publisher.
///
/// Trigger arguments, completion values and rejection reasons all have to be
/// `Clone` (a dispatch hands the same value to several listeners, and a shared
/// producer result is observed by several parties) and `Debug` (they show up
/// in logs and in [`PromiseError`](crate::PromiseError)).
///
/// The trait is implemented for every type that meets the bounds.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Message",
    label = "must be `Clone + Debug + Send + Sync + 'static`",
    note = "Payloads are cloned per listener and shared between threads."
)]
pub trait Message: Clone + Debug + Send + Sync + 'static {}

impl<T: Clone + Debug + Send + Sync + 'static> Message for T {}
