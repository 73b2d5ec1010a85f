//! # pledge - Publisher/Promise Bridge
//!
//! `pledge` lets callback-style, multicast publishers and single-shot
//! futures meet. An [`AsyncAction`] is a publisher that may declare two
//! outcome children, `completed` and `failed`. Three operations connect it
//! to futures:
//!
//! - [`AsyncAction::trigger_promise`]: trigger the action and await the
//!   outcome of *this* invocation.
//! - [`AsyncAction::promise`]: fire `completed`/`failed` from an existing
//!   future.
//! - [`AsyncAction::listen_and_promise`]: register a producer; the future it
//!   returns settles the trigger that invoked it.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pledge::prelude::*;
//! use futures::future;
//!
//! let bridge = Bridge::new(TokioScheduler::current());
//! let make_pancakes = bridge.async_action::<(u32, u32, u32), u32, String>("make_pancakes");
//!
//! make_pancakes.listen_and_promise(|&(flour, milk, egg): &(u32, u32, u32)| {
//!     future::ready(Ok(flour + milk + egg))
//! });
//!
//! assert_eq!(make_pancakes.trigger_promise((4, 2, 1)).await?, Some(7));
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use pledge_core::{
    // Error types
    BoxError,
    ConfigError,
    DispatchError,
    // Listener
    Listener,
    // Message
    Message,
    PledgeError,
    PromiseError,
    // Scheduler
    Scheduler,
    Task,
};

pub use pledge_std::{
    action::{ActionBuilder, AsyncAction, COMPLETED, FAILED, Unsubscribe},
    bridge::{Bridge, BridgeBuilder, Rejection, RejectionObserver},
    promise::{Promise, Resolver, Settlement, TriggerPromise},
    publisher::{Publisher, Subscription},
    redirect::{LayerId, RedirectStack},
    scheduler::SpawnScheduler,
};

#[cfg(feature = "tokio")]
pub use pledge_std::scheduler::TokioScheduler;

/// Promise helpers.
pub mod promise {
    pub use pledge_std::promise::{channel, share};
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use pledge_std::testing::*;
}

/// Prelude module - common imports for Pledge.
///
/// # Usage
///
/// ```rust,ignore
/// use pledge::prelude::*;
/// ```
pub mod prelude {
    #[cfg(feature = "tokio")]
    pub use crate::TokioScheduler;
    pub use crate::{
        AsyncAction, BoxError, Bridge, ConfigError, DispatchError, Listener, Message,
        PromiseError, Publisher, Scheduler, TriggerPromise, Unsubscribe,
    };
}
