//! Bridge factory.
//!
//! A [`Bridge`] bundles what every async action needs from its environment:
//! the [`Scheduler`] deferred ticks and settlement watchers run on, and an
//! optional rejection observer. Actions get a clone of the bridge at
//! construction, so nothing global is patched.
//!
//! # Example
//!
//! ```rust,ignore
//! let bridge = Bridge::builder(TokioScheduler::current())
//!     .on_rejection(|rejection| eprintln!("{} failed: {:?}", rejection.publisher(), rejection.reason()))
//!     .build();
//!
//! let load = bridge.async_action::<u64, Profile, String>("load_profile");
//! ```

use crate::action::{ActionBuilder, AsyncAction};
use pledge_core::{Message, Scheduler, Task};
use std::{fmt, sync::Arc};

/// Callback invoked for every rejection seen by `promise`.
pub type RejectionObserver = Arc<dyn Fn(&Rejection<'_>) + Send + Sync + 'static>;

/// A rejection reported to the [`RejectionObserver`].
#[derive(Debug, Clone, Copy)]
pub struct Rejection<'a> {
    publisher: &'a str,
    reason: &'a dyn fmt::Debug,
}

impl<'a> Rejection<'a> {
    /// Name of the action whose outcome was rejected.
    pub fn publisher(&self) -> &'a str {
        self.publisher
    }

    /// The rejection reason.
    pub fn reason(&self) -> &'a dyn fmt::Debug {
        self.reason
    }
}

/// Factory for async actions sharing a scheduler and rejection observer.
#[derive(Clone)]
pub struct Bridge {
    scheduler: Arc<dyn Scheduler>,
    on_rejection: Option<RejectionObserver>,
}

impl Bridge {
    /// Create a bridge with no rejection observer.
    pub fn new<S: Scheduler>(scheduler: S) -> Self {
        Self::builder(scheduler).build()
    }

    /// Start configuring a bridge.
    pub fn builder<S: Scheduler>(scheduler: S) -> BridgeBuilder {
        BridgeBuilder {
            scheduler: Arc::new(scheduler),
            on_rejection: None,
        }
    }

    /// Start declaring an action with trigger arguments `A`, completion
    /// value `T` and rejection reason `E`.
    pub fn action<A, T, E>(&self, name: impl Into<String>) -> ActionBuilder<A, T, E>
    where
        A: Message,
        T: Message,
        E: Message,
    {
        ActionBuilder::new(self.clone(), name.into())
    }

    /// Shorthand for an action declaring `completed` and `failed`.
    pub fn async_action<A, T, E>(&self, name: impl Into<String>) -> AsyncAction<A, T, E>
    where
        A: Message,
        T: Message,
        E: Message,
    {
        self.action(name).async_result().build()
    }

    /// Whether a rejection observer is configured.
    pub fn observes_rejections(&self) -> bool {
        self.on_rejection.is_some()
    }

    pub(crate) fn spawn(&self, task: Task) {
        self.scheduler.spawn(task);
    }

    pub(crate) fn defer(&self, tick: Box<dyn FnOnce() + Send + 'static>) {
        self.scheduler.defer(tick);
    }

    pub(crate) fn report_rejection(&self, publisher: &str, reason: &dyn fmt::Debug) {
        if let Some(observer) = &self.on_rejection {
            observer(&Rejection { publisher, reason });
        }
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("observes_rejections", &self.observes_rejections())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Bridge`].
pub struct BridgeBuilder {
    scheduler: Arc<dyn Scheduler>,
    on_rejection: Option<RejectionObserver>,
}

impl BridgeBuilder {
    /// Observe every rejection that reaches an action's `failed` child.
    pub fn on_rejection<F>(mut self, observer: F) -> Self
    where
        F: Fn(&Rejection<'_>) + Send + Sync + 'static,
    {
        self.on_rejection = Some(Arc::new(observer));
        self
    }

    /// Build the bridge.
    pub fn build(self) -> Bridge {
        Bridge {
            scheduler: self.scheduler,
            on_rejection: self.on_rejection,
        }
    }
}
