//! Scheduler implementations.
//!
//! - [`TokioScheduler`] (feature `tokio`): spawns onto a tokio runtime.
//!   Use a current-thread runtime to keep deferred ticks strictly ordered.
//! - [`SpawnScheduler`]: adapts any `futures` executor implementing
//!   [`Spawn`](futures::task::Spawn).
//!
//! For deterministic tests see [`ManualScheduler`](crate::testing::ManualScheduler).

use futures::task::{Spawn, SpawnExt};
use pledge_core::{Scheduler, Task};

#[cfg(feature = "tokio")]
pub use self::tokio_scheduler::TokioScheduler;

#[cfg(feature = "tokio")]
mod tokio_scheduler {
    use pledge_core::{Scheduler, Task};
    use tokio::runtime::{Handle, TryCurrentError};

    /// Runs tasks on a tokio runtime.
    #[derive(Debug, Clone)]
    pub struct TokioScheduler {
        handle: Handle,
    }

    impl TokioScheduler {
        /// Spawn onto the runtime behind `handle`.
        pub fn new(handle: Handle) -> Self {
            Self { handle }
        }

        /// Spawn onto the runtime the caller is running in.
        ///
        /// # Panics
        ///
        /// Panics when called outside of a tokio runtime.
        pub fn current() -> Self {
            Self::new(Handle::current())
        }

        /// Like [`current`](Self::current), without panicking.
        pub fn try_current() -> Result<Self, TryCurrentError> {
            Handle::try_current().map(Self::new)
        }
    }

    impl Scheduler for TokioScheduler {
        fn spawn(&self, task: Task) {
            // Detached: settlement is observed through the promise, not the handle.
            drop(self.handle.spawn(task));
        }
    }
}

/// Runs tasks on any [`Spawn`] executor.
#[derive(Debug, Clone)]
pub struct SpawnScheduler<S> {
    spawner: S,
}

impl<S> SpawnScheduler<S> {
    /// Wrap `spawner`.
    pub fn new(spawner: S) -> Self {
        Self { spawner }
    }
}

impl<S> Scheduler for SpawnScheduler<S>
where
    S: Spawn + Send + Sync + 'static,
{
    fn spawn(&self, task: Task) {
        if let Err(err) = SpawnExt::spawn(&self.spawner, task) {
            #[cfg(feature = "tracing")]
            {
                tracing::warn!(error = %err, "Executor refused task");
            }
            #[cfg(not(feature = "tracing"))]
            {
                let _ = err;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::Bridge;
    use futures::{executor::ThreadPool, future};
    use std::time::Duration;

    #[test]
    fn test_spawn_scheduler_thread_pool() {
        let pool = ThreadPool::builder().pool_size(1).create().unwrap();
        let bridge = Bridge::new(SpawnScheduler::new(pool));
        let action = bridge.async_action::<u32, u32, String>("square");
        let _producer = action.listen_and_promise(|n: &u32| future::ready(Ok(n * n)));

        let outcome = futures::executor::block_on(action.trigger_promise(12));
        assert_eq!(outcome.unwrap(), Some(144));
    }

    #[test]
    fn test_overlapping_ticks_keep_their_own_results() {
        let pool = ThreadPool::builder().pool_size(4).create().unwrap();
        let bridge = Bridge::new(SpawnScheduler::new(pool));
        let action = bridge.async_action::<u32, u32, String>("identity");
        let _producer = action.listen_and_promise(|n: &u32| {
            if *n == 1 {
                std::thread::sleep(Duration::from_millis(100));
            }
            future::ready(Ok(*n))
        });

        let first = action.trigger_promise(1);
        std::thread::sleep(Duration::from_millis(20));
        let second = action.trigger_promise(2);

        let (first, second) = futures::executor::block_on(future::join(first, second));
        assert_eq!(first.unwrap(), Some(1));
        assert_eq!(second.unwrap(), Some(2));
        assert_eq!(action.redirect_depth(), 1);
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn test_tokio_scheduler_runs_deferred_tick() {
        let bridge = Bridge::new(TokioScheduler::current());
        let action = bridge.async_action::<u32, u32, String>("square");
        let _producer = action.listen_and_promise(|n: &u32| future::ready(Ok(n * n)));

        assert_eq!(action.trigger_promise(9).await.unwrap(), Some(81));
    }

    #[cfg(feature = "tokio")]
    #[test]
    fn test_try_current_outside_runtime() {
        assert!(TokioScheduler::try_current().is_err());
    }
}
