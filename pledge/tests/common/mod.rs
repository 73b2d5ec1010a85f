#![allow(dead_code)]

use pledge::{AsyncAction, Bridge, Message, TokioScheduler};
use std::time::Duration;

// ============================================================================
// Fixtures
// ============================================================================

/// A bridge on the test's own runtime.
pub fn bridge() -> Bridge {
    Bridge::new(TokioScheduler::current())
}

/// An action declaring `completed` and `failed`.
pub fn async_action<A: Message, T: Message>(name: &str) -> AsyncAction<A, T, String> {
    bridge().async_action(name)
}

/// Resolve to `value` after `ms` milliseconds.
pub async fn after<T>(ms: u64, value: T) -> T {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    value
}

/// Fire `completed` (or `failed`) from a detached task after `ms`
/// milliseconds, the way a store reacting to an action would.
pub fn settle_later<A: Message, T: Message>(
    action: &AsyncAction<A, T, String>,
    ms: u64,
    outcome: Result<T, String>,
) {
    let completed = action.completed().cloned();
    let failed = action.failed().cloned();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        let fired = match outcome {
            Ok(value) => completed.map(|child| child.trigger(value)),
            Err(reason) => failed.map(|child| child.trigger(reason)),
        };
        if let Some(fired) = fired {
            fired.unwrap();
        }
    });
}
