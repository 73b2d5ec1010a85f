//! # pledge-std
//!
//! Standard implementations for Pledge.
//!
//! This crate provides:
//! - **Publishers**: [`Publisher`](publisher::Publisher), synchronous ordered multicast
//! - **Promises**: shared producer results and settle-once trigger promises
//! - **Actions**: [`AsyncAction`](action::AsyncAction) with `trigger_promise`,
//!   `promise` and `listen_and_promise`
//! - **Bridge**: the [`Bridge`](bridge::Bridge) factory actions are built from
//! - **Schedulers**: tokio and `futures` executor adapters
//! - **Testing**: recording listeners and a manual scheduler

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use pledge_core;

// Modules
pub mod action;
pub mod bridge;
pub mod promise;
pub mod publisher;
pub mod redirect;
pub mod scheduler;
pub mod testing;

mod sync;
