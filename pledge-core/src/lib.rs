//! # pledge-core
//!
//! Core traits for Pledge, a bridge between multicast publishers and
//! single-shot futures.
//!
//! This crate has minimal dependencies and is meant for code that plugs into
//! Pledge (custom schedulers, reusable listeners) without pulling in the
//! `pledge-std` implementations.
//!
//! # Pieces
//!
//! - [`Message`]: bound shared by trigger arguments and outcome payloads.
//! - [`Listener`]: a synchronous subscriber; publishers call every listener
//!   in registration order.
//! - [`Scheduler`]: the event loop. Deferred ticks and settlement watchers
//!   run on it.
//!
//! # Error Types
//!
//! - [`PledgeError`] - Top-level error type
//! - [`ConfigError`] - Missing `completed`/`failed` children
//! - [`DispatchError`] - Listener failures during a trigger
//! - [`PromiseError`] - Non-value settlements of a trigger promise

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
mod listener;
mod message;
mod scheduler;

// Re-exports
pub use error::{BoxError, ConfigError, DispatchError, PledgeError, PromiseError};
pub use listener::Listener;
pub use message::Message;
pub use scheduler::{Scheduler, Task};
