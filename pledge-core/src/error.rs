//! Error types for Pledge.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`PledgeError`] - Top-level error type
//! - [`ConfigError`] - An action is missing the children an operation needs
//! - [`DispatchError`] - A listener failed while a publisher was triggered
//! - [`PromiseError`] - Why a trigger promise settled without a value

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Pledge operations.
#[derive(Error, Debug)]
pub enum PledgeError {
    /// An operation was used on an action that cannot support it.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A publisher dispatch failed.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors caused by how an action was declared.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The action does not declare both outcome children.
    #[error("publisher `{publisher}` must have \"completed\" and \"failed\" child publishers")]
    MissingOutcomeChildren {
        /// Name of the offending publisher.
        publisher: String,
    },
}

/// Errors that can occur while a publisher dispatches to its listeners.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A listener returned an error; the remaining listeners were skipped.
    #[error("listener on `{publisher}` failed")]
    Listener {
        /// Name of the publisher being triggered.
        publisher: String,
        /// The listener's error.
        #[source]
        source: BoxError,
    },
}

impl DispatchError {
    /// Name of the publisher whose dispatch failed.
    pub fn publisher(&self) -> &str {
        match self {
            DispatchError::Listener { publisher, .. } => publisher,
        }
    }
}

/// The error side of a trigger promise.
#[derive(Error, Debug)]
pub enum PromiseError<E> {
    /// The outcome was a rejection: either the producer's future failed or
    /// the `failed` child fired.
    #[error("promise rejected: {0:?}")]
    Rejected(E),

    /// Triggering the publisher failed before any outcome was bound.
    #[error("trigger failed before an outcome was produced")]
    Dispatch(#[source] DispatchError),

    /// Every resolver was dropped without settling.
    #[error("promise was dropped before it settled")]
    Abandoned,
}

impl<E> PromiseError<E> {
    /// Returns the rejection reason, if this is a rejection.
    pub fn rejection(&self) -> Option<&E> {
        match self {
            PromiseError::Rejected(reason) => Some(reason),
            _ => None,
        }
    }

    /// Consumes the error, returning the rejection reason if there is one.
    pub fn into_rejection(self) -> Option<E> {
        match self {
            PromiseError::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

// Convenience conversions
impl From<BoxError> for PledgeError {
    fn from(err: BoxError) -> Self {
        PledgeError::Custom(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_names_publisher() {
        let err = ConfigError::MissingOutcomeChildren {
            publisher: "load".into(),
        };
        assert_eq!(
            err.to_string(),
            "publisher `load` must have \"completed\" and \"failed\" child publishers"
        );
    }

    #[test]
    fn test_dispatch_error_source() {
        let err = DispatchError::Listener {
            publisher: "save".into(),
            source: "disk full".into(),
        };
        assert_eq!(err.publisher(), "save");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("disk full"));
    }

    #[test]
    fn test_promise_error_rejection() {
        let err: PromiseError<String> = PromiseError::Rejected("boom".into());
        assert_eq!(err.rejection().map(String::as_str), Some("boom"));
        assert_eq!(err.to_string(), "promise rejected: \"boom\"");

        let abandoned: PromiseError<String> = PromiseError::Abandoned;
        assert!(abandoned.into_rejection().is_none());
    }

    #[test]
    fn test_pledge_error_from() {
        let err: PledgeError = ConfigError::MissingOutcomeChildren {
            publisher: "x".into(),
        }
        .into();
        assert!(matches!(err, PledgeError::Config(_)));
    }
}
