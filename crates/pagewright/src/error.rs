// Error types for pagewright
//
// Recoverable conditions (NotFound, NotActionable, AssertionFailed) are
// swallowed by the retry engine until the budget runs out. Everything else
// aborts the running chain immediately.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for pagewright operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a page
#[derive(Debug, Error)]
pub enum Error {
    /// Selector or index matched nothing, or a handle went stale
    #[error("Element not found: {0}")]
    NotFound(String),

    /// Element is present but cannot be interacted with right now
    ///
    /// Common causes: hidden, disabled, covered by an inert region, or the
    /// subject holds more than one element.
    #[error("Element not actionable: {0}")]
    NotActionable(String),

    /// Element cannot receive text input
    #[error("Element not focusable: {0}")]
    NotFocusable(String),

    /// No `<option>` matched the requested value or label
    #[error("Option '{option}' not found in select '{select}'")]
    OptionNotFound { option: String, select: String },

    /// Predicate evaluated false
    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    /// Retry budget exhausted
    ///
    /// Carries the last recoverable condition observed before giving up.
    #[error("Timed out after {elapsed:?} ({attempts} attempts): {last}")]
    Timeout {
        elapsed: Duration,
        attempts: u32,
        last: Box<Error>,
    },

    /// Page could not be loaded
    #[error("Navigation to '{url}' failed: {reason}")]
    NavigationError { url: String, reason: String },

    /// Selector could not be parsed
    #[error("Invalid selector: '{0}'")]
    InvalidSelector(String),

    /// Invalid argument provided to method
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A chain ran before any page was visited
    #[error("No page loaded: call visit() before querying")]
    NoPage,

    /// Session was torn down
    #[error("Session closed")]
    SessionClosed,

    /// Invalid session configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A command chain failed; carries the rendered chain
    #[error("{source}\n  in chain: {chain}")]
    Chain {
        chain: String,
        #[source]
        source: Box<Error>,
    },

    /// Error with additional context
    #[error("{0}: {1}")]
    Context(String, #[source] Box<Error>),
}

impl Error {
    /// Adds context to the error
    pub fn context(self, msg: impl Into<String>) -> Self {
        Error::Context(msg.into(), Box::new(self))
    }

    /// Whether the retry engine may swallow this error and try again.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::NotFound(_) | Error::NotActionable(_) | Error::AssertionFailed(_) => true,
            Error::Context(_, inner) => inner.is_recoverable(),
            _ => false,
        }
    }

    /// Whether this error (or the error it wraps) is a retry timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self.root_cause(), Error::Timeout { .. })
    }

    /// Strips `Chain` and `Context` wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Chain { source, .. } => source.root_cause(),
            Error::Context(_, inner) => inner.root_cause(),
            other => other,
        }
    }
}
