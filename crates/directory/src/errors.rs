//! Error and retry-policy types for the device directory.
//!
//! [`DirectoryError`] is the single error channel of every directory
//! operation and of every [`crate::DeviceServerSession`] implementation.
//! Transports map their own failures onto these variants; callers branch on
//! the variant, never on message text.
//!
//! [`RetryPolicy`] lets a caller decide whether re-issuing a failed call is
//! sensible. The directory itself never retries.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// ## Rules
///
/// - `Retryable` errors: connection failures, timeouts.
/// - `NonRetryable` errors: malformed responses, bad arguments, missing
///   remote objects, rejected credentials, invalid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt. `None` means the caller
        /// applies its own back-off schedule.
        after: Option<Duration>,
    },
    /// Re-issuing the same call will fail the same way.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Directory errors
// ---------------------------------------------------------------------------

/// Failure of a directory operation.
///
/// A call that returns an error has no assumed side effects.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum DirectoryError {
    /// The underlying connection failed (refused, reset, timed out).
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The server answered, but not with what the protocol promises
    /// (undecodable document, missing link, unexpected status).
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the unexpected response.
        message: String,
    },

    /// The caller passed a value that did not come from a listing call, or
    /// the server rejected the request as malformed.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },

    /// The referenced object does not exist on the server.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Kind of the missing object (e.g. `"client"`, `"instance"`).
        resource: String,
        /// Identifier or address of the missing object.
        id: String,
    },

    /// The server rejected the session credentials or token.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Description of the rejection.
        message: String,
    },

    /// The session could not be set up from the supplied configuration.
    ///
    /// Produced before any request is sent.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl DirectoryError {
    /// Shorthand for [`DirectoryError::Transport`].
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Shorthand for [`DirectoryError::Protocol`].
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Shorthand for [`DirectoryError::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Shorthand for [`DirectoryError::NotFound`].
    pub fn not_found(resource: impl Into<String>, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    /// Returns `true` for [`DirectoryError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Classifies this error for callers that implement their own retry loop.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Transport { .. } => RetryPolicy::Retryable { after: None },
            _ => RetryPolicy::NonRetryable,
        }
    }
}
