//! Failure taxonomy shared by every layer that talks to the remote service
//! or the local mirror.
//!
//! Errors are pure data: a closed [`ErrorKind`] plus the name of the module
//! that raised it. There is exactly one constructor per category, and any
//! failure that does not match a known pattern is classified as `Network`
//! so that callers never see an opaque error.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// The closed set of failure categories.
///
/// Variants are immutable once constructed and carry just enough context to
/// act on: the offending field for validation/parse failures, the
/// server-supplied delay for rate limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection-level failure, or anything unclassified.
    Network { message: String },
    /// The remote did not answer within the per-call timeout.
    Timeout { message: String },
    /// The remote asked us to back off, optionally telling us for how long.
    RateLimited { retry_after: Option<Duration> },
    /// Credentials missing, expired, or rejected.
    AuthenticationFailed,
    /// The addressed resource does not exist remotely.
    NotFound { resource: String },
    /// A request was rejected before any I/O because an input is invalid.
    Validation { field: String, value: String },
    /// A response field could not be decoded into its expected shape.
    Parse { field: String, raw_value: String },
    /// The mirrored content no longer matches what the caller expected.
    DataConflict { expected: String, actual: String },
    /// The client is misconfigured (base URL, store path, ...).
    Configuration { message: String },
}

impl ErrorKind {
    /// Stable discriminant tag, usable in logs and user-facing summaries.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            ErrorKind::Network { .. } => "network",
            ErrorKind::Timeout { .. } => "timeout",
            ErrorKind::RateLimited { .. } => "rate_limited",
            ErrorKind::AuthenticationFailed => "authentication_failed",
            ErrorKind::NotFound { .. } => "not_found",
            ErrorKind::Validation { .. } => "validation",
            ErrorKind::Parse { .. } => "parse",
            ErrorKind::DataConflict { .. } => "data_conflict",
            ErrorKind::Configuration { .. } => "configuration",
        }
    }

    /// Whether retrying the same operation can plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::Network { .. } | ErrorKind::Timeout { .. } | ErrorKind::RateLimited { .. }
        )
    }

    /// The server-supplied backoff delay, if this is a rate limit that
    /// carried one.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ErrorKind::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network { message } => write!(f, "network error: {message}"),
            ErrorKind::Timeout { message } => write!(f, "timed out: {message}"),
            ErrorKind::RateLimited { retry_after: Some(d) } => {
                write!(f, "rate limited, retry after {}ms", d.as_millis())
            }
            ErrorKind::RateLimited { retry_after: None } => write!(f, "rate limited"),
            ErrorKind::AuthenticationFailed => write!(f, "authentication failed"),
            ErrorKind::NotFound { resource } => write!(f, "not found: {resource}"),
            ErrorKind::Validation { field, value } => {
                write!(f, "invalid {field}: {value}")
            }
            ErrorKind::Parse { field, raw_value } => {
                write!(f, "cannot parse {field} from {raw_value:?}")
            }
            ErrorKind::DataConflict { expected, actual } => {
                write!(f, "conflict: expected {expected}, found {actual}")
            }
            ErrorKind::Configuration { message } => write!(f, "configuration error: {message}"),
        }
    }
}

/// A categorized failure: an [`ErrorKind`] tagged with the module it
/// originated from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{origin}] {kind}")]
pub struct MirrorError {
    origin: &'static str,
    kind: ErrorKind,
}

impl MirrorError {
    /// Create a network error.
    #[inline]
    pub fn network(origin: &'static str, message: impl Into<String>) -> Self {
        Self {
            origin,
            kind: ErrorKind::Network {
                message: message.into(),
            },
        }
    }

    /// Create a timeout error.
    #[inline]
    pub fn timeout(origin: &'static str, message: impl Into<String>) -> Self {
        Self {
            origin,
            kind: ErrorKind::Timeout {
                message: message.into(),
            },
        }
    }

    /// Create a rate limit error, optionally with the server-directed delay.
    #[inline]
    pub fn rate_limited(origin: &'static str, retry_after: Option<Duration>) -> Self {
        Self {
            origin,
            kind: ErrorKind::RateLimited { retry_after },
        }
    }

    /// Create an authentication error.
    #[inline]
    pub fn authentication(origin: &'static str) -> Self {
        Self {
            origin,
            kind: ErrorKind::AuthenticationFailed,
        }
    }

    /// Create a not found error.
    #[inline]
    pub fn not_found(origin: &'static str, resource: impl Into<String>) -> Self {
        Self {
            origin,
            kind: ErrorKind::NotFound {
                resource: resource.into(),
            },
        }
    }

    /// Create a validation error for a named field.
    #[inline]
    pub fn validation(
        origin: &'static str,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            origin,
            kind: ErrorKind::Validation {
                field: field.into(),
                value: value.into(),
            },
        }
    }

    /// Create a parse error for a named field.
    #[inline]
    pub fn parse(
        origin: &'static str,
        field: impl Into<String>,
        raw_value: impl Into<String>,
    ) -> Self {
        Self {
            origin,
            kind: ErrorKind::Parse {
                field: field.into(),
                raw_value: raw_value.into(),
            },
        }
    }

    /// Create a data conflict error.
    #[inline]
    pub fn conflict(
        origin: &'static str,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            origin,
            kind: ErrorKind::DataConflict {
                expected: expected.into(),
                actual: actual.into(),
            },
        }
    }

    /// Create a configuration error.
    #[inline]
    pub fn configuration(origin: &'static str, message: impl Into<String>) -> Self {
        Self {
            origin,
            kind: ErrorKind::Configuration {
                message: message.into(),
            },
        }
    }

    /// Classify an HTTP status into exactly one category.
    ///
    /// Statuses with no specific mapping fall back to `Network`, so every
    /// transport failure becomes exactly one taxonomy value.
    #[must_use]
    pub fn from_status(
        origin: &'static str,
        status: u16,
        detail: impl Into<String>,
        retry_after: Option<Duration>,
    ) -> Self {
        let detail = detail.into();
        let kind = match status {
            401 | 403 => ErrorKind::AuthenticationFailed,
            404 => ErrorKind::NotFound { resource: detail },
            408 => ErrorKind::Timeout { message: detail },
            429 => ErrorKind::RateLimited { retry_after },
            _ => ErrorKind::Network {
                message: format!("HTTP {status}: {detail}"),
            },
        };
        Self { origin, kind }
    }

    /// The failure category.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The module this error originated from.
    #[must_use]
    pub fn origin(&self) -> &'static str {
        self.origin
    }

    /// Stable discriminant tag of the category.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    /// Whether retrying can plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// Result type alias for operations that fail with a categorized error.
pub type Result<T> = std::result::Result<T, MirrorError>;
