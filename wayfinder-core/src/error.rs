//! Error taxonomy shared by provider adapters and the fallback resolver.
//!
//! Adapters classify every failure into an [`ErrorKind`] at their boundary.
//! The resolver decides whether to retry, fall back, or abort purely from
//! that kind; messages are carried for diagnostics only.

use std::fmt;

use thiserror::Error;

/// Classification of a single provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorKind {
    /// The query was malformed. Never retried and never falls back.
    InvalidInput,
    /// The provider answered but had no match.
    NotFound,
    /// The provider signalled throttling.
    RateLimited,
    /// Network failure, timeout, server error or an unusable response.
    Unavailable,
}

impl ErrorKind {
    /// Whether the same provider may be asked again after this failure.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// Stable lower-case label used in logs and diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid input",
            Self::NotFound => "not found",
            Self::RateLimited => "rate limited",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure returned by a provider adapter.
///
/// # Examples
///
/// ```
/// use wayfinder_core::{ErrorKind, ProviderError};
///
/// let err = ProviderError::unavailable("HTTP 503 from https://example.com");
/// assert_eq!(err.kind(), ErrorKind::Unavailable);
/// assert!(err.kind().is_retryable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    kind: ErrorKind,
    message: String,
}

impl ProviderError {
    /// Build an error of the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The query was malformed.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    /// The provider had no match.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// The provider throttled the request.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    /// The provider could not be reached or answered unusably.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    /// Classification of this failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable detail.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The operation a resolver performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Operation {
    /// Place name to coordinate.
    Geocode,
    /// Coordinate pair to distance and duration.
    Route,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Geocode => "geocode",
            Self::Route => "route",
        })
    }
}

/// One entry of the diagnostic trail carried by
/// [`ResolveError::AllProvidersFailed`] and by a
/// [`Resolution`](crate::Resolution) answered after a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProviderFailure {
    /// Name of the provider, as declared in its [`ProviderSpec`](crate::ProviderSpec).
    pub provider: String,
    /// Classification of the final failure.
    pub kind: ErrorKind,
    /// Number of calls made to the provider. Zero when it was skipped.
    pub attempts: u32,
    /// Detail of the final failure.
    pub message: String,
}

impl ProviderFailure {
    /// Record the final error observed for `provider` after `attempts` calls.
    #[must_use]
    pub fn from_error(provider: impl Into<String>, error: &ProviderError, attempts: u32) -> Self {
        Self {
            provider: provider.into(),
            kind: error.kind(),
            attempts,
            message: error.message().to_owned(),
        }
    }

    /// Record a provider that was never called.
    #[must_use]
    pub fn skipped(provider: impl Into<String>, kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            kind,
            attempts: 0,
            message: reason.into(),
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} after {} attempt(s) ({})",
            self.provider, self.kind, self.attempts, self.message
        )
    }
}

/// Coarse summary of a terminal failure for user-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The query itself was malformed.
    InvalidInput,
    /// Every provider answered and none had a match.
    NotFound,
    /// At least one provider was unreachable, throttled or timed out.
    Unavailable,
    /// The caller abandoned the request.
    Cancelled,
}

/// Terminal errors returned by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The query was rejected before any provider was consulted, or a
    /// provider reported it as malformed.
    #[error("invalid {operation} query: {message}")]
    InvalidInput {
        /// Operation that rejected the query.
        operation: Operation,
        /// Why the query was rejected.
        message: String,
    },
    /// Every configured provider failed.
    #[error("all {operation} providers failed: {}", format_trail(.failures))]
    AllProvidersFailed {
        /// Operation that failed.
        operation: Operation,
        /// One entry per configured provider, in configured order.
        failures: Vec<ProviderFailure>,
    },
    /// The caller cancelled the resolution.
    #[error("{operation} resolution was cancelled")]
    Cancelled {
        /// Operation that was cancelled.
        operation: Operation,
    },
}

impl ResolveError {
    /// Operation the error belongs to.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::InvalidInput { operation, .. }
            | Self::AllProvidersFailed { operation, .. }
            | Self::Cancelled { operation } => *operation,
        }
    }

    /// Diagnostic trail, empty unless every provider failed.
    #[must_use]
    pub fn failures(&self) -> &[ProviderFailure] {
        match self {
            Self::AllProvidersFailed { failures, .. } => failures,
            Self::InvalidInput { .. } | Self::Cancelled { .. } => &[],
        }
    }

    /// Summarise the failure as "not found" versus "try again later".
    ///
    /// An empty provider list counts as unavailable: nothing could answer.
    ///
    /// # Examples
    ///
    /// ```
    /// use wayfinder_core::{ErrorKind, FailureOutcome, Operation, ProviderFailure, ResolveError};
    ///
    /// let err = ResolveError::AllProvidersFailed {
    ///     operation: Operation::Geocode,
    ///     failures: vec![
    ///         ProviderFailure::skipped("graphhopper", ErrorKind::NotFound, "no hits"),
    ///         ProviderFailure::skipped("nominatim", ErrorKind::NotFound, "no hits"),
    ///     ],
    /// };
    /// assert_eq!(err.outcome(), FailureOutcome::NotFound);
    /// ```
    #[must_use]
    pub fn outcome(&self) -> FailureOutcome {
        match self {
            Self::InvalidInput { .. } => FailureOutcome::InvalidInput,
            Self::Cancelled { .. } => FailureOutcome::Cancelled,
            Self::AllProvidersFailed { failures, .. } => {
                if !failures.is_empty() && failures.iter().all(|f| f.kind == ErrorKind::NotFound) {
                    FailureOutcome::NotFound
                } else {
                    FailureOutcome::Unavailable
                }
            }
        }
    }
}

fn format_trail(failures: &[ProviderFailure]) -> String {
    if failures.is_empty() {
        return "no providers configured".to_owned();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
