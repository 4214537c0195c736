use std::fmt;

use http::Method;

/// Route registration error
///
/// Returned by [`Router::register_route`](super::Router::register_route) and the
/// group builders. Every variant is a programming error in the route table, so
/// callers are expected to abort startup rather than retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The pattern is not a usable absolute path
    ///
    /// Empty patterns, patterns without a leading `/` and patterns containing
    /// `//` are rejected.
    InvalidPath {
        /// The offending pattern
        pattern: String,
        /// What is wrong with it
        reason: &'static str,
    },
    /// A dynamic segment could not be parsed or its expression failed to compile
    MalformedPattern {
        /// The full pattern being registered
        pattern: String,
        /// The segment that failed to parse
        segment: String,
        /// Parser or regex compiler message
        reason: String,
    },
    /// The pattern collides with a route or sibling segment already in the tree
    RegistrationConflict {
        /// HTTP method of the route being registered
        method: Method,
        /// The full pattern being registered
        pattern: String,
        /// Description of the collision
        reason: String,
    },
}

impl RouteError {
    /// The pattern that triggered the error
    #[must_use]
    pub fn pattern(&self) -> &str {
        match self {
            RouteError::InvalidPath { pattern, .. }
            | RouteError::MalformedPattern { pattern, .. }
            | RouteError::RegistrationConflict { pattern, .. } => pattern,
        }
    }

    /// Short machine-readable kind, used as a structured log field
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RouteError::InvalidPath { .. } => "invalid_path",
            RouteError::MalformedPattern { .. } => "malformed_pattern",
            RouteError::RegistrationConflict { .. } => "registration_conflict",
        }
    }

    pub(crate) fn invalid(pattern: &str, reason: &'static str) -> Self {
        RouteError::InvalidPath {
            pattern: pattern.to_string(),
            reason,
        }
    }

    pub(crate) fn malformed(pattern: &str, segment: &str, reason: impl Into<String>) -> Self {
        RouteError::MalformedPattern {
            pattern: pattern.to_string(),
            segment: segment.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn conflict(method: &Method, pattern: &str, reason: impl Into<String>) -> Self {
        RouteError::RegistrationConflict {
            method: method.clone(),
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::InvalidPath { pattern, reason } => {
                write!(f, "invalid route path '{}': {}", pattern, reason)
            }
            RouteError::MalformedPattern {
                pattern,
                segment,
                reason,
            } => {
                write!(
                    f,
                    "malformed segment '{}' in route '{}': {}",
                    segment, pattern, reason
                )
            }
            RouteError::RegistrationConflict {
                method,
                pattern,
                reason,
            } => {
                write!(
                    f,
                    "route conflict for {} {}: {}",
                    method, pattern, reason
                )
            }
        }
    }
}

impl std::error::Error for RouteError {}
