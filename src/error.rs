//! Crate error type.
//!
//! Two failure kinds exist, both raised at construction time and both fatal
//! to the operation that raised them. Everything else (no matching tier,
//! empty text, zero-width viewport) is defined policy, not an error.

use thiserror::Error;

use crate::dom::NodeId;

/// Errors raised while binding a controller to an element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The element already carries a live controller.
    ///
    /// Callers must use the existing one, reachable via
    /// [`clamp::controller_of`](crate::clamp::controller_of).
    #[error("node {0} already has a clamp controller, use clamp::controller_of to access it")]
    AlreadyClamped(NodeId),

    /// A reserved attribute is present but does not parse.
    ///
    /// A malformed declaration is a caller bug. It surfaces immediately and
    /// never falls back to default behavior.
    #[error(
        "invalid `{attribute}` attribute value {value:?}: {reason} \
         (see the lineclamp crate documentation for the expected format)"
    )]
    InvalidAttribute {
        /// The reserved attribute name that failed to parse.
        attribute: &'static str,
        /// The raw attribute value as declared on the element.
        value: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
