//! Errors from matcher construction and spec loading.
//!
//! These are caught when a chain or spec is built, never while a payload is
//! being evaluated. Validation and filtering express data problems as `false`
//! or pass-through, not as errors.

/// Errors from matcher construction and configuration loading.
///
/// Every variant signals a programming or configuration mistake by the caller.
/// Fix the chain or the config and rebuild.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatcherError {
    /// A case or default was given without an action.
    #[error("case #{position} has no action; every case and default needs one")]
    MissingAction {
        /// Zero-based position of the offending call in its chain.
        position: usize,
    },

    /// A `matches` pattern failed to compile.
    #[error("invalid pattern \"{pattern}\": {reason}")]
    InvalidPattern {
        /// The pattern that failed to compile.
        pattern: String,
        /// The underlying compiler message.
        reason: String,
    },

    /// A pattern exceeds [`MAX_PATTERN_LENGTH`](crate::MAX_PATTERN_LENGTH) (literals)
    /// or [`MAX_REGEX_PATTERN_LENGTH`](crate::MAX_REGEX_PATTERN_LENGTH) (regexes).
    #[error("pattern length is {len}, but maximum allowed is {max}")]
    PatternTooLong {
        /// Actual length of the pattern.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// Predicate nesting exceeds [`MAX_DEPTH`](crate::MAX_DEPTH).
    #[error("predicate nesting depth is {depth}, but maximum allowed is {max}")]
    DepthExceeded {
        /// Actual depth of the predicate.
        depth: usize,
        /// Maximum allowed depth.
        max: usize,
    },

    /// Too many children in an `any` or `all` predicate.
    #[error("compound predicate has {count} children, but maximum allowed is {max}")]
    TooManyPredicates {
        /// Actual count of children.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// Spec deserialization failed.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// The underlying parser message.
        reason: String,
    },
}
