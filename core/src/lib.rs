//! casewise - declarative control-flow primitives for application code
//!
//! Small building blocks that replace hand-written branching and guard code:
//!
//! - [`match_value`] / [`MatchChain`] — first-match-wins alternative to `if`/`else if`
//! - [`is_valid`] — does a [`Value`] carry meaningful content? (cycle-safe)
//! - [`validate`] / [`filter`] — per-field rule engines over records, built on the two above
//! - [`guard`] / [`ConcurrentTask`] — single-flight execution of an async task per [`LockCell`]
//! - [`delay`] — a cancellable timer with a tri-state outcome
//! - [`record_time`] — timing wrapper that logs through `tracing`
//!
//! # Key Design Insights
//!
//! 1. **One owner per chain**: every [`MatchChain`] method takes `self`, so "at most one
//!    action runs" holds by construction.
//!
//! 2. **Specs carry their fallback**: a [`FieldSpec`] cannot be built without a default
//!    rule. There is no module-level policy to forget about.
//!
//! 3. **Data problems are not errors**: [`validate`] answers `false` and [`filter`]
//!    passes the payload through. Only construction mistakes return [`MatcherError`].
//!
//! # Example
//!
//! ```
//! use casewise::prelude::*;
//!
//! let signup = Value::object([
//!     ("name", Value::from("ada")),
//!     ("email", Value::from("ada@example.com")),
//!     ("nickname", Value::from("")),
//! ]);
//!
//! // The default spec fails on any field that is not valid.
//! assert!(!validate_default(&signup));
//!
//! // Filtering drops those fields instead.
//! let cleaned = filter_default(&signup);
//! assert!(validate_default(&cleaned));
//!
//! let greeting = match_value(cleaned.as_object().map_or(0, Object::len))
//!     .case(|n| *n == 0, |_| "nothing to say")
//!     .default(|n| if n > 1 { "hello, all fields" } else { "hello, one field" });
//! assert_eq!(greeting, "hello, all fields");
//! ```
//!
//! # Features
//!
//! - `serde` — conversions between [`Value`] and `serde_json::Value`; serde support for
//!   [`GuardConfig`]
//! - `config` — JSON/YAML spec files via [`SpecConfig`]

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod delay;
mod error;
mod field_rule;
mod filter;
mod guard;
mod matcher;
mod timing;
mod trace;
mod validate;
mod validity;
mod value;

#[cfg(feature = "config")]
mod config;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use error::MatcherError;
pub use field_rule::{
    bypass_value, return_false, return_true, FieldRule, FieldSpec, FilterSpec, ValidationSpec,
};
pub use matcher::{match_value, MatchChain};
pub use value::{Callable, CustomValue, Object, SharedValue, Value};

// Engines
pub use filter::{filter, filter_default};
pub use validate::{validate, validate_default, validate_with_trace};
pub use validity::{is_valid, is_valid_with};

// Async primitives
pub use delay::{delay, sleep, DelayHandle, RejectWith, Rejection, TimerToken};
pub use guard::{guard, ConcurrentTask, GuardConfig, GuardOptions, LockCell, TaskOutcome};
pub use timing::{record_time, Recorded, Timed};

// Trace types
pub use trace::{FieldStep, ValidationTrace};

// Config (feature-gated)
#[cfg(feature = "config")]
pub use config::{
    ActionConfig, FailAction, KeepAction, PredicateConfig, RuleConfig, SpecConfig,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use casewise::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Async primitives
        delay,
        filter,
        filter_default,
        guard,
        // Validity
        is_valid,
        is_valid_with,
        // Matcher
        match_value,
        record_time,
        validate,
        validate_default,
        DelayHandle,
        FieldRule,
        FilterSpec,
        GuardOptions,
        LockCell,
        MatchChain,
        // Errors
        MatcherError,
        Object,
        RejectWith,
        Rejection,
        SharedValue,
        TaskOutcome,
        ValidationSpec,
        // Core types
        Value,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum allowed nesting depth for configured predicates.
///
/// Protects against stack overflow from deeply nested `not`/`any`/`all`.
pub const MAX_DEPTH: usize = 32;

/// Maximum number of children in a single `any` or `all` predicate.
pub const MAX_PREDICATES_PER_COMPOUND: usize = 256;

/// Maximum length for literal string patterns (`equals`).
pub const MAX_PATTERN_LENGTH: usize = 8192;

/// Maximum length for regex patterns (`matches`).
///
/// Shorter limit than [`MAX_PATTERN_LENGTH`] because regex compilation cost
/// grows faster than literal comparison.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4096;
