//! Matcher — a chainable, first-match-wins alternative to `if`/`else if`.
//!
//! [`match_value`] starts a [`MatchChain`] over a subject. Each [`case`] pairs a
//! predicate with an action; the first predicate that returns `true` runs its
//! action, and every later case becomes a no-op. The chain ends with
//! [`default`] (always yields a result) or [`end`] (yields `None` on no match).
//!
//! [`case`]: MatchChain::case
//! [`default`]: MatchChain::default
//! [`end`]: MatchChain::end

use crate::MatcherError;
use std::fmt;

/// Start a match chain over `value`.
///
/// ```
/// use casewise::match_value;
///
/// let label = match_value(42)
///     .case(|n| *n < 0, |_| "negative")
///     .case(|n| *n == 0, |_| "zero")
///     .default(|_| "positive");
///
/// assert_eq!(label, "positive");
/// ```
pub fn match_value<V, R>(value: V) -> MatchChain<V, R> {
    MatchChain {
        value,
        result: None,
        position: 0,
    }
}

/// A single-owner match chain.
///
/// Every builder method takes `self` by value, so a chain is consumed by its
/// terminal call and cannot be resumed afterwards.
///
/// # INV: at most one action runs
///
/// `result` goes from `None` to `Some` exactly once, when the first predicate
/// fires (or the default runs). After that, neither predicates nor actions of
/// later cases are evaluated.
#[must_use = "a match chain does nothing until it is terminated with `default` or `end`"]
pub struct MatchChain<V, R> {
    value: V,
    result: Option<R>,
    /// Number of case/default calls seen so far, used in error reports.
    position: usize,
}

impl<V, R> MatchChain<V, R> {
    /// Add a case.
    ///
    /// If the chain is still unmatched, `predicate` is applied to the subject;
    /// when it returns `true`, `action` computes the result and the chain
    /// becomes matched. Otherwise neither closure is called.
    pub fn case<P, F>(mut self, predicate: P, action: F) -> Self
    where
        P: FnOnce(&V) -> bool,
        F: FnOnce(&V) -> R,
    {
        self.position += 1;
        if self.result.is_none() && predicate(&self.value) {
            self.result = Some(action(&self.value));
        }
        self
    }

    /// Add a case whose action may be missing.
    ///
    /// The action check happens unconditionally, even when an earlier case
    /// already matched.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::MissingAction`] if `action` is `None`.
    pub fn try_case<P, F>(self, predicate: P, action: Option<F>) -> Result<Self, MatcherError>
    where
        P: FnOnce(&V) -> bool,
        F: FnOnce(&V) -> R,
    {
        match action {
            Some(action) => Ok(self.case(predicate, action)),
            None => Err(MatcherError::MissingAction {
                position: self.position,
            }),
        }
    }

    /// Terminate the chain with a fallback.
    ///
    /// Returns the matched case's result, or runs `action` on the subject.
    pub fn default<F>(self, action: F) -> R
    where
        F: FnOnce(V) -> R,
    {
        match self.result {
            Some(result) => result,
            None => action(self.value),
        }
    }

    /// Terminate the chain with a fallback that may be missing.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::MissingAction`] if `action` is `None`, whether or
    /// not an earlier case matched.
    pub fn try_default<F>(self, action: Option<F>) -> Result<R, MatcherError>
    where
        F: FnOnce(V) -> R,
    {
        match action {
            Some(action) => Ok(self.default(action)),
            None => Err(MatcherError::MissingAction {
                position: self.position,
            }),
        }
    }

    /// Terminate the chain without a fallback.
    ///
    /// Returns `None` if no case matched.
    pub fn end(self) -> Option<R> {
        self.result
    }

    /// Returns `true` once a case has fired.
    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.result.is_some()
    }

    /// The subject this chain matches against.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }
}

impl<V: fmt::Debug, R> fmt::Debug for MatchChain<V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchChain")
            .field("value", &self.value)
            .field("matched", &self.is_matched())
            .field("cases", &self.position)
            .finish()
    }
}
