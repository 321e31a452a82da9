//! Field rules and the specs built from them.
//!
//! A [`FieldRule`] is one `(predicate, action)` pair. A [`FieldSpec`] maps field
//! names to rules and always carries a default rule for every field without an
//! override, so there is no hidden fallback policy.

use crate::{is_valid, MatcherError, Value};
use std::fmt;
use std::sync::Arc;

type PredicateFn<V> = Arc<dyn Fn(&V) -> bool + Send + Sync>;
type ActionFn<V, R> = Arc<dyn Fn(&V) -> R + Send + Sync>;

/// A predicate paired with the action it triggers.
///
/// Both closures are reference-counted, so cloning a rule (or a whole spec)
/// is cheap and clones can be shared across threads.
pub struct FieldRule<V, R> {
    predicate: PredicateFn<V>,
    action: ActionFn<V, R>,
}

impl<V, R> FieldRule<V, R> {
    /// Create a rule.
    pub fn new<P, F>(predicate: P, action: F) -> Self
    where
        P: Fn(&V) -> bool + Send + Sync + 'static,
        F: Fn(&V) -> R + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            action: Arc::new(action),
        }
    }

    /// Create a rule whose action may be missing.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::MissingAction`] if `action` is `None`.
    pub fn try_new<P, F>(predicate: P, action: Option<F>) -> Result<Self, MatcherError>
    where
        P: Fn(&V) -> bool + Send + Sync + 'static,
        F: Fn(&V) -> R + Send + Sync + 'static,
    {
        action
            .map(|action| Self::new(predicate, action))
            .ok_or(MatcherError::MissingAction { position: 0 })
    }

    /// Apply the predicate.
    pub fn test(&self, value: &V) -> bool {
        (self.predicate)(value)
    }

    /// Apply the action.
    pub fn apply(&self, value: &V) -> R {
        (self.action)(value)
    }
}

impl<V, R> Clone for FieldRule<V, R> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
            action: Arc::clone(&self.action),
        }
    }
}

impl<V, R> fmt::Debug for FieldRule<V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule").finish_non_exhaustive()
    }
}

/// Field name → rule, with a required default.
///
/// Lookup is exact on the field name. Overrides keep the order they were
/// added in; adding a name twice replaces the earlier rule.
pub struct FieldSpec<R> {
    default: FieldRule<Value, R>,
    overrides: Vec<(String, FieldRule<Value, R>)>,
}

/// Spec for [`validate`](crate::validate): actions produce the verdict
/// returned when their predicate fires.
pub type ValidationSpec = FieldSpec<bool>;

/// Spec for [`filter`](crate::filter): actions produce the value kept for the
/// field.
pub type FilterSpec = FieldSpec<Value>;

impl<R> FieldSpec<R> {
    /// Create a spec with only a default rule.
    pub fn new(default: FieldRule<Value, R>) -> Self {
        Self {
            default,
            overrides: Vec::new(),
        }
    }

    /// Add or replace the rule for `field`.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, rule: FieldRule<Value, R>) -> Self {
        let field = field.into();
        match self.overrides.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => *existing = rule,
            None => self.overrides.push((field, rule)),
        }
        self
    }

    /// The rule that applies to `field`: its override, or the default.
    pub fn rule_for(&self, field: &str) -> &FieldRule<Value, R> {
        self.overrides
            .iter()
            .find(|(name, _)| name == field)
            .map_or(&self.default, |(_, rule)| rule)
    }

    /// The default rule.
    pub fn default_rule(&self) -> &FieldRule<Value, R> {
        &self.default
    }

    /// Names with an explicit override, in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.overrides.iter().map(|(name, _)| name.as_str())
    }
}

impl<R> Clone for FieldSpec<R> {
    fn clone(&self) -> Self {
        Self {
            default: self.default.clone(),
            overrides: self.overrides.clone(),
        }
    }
}

impl<R> fmt::Debug for FieldSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("fields", &self.fields().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Fail on any field that is not valid.
impl Default for ValidationSpec {
    fn default() -> Self {
        Self::new(FieldRule::new(|v: &Value| !is_valid(v), return_false))
    }
}

/// Keep every valid field unchanged.
impl Default for FilterSpec {
    fn default() -> Self {
        Self::new(FieldRule::new(is_valid, bypass_value))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Stock actions
// ═══════════════════════════════════════════════════════════════════════════════

/// Identity action: keep the value as it is.
#[must_use]
pub fn bypass_value(value: &Value) -> Value {
    value.clone()
}

/// Failure action for validation specs.
#[must_use]
pub fn return_false(_value: &Value) -> bool {
    false
}

/// Success callback for [`validate`](crate::validate).
#[must_use]
pub fn return_true() -> bool {
    true
}
