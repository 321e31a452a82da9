//! Config types for spec construction.
//!
//! These types mirror [`FieldSpec`] but are serde-deserializable, so
//! validation and filter specs can live in JSON or YAML files.
//!
//! # Relationship to runtime types
//!
//! | Config type | Runtime type | Built by |
//! |-------------|-------------|----------|
//! | [`SpecConfig<FailAction>`] | [`ValidationSpec`] | [`SpecConfig::build_validation`] |
//! | [`SpecConfig<KeepAction>`] | [`FilterSpec`] | [`SpecConfig::build_filter`] |
//! | [`RuleConfig`] | [`FieldRule`] | [`SpecConfig::build`] |
//!
//! # Format
//!
//! ```yaml
//! default:
//!   predicate: invalid
//! fields:
//!   email:
//!     predicate:
//!       not:
//!         matches: "^[^@]+@[^@]+$"
//!     action:
//!       log: email is malformed
//! ```
//!
//! All limits are checked when the spec is built, never during evaluation.

use crate::{
    bypass_value, is_valid, is_valid_with, FieldRule, FieldSpec, FilterSpec, MatcherError,
    ValidationSpec, Value, MAX_DEPTH, MAX_PATTERN_LENGTH, MAX_PREDICATES_PER_COMPOUND,
    MAX_REGEX_PATTERN_LENGTH,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Field name used in log events emitted by the default rule.
const DEFAULT_FIELD: &str = "*";

/// Configuration for a [`FieldSpec`].
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "A: Deserialize<'de> + Default"))]
pub struct SpecConfig<A> {
    /// Rule for every field without an entry in `fields`.
    pub default: RuleConfig<A>,

    /// Per-field overrides.
    #[serde(default)]
    pub fields: BTreeMap<String, RuleConfig<A>>,
}

/// Configuration for a [`FieldRule`].
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "A: Deserialize<'de> + Default"))]
pub struct RuleConfig<A> {
    /// When the rule fires.
    pub predicate: PredicateConfig,

    /// What the rule does when it fires.
    #[serde(default)]
    pub action: A,
}

/// Configuration for a field predicate.
///
/// Externally tagged:
///
/// ```yaml
/// predicate: invalid
/// predicate: { equals: "admin" }
/// predicate: { any: [absent, { matches: "^\\s*$" }] }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateConfig {
    /// The value is valid (strict).
    Valid,
    /// The value is not valid (strict).
    Invalid,
    /// The value is present: valid under `required = false`.
    Present,
    /// The value is absent: not valid under `required = false`.
    Absent,
    /// The value equals the given JSON value.
    Equals(serde_json::Value),
    /// The value is a string matching the given regex.
    Matches(String),
    /// Inverts the inner predicate.
    Not(Box<PredicateConfig>),
    /// Any child fires. An empty list never fires.
    Any(Vec<PredicateConfig>),
    /// All children fire. An empty list always fires.
    All(Vec<PredicateConfig>),
}

/// Failure action for validation specs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailAction {
    /// Fail silently.
    #[default]
    Fail,
    /// Emit a `warn` event with the message, then fail.
    Log(String),
}

/// Keep action for filter specs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepAction {
    /// Keep the value unchanged.
    #[default]
    Keep,
    /// Keep strings with surrounding whitespace removed; other values unchanged.
    Trim,
    /// Keep the field but replace its value.
    Replace(serde_json::Value),
}

/// An action config that compiles into a field action.
pub trait ActionConfig {
    /// What the compiled action returns.
    type Output: 'static;

    /// Compile into an action. `field` names the field in log events.
    fn compile(&self, field: &str) -> Box<dyn Fn(&Value) -> Self::Output + Send + Sync>;
}

impl ActionConfig for FailAction {
    type Output = bool;

    fn compile(&self, field: &str) -> Box<dyn Fn(&Value) -> bool + Send + Sync> {
        match self {
            Self::Fail => Box::new(|_: &Value| false),
            Self::Log(message) => {
                let field = field.to_owned();
                let message = message.clone();
                Box::new(move |value: &Value| {
                    warn!(field = %field, kind = value.type_name(), "{message}");
                    false
                })
            }
        }
    }
}

impl ActionConfig for KeepAction {
    type Output = Value;

    fn compile(&self, _field: &str) -> Box<dyn Fn(&Value) -> Value + Send + Sync> {
        match self {
            Self::Keep => Box::new(bypass_value),
            Self::Trim => Box::new(|value: &Value| match value.as_str() {
                Some(text) => Value::from(text.trim()),
                None => value.clone(),
            }),
            Self::Replace(replacement) => {
                let replacement = Value::from(replacement.clone());
                Box::new(move |_: &Value| replacement.clone())
            }
        }
    }
}

impl<A> SpecConfig<A>
where
    A: DeserializeOwned + Default,
{
    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::InvalidConfig`] if the document does not parse.
    pub fn from_json(json: &str) -> Result<Self, MatcherError> {
        serde_json::from_str(json).map_err(invalid_config)
    }

    /// Parse a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::InvalidConfig`] if the document does not parse.
    pub fn from_yaml(yaml: &str) -> Result<Self, MatcherError> {
        // Through a JSON tree so enums read the same in both formats.
        let tree: serde_json::Value = serde_yaml::from_str(yaml).map_err(invalid_config)?;
        Self::from_value(tree)
    }

    /// Convert an already-parsed JSON tree.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::InvalidConfig`] if the tree has the wrong shape.
    pub fn from_value(tree: serde_json::Value) -> Result<Self, MatcherError> {
        serde_json::from_value(tree).map_err(invalid_config)
    }
}

impl<A: ActionConfig> SpecConfig<A> {
    /// Build the runtime spec.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern does not compile or a limit is exceeded.
    pub fn build(&self) -> Result<FieldSpec<A::Output>, MatcherError> {
        let mut spec = FieldSpec::new(build_rule(&self.default, DEFAULT_FIELD)?);
        for (field, rule) in &self.fields {
            spec = spec.with_field(field.as_str(), build_rule(rule, field)?);
        }
        Ok(spec)
    }
}

impl SpecConfig<FailAction> {
    /// Build a [`ValidationSpec`].
    ///
    /// # Errors
    ///
    /// See [`SpecConfig::build`].
    pub fn build_validation(&self) -> Result<ValidationSpec, MatcherError> {
        self.build()
    }
}

impl SpecConfig<KeepAction> {
    /// Build a [`FilterSpec`].
    ///
    /// # Errors
    ///
    /// See [`SpecConfig::build`].
    pub fn build_filter(&self) -> Result<FilterSpec, MatcherError> {
        self.build()
    }
}

fn build_rule<A: ActionConfig>(
    rule: &RuleConfig<A>,
    field: &str,
) -> Result<FieldRule<Value, A::Output>, MatcherError> {
    let predicate = CompiledPredicate::compile(&rule.predicate, 1)?;
    let action = rule.action.compile(field);
    Ok(FieldRule::new(move |value: &Value| predicate.test(value), action))
}

#[allow(clippy::needless_pass_by_value)]
fn invalid_config(err: impl std::fmt::Display) -> MatcherError {
    MatcherError::InvalidConfig {
        reason: err.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Compiled predicates
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
enum CompiledPredicate {
    Valid,
    Invalid,
    Present,
    Absent,
    Equals(Value),
    Matches(regex::Regex),
    Not(Box<CompiledPredicate>),
    Any(Vec<CompiledPredicate>),
    All(Vec<CompiledPredicate>),
}

impl CompiledPredicate {
    fn compile(config: &PredicateConfig, depth: usize) -> Result<Self, MatcherError> {
        if depth > MAX_DEPTH {
            return Err(MatcherError::DepthExceeded {
                depth,
                max: MAX_DEPTH,
            });
        }

        Ok(match config {
            PredicateConfig::Valid => Self::Valid,
            PredicateConfig::Invalid => Self::Invalid,
            PredicateConfig::Present => Self::Present,
            PredicateConfig::Absent => Self::Absent,
            PredicateConfig::Equals(expected) => {
                if let Some(text) = expected.as_str() {
                    check_length(text, MAX_PATTERN_LENGTH)?;
                }
                Self::Equals(Value::from(expected.clone()))
            }
            PredicateConfig::Matches(pattern) => {
                check_length(pattern, MAX_REGEX_PATTERN_LENGTH)?;
                let regex =
                    regex::Regex::new(pattern).map_err(|e| MatcherError::InvalidPattern {
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })?;
                Self::Matches(regex)
            }
            PredicateConfig::Not(inner) => Self::Not(Box::new(Self::compile(inner, depth + 1)?)),
            PredicateConfig::Any(children) => Self::Any(Self::compile_all(children, depth)?),
            PredicateConfig::All(children) => Self::All(Self::compile_all(children, depth)?),
        })
    }

    fn compile_all(children: &[PredicateConfig], depth: usize) -> Result<Vec<Self>, MatcherError> {
        if children.len() > MAX_PREDICATES_PER_COMPOUND {
            return Err(MatcherError::TooManyPredicates {
                count: children.len(),
                max: MAX_PREDICATES_PER_COMPOUND,
            });
        }
        children
            .iter()
            .map(|child| Self::compile(child, depth + 1))
            .collect()
    }

    fn test(&self, value: &Value) -> bool {
        match self {
            Self::Valid => is_valid(value),
            Self::Invalid => !is_valid(value),
            Self::Present => is_valid_with(value, false),
            Self::Absent => !is_valid_with(value, false),
            Self::Equals(expected) => match value {
                Value::Shared(shared) => *shared.read() == *expected,
                other => other == expected,
            },
            Self::Matches(regex) => value.as_str().is_some_and(|text| regex.is_match(text)),
            Self::Not(inner) => !inner.test(value),
            Self::Any(children) => children.iter().any(|child| child.test(value)),
            Self::All(children) => children.iter().all(|child| child.test(value)),
        }
    }
}

fn check_length(pattern: &str, max: usize) -> Result<(), MatcherError> {
    if pattern.len() > max {
        return Err(MatcherError::PatternTooLong {
            len: pattern.len(),
            max,
        });
    }
    Ok(())
}
