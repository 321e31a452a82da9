//! Validation engine — per-field predicates folded into one match chain.
//!
//! The payload's own fields become the cases of a single [`MatchChain`], in
//! payload order. The first field whose predicate fires decides the verdict
//! through its action; if none fires, the success callback decides.
//!
//! [`MatchChain`]: crate::MatchChain

use crate::trace::{FieldStep, ValidationTrace};
use crate::validity::valid_record;
use crate::{match_value, return_true, ValidationSpec, Value};

/// Validate `payload` against `spec`.
///
/// Returns `false` straight away when the payload is not a valid record
/// (an [`Object`](crate::Object) with at least one present field, or a
/// non-empty array keyed by index; either may sit behind a shared handle).
/// Otherwise returns the action result of the first field whose predicate
/// fires, or `on_success()` when none fires.
///
/// ```
/// use casewise::{validate, FieldRule, ValidationSpec, Value};
///
/// let spec = ValidationSpec::default()
///     .with_field(
///         "age",
///         FieldRule::new(|v: &Value| v.as_f64().map_or(true, |n| n < 0.0), |_: &Value| false),
///     );
///
/// let ok = Value::object([("name", Value::from("ada")), ("age", Value::from(36))]);
/// let bad = Value::object([("name", Value::from("ada")), ("age", Value::from(-1))]);
///
/// assert!(validate(&ok, &spec, || true));
/// assert!(!validate(&bad, &spec, || true));
/// ```
pub fn validate<S>(payload: &Value, spec: &ValidationSpec, on_success: S) -> bool
where
    S: FnOnce() -> bool,
{
    let Some(record) = valid_record(payload) else {
        return false;
    };

    record
        .iter()
        .fold(match_value(payload), |chain, (field, value)| {
            let rule = spec.rule_for(field);
            chain.case(|_| rule.test(value), |_| rule.apply(value))
        })
        .default(|_| on_success())
}

/// Validate with the default spec: every field must be valid.
pub fn validate_default(payload: &Value) -> bool {
    validate(payload, &ValidationSpec::default(), return_true)
}

/// Like [`validate`] with [`return_true`] on success, recording each
/// evaluated predicate.
pub fn validate_with_trace(payload: &Value, spec: &ValidationSpec) -> ValidationTrace {
    let Some(record) = valid_record(payload) else {
        return ValidationTrace::rejected();
    };

    let mut steps = Vec::with_capacity(record.len());
    let result = record
        .iter()
        .fold(match_value(payload), |chain, (field, value)| {
            let rule = spec.rule_for(field);
            chain.case(
                |_| {
                    let fired = rule.test(value);
                    steps.push(FieldStep {
                        field: field.to_owned(),
                        fired,
                    });
                    fired
                },
                |_| rule.apply(value),
            )
        })
        .default(|_| return_true());

    ValidationTrace {
        result,
        steps,
        payload_rejected: false,
    }
}
