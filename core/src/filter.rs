//! Filter engine — keep the fields whose predicate fires.

use crate::validity::valid_record;
use crate::{match_value, FilterSpec, Object, Value};

/// Project `payload` through `spec`.
///
/// Each own field runs a one-case chain: when its predicate fires, the field
/// is kept with whatever the action returns; otherwise it is dropped. Key
/// order follows the payload. An array payload is projected by index and
/// comes back as a record keyed `"0"`, `"1"`, ...
///
/// A payload that is not a valid record comes back unchanged (a clone, so a
/// shared handle still aliases the caller's value).
///
/// ```
/// use casewise::{filter_default, Value};
///
/// let payload = Value::object([
///     ("a", Value::from("x")),
///     ("b", Value::array(Vec::<Value>::new())),
/// ]);
/// assert_eq!(filter_default(&payload), Value::object([("a", "x")]));
///
/// assert_eq!(filter_default(&Value::Null), Value::Null);
/// ```
#[must_use]
pub fn filter(payload: &Value, spec: &FilterSpec) -> Value {
    let Some(record) = valid_record(payload) else {
        return payload.clone();
    };

    let kept: Object = record
        .iter()
        .filter_map(|(field, value)| {
            let rule = spec.rule_for(field);
            match_value(value)
                .case(|v| rule.test(v), |v| rule.apply(v))
                .end()
                .map(|kept| (field, kept))
        })
        .collect();

    Value::Object(kept)
}

/// Filter with the default spec: keep every valid field as it is.
#[must_use]
pub fn filter_default(payload: &Value) -> Value {
    filter(payload, &FilterSpec::default())
}
