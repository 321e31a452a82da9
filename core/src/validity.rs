//! Validity checker — does a value carry meaningful content?
//!
//! A pure recursive predicate. The only state is a transient set of visited
//! [`SharedValue`](crate::SharedValue) identities, created fresh for every
//! top-level call and threaded through the recursion.

use crate::{Object, Value};
use std::collections::HashSet;

/// Returns `true` if `value` carries meaningful content (strict mode).
///
/// Shorthand for [`is_valid_with(value, true)`](is_valid_with).
///
/// ```
/// use casewise::{is_valid, Value};
///
/// assert!(!is_valid(&Value::Null));
/// assert!(!is_valid(&Value::from("   ")));
/// assert!(!is_valid(&Value::object([("a", Value::Null)])));
/// assert!(is_valid(&Value::object([("a", "")])));
/// ```
#[must_use]
pub fn is_valid(value: &Value) -> bool {
    is_valid_with(value, true)
}

/// Returns `true` if `value` carries meaningful content.
///
/// With `required = false`, presence is enough: empty strings and empty
/// composites count as valid, only `Undefined`/`Null`/`NaN` and custom
/// values are rejected.
///
/// # Rules
///
/// | Kind | Valid when |
/// |------|------------|
/// | `Undefined`, `Null` | never |
/// | `Shared` already visited | always (breaks cycles) |
/// | `Function`, `Bool`, `Symbol` | always |
/// | `Number` | not `NaN` |
/// | `String`, `BigInt` | `!required`, or non-blank text |
/// | `Array` | `!required`, or non-empty |
/// | `Set`, `Map` | `!required`, or non-empty |
/// | `Object` | `!required`, or some field is valid under `required = false` |
/// | `Shared` | the referenced value is valid |
/// | `Custom` | never |
#[must_use]
pub fn is_valid_with(value: &Value, required: bool) -> bool {
    check(value, required, &mut HashSet::new())
}

fn check(value: &Value, required: bool, seen: &mut HashSet<usize>) -> bool {
    match value {
        Value::Undefined | Value::Null => false,
        Value::Function(_) | Value::Bool(_) | Value::Symbol(_) => true,
        Value::Number(n) => !n.is_nan(),
        Value::String(s) => !required || !s.trim().is_empty(),
        // The decimal form of an integer is never blank.
        Value::BigInt(_) => true,
        Value::Shared(shared) => {
            let inner = shared.read();
            // Only composites can lead back to this cell.
            if is_composite(&inner) && !seen.insert(shared.identity()) {
                return true;
            }
            check(&inner, required, seen)
        }
        Value::Array(items) | Value::Set(items) => !required || !items.is_empty(),
        Value::Map(entries) => !required || !entries.is_empty(),
        Value::Object(object) => !required || any_field_present(object, seen),
        Value::Custom(_) => false,
    }
}

fn is_composite(value: &Value) -> bool {
    matches!(
        value,
        Value::Array(_) | Value::Set(_) | Value::Map(_) | Value::Object(_) | Value::Shared(_)
    )
}

/// Short-circuits on the first field that is present.
fn any_field_present(object: &Object, seen: &mut HashSet<usize>) -> bool {
    object.values().any(|field| check(field, false, seen))
}

/// The engines' top-level guard: a valid, keyed payload.
///
/// Returns a snapshot of the payload's own fields, or `None` when the payload
/// should be rejected (validate) or passed through untouched (filter). Arrays
/// are records keyed by index (`"0"`, `"1"`, ...). One `Shared` handle is
/// looked through.
pub(crate) fn valid_record(payload: &Value) -> Option<Object> {
    if !is_valid(payload) {
        return None;
    }
    match payload {
        Value::Shared(shared) => own_fields(&shared.read()),
        other => own_fields(other),
    }
}

fn own_fields(value: &Value) -> Option<Object> {
    match value {
        Value::Object(object) => Some(object.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item.clone()))
                .collect(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SharedValue;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Opaque;

    impl crate::CustomValue for Opaque {
        fn custom_type_name(&self) -> &'static str {
            "opaque"
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn self_referencing(extra: Option<(&str, Value)>) -> SharedValue {
        let cell = SharedValue::new(Object::new());
        if let Value::Object(record) = &mut *cell.write() {
            record.insert("me", Value::Shared(cell.clone()));
            if let Some((key, value)) = extra {
                record.insert(key, value);
            }
        }
        cell
    }

    #[test]
    fn test_empty_object_is_invalid() {
        assert!(!is_valid(&Value::Object(Object::new())));
    }

    #[test]
    fn test_empty_array_is_invalid() {
        assert!(!is_valid(&Value::Array(vec![])));
    }

    #[test]
    fn test_blank_string_is_invalid() {
        assert!(!is_valid(&Value::from("")));
        assert!(!is_valid(&Value::from(" \t\n")));
        assert!(is_valid(&Value::from(" x ")));
    }

    #[test]
    fn test_absent_fields_make_object_invalid() {
        assert!(!is_valid(&Value::object([("a", Value::Undefined)])));
        assert!(!is_valid(&Value::object([("a", Value::Null)])));
        assert!(!is_valid(&Value::object([
            ("a", Value::Null),
            ("b", Value::Undefined),
            ("c", Value::Null),
        ])));
    }

    #[test]
    fn test_present_empty_string_field_makes_object_valid() {
        assert!(is_valid(&Value::object([("a", "")])));
        assert!(is_valid(&Value::object([
            ("a", Value::Null),
            ("b", Value::Undefined),
            ("c", Value::from("")),
        ])));
    }

    #[test]
    fn test_nested_empty_object_counts_as_present() {
        assert!(is_valid(&Value::object([("a", Value::Object(Object::new()))])));
    }

    #[test]
    fn test_opaque_kinds_are_valid() {
        assert!(is_valid(&Value::function(|_| Value::from(""))));
        assert!(is_valid(&Value::Bool(false)));
        assert!(is_valid(&Value::symbol("token")));
    }

    #[test]
    fn test_numbers() {
        assert!(is_valid(&Value::Number(0.0)));
        assert!(is_valid(&Value::Number(f64::INFINITY)));
        assert!(!is_valid(&Value::Number(f64::NAN)));
        assert!(!is_valid_with(&Value::Number(f64::NAN), false));
        assert!(is_valid(&Value::BigInt(0)));
    }

    #[test]
    fn test_sets_and_maps_use_size() {
        assert!(!is_valid(&Value::set(Vec::<Value>::new())));
        assert!(is_valid(&Value::set([Value::Null])));
        assert!(!is_valid(&Value::map(Vec::<(Value, Value)>::new())));
        assert!(is_valid(&Value::map([("k", Value::Null)])));
    }

    #[test]
    fn test_lenient_mode_accepts_presence() {
        assert!(is_valid_with(&Value::from(""), false));
        assert!(is_valid_with(&Value::Array(vec![]), false));
        assert!(is_valid_with(&Value::Object(Object::new()), false));
        assert!(!is_valid_with(&Value::Null, false));
        assert!(!is_valid_with(&Value::Undefined, false));
    }

    #[test]
    fn test_custom_values_are_invalid() {
        let custom = Value::Custom(Arc::new(Opaque));
        assert!(!is_valid(&custom));
        assert!(!is_valid_with(&custom, false));
    }

    #[test]
    fn test_self_reference_terminates() {
        // The back-reference is a present field, so the record is valid.
        let cell = self_referencing(None);
        assert!(is_valid(&Value::Shared(cell)));
    }

    #[test]
    fn test_self_reference_with_absent_sibling() {
        let cell = self_referencing(Some(("gone", Value::Null)));
        assert!(is_valid(&Value::Shared(cell)));
    }

    #[test]
    fn test_shared_null_is_invalid() {
        assert!(!is_valid(&Value::shared(Value::Null)));
        assert!(!is_valid(&Value::shared(Object::new())));
        assert!(is_valid(&Value::shared(Value::object([("a", 1)]))));
    }

    #[test]
    fn test_shared_alias_visited_twice() {
        let empty = SharedValue::new(Object::new());
        let payload = Value::object([
            ("first", Value::Shared(empty.clone())),
            ("second", Value::Shared(empty)),
        ]);
        assert!(is_valid(&payload));
    }

    #[test]
    fn test_seen_set_is_per_call() {
        let cell = SharedValue::new(Value::object([("a", Value::Null)]));
        let value = Value::Shared(cell);
        // A stale visited-set would turn the second call into `true`.
        assert!(!is_valid(&value));
        assert!(!is_valid(&value));
    }

    #[test]
    fn test_valid_record_guard() {
        assert!(valid_record(&Value::Null).is_none());
        assert!(valid_record(&Value::Object(Object::new())).is_none());
        assert!(valid_record(&Value::from("text")).is_none());
        assert!(valid_record(&Value::set([1])).is_none());
        assert_eq!(
            valid_record(&Value::object([("a", "x")])).map(|o| o.len()),
            Some(1)
        );
    }

    #[test]
    fn test_valid_record_keys_arrays_by_index() {
        let record = valid_record(&Value::array(["a", "b"])).expect("array record");
        assert_eq!(record.keys().collect::<Vec<_>>(), ["0", "1"]);
        assert_eq!(record.get("1"), Some(&Value::from("b")));

        let shared = Value::shared(Value::array(["a"]));
        assert_eq!(valid_record(&shared).map(|o| o.len()), Some(1));

        assert!(valid_record(&Value::Array(vec![])).is_none());
    }

    #[test]
    fn test_aliased_shared_null_is_not_visited() {
        let cell = SharedValue::new(Value::Null);
        let payload = Value::object([
            ("a", Value::Shared(cell.clone())),
            ("b", Value::Shared(cell)),
        ]);
        assert!(!is_valid(&payload));

        let gone = SharedValue::new(Value::Undefined);
        let payload = Value::object([
            ("a", Value::Shared(gone.clone())),
            ("b", Value::Shared(gone)),
        ]);
        assert!(!is_valid(&payload));
    }
}
