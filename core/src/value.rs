//! `Value` — the dynamic data model inspected by the validity checker and engines.
//!
//! Payloads handed to [`validate`](crate::validate) and [`filter`](crate::filter)
//! are loosely shaped records: strings, numbers, nested lists, nested records,
//! opaque handles. `Value` erases all of them into one enum so the engines can
//! stay non-generic over the payload shape.
//!
//! # Identity via `Shared`
//!
//! Owned variants form a tree and can never alias. When a payload needs
//! reference semantics (the same record reachable twice, or a record that
//! points back at itself) wrap it in [`SharedValue`]. The validity checker
//! tracks `Shared` identities to break cycles.
//!
//! # Extensibility via `Custom`
//!
//! Domain types that are none of the built-in kinds implement [`CustomValue`]
//! and travel as `Value::Custom(Arc::new(your_type))`. The validity checker
//! classifies them as "anything else" and rejects them.

use std::any::Any;
use std::fmt::{self, Debug};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Extension trait for payload values that are not one of the built-in kinds.
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use std::sync::Arc;
/// use casewise::{CustomValue, Value};
///
/// #[derive(Debug)]
/// struct Money { cents: i64 }
///
/// impl CustomValue for Money {
///     fn custom_type_name(&self) -> &'static str { "money" }
///     fn as_any(&self) -> &dyn Any { self }
/// }
///
/// let value = Value::Custom(Arc::new(Money { cents: 1250 }));
/// assert_eq!(value.type_name(), "money");
/// ```
pub trait CustomValue: Send + Sync + Debug {
    /// Human-readable type identifier, `snake_case` by convention.
    fn custom_type_name(&self) -> &'static str;

    /// Returns `self` as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// Opaque callable carried inside a payload.
///
/// The engines never invoke it; it exists so that payloads holding callbacks
/// can still be inspected (functions are always "meaningful").
#[derive(Clone)]
pub struct Callable(Arc<dyn Fn(&Value) -> Value + Send + Sync>);

impl Callable {
    /// Wrap a closure.
    pub fn new(f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Invoke the wrapped closure.
    pub fn call(&self, arg: &Value) -> Value {
        (self.0)(arg)
    }
}

impl Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({:p})", Arc::as_ptr(&self.0).cast::<()>())
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A reference-counted, interior-mutable value with pointer identity.
///
/// Cloning a `SharedValue` aliases it. Equality is identity, never structure,
/// so comparing two cyclic graphs terminates.
///
/// ```
/// use casewise::{Object, SharedValue, Value};
///
/// let node = SharedValue::new(Object::new());
/// if let Value::Object(record) = &mut *node.write() {
///     record.insert("me", Value::Shared(node.clone()));
/// }
/// assert!(casewise::is_valid(&Value::Shared(node)));
/// ```
#[derive(Clone)]
pub struct SharedValue(Arc<RwLock<Value>>);

impl SharedValue {
    /// Create a new shared cell holding `value`.
    pub fn new(value: impl Into<Value>) -> Self {
        Self(Arc::new(RwLock::new(value.into())))
    }

    /// Borrow the current value. A poisoned lock is recovered, not propagated.
    pub fn read(&self) -> RwLockReadGuard<'_, Value> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutably borrow the current value.
    pub fn write(&self) -> RwLockWriteGuard<'_, Value> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the current value, returning the previous one.
    pub fn replace(&self, value: impl Into<Value>) -> Value {
        std::mem::replace(&mut *self.write(), value.into())
    }

    /// Returns `true` if both handles point at the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Stable identity of the cell, used for cycle detection.
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl Debug for SharedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the contents: a cycle would recurse forever.
        write!(f, "Shared({:#x})", self.identity())
    }
}

impl PartialEq for SharedValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// An insertion-ordered record of own keys.
///
/// Inserting a key that already exists replaces its value in place, keeping
/// the original position. Equality ignores key order.
#[derive(Debug, Clone, Default)]
pub struct Object {
    entries: Vec<(String, Value)>,
}

impl Object {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, returning the previous value for that key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Look up a field by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns `true` if the record has `key` as an own key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Own keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Field values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of own keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the record has no own keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut object = Self::new();
        for (k, v) in iter {
            object.insert(k, v);
        }
        object
    }
}

impl IntoIterator for Object {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// The erased value type every engine inspects.
///
/// # Variants
///
/// - `Undefined` / `Null` — absent data; never valid
/// - `Bool`, `Symbol`, `Function` — opaque kinds; always valid
/// - `Number`, `BigInt`, `String` — scalars
/// - `Array`, `Set`, `Map`, `Object` — owned composites
/// - `Shared` — composite with identity (enables aliasing and cycles)
/// - `Custom` — user extension, classified as "anything else"
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value at all (a missing field, an unset slot).
    #[default]
    Undefined,

    /// An explicit null.
    Null,

    /// Boolean.
    Bool(bool),

    /// Floating point number; `NaN` is representable and invalid.
    Number(f64),

    /// Integer beyond the exact range of `f64`.
    BigInt(i128),

    /// Text.
    String(String),

    /// Opaque unique token, identified by its allocation.
    Symbol(Arc<str>),

    /// Opaque callable.
    Function(Callable),

    /// Ordered sequence.
    Array(Vec<Value>),

    /// Unordered collection of members.
    Set(Vec<Value>),

    /// Keyed collection with arbitrary keys.
    Map(Vec<(Value, Value)>),

    /// Record of own keys.
    Object(Object),

    /// Shared composite with pointer identity.
    Shared(SharedValue),

    /// Domain-specific extension.
    Custom(Arc<dyn CustomValue>),
}

// Manual PartialEq: trait objects don't derive it, and Symbol/Custom compare by allocation.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::BigInt(a), Self::BigInt(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => Arc::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => a == b,
            (Self::Array(a), Self::Array(b)) | (Self::Set(a), Self::Set(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Shared(a), Self::Shared(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Build an `Object` value from `(key, value)` pairs.
    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Object(entries.into_iter().collect())
    }

    /// Build an `Array` value.
    pub fn array<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    /// Build a `Set` value. Duplicate members are dropped.
    pub fn set<V: Into<Value>>(members: impl IntoIterator<Item = V>) -> Self {
        let mut unique: Vec<Value> = Vec::new();
        for member in members {
            let member = member.into();
            if !unique.contains(&member) {
                unique.push(member);
            }
        }
        Self::Set(unique)
    }

    /// Build a `Map` value.
    pub fn map<K: Into<Value>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Wrap a value in a fresh [`SharedValue`].
    pub fn shared(value: impl Into<Value>) -> Self {
        Self::Shared(SharedValue::new(value))
    }

    /// Create a new unique symbol.
    pub fn symbol(description: &str) -> Self {
        Self::Symbol(Arc::from(description))
    }

    /// Wrap a closure as an opaque function value.
    pub fn function(f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        Self::Function(Callable::new(f))
    }

    /// Returns `true` for `Undefined`.
    #[inline]
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns `true` for `Undefined` or `Null`.
    #[inline]
    #[must_use]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// Returns `true` for an `Object`, directly or behind a `Shared` handle.
    #[must_use]
    pub fn is_object(&self) -> bool {
        match self {
            Self::Object(_) => true,
            Self::Shared(shared) => matches!(&*shared.read(), Self::Object(_)),
            _ => false,
        }
    }

    /// Try to get the value as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Try to get the value as a number.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as a boolean.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the value as an array slice.
    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Try to get the value as a record.
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Copy of the record behind this value, looking through one `Shared` handle.
    ///
    /// Iterating the copy holds no lock, so a predicate may inspect the same
    /// shared cell again.
    #[must_use]
    pub fn object_snapshot(&self) -> Option<Object> {
        match self {
            Self::Object(object) => Some(object.clone()),
            Self::Shared(shared) => shared.read().as_object().cloned(),
            _ => None,
        }
    }

    /// Returns a string describing the kind of this value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Function(_) => "function",
            Self::Array(_) => "array",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
            Self::Shared(_) => "shared",
            Self::Custom(c) => c.custom_type_name(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        integer(i128::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        integer(i128::from(n))
    }
}

impl From<i128> for Value {
    fn from(n: i128) -> Self {
        Self::BigInt(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Self::Object(object)
    }
}

impl From<SharedValue> for Value {
    fn from(shared: SharedValue) -> Self {
        Self::Shared(shared)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Undefined, Into::into)
    }
}

/// Largest integer magnitude `f64` represents exactly (2^53).
const MAX_SAFE_INTEGER: i128 = 1 << 53;

#[allow(clippy::cast_precision_loss)] // exact within the safe range
fn integer(n: i128) -> Value {
    if n.abs() <= MAX_SAFE_INTEGER {
        Value::Number(n as f64)
    } else {
        Value::BigInt(n)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSON interop (feature = "serde")
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "serde")]
mod json {
    use super::{integer, Object, Value, MAX_SAFE_INTEGER};
    use std::collections::HashSet;

    impl From<serde_json::Value> for Value {
        fn from(json: serde_json::Value) -> Self {
            match json {
                serde_json::Value::Null => Self::Null,
                serde_json::Value::Bool(b) => Self::Bool(b),
                serde_json::Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        integer(i128::from(i))
                    } else if let Some(u) = n.as_u64() {
                        integer(i128::from(u))
                    } else {
                        n.as_f64().map_or(Self::Null, Self::Number)
                    }
                }
                serde_json::Value::String(s) => Self::String(s),
                serde_json::Value::Array(items) => {
                    Self::Array(items.into_iter().map(Self::from).collect())
                }
                serde_json::Value::Object(map) => Self::Object(
                    map.into_iter()
                        .map(|(k, v)| (k, Self::from(v)))
                        .collect::<Object>(),
                ),
            }
        }
    }

    impl From<&Value> for serde_json::Value {
        fn from(value: &Value) -> Self {
            value.to_json()
        }
    }

    impl Value {
        /// Render as JSON.
        ///
        /// `Undefined` and opaque kinds become `null`, sets become arrays, maps
        /// become objects with stringified keys, and a `Shared` cell reached
        /// again through itself becomes `null`.
        #[must_use]
        pub fn to_json(&self) -> serde_json::Value {
            to_json(self, &mut HashSet::new())
        }
    }

    fn to_json(value: &Value, path: &mut HashSet<usize>) -> serde_json::Value {
        match value {
            Value::Undefined
            | Value::Null
            | Value::Symbol(_)
            | Value::Function(_)
            | Value::Custom(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number(*n),
            Value::BigInt(n) => i64::try_from(*n)
                .map(serde_json::Value::from)
                .or_else(|_| u64::try_from(*n).map(serde_json::Value::from))
                .unwrap_or_else(|_| serde_json::Value::String(n.to_string())),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) | Value::Set(items) => {
                serde_json::Value::Array(items.iter().map(|v| to_json(v, path)).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (map_key(k), to_json(v, path)))
                    .collect(),
            ),
            Value::Object(object) => serde_json::Value::Object(
                object
                    .iter()
                    .map(|(k, v)| (k.to_string(), to_json(v, path)))
                    .collect(),
            ),
            Value::Shared(shared) => {
                let id = shared.identity();
                if !path.insert(id) {
                    return serde_json::Value::Null;
                }
                let rendered = to_json(&shared.read(), path);
                path.remove(&id);
                rendered
            }
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn number(n: f64) -> serde_json::Value {
        if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER as f64 {
            serde_json::Value::from(n as i64)
        } else {
            serde_json::Number::from_f64(n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number)
        }
    }

    fn map_key(key: &Value) -> String {
        match key {
            Value::String(s) => s.clone(),
            other => match to_json(other, &mut HashSet::new()) {
                serde_json::Value::String(s) => s,
                json => json.to_string(),
            },
        }
    }
}
