#![forbid(unsafe_code)]

//! Plain data values and node identity.
//!
//! A [`Value`] is either a scalar (`Null`, `Bool`, `Number`, `String`) or a
//! shared handle to a structure ([`Object`] or [`Array`]). Handles have
//! reference semantics: cloning a `Value::Object` yields a second handle to
//! the same node, so graphs may share nodes and may contain cycles.
//!
//! # Equality
//!
//! [`Value::strict_eq`] is the change gate used by every tracked write:
//! handles compare by identity, scalars by value. `NaN` is never strictly
//! equal to itself, so writing `NaN` over `NaN` counts as a change.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::array::Array;
use crate::object::Object;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a structure node.
///
/// Assigned once when an [`Object`] or [`Array`] is created and never
/// reused. The builder keys its visited set on this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A plain data value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// Shared handle to a keyed structure.
    Object(Object),
    /// Shared handle to a sequence.
    Array(Array),
}

impl Value {
    /// Build an object value from key/value pairs, in order.
    ///
    /// Later duplicates overwrite earlier ones in place.
    pub fn object<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Object(Object::from_pairs(pairs))
    }

    /// Build an array value from elements.
    pub fn array<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::Array(Array::from_values(items))
    }

    /// Strict equality: identity for structures, value equality for scalars.
    #[must_use]
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Array(a), Self::Array(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Identity of the structure behind this value, if any.
    #[must_use]
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Self::Object(obj) => Some(obj.id()),
            Self::Array(arr) => Some(arr.id()),
            _ => None,
        }
    }

    /// Whether this value is a structure that has been through the builder.
    ///
    /// Objects count as reactive once sealed by the builder, keys or not;
    /// arrays once their mutator set is intercepted. Scalars are never
    /// reactive.
    #[must_use]
    pub fn is_reactive(&self) -> bool {
        match self {
            Self::Object(obj) => obj.is_observed(),
            Self::Array(arr) => arr.is_intercepted(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Short name of the variant, used in log fields.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
        }
    }
}

// Structures print as handles (id and shape) so cyclic graphs format safely.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Number(n) => write!(f, "Number({n})"),
            Self::String(s) => write!(f, "String({s:?})"),
            Self::Object(obj) => fmt::Debug::fmt(obj, f),
            Self::Array(arr) => fmt::Debug::fmt(arr, f),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl From<Array> for Value {
    fn from(value: Array) -> Self {
        Self::Array(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Drop `pending` without recursing through nested handles.
///
/// Node destructors route their children here, so releasing a deep chain
/// costs heap, not stack.
pub(crate) fn release(mut pending: Vec<Value>) {
    while let Some(value) = pending.pop() {
        match value {
            Value::Object(obj) => pending.append(&mut obj.into_children()),
            Value::Array(arr) => pending.append(&mut arr.into_children()),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_compare_by_value() {
        assert!(Value::from(1).strict_eq(&Value::from(1.0)));
        assert!(Value::from("a").strict_eq(&Value::from("a".to_string())));
        assert!(Value::Null.strict_eq(&Value::Null));
        assert!(!Value::from(true).strict_eq(&Value::from(1)));
        assert!(!Value::Null.strict_eq(&Value::from(false)));
    }

    #[test]
    fn nan_is_never_strictly_equal() {
        let nan = Value::from(f64::NAN);
        assert!(!nan.strict_eq(&nan.clone()));
    }

    #[test]
    fn structures_compare_by_identity() {
        let a = Value::object([("x", 1)]);
        let b = Value::object([("x", 1)]);
        assert!(a.strict_eq(&a.clone()));
        assert!(!a.strict_eq(&b));

        let xs = Value::array([1, 2]);
        assert!(xs.strict_eq(&xs.clone()));
        assert!(!xs.strict_eq(&Value::array([1, 2])));
    }

    #[test]
    fn node_ids_are_unique() {
        let a = Value::object(Vec::<(String, Value)>::new());
        let b = Value::array(Vec::<Value>::new());
        assert_ne!(a.node_id(), b.node_id());
        assert_eq!(a.node_id(), a.clone().node_id());
        assert_eq!(Value::from(3).node_id(), None);
    }

    #[test]
    fn option_maps_none_to_null() {
        assert!(Value::from(None::<i32>).is_null());
        assert_eq!(Value::from(Some(2)).as_f64(), Some(2.0));
    }

    #[test]
    fn plain_values_are_not_reactive() {
        assert!(!Value::object([("a", 1)]).is_reactive());
        assert!(!Value::array([1]).is_reactive());
        assert!(!Value::from("s").is_reactive());
    }

    #[test]
    fn deep_chain_drops_without_overflow() {
        let mut value = Value::object([("leaf", 0)]);
        for i in 0..100_000 {
            value = if i % 2 == 0 {
                Value::object([("next", value)])
            } else {
                Value::array([value])
            };
        }
        drop(value);
    }

    #[test]
    fn shared_child_survives_parent_drop() {
        let child = Value::object([("v", 1)]);
        drop(Value::array([child.clone(), Value::object([("c", child.clone())])]));
        assert_eq!(
            child.as_object().and_then(|o| o.get("v")).and_then(|v| v.as_f64()),
            Some(1.0)
        );
    }

    #[test]
    fn debug_of_cycle_terminates() {
        let obj = Object::new();
        obj.set("me", obj.clone());
        let dbg = format!("{:?}", Value::Object(obj));
        assert!(dbg.contains("Object"));
    }
}
