#![forbid(unsafe_code)]

//! Keyed structures.
//!
//! [`Object`] is a shared handle to an ordered map of named properties.
//! Reads never have side effects. Writes go through the key's accessor when
//! the builder has installed one, and are plain stores otherwise.
//!
//! # Limitations
//!
//! Interception covers exactly the keys present when the object was
//! observed:
//!
//! - a key added afterwards is an ordinary property; writing it never
//!   notifies, even on later writes;
//! - [`Object::remove`] never notifies, and a removed key comes back as an
//!   ordinary property if written again.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::slot::{self, PropertyTable, WriteOutcome};
use crate::value::{self, NodeId, Value};

struct ObjectNode {
    id: NodeId,
    props: RefCell<PropertyTable>,
    /// Set once the builder has sealed this node.
    observed: Cell<bool>,
}

impl Drop for ObjectNode {
    fn drop(&mut self) {
        value::release(self.props.get_mut().take_values());
    }
}

/// Shared handle to a keyed structure.
///
/// Cloning produces another handle to the same node.
#[derive(Clone)]
pub struct Object {
    node: Rc<ObjectNode>,
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl Object {
    /// Create an empty object.
    #[must_use]
    pub fn new() -> Self {
        Self {
            node: Rc::new(ObjectNode {
                id: NodeId::next(),
                props: RefCell::new(PropertyTable::default()),
                observed: Cell::new(false),
            }),
        }
    }

    pub(crate) fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let obj = Self::new();
        {
            let mut props = obj.node.props.borrow_mut();
            for (key, value) in pairs {
                props.insert_plain(key.into(), value.into());
            }
        }
        obj
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.node.id
    }

    /// Whether both handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Read a property. Returns a handle for structures, a copy for scalars.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.node.props.borrow().get(key)
    }

    /// Write a property.
    ///
    /// On a tracked key this skips strictly equal values, converts the new
    /// value, stores it, and notifies once. On any other key the value is
    /// stored as an ordinary property.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> WriteOutcome {
        slot::write(&self.node.props, key, value.into())
    }

    /// Remove a property without notifying.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.node.props.borrow_mut().remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.node.props.borrow().contains_key(key)
    }

    /// Keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.node.props.borrow().keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.node.props.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether writes to `key` are intercepted.
    #[must_use]
    pub fn is_tracked(&self, key: &str) -> bool {
        self.node.props.borrow().is_tracked(key)
    }

    /// Intercepted keys in insertion order.
    #[must_use]
    pub fn tracked_keys(&self) -> Vec<String> {
        self.node.props.borrow().tracked_keys()
    }

    /// Whether the builder has sealed this object, even with no keys.
    #[must_use]
    pub fn is_observed(&self) -> bool {
        self.node.observed.get()
    }

    pub(crate) fn props(&self) -> &RefCell<PropertyTable> {
        &self.node.props
    }

    pub(crate) fn mark_observed(&self) {
        self.node.observed.set(true);
    }

    /// Hand back the children if this is the last handle; the node then
    /// drops empty.
    pub(crate) fn into_children(mut self) -> Vec<Value> {
        match Rc::get_mut(&mut self.node) {
            Some(node) => node.props.get_mut().take_values(),
            None => Vec::new(),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let props = self.node.props.borrow();
        f.debug_struct("Object")
            .field("id", &self.node.id)
            .field("keys", &props.keys())
            .field("tracked", &props.tracked_keys().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::Observer;
    use crate::sink::CountingSink;

    fn observed(pairs: Vec<(&str, Value)>) -> (Object, Rc<CountingSink>) {
        let sink = Rc::new(CountingSink::new());
        let obj = Object::from_pairs(pairs);
        Observer::from_shared(sink.clone()).observe(&Value::Object(obj.clone()));
        (obj, sink)
    }

    #[test]
    fn plain_object_reads_and_writes() {
        let obj = Object::new();
        assert!(obj.is_empty());
        assert_eq!(obj.set("a", 1), WriteOutcome::Untracked);
        assert_eq!(obj.get("a").and_then(|v| v.as_f64()), Some(1.0));
        assert_eq!(obj.len(), 1);
        assert!(obj.get("missing").is_none());
    }

    #[test]
    fn tracked_write_notifies() {
        let (obj, sink) = observed(vec![("name", Value::from("a"))]);
        assert!(obj.is_tracked("name"));

        assert!(obj.set("name", "b").notified());
        assert_eq!(obj.get("name").as_ref().and_then(Value::as_str), Some("b"));
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn same_value_is_suppressed() {
        let (obj, sink) = observed(vec![("age", Value::from(20))]);
        assert_eq!(obj.set("age", 20), WriteOutcome::Unchanged);
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn same_handle_is_suppressed() {
        let inner = Value::object([("x", 1)]);
        let (obj, sink) = observed(vec![("inner", inner.clone())]);
        assert_eq!(obj.set("inner", inner), WriteOutcome::Unchanged);
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn added_key_is_not_tracked() {
        let (obj, sink) = observed(vec![("name", Value::from("a"))]);
        assert_eq!(obj.set("city", "X"), WriteOutcome::Untracked);
        assert_eq!(obj.set("city", "Y"), WriteOutcome::Untracked);
        assert!(!obj.is_tracked("city"));
        assert_eq!(sink.count(), 0);
        assert_eq!(obj.get("city").as_ref().and_then(Value::as_str), Some("Y"));
    }

    #[test]
    fn remove_is_silent_and_readd_is_untracked() {
        let (obj, sink) = observed(vec![("name", Value::from("a"))]);
        let removed = obj.remove("name");
        assert_eq!(removed.as_ref().and_then(Value::as_str), Some("a"));
        assert!(!obj.contains_key("name"));

        assert_eq!(obj.set("name", "c"), WriteOutcome::Untracked);
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn self_assignment_through_cycle() {
        let (obj, sink) = observed(vec![("me", Value::Null)]);
        assert!(obj.set("me", obj.clone()).notified());
        assert_eq!(sink.count(), 1);

        let me = obj.get("me");
        assert!(me.as_ref().and_then(Value::as_object).is_some_and(|o| o.ptr_eq(&obj)));
    }

    #[test]
    fn sink_can_read_during_notify() {
        let obj = Object::from_pairs([("n", 1)]);
        let seen = Rc::new(std::cell::Cell::new(0.0));
        let (reader, seen_clone) = (obj.clone(), Rc::clone(&seen));
        let observer = Observer::new(move || {
            let n = reader.get("n").and_then(|v| v.as_f64()).unwrap_or(-1.0);
            seen_clone.set(n);
        });
        observer.observe(&Value::Object(obj.clone()));

        obj.set("n", 7);
        assert_eq!(seen.get(), 7.0);
    }

    #[test]
    fn keys_keep_insertion_order() {
        let obj = Object::from_pairs([("z", 1), ("a", 2), ("m", 3)]);
        assert_eq!(obj.keys(), vec!["z", "a", "m"]);
    }

    #[test]
    fn debug_lists_keys() {
        let obj = Object::from_pairs([("k", 1)]);
        let dbg = format!("{obj:?}");
        assert!(dbg.contains("Object"));
        assert!(dbg.contains("\"k\""));
    }
}
