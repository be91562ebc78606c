#![forbid(unsafe_code)]

//! Sequences with an interceptable mutator set.
//!
//! Per-index accessors make no sense for a container whose length changes,
//! so an [`Array`] is intercepted at the level of its structural mutators
//! instead. Once observed, the five operations in [`Mutator::ALL`] notify
//! the observer's sink once per call, whatever the number of elements
//! affected. The interception belongs to that one instance; other arrays
//! are unaffected until they are observed themselves.
//!
//! # Notification timing
//!
//! By default the sink runs *before* the mutation is applied
//! ([`NotifyTiming::BeforeMutation`]), so a sink that reads the array sees
//! the old contents. Configure [`NotifyTiming::AfterMutation`] on the
//! observer to notify once the new contents are in place.
//!
//! # Limitations
//!
//! [`Array::set`] (direct index assignment) is never intercepted: it stores
//! the value without notifying and without converting it.
//!
//! [`NotifyTiming::BeforeMutation`]: crate::NotifyTiming::BeforeMutation
//! [`NotifyTiming::AfterMutation`]: crate::NotifyTiming::AfterMutation

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::config::NotifyTiming;
use crate::observer::Observer;
use crate::slot::{self, PropertyTable, WriteOutcome};
use crate::value::{self, NodeId, Value};

/// The structural operations intercepted on an observed array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutator {
    /// Append at the end.
    Push,
    /// Remove from the end.
    Pop,
    /// Remove from the front.
    Shift,
    /// Insert at the front.
    Unshift,
    /// Remove and/or insert at an arbitrary position.
    Splice,
}

impl Mutator {
    pub const ALL: [Mutator; 5] = [
        Mutator::Push,
        Mutator::Pop,
        Mutator::Shift,
        Mutator::Unshift,
        Mutator::Splice,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Pop => "pop",
            Self::Shift => "shift",
            Self::Unshift => "unshift",
            Self::Splice => "splice",
        }
    }
}

struct ArrayNode {
    id: NodeId,
    items: RefCell<Vec<Value>>,
    props: RefCell<PropertyTable>,
    /// Observer owning the intercepted mutator set, if installed.
    mutators: RefCell<Option<Observer>>,
}

impl Drop for ArrayNode {
    fn drop(&mut self) {
        let mut children = std::mem::take(self.items.get_mut());
        children.append(&mut self.props.get_mut().take_values());
        value::release(children);
    }
}

/// Shared handle to a sequence.
///
/// Cloning produces another handle to the same node.
#[derive(Clone)]
pub struct Array {
    node: Rc<ArrayNode>,
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

impl Array {
    /// Create an empty array.
    #[must_use]
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    fn with_items(items: Vec<Value>) -> Self {
        Self {
            node: Rc::new(ArrayNode {
                id: NodeId::next(),
                items: RefCell::new(items),
                props: RefCell::new(PropertyTable::default()),
                mutators: RefCell::new(None),
            }),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self::with_items(Vec::with_capacity(capacity))
    }

    pub(crate) fn from_values<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::with_items(items.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.node.id
    }

    /// Whether both handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Whether the mutator set of this instance is intercepted.
    #[must_use]
    pub fn is_intercepted(&self) -> bool {
        self.node.mutators.borrow().is_some()
    }

    // -- reads ---------------------------------------------------------------

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.node.items.borrow().get(index).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.node.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the elements (handles for structures).
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.node.items.borrow().clone()
    }

    // -- unintercepted index assignment --------------------------------------

    /// Assign an element by index, padding with `Null` past the end.
    ///
    /// Never notifies and never converts `value`, even on an observed array.
    /// An index with no representable length (`usize::MAX`) is ignored.
    pub fn set(&self, index: usize, value: impl Into<Value>) {
        let mut items = self.node.items.borrow_mut();
        if index >= items.len() {
            let Some(len) = index.checked_add(1) else {
                warn!(index, "array index out of range; write ignored");
                return;
            };
            items.resize(len, Value::Null);
        }
        items[index] = value.into();
    }

    // -- intercepted mutators ------------------------------------------------

    /// Append an element. Returns the new length.
    pub fn push(&self, value: impl Into<Value>) -> usize {
        self.mutate(Mutator::Push, vec![value.into()], |items, mut inserted| {
            items.append(&mut inserted);
            items.len()
        })
    }

    /// Remove the last element.
    pub fn pop(&self) -> Option<Value> {
        self.mutate(Mutator::Pop, Vec::new(), |items, _| items.pop())
    }

    /// Remove the first element.
    pub fn shift(&self) -> Option<Value> {
        self.mutate(Mutator::Shift, Vec::new(), |items, _| {
            if items.is_empty() {
                None
            } else {
                Some(items.remove(0))
            }
        })
    }

    /// Insert elements at the front, keeping their order. Returns the new
    /// length.
    pub fn unshift<V: Into<Value>>(&self, values: impl IntoIterator<Item = V>) -> usize {
        let values = values.into_iter().map(Into::into).collect();
        self.mutate(Mutator::Unshift, values, |items, inserted| {
            let rest = std::mem::replace(items, inserted);
            items.extend(rest);
            items.len()
        })
    }

    /// Remove `delete_count` elements starting at `start` and insert `values`
    /// in their place. Returns the removed elements.
    ///
    /// `start` is clamped to the length; `delete_count` to what remains.
    pub fn splice<V: Into<Value>>(
        &self,
        start: usize,
        delete_count: usize,
        values: impl IntoIterator<Item = V>,
    ) -> Vec<Value> {
        let values = values.into_iter().map(Into::into).collect();
        self.mutate(Mutator::Splice, values, |items, inserted| {
            let start = start.min(items.len());
            let end = start + delete_count.min(items.len() - start);
            items.splice(start..end, inserted).collect()
        })
    }

    /// Apply `op`, notifying first (or last) if this instance is intercepted.
    fn mutate<R>(
        &self,
        mutator: Mutator,
        inserted: Vec<Value>,
        op: impl FnOnce(&mut Vec<Value>, Vec<Value>) -> R,
    ) -> R {
        let observer = self.node.mutators.borrow().clone();
        let Some(observer) = observer else {
            return op(&mut self.node.items.borrow_mut(), inserted);
        };

        if observer.config().convert_inserted {
            for value in &inserted {
                observer.observe(value);
            }
        }

        trace!(
            array = %self.node.id,
            mutator = mutator.name(),
            inserted = inserted.len(),
            "intercepted mutator"
        );
        match observer.config().sequence_notify {
            NotifyTiming::BeforeMutation => {
                observer.notify();
                op(&mut self.node.items.borrow_mut(), inserted)
            }
            NotifyTiming::AfterMutation => {
                let result = op(&mut self.node.items.borrow_mut(), inserted);
                observer.notify();
                result
            }
        }
    }

    // -- named properties ----------------------------------------------------

    /// Read a named (non-index) property.
    #[must_use]
    pub fn prop(&self, key: &str) -> Option<Value> {
        self.node.props.borrow().get(key)
    }

    /// Write a named property, through its accessor when tracked.
    pub fn set_prop(&self, key: &str, value: impl Into<Value>) -> WriteOutcome {
        slot::write(&self.node.props, key, value.into())
    }

    #[must_use]
    pub fn prop_keys(&self) -> Vec<String> {
        self.node.props.borrow().keys()
    }

    #[must_use]
    pub fn is_tracked_prop(&self, key: &str) -> bool {
        self.node.props.borrow().is_tracked(key)
    }

    // -- builder hooks -------------------------------------------------------

    pub(crate) fn props(&self) -> &RefCell<PropertyTable> {
        &self.node.props
    }

    /// Hand back the children if this is the last handle; the node then
    /// drops empty.
    pub(crate) fn into_children(mut self) -> Vec<Value> {
        match Rc::get_mut(&mut self.node) {
            Some(node) => {
                let mut children = std::mem::take(node.items.get_mut());
                children.append(&mut node.props.get_mut().take_values());
                children
            }
            None => Vec::new(),
        }
    }

    /// Replace this instance's mutator set with one owned by `observer`.
    pub(crate) fn intercept(&self, observer: &Observer) {
        *self.node.mutators.borrow_mut() = Some(observer.clone());
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("id", &self.node.id)
            .field("len", &self.node.items.borrow().len())
            .field("intercepted", &self.is_intercepted())
            .finish()
    }
}
