#![forbid(unsafe_code)]

//! Named-property storage with installable accessors.
//!
//! A [`PropertyTable`] backs every [`Object`](crate::Object) and the named
//! properties of every [`Array`](crate::Array). Each entry is either a plain
//! value or a tracked accessor that owns the captured value together with
//! the [`Observer`] that installed it.
//!
//! # Invariants
//!
//! 1. Keys are unique; iteration follows insertion order.
//! 2. Installing an accessor never changes the value a read returns.
//! 3. A tracked write notifies at most once, after the new value has been
//!    converted and stored.
//! 4. No `RefCell` borrow is held while converting a value or notifying.

use std::cell::RefCell;

use tracing::trace;

use crate::observer::Observer;
use crate::value::Value;

/// What a property write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The key is not intercepted; stored without notification.
    Untracked,
    /// The key is intercepted but the value is strictly equal to the
    /// captured one; nothing changed.
    Unchanged,
    /// The value was converted, stored, and the sink notified.
    Notified,
}

impl WriteOutcome {
    #[must_use]
    pub const fn notified(self) -> bool {
        matches!(self, Self::Notified)
    }
}

struct Accessor {
    captured: Value,
    observer: Observer,
}

enum Slot {
    Plain(Value),
    Tracked(Accessor),
}

impl Slot {
    fn value(&self) -> &Value {
        match self {
            Self::Plain(value) => value,
            Self::Tracked(accessor) => &accessor.captured,
        }
    }
}

#[derive(Default)]
pub(crate) struct PropertyTable {
    entries: Vec<(String, Slot)>,
}

impl PropertyTable {
    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub(crate) fn get(&self, key: &str) -> Option<Value> {
        self.position(key)
            .map(|index| self.entries[index].1.value().clone())
    }

    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    pub(crate) fn values(&self) -> Vec<Value> {
        self.entries.iter().map(|(_, s)| s.value().clone()).collect()
    }

    pub(crate) fn is_tracked(&self, key: &str) -> bool {
        self.position(key)
            .is_some_and(|index| matches!(self.entries[index].1, Slot::Tracked(_)))
    }

    pub(crate) fn tracked_keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Tracked(_)))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Store without interception, replacing or appending.
    ///
    /// Used for initial construction, before any observer is involved.
    pub(crate) fn insert_plain(&mut self, key: String, value: Value) {
        match self.position(&key) {
            Some(index) => self.entries[index].1 = Slot::Plain(value),
            None => self.entries.push((key, Slot::Plain(value))),
        }
    }

    /// Empty the table, returning every stored value.
    pub(crate) fn take_values(&mut self) -> Vec<Value> {
        self.entries
            .drain(..)
            .map(|(_, slot)| match slot {
                Slot::Plain(value) => value,
                Slot::Tracked(accessor) => accessor.captured,
            })
            .collect()
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.position(key)?;
        let (_, slot) = self.entries.remove(index);
        Some(match slot {
            Slot::Plain(value) => value,
            Slot::Tracked(accessor) => accessor.captured,
        })
    }

    /// Put an accessor on every present key. Already tracked keys keep their
    /// captured value and switch to `observer`. Returns the number of keys.
    pub(crate) fn install(&mut self, observer: &Observer) -> usize {
        for (_, slot) in &mut self.entries {
            match slot {
                Slot::Tracked(accessor) => accessor.observer = observer.clone(),
                Slot::Plain(value) => {
                    let captured = std::mem::take(value);
                    *slot = Slot::Tracked(Accessor {
                        captured,
                        observer: observer.clone(),
                    });
                }
            }
        }
        self.entries.len()
    }
}

/// Write `value` under `key`, running the accessor if one is installed.
pub(crate) fn write(table: &RefCell<PropertyTable>, key: &str, value: Value) -> WriteOutcome {
    let observer = {
        let mut props = table.borrow_mut();
        let Some(index) = props.position(key) else {
            trace!(key, "write to unknown key stored untracked");
            props.entries.push((key.to_owned(), Slot::Plain(value)));
            return WriteOutcome::Untracked;
        };
        match &mut props.entries[index].1 {
            Slot::Plain(slot) => {
                *slot = value;
                return WriteOutcome::Untracked;
            }
            Slot::Tracked(accessor) => {
                if accessor.captured.strict_eq(&value) {
                    return WriteOutcome::Unchanged;
                }
                accessor.observer.clone()
            }
        }
    };

    // A scalar slot may receive a structure at any time; it must become
    // reactive before the sink runs.
    observer.observe(&value);

    {
        let mut props = table.borrow_mut();
        match props.position(key) {
            Some(index) => match &mut props.entries[index].1 {
                Slot::Tracked(accessor) => accessor.captured = value,
                Slot::Plain(slot) => *slot = value,
            },
            None => props.entries.push((key.to_owned(), Slot::Plain(value))),
        }
    }

    trace!(key, "tracked write");
    observer.notify();
    WriteOutcome::Notified
}
