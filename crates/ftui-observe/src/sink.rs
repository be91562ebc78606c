#![forbid(unsafe_code)]

//! Notification sinks.
//!
//! A sink is the zero-argument "update view" hook invoked after every
//! tracked change. The engine never inspects a sink's state; it only calls
//! [`NotificationSink::notify`], synchronously and on the caller's thread.
//!
//! Calls are not deduplicated or batched: three writes produce three calls.
//!
//! Any `Fn()` closure is a sink:
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use ftui_observe::{Observer, Value};
//!
//! let renders = Rc::new(Cell::new(0u32));
//! let counter = Rc::clone(&renders);
//! let observer = Observer::new(move || counter.set(counter.get() + 1));
//!
//! let data = Value::object([("name", "a")]);
//! observer.observe(&data);
//! data.as_object().unwrap().set("name", "b");
//! assert_eq!(renders.get(), 1);
//! ```

use std::borrow::Cow;
use std::cell::Cell;
use std::fmt;

use tracing::info;

/// Receiver of change notifications.
pub trait NotificationSink {
    /// Called once per tracked change.
    fn notify(&self);
}

impl<F: Fn()> NotificationSink for F {
    fn notify(&self) {
        self();
    }
}

/// Default sink: emits an `info` event per notification.
///
/// This is the diagnostic stand-in for a real view layer. Nothing is
/// printed unless the host installs a `tracing` subscriber.
#[derive(Debug, Clone)]
pub struct LogSink {
    label: Cow<'static, str>,
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new("update view")
    }
}

impl LogSink {
    /// Create a log sink with a custom message.
    #[must_use]
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// The message logged on each notification.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl NotificationSink for LogSink {
    fn notify(&self) {
        info!(label = %self.label, "view update requested");
    }
}

/// Sink that counts notifications.
///
/// Share it through an `Rc` to keep reading the count after handing it to
/// an [`Observer`](crate::Observer):
///
/// ```
/// use std::rc::Rc;
/// use ftui_observe::{CountingSink, Observer, Value};
///
/// let sink = Rc::new(CountingSink::new());
/// let observer = Observer::from_shared(sink.clone());
/// let nums = Value::array([1, 2]);
/// observer.observe(&nums);
/// nums.as_array().unwrap().push(3);
/// assert_eq!(sink.count(), 1);
/// ```
#[derive(Default)]
pub struct CountingSink {
    count: Cell<u64>,
}

impl CountingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received since creation or the last [`reset`](Self::reset).
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.get()
    }

    /// Reset the count to zero, returning the previous count.
    pub fn reset(&self) -> u64 {
        self.count.replace(0)
    }
}

impl fmt::Debug for CountingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountingSink")
            .field("count", &self.count.get())
            .finish()
    }
}

impl NotificationSink for CountingSink {
    fn notify(&self) {
        self.count.set(self.count.get() + 1);
    }
}

/// Sink that discards notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self) {}
}
