#![forbid(unsafe_code)]

//! Deep change interception for plain data graphs.
//!
//! # Role in FrankenTUI
//! `ftui-observe` turns a nested, JSON-like data model into a reactive one:
//! reads stay free, and every tracked write triggers a view-update
//! notification. It has no dependency graph; any change anywhere in an
//! observed graph reaches the same [`NotificationSink`].
//!
//! # Primary pieces
//! - **[`Value`]**: scalars plus shared [`Object`] and [`Array`] handles.
//! - **[`select()`]**: routes a value to the scalar, sequence, or keyed
//!   interception strategy.
//! - **[`Observer`]**: the graph builder. Installs accessors on object keys
//!   and intercepts array mutators, eagerly and without recursion.
//! - **[`NotificationSink`]**: the "update view" hook, passed in explicitly
//!   so independent roots can use independent sinks.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use ftui_observe::{CountingSink, Observer, Value, WriteOutcome};
//!
//! let sink = Rc::new(CountingSink::new());
//! let observer = Observer::from_shared(sink.clone());
//!
//! let root = Value::object([
//!     ("name", Value::from("a")),
//!     ("info", Value::object([("city", "X")])),
//!     ("nums", Value::array([1, 2, 3])),
//! ]);
//! observer.observe(&root);
//!
//! let data = root.as_object().unwrap();
//! data.set("name", "b");
//! data.get("info").unwrap().as_object().unwrap().set("city", "Y");
//! data.get("nums").unwrap().as_array().unwrap().push(4);
//! assert_eq!(sink.count(), 3);
//!
//! // Keys added after observation are not intercepted.
//! assert_eq!(data.set("extra", 1), WriteOutcome::Untracked);
//! assert_eq!(sink.count(), 3);
//! ```
//!
//! # Invariants
//!
//! 1. Reads never notify and always return the last written value.
//! 2. A tracked write notifies exactly once, after the new value is
//!    converted and stored; a strictly equal write notifies zero times.
//! 3. Each intercepted array mutator call notifies exactly once.
//! 4. Building never notifies.
//!
//! # Limitations
//!
//! Adding or removing object keys after observation, and assigning array
//! elements by index, are never intercepted. These paths succeed silently.

pub mod array;
pub mod config;
#[cfg(feature = "json")]
pub mod json;
pub mod object;
pub mod observer;
pub mod select;
pub mod sink;
mod slot;
pub mod value;

pub use array::{Array, Mutator};
pub use config::{NotifyTiming, ObserverConfig};
#[cfg(feature = "json")]
pub use json::SnapshotError;
pub use object::Object;
pub use observer::{ObserveStats, Observer, observe};
pub use select::{Strategy, StrategyKind, select};
pub use sink::{CountingSink, LogSink, NotificationSink, NullSink};
pub use slot::WriteOutcome;
pub use value::{NodeId, Value};
