#![forbid(unsafe_code)]

//! The reactive graph builder.
//!
//! [`Observer::observe`] converts every structure reachable from a root:
//! objects get an accessor per present key, arrays get their mutator set
//! intercepted. Conversion is eager and synchronous; no notification is
//! emitted while building.
//!
//! # Traversal
//!
//! The walk uses an explicit work-list instead of recursion, so deep
//! graphs cannot overflow the stack. It is post-order: a node's children
//! are converted before the node's own accessors are installed. A visited
//! set keyed on [`NodeId`](crate::NodeId) makes each node processed once
//! per call, which terminates cycles and skips shared nodes.
//!
//! # Re-observation
//!
//! Observing an already reactive structure is allowed. Accessors are
//! re-installed: captured values are kept and the new observer replaces
//! the old one, so the last observer to reach a shared node owns its
//! notifications.
//!
//! # Ownership
//!
//! Accessors hold their observer, and the observer holds the sink. A sink
//! that captures a handle to the graph it observes forms an `Rc` cycle and
//! is never freed.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::config::ObserverConfig;
use crate::select::{Strategy, select};
use crate::sink::{LogSink, NotificationSink};
use crate::value::{NodeId, Value};

/// Counts from one [`Observer::observe`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObserveStats {
    /// Objects converted.
    pub objects: usize,
    /// Arrays whose mutator set was intercepted.
    pub arrays: usize,
    /// Accessors installed (object keys plus array named properties).
    pub properties: usize,
    /// Edges that led to a node already processed in this call.
    pub revisited: usize,
}

impl ObserveStats {
    /// Objects plus arrays.
    #[must_use]
    pub const fn nodes(&self) -> usize {
        self.objects + self.arrays
    }
}

enum Frame {
    Enter(Value),
    Seal(Value),
}

/// Installs interception on value graphs and delivers their notifications.
///
/// Cloning shares the sink.
#[derive(Clone)]
pub struct Observer {
    sink: Rc<dyn NotificationSink>,
    config: ObserverConfig,
}

impl Default for Observer {
    fn default() -> Self {
        Self::new(LogSink::default())
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Observer {
    /// Create an observer that notifies `sink`.
    #[must_use]
    pub fn new(sink: impl NotificationSink + 'static) -> Self {
        Self::from_shared(Rc::new(sink))
    }

    /// Create an observer around an already shared sink.
    #[must_use]
    pub fn from_shared(sink: Rc<dyn NotificationSink>) -> Self {
        Self {
            sink,
            config: ObserverConfig::default(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ObserverConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    /// Make every structure reachable from `root` reactive.
    ///
    /// Scalars are accepted and left untouched.
    pub fn observe(&self, root: &Value) -> ObserveStats {
        let mut stats = ObserveStats::default();
        if matches!(select(root), Strategy::Scalar) {
            return stats;
        }

        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut stack = vec![Frame::Enter(root.clone())];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(value) => {
                    let children = match select(&value) {
                        Strategy::Scalar => continue,
                        Strategy::Keyed(obj) => {
                            if !visited.insert(obj.id()) {
                                stats.revisited += 1;
                                continue;
                            }
                            obj.props().borrow().values()
                        }
                        Strategy::Sequence(arr) => {
                            if !visited.insert(arr.id()) {
                                stats.revisited += 1;
                                continue;
                            }
                            let mut children = arr.to_vec();
                            children.extend(arr.props().borrow().values());
                            children
                        }
                    };
                    stack.push(Frame::Seal(value));
                    stack.extend(
                        children
                            .into_iter()
                            .rev()
                            .filter(|child| !matches!(select(child), Strategy::Scalar))
                            .map(Frame::Enter),
                    );
                }
                Frame::Seal(value) => match select(&value) {
                    Strategy::Scalar => {}
                    Strategy::Keyed(obj) => {
                        stats.properties += obj.props().borrow_mut().install(self);
                        obj.mark_observed();
                        stats.objects += 1;
                    }
                    Strategy::Sequence(arr) => {
                        arr.intercept(self);
                        stats.properties += arr.props().borrow_mut().install(self);
                        stats.arrays += 1;
                    }
                },
            }
        }

        debug!(
            root = root.type_name(),
            objects = stats.objects,
            arrays = stats.arrays,
            properties = stats.properties,
            revisited = stats.revisited,
            "observed value graph"
        );
        stats
    }

    /// Invoke the sink once.
    pub fn notify(&self) {
        self.sink.notify();
    }
}

/// Observe `root` with a default [`LogSink`] observer.
pub fn observe(root: &Value) -> ObserveStats {
    Observer::default().observe(root)
}
