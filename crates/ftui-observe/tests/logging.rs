//! Structured logging emitted by the engine.
//!
//! Captures events with a counting `tracing-subscriber` layer and checks
//! what the builder, tracked writes, and the default sink report.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ftui_observe::{LogSink, Observer, Value};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;

#[derive(Clone, Default)]
struct LevelCounts {
    info: Arc<AtomicUsize>,
    debug: Arc<AtomicUsize>,
    trace: Arc<AtomicUsize>,
}

impl<S: Subscriber> Layer<S> for LevelCounts {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !event.metadata().target().starts_with("ftui_observe") {
            return;
        }
        let counter = match *event.metadata().level() {
            Level::INFO => &self.info,
            Level::DEBUG => &self.debug,
            Level::TRACE => &self.trace,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn log_sink_emits_one_info_event_per_notification() {
    let counts = LevelCounts::default();
    let subscriber = Registry::default().with(counts.clone());

    tracing::subscriber::with_default(subscriber, || {
        let root = Value::object([("name", "a")]);
        Observer::new(LogSink::default()).observe(&root);
        let obj = root.as_object().expect("object");
        obj.set("name", "b");
        obj.set("name", "c");
        obj.set("name", "c");
    });

    assert_eq!(counts.info.load(Ordering::Relaxed), 2);
}

#[test]
fn builder_reports_summary_at_debug() {
    let counts = LevelCounts::default();
    let subscriber = Registry::default().with(counts.clone());

    tracing::subscriber::with_default(subscriber, || {
        let root = Value::array([Value::object([("x", 1)])]);
        Observer::new(|| {}).observe(&root);
    });

    assert_eq!(counts.debug.load(Ordering::Relaxed), 1);
    assert_eq!(counts.info.load(Ordering::Relaxed), 0);
}

#[test]
fn writes_and_mutators_trace() {
    let counts = LevelCounts::default();
    let subscriber = Registry::default().with(counts.clone());

    tracing::subscriber::with_default(subscriber, || {
        let root = Value::object([("nums", Value::array([1]))]);
        Observer::new(|| {}).observe(&root);
        let obj = root.as_object().expect("object");
        if let Some(nums) = obj.get("nums").as_ref().and_then(Value::as_array) {
            nums.push(2);
        }
        obj.set("nums", Value::Null);
    });

    // One intercepted mutator and one tracked write.
    assert_eq!(counts.trace.load(Ordering::Relaxed), 2);
}
