#![forbid(unsafe_code)]

//! Scripted walkthrough of `ftui-observe`.
//!
//! Observes a small user record, then runs a fixed list of writes against
//! it: tracked scalar writes, scalar-to-object migration, nested writes, an
//! array push, and the two unsupported paths (adding and deleting a key).
//! Each step logs how many view updates it triggered.

mod cli;

use std::cell::Cell;
use std::process;
use std::rc::Rc;

use ftui_observe::{LogSink, NotificationSink, Observer, ObserverConfig, Value};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Logs through [`LogSink`] and counts, so each step can report its total.
struct DemoSink {
    log: LogSink,
    count: Cell<u64>,
}

impl NotificationSink for DemoSink {
    fn notify(&self) {
        self.count.set(self.count.get() + 1);
        self.log.notify();
    }
}

/// Run one scripted action and log the updates it caused.
fn step(sink: &DemoSink, label: &str, action: impl FnOnce()) {
    let before = sink.count.get();
    action();
    info!(step = label, updates = sink.count.get() - before, "step done");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = match cli::Opts::parse_from(std::env::args().skip(1), ObserverConfig::from_env()) {
        Ok(opts) => opts,
        Err(e @ (cli::ParseError::Help | cli::ParseError::Version)) => {
            println!("{e}");
            return;
        }
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    };

    let data = Value::from_json(&json!({
        "name": "zhangsan",
        "age": 20,
        "info": { "address": "Hangzhou" },
        "nums": [10, 20, 30],
    }));

    let sink = Rc::new(DemoSink {
        log: LogSink::default(),
        count: Cell::new(0),
    });
    let observer = Observer::from_shared(sink.clone()).with_config(opts.config);
    let stats = observer.observe(&data);
    info!(
        objects = stats.objects,
        arrays = stats.arrays,
        properties = stats.properties,
        "data observed"
    );

    let Some(root) = data.as_object() else {
        error!("demo data is not an object");
        process::exit(1);
    };

    step(&sink, "rename", || {
        root.set("name", "allen");
    });
    step(&sink, "age becomes an object", || {
        root.set("age", Value::object([("num", 21)]));
    });
    step(&sink, "age replaced again", || {
        root.set("age", Value::object([("num", 23)]));
    });
    step(&sink, "nested age write", || {
        if let Some(age) = root.get("age").as_ref().and_then(Value::as_object) {
            age.set("num", 22);
        }
    });
    step(&sink, "nested address write", || {
        if let Some(info) = root.get("info").as_ref().and_then(Value::as_object) {
            info.set("address", "Shanghai");
        }
    });
    step(&sink, "push to nums", || {
        if let Some(nums) = root.get("nums").as_ref().and_then(Value::as_array) {
            nums.push(4);
        }
    });
    step(&sink, "add key (not intercepted)", || {
        root.set("city", "Hangzhou");
    });
    step(&sink, "delete key (not intercepted)", || {
        root.remove("name");
    });

    info!(total_updates = sink.count.get(), "script finished");

    match data.to_json() {
        Ok(snapshot) if opts.json => println!("{snapshot:#}"),
        Ok(snapshot) => info!(%snapshot, "final state"),
        Err(e) => {
            error!(error = %e, "snapshot failed");
            process::exit(1);
        }
    }
}
