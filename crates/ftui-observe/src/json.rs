#![forbid(unsafe_code)]

//! Bridge between [`Value`] graphs and `serde_json`.
//!
//! [`Value::from_json`] builds plain (not yet observed) data from a JSON
//! document; object keys keep the order `serde_json` iterates them in.
//! [`Value::to_json`] snapshots a graph, reactive or not; it reads through
//! accessors without notifying.
//!
//! Snapshots must be trees. Shared nodes are emitted once per reference,
//! and a back-edge to an ancestor fails with [`SnapshotError::Cycle`].

use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::vec;

use serde_json::{Map, Number};

use crate::array::Array;
use crate::object::Object;
use crate::value::{NodeId, Value};

/// Errors from [`Value::to_json`].
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotError {
    /// The graph reaches `node` again from inside itself.
    Cycle { node: NodeId, path: String },
    /// `NaN` and infinities have no JSON form.
    NonFiniteNumber { value: f64, path: String },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cycle { node, path } => {
                write!(f, "cycle through node {node} at '{path}'")
            }
            Self::NonFiniteNumber { value, path } => {
                write!(f, "non-finite number {value} at '{path}'")
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

impl Value {
    /// Build plain data from JSON.
    ///
    /// Nesting depth is bounded by the heap, not the stack.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Self {
        let root = shell(json);
        let mut stack = vec![(root.clone(), json)];
        while let Some((target, source)) = stack.pop() {
            match (&target, source) {
                (Self::Array(arr), serde_json::Value::Array(items)) => {
                    for (index, item) in items.iter().enumerate() {
                        let child = shell(item);
                        arr.set(index, child.clone());
                        stack.push((child, item));
                    }
                }
                (Self::Object(obj), serde_json::Value::Object(map)) => {
                    for (key, item) in map {
                        let child = shell(item);
                        obj.set(key, child.clone());
                        stack.push((child, item));
                    }
                }
                _ => {}
            }
        }
        root
    }

    /// Snapshot this value as JSON.
    ///
    /// Whole numbers within `i64` range are emitted as JSON integers. Array
    /// named properties are not part of the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] on a cycle or a non-finite number.
    pub fn to_json(&self) -> Result<serde_json::Value, SnapshotError> {
        snapshot(self)
    }
}

/// Scalars convert directly; structures come back empty, to be filled in.
fn shell(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::Array(Array::with_capacity(items.len())),
        serde_json::Value::Object(_) => Value::Object(Object::new()),
    }
}

/// A structure whose children are still being emitted.
struct Frame {
    id: NodeId,
    /// Length of `path` up to and including this node.
    path_len: usize,
    body: Body,
}

enum Body {
    Array {
        pending: vec::IntoIter<Value>,
        index: usize,
        out: Vec<serde_json::Value>,
    },
    Object {
        pending: vec::IntoIter<(String, Value)>,
        key: Option<String>,
        out: Map<String, serde_json::Value>,
    },
}

impl Frame {
    /// Next child to emit, with `path` pointing at it.
    fn next_child(&mut self, path: &mut String) -> Option<Value> {
        path.truncate(self.path_len);
        match &mut self.body {
            Body::Array { pending, index, .. } => {
                let item = pending.next()?;
                let _ = write!(path, "[{index}]");
                *index += 1;
                Some(item)
            }
            Body::Object { pending, key, .. } => {
                let (name, item) = pending.next()?;
                path.push('.');
                path.push_str(&name);
                *key = Some(name);
                Some(item)
            }
        }
    }

    fn accept(&mut self, json: serde_json::Value) {
        match &mut self.body {
            Body::Array { out, .. } => out.push(json),
            Body::Object { out, key, .. } => {
                if let Some(name) = key.take() {
                    out.insert(name, json);
                }
            }
        }
    }

    fn finish(self) -> serde_json::Value {
        match self.body {
            Body::Array { out, .. } => serde_json::Value::Array(out),
            Body::Object { out, .. } => serde_json::Value::Object(out),
        }
    }
}

enum Entry {
    Leaf(serde_json::Value),
    Open(Frame),
}

fn open(
    value: &Value,
    ancestors: &HashSet<NodeId>,
    path: &str,
) -> Result<Entry, SnapshotError> {
    if let Some(id) = value.node_id() {
        if ancestors.contains(&id) {
            return Err(SnapshotError::Cycle {
                node: id,
                path: path.to_string(),
            });
        }
    }

    Ok(match value {
        Value::Null => Entry::Leaf(serde_json::Value::Null),
        Value::Bool(b) => Entry::Leaf(serde_json::Value::Bool(*b)),
        Value::Number(n) => Entry::Leaf(serde_json::Value::Number(number(*n, path)?)),
        Value::String(s) => Entry::Leaf(serde_json::Value::String(s.clone())),
        Value::Array(arr) => Entry::Open(Frame {
            id: arr.id(),
            path_len: path.len(),
            body: Body::Array {
                pending: arr.to_vec().into_iter(),
                index: 0,
                out: Vec::with_capacity(arr.len()),
            },
        }),
        Value::Object(obj) => {
            let pairs: Vec<(String, Value)> = obj
                .keys()
                .into_iter()
                .filter_map(|key| obj.get(&key).map(|item| (key, item)))
                .collect();
            Entry::Open(Frame {
                id: obj.id(),
                path_len: path.len(),
                body: Body::Object {
                    pending: pairs.into_iter(),
                    key: None,
                    out: Map::new(),
                },
            })
        }
    })
}

/// Depth-first snapshot on an explicit stack; `ancestors` holds the ids of
/// the open frames.
fn snapshot(root: &Value) -> Result<serde_json::Value, SnapshotError> {
    let mut path = String::from("$");
    let mut ancestors = HashSet::new();
    let mut stack = match open(root, &ancestors, &path)? {
        Entry::Leaf(json) => return Ok(json),
        Entry::Open(frame) => {
            ancestors.insert(frame.id);
            vec![frame]
        }
    };

    let mut result = None;
    while let Some(top) = stack.last_mut() {
        if let Some(child) = top.next_child(&mut path) {
            match open(&child, &ancestors, &path)? {
                Entry::Leaf(json) => top.accept(json),
                Entry::Open(frame) => {
                    ancestors.insert(frame.id);
                    stack.push(frame);
                }
            }
            continue;
        }

        let Some(done) = stack.pop() else { break };
        ancestors.remove(&done.id);
        path.truncate(done.path_len);
        let json = done.finish();
        match stack.last_mut() {
            Some(parent) => parent.accept(json),
            None => result = Some(json),
        }
    }
    Ok(result.unwrap_or_default())
}

fn number(n: f64, path: &str) -> Result<Number, SnapshotError> {
    let negative_zero = n == 0.0 && n.is_sign_negative();
    if !negative_zero && n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        return Ok(Number::from(n as i64));
    }
    Number::from_f64(n).ok_or_else(|| SnapshotError::NonFiniteNumber {
        value: n,
        path: path.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::Observer;
    use crate::sink::CountingSink;
    use serde_json::json;
    use std::rc::Rc;

    #[test]
    fn json_builds_plain_data() {
        let value = Value::from_json(&json!({
            "name": "zhangsan",
            "age": 20,
            "info": { "address": "Hangzhou" },
            "nums": [10, 20, 30],
        }));

        let root = value.as_object().expect("object");
        let mut keys = root.keys();
        keys.sort();
        assert_eq!(keys, vec!["age", "info", "name", "nums"]);
        assert!(!value.is_reactive());
        assert_eq!(
            root.get("nums").and_then(|n| n.as_array().map(Array::len)),
            Some(3)
        );
    }

    #[test]
    fn deep_json_builds_without_overflow() {
        let mut json = json!([0]);
        for _ in 0..20_000 {
            let mut map = Map::new();
            map.insert("next".to_string(), json);
            json = serde_json::Value::Object(map);
        }
        let value = Value::from_json(&json);

        let mut depth = 0;
        let mut cursor = value.clone();
        while let Some(next) = cursor.as_object().and_then(|o| o.get("next")) {
            cursor = next;
            depth += 1;
        }
        assert_eq!(depth, 20_000);
        assert_eq!(cursor.as_array().map(Array::len), Some(1));

        while let Some(next) = json.as_object_mut().and_then(|map| map.remove("next")) {
            json = next;
        }
    }

    #[test]
    fn snapshot_after_writes() {
        let sink = Rc::new(CountingSink::new());
        let value = Value::from_json(&json!({ "a": 1, "list": [1.5, true, null] }));
        Observer::from_shared(sink.clone()).observe(&value);

        let root = value.as_object().expect("object");
        root.set("a", "two");
        if let Some(list) = root.get("list").as_ref().and_then(Value::as_array) {
            list.push(4);
        }

        assert_eq!(
            value.to_json(),
            Ok(json!({ "a": "two", "list": [1.5, true, null, 4] }))
        );
        assert_eq!(sink.count(), 2);
    }

    #[test]
    fn shared_node_is_not_a_cycle() {
        let shared = Value::object([("v", 1)]);
        let root = Value::array([shared.clone(), shared]);
        assert_eq!(root.to_json(), Ok(json!([{ "v": 1 }, { "v": 1 }])));
    }

    #[test]
    fn cycle_is_reported_with_path() {
        let obj = Object::new();
        obj.set("inner", Value::object([("back", obj.clone())]));

        let err = Value::Object(obj.clone())
            .to_json()
            .expect_err("cycle");
        match &err {
            SnapshotError::Cycle { node, path } => {
                assert_eq!(*node, obj.id());
                assert_eq!(path, "$.inner.back");
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(err.to_string().contains("cycle"));

        // Break the cycle so the test does not leak.
        obj.remove("inner");
    }

    #[test]
    fn deep_chain_snapshots_without_overflow() {
        let sink = Rc::new(CountingSink::new());
        let mut leaf = Value::object([("v", 0)]);
        for _ in 0..20_000 {
            leaf = Value::object([("next", leaf)]);
        }
        let stats = Observer::from_shared(sink.clone()).observe(&leaf);
        assert_eq!(stats.objects, 20_001);

        // Detach level by level; a deep serde_json value drops recursively.
        let mut snapshot = leaf.to_json().expect("snapshot");
        let mut depth = 0;
        while let Some(next) = snapshot.as_object_mut().and_then(|map| map.remove("next")) {
            snapshot = next;
            depth += 1;
        }
        assert_eq!(depth, 20_000);
        assert_eq!(snapshot, json!({ "v": 0 }));
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn deep_cycle_is_reported() {
        let top = Object::new();
        let mut value = Value::Object(top.clone());
        for _ in 0..5_000 {
            value = Value::object([("next", value)]);
        }
        top.set("back", value.clone());

        let err = value.to_json().expect_err("cycle");
        assert!(matches!(err, SnapshotError::Cycle { node, .. } if Some(node) == value.node_id()));

        top.remove("back");
    }

    #[test]
    fn negative_zero_keeps_its_sign() {
        let json = Value::array([Value::from(-0.0), Value::from(0.0)])
            .to_json()
            .expect("snapshot");
        assert!(json[0].as_f64().is_some_and(f64::is_sign_negative));
        assert_eq!(json[1], json!(0));
    }

    #[test]
    fn nan_is_rejected() {
        let value = Value::array([Value::from(f64::NAN)]);
        assert!(matches!(
            value.to_json(),
            Err(SnapshotError::NonFiniteNumber { ref path, .. }) if path == "$[0]"
        ));
    }
}
