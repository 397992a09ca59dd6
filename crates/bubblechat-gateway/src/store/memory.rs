use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use tokio::sync::watch;

use bubblechat_core::error::{ChatError, Result};
use bubblechat_core::protocol::paths::StorePath;

use super::{RealtimeStore, Subscription};
use crate::obs::ChatMetrics;

struct Watcher {
    path: StorePath,
    tx: watch::Sender<Option<Value>>,
}

/// In-process key-tree store with full-snapshot subscriptions.
///
/// - The tree is one JSON value; objects with no children do not exist, so a
///   node whose last child is removed disappears too.
/// - Every mutation recomputes the value at each overlapping watcher path
///   under the write lock and publishes it only if it changed, so watchers
///   see values in mutation order and unrelated writes cost nothing.
pub struct MemoryStore {
    tree: RwLock<Value>,
    watchers: Arc<DashMap<u64, Watcher>>,
    next_watch_id: AtomicU64,
    available: AtomicBool,
    metrics: Arc<ChatMetrics>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(ChatMetrics::default()))
    }
}

impl MemoryStore {
    pub fn new(metrics: Arc<ChatMetrics>) -> Self {
        Self {
            tree: RwLock::new(Value::Null),
            watchers: Arc::new(DashMap::new()),
            next_watch_id: AtomicU64::new(1),
            available: AtomicBool::new(true),
            metrics,
        }
    }

    pub fn metrics(&self) -> &ChatMetrics {
        &self.metrics
    }

    /// Simulate an outage: while unavailable every operation fails with
    /// `TransientFailure` and beacons are dropped.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
        tracing::info!(available, "memory store availability changed");
    }

    /// Number of attached subscriptions.
    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(ChatError::TransientFailure("store offline".into()))
        }
    }

    fn record<T>(&self, op: &'static str, started: Instant, res: &Result<T>) {
        self.metrics.store_ops.inc(&[("op", op)]);
        self.metrics.store_op_duration.observe(&[("op", op)], started.elapsed());
        if let Err(e) = res {
            self.metrics.store_errors.inc(&[("op", op), ("code", e.client_code().as_str())]);
        }
    }

    /// Apply a mutation (`None` = delete) and notify overlapping watchers.
    fn mutate(&self, path: &StorePath, value: Option<Value>) -> Result<()> {
        self.ensure_available()?;
        let value = value.and_then(normalize);

        let mut tree = self
            .tree
            .write()
            .map_err(|_| ChatError::Internal("store lock poisoned".into()))?;

        match value {
            Some(v) => set_at(&mut tree, path.segments(), v),
            None => {
                remove_at(&mut tree, path.segments());
            }
        }
        if is_empty(&tree) {
            *tree = Value::Null;
        }

        for w in self.watchers.iter() {
            if !w.path.overlaps(path) {
                continue;
            }
            let next = get_at(&tree, &w.path).cloned();
            w.tx.send_if_modified(|cur| {
                if *cur == next {
                    false
                } else {
                    *cur = next;
                    true
                }
            });
        }
        Ok(())
    }

    fn read(&self, path: &StorePath) -> Result<Option<Value>> {
        self.ensure_available()?;
        let tree = self
            .tree
            .read()
            .map_err(|_| ChatError::Internal("store lock poisoned".into()))?;
        Ok(get_at(&tree, path).cloned())
    }

    fn attach(&self, path: &StorePath) -> Result<Subscription> {
        self.ensure_available()?;
        // hold the read lock so no mutation slips between snapshot and insert
        let tree = self
            .tree
            .read()
            .map_err(|_| ChatError::Internal("store lock poisoned".into()))?;
        let (tx, rx) = watch::channel(get_at(&tree, path).cloned());
        let id = self.next_watch_id.fetch_add(1, Ordering::Relaxed);
        self.watchers.insert(id, Watcher { path: path.clone(), tx });
        drop(tree);

        self.metrics.store_subscriptions.inc(&[]);
        tracing::debug!(watch_id = id, path = %path, "subscription attached");

        let watchers = Arc::clone(&self.watchers);
        let metrics = Arc::clone(&self.metrics);
        Ok(Subscription::new(path.clone(), rx, move || {
            if watchers.remove(&id).is_some() {
                metrics.store_subscriptions.dec(&[]);
                tracing::debug!(watch_id = id, "subscription disposed");
            }
        }))
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    async fn subscribe(&self, path: &StorePath) -> Result<Subscription> {
        let started = Instant::now();
        let res = self.attach(path);
        self.record("subscribe", started, &res);
        res
    }

    async fn write(&self, path: &StorePath, value: Value) -> Result<()> {
        let started = Instant::now();
        let res = self.mutate(path, Some(value));
        self.record("write", started, &res);
        tracing::trace!(path = %path, ok = res.is_ok(), "store write");
        res
    }

    async fn delete(&self, path: &StorePath) -> Result<()> {
        let started = Instant::now();
        let res = self.mutate(path, None);
        self.record("delete", started, &res);
        tracing::trace!(path = %path, ok = res.is_ok(), "store delete");
        res
    }

    async fn read_once(&self, path: &StorePath) -> Result<Option<Value>> {
        let started = Instant::now();
        let res = self.read(path);
        self.record("read", started, &res);
        res
    }

    fn beacon_delete(&self, path: &StorePath) {
        // in-process the delete is immediate; failures are swallowed
        match self.mutate(path, None) {
            Ok(_) => self.metrics.beacons.inc(&[("result", "applied")]),
            Err(e) => {
                self.metrics.beacons.inc(&[("result", "dropped")]);
                tracing::debug!(path = %path, error = %e, "beacon delete dropped");
            }
        }
    }
}

fn is_empty(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Object(m) => m.is_empty(),
        _ => false,
    }
}

/// Drop null children and empty objects; `None` if nothing is left.
fn normalize(v: Value) -> Option<Value> {
    match v {
        Value::Null => None,
        Value::Object(map) => {
            let out: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| normalize(v).map(|v| (k, v)))
                .collect();
            if out.is_empty() {
                None
            } else {
                Some(Value::Object(out))
            }
        }
        other => Some(other),
    }
}

fn get_at<'a>(root: &'a Value, path: &StorePath) -> Option<&'a Value> {
    let mut cur = root;
    for seg in path.segments() {
        cur = cur.as_object()?.get(seg)?;
    }
    if is_empty(cur) {
        None
    } else {
        Some(cur)
    }
}

fn set_at(node: &mut Value, segs: &[String], value: Value) {
    match segs.split_first() {
        None => *node = value,
        Some((head, rest)) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                let child = map.entry(head.clone()).or_insert(Value::Null);
                set_at(child, rest, value);
            }
        }
    }
}

/// Remove the node at `segs` and prune parents left empty.
fn remove_at(node: &mut Value, segs: &[String]) -> bool {
    let Some((head, rest)) = segs.split_first() else {
        let had = !is_empty(node);
        *node = Value::Null;
        return had;
    };
    let Value::Object(map) = node else {
        return false;
    };
    if rest.is_empty() {
        return map.remove(head).is_some();
    }
    let Some(child) = map.get_mut(head) else {
        return false;
    };
    let removed = remove_at(child, rest);
    if is_empty(child) {
        map.remove(head);
    }
    removed
}
