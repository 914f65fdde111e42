//! Recording tracer and meter handed to the client under test
//!
//! One instance of each is created per run and shared through the fixture,
//! so tests can assert on the spans and metrics the client produced.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A span recorded by [`TestTracer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSpan {
    pub id: Uuid,
    pub name: String,
    pub parent: Option<Uuid>,
    pub attributes: BTreeMap<String, String>,
    pub finished: bool,
}

#[derive(Debug, Default)]
pub struct TestTracer {
    spans: Mutex<Vec<RecordedSpan>>,
}

impl TestTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a span and return its id
    pub fn request_span(&self, name: &str, parent: Option<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        lock(&self.spans).push(RecordedSpan {
            id,
            name: name.to_string(),
            parent,
            attributes: BTreeMap::new(),
            finished: false,
        });
        id
    }

    pub fn set_attribute(&self, span: Uuid, key: &str, value: &str) {
        if let Some(recorded) = lock(&self.spans).iter_mut().find(|recorded| recorded.id == span) {
            recorded.attributes.insert(key.to_string(), value.to_string());
        }
    }

    pub fn end_span(&self, span: Uuid) {
        if let Some(recorded) = lock(&self.spans).iter_mut().find(|recorded| recorded.id == span) {
            recorded.finished = true;
        }
    }

    pub fn spans(&self) -> Vec<RecordedSpan> {
        lock(&self.spans).clone()
    }

    pub fn spans_named(&self, name: &str) -> Vec<RecordedSpan> {
        lock(&self.spans).iter().filter(|span| span.name == name).cloned().collect()
    }

    pub fn children_of(&self, parent: Uuid) -> Vec<RecordedSpan> {
        lock(&self.spans)
            .iter()
            .filter(|span| span.parent == Some(parent))
            .cloned()
            .collect()
    }

    pub fn reset(&self) {
        lock(&self.spans).clear();
    }
}

#[derive(Debug, Default)]
struct MeterState {
    counters: HashMap<String, u64>,
    values: HashMap<String, Vec<u64>>,
}

#[derive(Debug, Default)]
pub struct TestMeter {
    state: Mutex<MeterState>,
}

impl TestMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metric key: the name followed by tags sorted by key
    fn key(name: &str, tags: &[(&str, &str)]) -> String {
        let sorted: BTreeMap<&str, &str> = tags.iter().copied().collect();
        let rendered = sorted
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(",");
        format!("{name}:{rendered}")
    }

    pub fn counter_add(&self, name: &str, tags: &[(&str, &str)], delta: u64) {
        *lock(&self.state).counters.entry(Self::key(name, tags)).or_insert(0) += delta;
    }

    pub fn record_value(&self, name: &str, tags: &[(&str, &str)], value: u64) {
        lock(&self.state)
            .values
            .entry(Self::key(name, tags))
            .or_default()
            .push(value);
    }

    pub fn counter(&self, name: &str, tags: &[(&str, &str)]) -> u64 {
        lock(&self.state)
            .counters
            .get(&Self::key(name, tags))
            .copied()
            .unwrap_or(0)
    }

    pub fn values(&self, name: &str, tags: &[(&str, &str)]) -> Vec<u64> {
        lock(&self.state)
            .values
            .get(&Self::key(name, tags))
            .cloned()
            .unwrap_or_default()
    }

    pub fn reset(&self) {
        let mut state = lock(&self.state);
        state.counters.clear();
        state.values.clear();
    }
}
