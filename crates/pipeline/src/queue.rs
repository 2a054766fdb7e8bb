//! The data layer — an ordered, append-only event queue whose append path
//! can be wrapped by interceptor layers.
//!
//! Third-party tag-manager code treats the queue as a plain ordered
//! sequence; interception lives in the push path and is invisible to
//! producers.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::debug;

use tagbridge_core::record::EventRecord;

/// Base ordered sequence of event records.
///
/// Append-only from the producer's perspective; insertion order carries the
/// temporal order of user/app events and is preserved end-to-end. The
/// standard sequence capabilities (`Index`, iteration, `Extend`,
/// `FromIterator`) are implemented so consumers that runtime-check for "an
/// ordinary sequence" accept it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQueue {
    records: Vec<EventRecord>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: EventRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EventRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }
}

impl From<Vec<EventRecord>> for EventQueue {
    fn from(records: Vec<EventRecord>) -> Self {
        Self { records }
    }
}

impl std::ops::Index<usize> for EventQueue {
    type Output = EventRecord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

impl Extend<EventRecord> for EventQueue {
    fn extend<T: IntoIterator<Item = EventRecord>>(&mut self, iter: T) {
        self.records.extend(iter);
    }
}

impl FromIterator<EventRecord> for EventQueue {
    fn from_iter<T: IntoIterator<Item = EventRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for EventQueue {
    type Item = EventRecord;
    type IntoIter = std::vec::IntoIter<EventRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventQueue {
    type Item = &'a EventRecord;
    type IntoIter = std::slice::Iter<'a, EventRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Append continuation — the push path below a given proxy layer.
pub type AppendFn = Arc<dyn Fn(EventRecord) + Send + Sync>;

/// A proxy layer over the data-layer append path.
///
/// A layer may rewrite the record and may defer derived appends, but must
/// forward exactly one record to `next`, synchronously — the derivation is
/// additive, never a replacement.
pub trait Interceptor: Send + Sync {
    /// Name used in install logs.
    fn name(&self) -> &'static str;

    fn intercept(&self, record: EventRecord, next: &AppendFn);
}

/// Proxied handle to the event queue.
///
/// [`push`] funnels through the installed layers (outermost first) before
/// the record lands in the base queue. Clones share both the base queue and
/// the layer chain; the queue lives for the process lifetime and is never
/// explicitly destroyed.
///
/// [`push`]: DataLayer::push
#[derive(Clone)]
pub struct DataLayer {
    base: Arc<Mutex<EventQueue>>,
    append: AppendFn,
}

impl DataLayer {
    pub fn new() -> Self {
        Self::from_records(Vec::new())
    }

    /// Build a data layer over pre-existing records, preserving their
    /// order. The records are copied exactly once — wrapping an already
    /// populated queue never duplicates entries.
    pub fn from_records(records: Vec<EventRecord>) -> Self {
        let base = Arc::new(Mutex::new(EventQueue::from(records)));
        let sink = Arc::clone(&base);
        let append: AppendFn = Arc::new(move |record| sink.lock().push(record));
        Self { base, append }
    }

    /// Install `layer` as the new outermost proxy. The layer's `next` is
    /// the append path as it existed before installation, so earlier
    /// installed layers sit closer to the base queue. Contents are
    /// untouched.
    pub fn with_layer(self, layer: Arc<dyn Interceptor>) -> Self {
        debug!(layer = layer.name(), "data-layer proxy installed");
        let next = Arc::clone(&self.append);
        let append: AppendFn = Arc::new(move |record| layer.intercept(record, &next));
        Self {
            base: self.base,
            append,
        }
    }

    /// Append a record through the full proxy chain.
    pub fn push(&self, record: EventRecord) {
        (self.append)(record);
    }

    /// The append continuation entering the full chain — for code that
    /// pushes from deferred tasks.
    pub fn append_fn(&self) -> AppendFn {
        Arc::clone(&self.append)
    }

    /// Number of records in the base queue.
    pub fn len(&self) -> usize {
        self.base.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.lock().is_empty()
    }

    /// Copy of the base queue contents, in append order.
    pub fn snapshot(&self) -> Vec<EventRecord> {
        self.base.lock().records().to_vec()
    }
}

impl Default for DataLayer {
    fn default() -> Self {
        Self::new()
    }
}

/// The event-command entry point handed to externally evaluated code — the
/// sole public surface third-party scripts use to emit events. Appends its
/// argument list, as a tuple, to the data layer.
#[derive(Clone)]
pub struct EventCommand {
    layer: DataLayer,
}

impl EventCommand {
    pub fn new(layer: DataLayer) -> Self {
        Self { layer }
    }

    /// Variadic emit: the argument list becomes a tuple record.
    pub fn emit(&self, args: Vec<Value>) {
        self.layer.push(EventRecord::Tuple(args));
    }

    /// Convenience for the common `("event", name, params)` shape.
    pub fn event(&self, name: &str, params: Map<String, Value>) {
        self.layer.push(EventRecord::named_event(name, params));
    }
}
