//! Tabula store: canonical record collection for one table instance.
//!
//! Mutations apply synchronously and are total: a missing target id is a
//! benign no-op, never an error. Readers get cheap `Arc` snapshots through
//! a [`StoreHandle`].

#![forbid(unsafe_code)]

use std::sync::Arc;

use arc_swap::ArcSwap;
use metrics::{counter, gauge};
use rustc_hash::FxHashMap;
use tabula_core::{DisplayProjector, Fields, Mutation, Record, RecordId, TableSnapshot};
use tracing::debug;
use uuid::Uuid;

/// Holds the canonical records of one table and applies [`Mutation`]s.
///
/// No history, no undo; each apply bumps the epoch and the next `publish`
/// swaps a fresh snapshot into the shared handle.
pub struct RecordStore {
    records: Vec<Record>,
    index: FxHashMap<RecordId, usize>,
    epoch: u64,
    projector: Option<Arc<dyn DisplayProjector>>,
    snap: Arc<ArcSwap<TableSnapshot>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            index: FxHashMap::default(),
            epoch: 0,
            projector: None,
            snap: Arc::new(ArcSwap::from_pointee(TableSnapshot::default())),
        }
    }

    pub fn with_projector(projector: Option<Arc<dyn DisplayProjector>>) -> Self {
        let mut s = Self::new();
        s.projector = projector;
        s
    }

    /// Seed the store with an initial collection, reprojecting display fields.
    pub fn replace_all(&mut self, records: Vec<Record>) {
        self.records = records;
        for r in self.records.iter_mut() {
            if let Some(p) = self.projector.as_deref() {
                r.projected = p.project(&r.fields);
            }
        }
        self.rebuild_index();
        self.bump();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    /// Apply one mutation. Total: never fails, never panics.
    pub fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::Create { fields } => {
                let id = self.fresh_id();
                let mut record = Record::new(id.clone(), fields);
                if let Some(p) = self.projector.as_deref() {
                    record.projected = p.project(&record.fields);
                }
                self.index.insert(id, self.records.len());
                self.records.push(record);
                counter!("store_mutations_total", 1u64, "kind" => "create");
            }
            Mutation::Update { id, fields } => match self.index.get(&id).copied() {
                Some(i) => {
                    let record = &mut self.records[i];
                    for (name, value) in fields {
                        record.fields.insert(name, value);
                    }
                    if let Some(p) = self.projector.as_deref() {
                        record.projected = p.project(&record.fields);
                    }
                    counter!("store_mutations_total", 1u64, "kind" => "update");
                }
                None => {
                    debug!(id = %id, "update target missing; no-op");
                    counter!("store_mutations_noop_total", 1u64, "kind" => "update");
                }
            },
            Mutation::Delete { id } => match self.index.remove(&id) {
                Some(i) => {
                    self.records.remove(i);
                    self.rebuild_index();
                    counter!("store_mutations_total", 1u64, "kind" => "delete");
                }
                None => {
                    debug!(id = %id, "delete target missing; no-op");
                    counter!("store_mutations_noop_total", 1u64, "kind" => "delete");
                }
            },
        }
        self.bump();
    }

    /// Freeze the current state into an immutable snapshot.
    pub fn freeze(&self) -> Arc<TableSnapshot> {
        Arc::new(TableSnapshot { epoch: self.epoch, records: self.records.clone() })
    }

    /// Freeze and swap the shared snapshot read by [`StoreHandle`]s.
    pub fn publish(&self) -> Arc<TableSnapshot> {
        let next = self.freeze();
        self.snap.store(Arc::clone(&next));
        gauge!("store_records", self.records.len() as f64);
        next
    }

    pub fn handle(&self) -> StoreHandle {
        StoreHandle { snap: Arc::clone(&self.snap) }
    }

    fn bump(&mut self) {
        self.epoch = self.epoch.saturating_add(1);
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, r) in self.records.iter().enumerate() {
            self.index.insert(r.id.clone(), i);
        }
    }

    fn fresh_id(&self) -> RecordId {
        // v4 collisions are vanishingly unlikely; the loop keeps the
        // must-not-collide contract airtight against seeded ids.
        loop {
            let id = Uuid::new_v4().to_string();
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheap, cloneable read handle over the store's latest published snapshot.
#[derive(Clone)]
pub struct StoreHandle {
    snap: Arc<ArcSwap<TableSnapshot>>,
}

impl StoreHandle {
    pub fn current(&self) -> Arc<TableSnapshot> {
        self.snap.load_full()
    }
}

/// Convenience constructor used by seeds and tests.
pub fn record(id: &str, fields: Fields) -> Record {
    Record::new(id, fields)
}
