//! Shape repository: the sole owner of canonical shape state.
//!
//! `ShapeStore` keeps an insertion-ordered id list alongside an id→shape map.
//! Every write re-runs shape canonicalization (coordinate clamping, minimum
//! dimensions, closed-point coincidence), so readers can trust invariants
//! without re-checking. Callers treat returned shapes as immutable
//! snapshots; nothing else mutates them. Unknown ids are no-ops or `None`,
//! never errors.
//!
//! Gesture cancellation runs through [`Transaction`]: sessions snapshot the
//! shapes they are about to touch, then either `commit` (drop the snapshot)
//! or `rollback` (restore the exact pre-gesture state, deleting any shapes
//! created inside the transaction).

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::HashMap;

use crate::shape::{Shape, ShapeId};

/// In-memory, insertion-ordered store of shapes.
#[derive(Debug, Default)]
pub struct ShapeStore {
    order: Vec<ShapeId>,
    shapes: HashMap<ShapeId, Shape>,
}

impl ShapeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered snapshot of all shapes (insertion order = z-order, first is
    /// bottom-most).
    #[must_use]
    pub fn list(&self) -> Vec<&Shape> {
        self.order.iter().filter_map(|id| self.shapes.get(id)).collect()
    }

    /// Ordered snapshot of all shape ids.
    #[must_use]
    pub fn ids(&self) -> &[ShapeId] {
        &self.order
    }

    /// Look up a shape by id.
    #[must_use]
    pub fn read(&self, id: &str) -> Option<&Shape> {
        self.shapes.get(id)
    }

    /// Insert or replace a shape, canonicalizing it first. New ids append to
    /// the z-order; existing ids keep their position.
    pub fn write(&mut self, mut shape: Shape) {
        shape.canonicalize();
        if !self.shapes.contains_key(&shape.id) {
            self.order.push(shape.id.clone());
        }
        self.shapes.insert(shape.id.clone(), shape);
    }

    /// Remove a shape by id, returning it if present.
    pub fn remove(&mut self, id: &str) -> Option<Shape> {
        let removed = self.shapes.remove(id);
        if removed.is_some() {
            self.order.retain(|o| o != id);
        }
        removed
    }

    /// Remove every shape.
    pub fn clear(&mut self) {
        self.order.clear();
        self.shapes.clear();
    }

    /// Number of shapes in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the store contains no shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // ── Z-order ─────────────────────────────────────────────────

    /// Move a shape to the top of the z-order.
    pub fn bring_to_front(&mut self, id: &str) {
        if let Some(pos) = self.order.iter().position(|o| o == id) {
            let id = self.order.remove(pos);
            self.order.push(id);
        }
    }

    /// Move a shape to the bottom of the z-order.
    pub fn send_to_back(&mut self, id: &str) {
        if let Some(pos) = self.order.iter().position(|o| o == id) {
            let id = self.order.remove(pos);
            self.order.insert(0, id);
        }
    }

    /// Swap a shape one step toward the top.
    pub fn raise(&mut self, id: &str) {
        if let Some(pos) = self.order.iter().position(|o| o == id) {
            if pos + 1 < self.order.len() {
                self.order.swap(pos, pos + 1);
            }
        }
    }

    /// Swap a shape one step toward the bottom.
    pub fn lower(&mut self, id: &str) {
        if let Some(pos) = self.order.iter().position(|o| o == id) {
            if pos > 0 {
                self.order.swap(pos, pos - 1);
            }
        }
    }

    // ── Transactions ────────────────────────────────────────────

    /// Begin a transaction over the given shapes, snapshotting their current
    /// state. Ids not present in the store are recorded as created-if-seen:
    /// rollback deletes them if they exist by then.
    #[must_use]
    pub fn begin<'a, I>(&self, ids: I) -> Transaction
    where
        I: IntoIterator<Item = &'a ShapeId>,
    {
        let mut saved = Vec::new();
        let mut created = Vec::new();
        for id in ids {
            match self.shapes.get(id) {
                Some(shape) => saved.push(shape.clone()),
                None => created.push(id.clone()),
            }
        }
        Transaction { saved, created }
    }
}

/// Snapshot of the shapes a session is about to mutate.
///
/// Dropping a transaction without calling [`Transaction::rollback`] behaves
/// like a commit: the snapshot is simply discarded.
#[derive(Debug, Clone)]
pub struct Transaction {
    saved: Vec<Shape>,
    created: Vec<ShapeId>,
}

impl Transaction {
    /// Ids of the shapes captured in this transaction.
    #[must_use]
    pub fn ids(&self) -> Vec<ShapeId> {
        self.saved
            .iter()
            .map(|s| s.id.clone())
            .chain(self.created.iter().cloned())
            .collect()
    }

    /// Snapshot of a single shape captured at begin time.
    #[must_use]
    pub fn snapshot(&self, id: &str) -> Option<&Shape> {
        self.saved.iter().find(|s| s.id == id)
    }

    /// All captured shape snapshots.
    #[must_use]
    pub fn snapshots(&self) -> &[Shape] {
        &self.saved
    }

    /// Keep the current store state; the snapshot is discarded.
    pub fn commit(self) {}

    /// Restore every captured shape to its exact snapshot and delete shapes
    /// that were created after the transaction began.
    pub fn rollback(self, store: &mut ShapeStore) {
        for shape in self.saved {
            store.write(shape);
        }
        for id in &self.created {
            store.remove(id);
        }
    }
}
