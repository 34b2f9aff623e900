#![forbid(unsafe_code)]

//! Snapshot store and root set.
//!
//! [`NodeStore`] maps identifiers to the last known complete snapshot of a
//! component. Every record is a full overwrite; mount/update notifications
//! supply whole snapshots, never patches. [`RootSet`] tracks the identifiers
//! of independently-mounted trees; membership is only added on root mount and
//! removed on unmount of that exact identifier.

use ahash::{AHashMap, AHashSet};

use crate::identity::Identifier;
use crate::node::NodeSnapshot;

/// Identifier → last known snapshot.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: AHashMap<Identifier, NodeSnapshot>,
}

impl NodeStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite any prior snapshot for `id`.
    pub fn record(&mut self, id: Identifier, snapshot: NodeSnapshot) {
        self.nodes.insert(id, snapshot);
    }

    /// The last recorded snapshot for `id`.
    #[must_use]
    pub fn get(&self, id: &Identifier) -> Option<&NodeSnapshot> {
        self.nodes.get(id)
    }

    /// Mutable access for in-place mutation commands.
    pub fn get_mut(&mut self, id: &Identifier) -> Option<&mut NodeSnapshot> {
        self.nodes.get_mut(id)
    }

    /// Drop the snapshot for `id`, if present.
    pub fn remove(&mut self, id: &Identifier) -> Option<NodeSnapshot> {
        self.nodes.remove(id)
    }

    /// Whether a snapshot exists for `id`.
    #[must_use]
    pub fn contains(&self, id: &Identifier) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of tracked snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Identifiers of top-level mounted trees.
#[derive(Debug, Default)]
pub struct RootSet {
    roots: AHashSet<Identifier>,
}

impl RootSet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as a root. Returns `false` if it already was one.
    pub fn add(&mut self, id: Identifier) -> bool {
        self.roots.insert(id)
    }

    /// Remove `id` on unmount. Returns `true` if it was a root.
    pub fn remove(&mut self, id: &Identifier) -> bool {
        self.roots.remove(id)
    }

    /// Whether `id` is a root.
    #[must_use]
    pub fn contains(&self, id: &Identifier) -> bool {
        self.roots.contains(id)
    }

    /// Iterate the current roots (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        self.roots.iter()
    }

    /// Number of roots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether there are no roots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
