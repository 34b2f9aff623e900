#![forbid(unsafe_code)]

//! Stable identifiers for otherwise-unstable component references.
//!
//! The registry owns the identifier lifecycle: the first observation of a
//! [`ComponentHandle`] mints a process-unique [`Identifier`]; repeated
//! observations return the same one until [`forget`](IdentityRegistry::forget)
//! is called; a forgotten handle re-registers under a *fresh* identifier,
//! never a recycled one. Identifiers are the sole cross-boundary reference,
//! so collision-freedom is a correctness requirement; minting draws from a
//! process-wide monotonic counter.
//!
//! The original host tracked the handle→id direction with a weak map; here
//! both directions are explicit inverse maps and `forget` is invoked
//! deterministically on unmount.
//!
//! # Invariants
//!
//! 1. `by_handle` and `by_id` are mutual inverses at all times.
//! 2. Two concurrently tracked handles never share an identifier.
//! 3. A minted identifier is never re-minted, even after `forget`.

use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::node::{ComponentHandle, Handle};

static NEXT_IDENTIFIER: AtomicU64 = AtomicU64::new(1);

fn next_identifier() -> Identifier {
    Identifier(format!(".{}", NEXT_IDENTIFIER.fetch_add(1, Ordering::Relaxed)))
}

/// Process-unique string key substituting for a [`ComponentHandle`] across
/// the transport boundary.
///
/// Minted identifiers are `.`-prefixed counter values; primitive leaves pass
/// their own content through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// String view (for channel `forget` calls and logging).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Identifier {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for Identifier {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

/// Bidirectional handle↔identifier registry.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    by_handle: AHashMap<ComponentHandle, Identifier>,
    by_id: AHashMap<Identifier, ComponentHandle>,
}

impl IdentityRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier for `handle`, minting and recording one on first sight.
    ///
    /// Primitive leaves are self-identifying and never tracked: their content
    /// is returned unchanged.
    pub fn identifier_for(&mut self, handle: &Handle) -> Identifier {
        match handle {
            Handle::Text(text) => Identifier(text.clone()),
            Handle::Component(component) => {
                if let Some(id) = self.by_handle.get(component) {
                    return id.clone();
                }
                let id = next_identifier();
                self.by_handle.insert(*component, id.clone());
                self.by_id.insert(id.clone(), *component);
                id
            }
        }
    }

    /// Existing identifier for `handle`, without minting.
    #[must_use]
    pub fn identifier_of(&self, handle: ComponentHandle) -> Option<&Identifier> {
        self.by_handle.get(&handle)
    }

    /// The tracked handle behind `id`, if any.
    #[must_use]
    pub fn handle_for(&self, id: &Identifier) -> Option<ComponentHandle> {
        self.by_id.get(id).copied()
    }

    /// Whether `id` currently resolves to a tracked handle.
    #[must_use]
    pub fn is_tracked(&self, id: &Identifier) -> bool {
        self.by_id.contains_key(id)
    }

    /// Drop both directions of the association for `handle`.
    ///
    /// Returns the identifier that was bound, if any. A later
    /// [`identifier_for`](Self::identifier_for) on an equal handle mints a
    /// new, different identifier.
    pub fn forget(&mut self, handle: ComponentHandle) -> Option<Identifier> {
        let id = self.by_handle.remove(&handle)?;
        self.by_id.remove(&id);
        Some(id)
    }

    /// Number of tracked handles.
    #[must_use]
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.by_handle.len(), self.by_id.len());
        self.by_handle.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }
}
