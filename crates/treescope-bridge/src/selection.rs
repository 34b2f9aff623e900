#![forbid(unsafe_code)]

//! Selection dedup state machine.
//!
//! The host-side selection probe fires more often than the selection actually
//! changes, so the backend is poked with "check selection" ticks at an
//! implementation-defined interval. This tracker decides when a tick should
//! turn into a real selection message: only when the observed node changed
//! since the previous tick *and* differs from the last selection actually
//! sent downstream (or fed back by the frontend).
//!
//! Pure data/logic, deterministic for fixed inputs, no I/O.
//!
//! # Invariants
//!
//! 1. `observe` returns a node at most once per observed change.
//! 2. Two consecutive `observe` calls with equal input never both fire.
//! 3. After `record_sent(node, ..)`, observing that same node stays silent.

use treescope_core::identity::Identifier;
use treescope_core::node::NativeNode;

/// Tracks the observed and downstream-visible selection across polling ticks.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    /// What the host probe reported on the previous tick.
    previous_observed: Option<NativeNode>,
    /// Native node of the last selection sent or acknowledged downstream.
    last_sent_node: Option<NativeNode>,
    /// Identifier of the last selection sent or acknowledged downstream.
    last_sent_id: Option<Identifier>,
}

impl SelectionTracker {
    /// Fresh tracker with no remembered selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one polling tick. Returns the node to select downstream, or
    /// `None` when the tick is redundant.
    pub fn observe(&mut self, observed: Option<NativeNode>) -> Option<NativeNode> {
        if observed == self.previous_observed {
            return None;
        }
        self.previous_observed = observed;
        match observed {
            Some(node) if self.last_sent_node != Some(node) => Some(node),
            _ => None,
        }
    }

    /// Record a selection that was sent downstream (or reported back by the
    /// frontend), so later ticks observing it stay silent.
    pub fn record_sent(&mut self, node: Option<NativeNode>, id: Identifier) {
        self.last_sent_node = node;
        self.last_sent_id = Some(id);
    }

    /// Identifier of the remembered selection, if any.
    #[must_use]
    pub fn selected_id(&self) -> Option<&Identifier> {
        self.last_sent_id.as_ref()
    }

    /// Drop the remembered selection if it belongs to `id` (called on that
    /// identifier's unmount). Returns whether anything was cleared.
    ///
    /// Also forgets the previous observation so a later re-selection of the
    /// same native node fires again instead of being deduplicated away.
    pub fn clear_unmounted(&mut self, id: &Identifier) -> bool {
        if self.last_sent_id.as_ref() != Some(id) {
            return false;
        }
        self.previous_observed = None;
        self.last_sent_node = None;
        self.last_sent_id = None;
        true
    }
}
