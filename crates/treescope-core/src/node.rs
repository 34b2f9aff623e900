#![forbid(unsafe_code)]

//! Component handles, node snapshots, and the per-node update capability.
//!
//! A [`ComponentHandle`] is a host-owned opaque token for one live instance in
//! the observed tree. The core never fabricates handles and never compares
//! them by anything but token identity; the host mints them and reports them
//! through lifecycle notifications.
//!
//! A [`NodeSnapshot`] is the core's cached description of a component. Every
//! mount/update notification supplies a *complete* snapshot; there are no
//! patch/merge semantics anywhere in this layer.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Host-owned opaque token for a live component instance.
///
/// Compared by token identity only. The host guarantees that two distinct
/// live instances never share a token and that a token is not re-minted
/// while its instance is still mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentHandle(u64);

impl ComponentHandle {
    /// Wrap a host-assigned token.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw host token (for logging/diagnostics).
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Host-native UI node token (a DOM element, a view object, …).
///
/// Opaque to the core; only the tree adapter can translate between these and
/// [`ComponentHandle`]s. Serializable because highlight events carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NativeNode(u64);

impl NativeNode {
    /// Wrap a host-assigned native node token.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw host token.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// What a lifecycle notification references a tree member by.
///
/// Composite components are referenced by their [`ComponentHandle`] and get a
/// registry-minted identifier. Primitive leaves (text nodes) are
/// self-identifying: their content *is* their identifier and the registry
/// never tracks them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Handle {
    /// A tracked component instance.
    Component(ComponentHandle),
    /// A primitive leaf value, identified by its own content.
    Text(String),
}

/// Per-instance contract letting the core request a host re-render.
///
/// Completion of [`trigger_update`](Updater::trigger_update) is observed via
/// a later update notification, never via a return value.
pub trait Updater {
    /// Replace the component's state container wholesale.
    fn apply_state(&self, new_state: Value);

    /// Ask the host to re-render this component.
    fn trigger_update(&self);

    /// Reference to the underlying public instance, used only for
    /// diagnostic global-binding, never for identity.
    fn public_instance(&self) -> Value;
}

/// Tagged update capability.
///
/// "Does this component support update" is a variant match, not a field
/// probe: [`Updatable`](UpdateCapability::Updatable) always carries a full
/// [`Updater`].
#[derive(Clone, Default)]
pub enum UpdateCapability {
    /// The component cannot be re-rendered on request.
    #[default]
    ReadOnly,
    /// The component exposes the full update contract.
    Updatable(Rc<dyn Updater>),
}

impl UpdateCapability {
    /// Whether a mutation request can be applied to this node.
    #[must_use]
    pub fn can_update(&self) -> bool {
        matches!(self, Self::Updatable(_))
    }

    /// The updater, if the component is updatable.
    #[must_use]
    pub fn updater(&self) -> Option<&Rc<dyn Updater>> {
        match self {
            Self::ReadOnly => None,
            Self::Updatable(updater) => Some(updater),
        }
    }
}

impl fmt::Debug for UpdateCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => f.write_str("ReadOnly"),
            Self::Updatable(_) => f.write_str("Updatable(..)"),
        }
    }
}

/// Which snapshot field a mutation command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// `props` field.
    Props,
    /// `state` field.
    State,
    /// `context` field.
    Context,
}

impl MutationKind {
    /// Lowercase field name (for logging and wire payloads).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Props => "props",
            Self::State => "state",
            Self::Context => "context",
        }
    }
}

/// The last known description of a component, as supplied by the host.
///
/// `kind` is the host's internal tag and never leaves the process; outbound
/// messages carry only the sanitized [`WireNode`](crate::event::WireNode)
/// projection of this.
#[derive(Debug, Clone, Default)]
pub struct NodeSnapshot {
    /// Display name, if the host knows one.
    pub name: Option<String>,
    /// Host-internal type tag. Never serialized outward.
    pub kind: Option<String>,
    /// Component state, if any.
    pub state: Option<Value>,
    /// Component props, if any.
    pub props: Option<Value>,
    /// Component context, if any.
    pub context: Option<Value>,
    /// Children as reported by the host, in order.
    pub children: Option<Vec<Handle>>,
    /// Update capability for this instance.
    pub updater: UpdateCapability,
}

impl NodeSnapshot {
    /// The field a mutation of `kind` writes into.
    pub fn field_mut(&mut self, kind: MutationKind) -> &mut Option<Value> {
        match kind {
            MutationKind::Props => &mut self.props,
            MutationKind::State => &mut self.state,
            MutationKind::Context => &mut self.context,
        }
    }

    /// Read-only view of the field a mutation of `kind` targets.
    #[must_use]
    pub fn field(&self, kind: MutationKind) -> Option<&Value> {
        match kind {
            MutationKind::Props => self.props.as_ref(),
            MutationKind::State => self.state.as_ref(),
            MutationKind::Context => self.context.as_ref(),
        }
    }
}
