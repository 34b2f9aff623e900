#![forbid(unsafe_code)]

//! Capability traits for the injected collaborators.
//!
//! The backend consumes its environment through these seams: a tree adapter
//! that translates between component handles and host-native UI nodes, an
//! abstract bidirectional message channel, and a diagnostic sink that
//! replaces ambient process-wide inspection globals with an explicit
//! `publish` operation.
//!
//! Every operation that needs a collaborator before it has been injected
//! degrades to a logged no-op; none of these is required for the backend's
//! registries to stay consistent.

use serde_json::Value;
use treescope_core::node::{ComponentHandle, NativeNode};

/// External collaborator translating between [`ComponentHandle`]s and
/// host-native UI nodes.
pub trait TreeAdapter {
    /// Host-native node for a tracked component, if it has one.
    fn native_node(&self, handle: ComponentHandle) -> Option<NativeNode>;

    /// Component owning a host-native node, if the adapter can resolve it.
    fn component_handle(&self, node: NativeNode) -> Option<ComponentHandle>;

    /// The host's externally-observed "currently selected" node, polled by
    /// the selection dedup machine.
    fn selected_node(&self) -> Option<NativeNode>;

    /// Bring a native node into view.
    fn scroll_into_view(&self, node: NativeNode);

    /// Release host-side resources on backend shutdown.
    fn teardown(&self);
}

/// Abstract bidirectional message channel.
///
/// The transport is assumed reliable and ordered; the binder forwards
/// outbound events through [`send`](MessageChannel::send) and registers one
/// [`on_receive`](MessageChannel::on_receive) handler per inbound command
/// name.
pub trait MessageChannel {
    /// Send an outbound message. Payload-free events send `Value::Null`.
    fn send(&self, event: &str, payload: Value);

    /// Register a handler for an inbound event name.
    fn on_receive(&self, event: &str, handler: Box<dyn FnMut(Value)>);

    /// Release any per-identifier subscriptions the channel holds; called
    /// after the identifier's unmount message was sent.
    fn forget(&self, id: &str);
}

/// Explicit, injected replacement for ad hoc process-wide inspection slots.
pub trait DiagnosticSink {
    /// Publish `value` under a well-known slot name (`$tmp`, `$r`, …) for
    /// external inspection. Purely diagnostic; never read back by the core.
    fn publish(&self, slot: &str, value: Value);
}
