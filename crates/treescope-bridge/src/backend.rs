#![forbid(unsafe_code)]

//! The Backend controller: identity tracking and event normalization.
//!
//! Translates raw host lifecycle notifications and frontend mutation
//! commands into each other's vocabulary. Host callbacks flow through the
//! identity registry (assign/resolve identifier) and the node store (record
//! the full snapshot) before a sanitized [`BackendEvent`] is handed to the
//! subscribers; inbound commands mutate stored snapshots via the path
//! accessor and re-trigger the host's update capability.
//!
//! Everything runs synchronously in the caller's turn on a single thread.
//! No failed operation is fatal: missing capabilities, unresolved
//! references, malformed paths, and uninjected collaborators each degrade to
//! a logged no-op that leaves every registry consistent.
//!
//! # Invariants
//!
//! 1. Store, root set, and registry membership agree for every tracked
//!    component.
//! 2. Unmount removes the snapshot and root entry *before* emitting, and
//!    forgets the handle *after* emitting, so the emitted identifier is
//!    still valid to forward but resolves to nothing afterward.
//! 3. An update for an identifier no longer tracked is dropped; the
//!    frontend never sees an `update` after the matching `unmount`.

use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, trace, warn};

use treescope_core::event::{BackendEvent, GlobalPath, HostCapabilities, InboundCommand, WireNode};
use treescope_core::identity::{Identifier, IdentityRegistry};
use treescope_core::node::{ComponentHandle, Handle, MutationKind, NativeNode, NodeSnapshot};
use treescope_core::path::{PathKey, get_in, set_in};
use treescope_core::store::{NodeStore, RootSet};

use crate::adapter::{DiagnosticSink, TreeAdapter};
use crate::selection::SelectionTracker;

/// The identity-tracking and event-normalization engine.
pub struct Backend {
    registry: IdentityRegistry,
    store: NodeStore,
    roots: RootSet,
    tracker: SelectionTracker,
    adapter: Option<Rc<dyn TreeAdapter>>,
    diagnostics: Option<Rc<dyn DiagnosticSink>>,
    capabilities: HostCapabilities,
    subscribers: Vec<Box<dyn FnMut(&BackendEvent)>>,
}

impl Backend {
    /// Backend with no collaborators injected yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: IdentityRegistry::new(),
            store: NodeStore::new(),
            roots: RootSet::new(),
            tracker: SelectionTracker::new(),
            adapter: None,
            diagnostics: None,
            capabilities: HostCapabilities::default(),
            subscribers: Vec::new(),
        }
    }

    /// Inject the host tree adapter.
    pub fn set_tree_adapter(&mut self, adapter: Rc<dyn TreeAdapter>) {
        self.adapter = Some(adapter);
    }

    /// Inject the diagnostic sink.
    pub fn set_diagnostic_sink(&mut self, sink: Rc<dyn DiagnosticSink>) {
        self.diagnostics = Some(sink);
    }

    /// Declare the host capability probe result.
    pub fn set_capabilities(&mut self, capabilities: HostCapabilities) {
        self.capabilities = capabilities;
    }

    /// Subscribe to the backend's outbound event stream.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&BackendEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Current root identifiers.
    #[must_use]
    pub fn roots(&self) -> &RootSet {
        &self.roots
    }

    /// The snapshot store.
    #[must_use]
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// The identity registry.
    #[must_use]
    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    fn emit(&mut self, event: BackendEvent) {
        trace!(event = event.name(), "emit");
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
    }

    /// Sanitized wire projection of the stored snapshot for `id`.
    fn wire_for(&mut self, id: &Identifier) -> Option<WireNode> {
        let registry = &mut self.registry;
        let snapshot = self.store.get(id)?;
        Some(WireNode::from_snapshot(id.clone(), snapshot, |child| {
            registry.identifier_for(child)
        }))
    }

    // ── Host lifecycle ───────────────────────────────────────────────

    /// A top-level tree mounted under `handle`.
    pub fn on_root(&mut self, handle: ComponentHandle) {
        let id = self.registry.identifier_for(&Handle::Component(handle));
        self.roots.add(id.clone());
        self.emit(BackendEvent::Root(id));
    }

    /// A component mounted; `snapshot` is its complete description.
    pub fn on_mounted(&mut self, handle: ComponentHandle, snapshot: NodeSnapshot) {
        let id = self.registry.identifier_for(&Handle::Component(handle));
        let registry = &mut self.registry;
        let wire = WireNode::from_snapshot(id.clone(), &snapshot, |child| {
            registry.identifier_for(child)
        });
        self.store.record(id, snapshot);
        self.emit(BackendEvent::Mount(wire));
    }

    /// A component updated; `snapshot` replaces the stored one wholesale.
    ///
    /// Updates for handles no longer tracked (unmounted, or never mounted)
    /// are dropped so `update` can never trail the matching `unmount`.
    pub fn on_updated(&mut self, handle: ComponentHandle, snapshot: NodeSnapshot) {
        let Some(id) = self.registry.identifier_of(handle).cloned() else {
            warn!(handle = handle.raw(), "late update for untracked handle dropped");
            return;
        };
        let registry = &mut self.registry;
        let wire = WireNode::from_snapshot(id.clone(), &snapshot, |child| {
            registry.identifier_for(child)
        });
        self.store.record(id, snapshot);
        self.emit(BackendEvent::Update(wire));
    }

    /// A component unmounted. The identifier is released and never reused.
    pub fn on_unmounted(&mut self, handle: ComponentHandle) {
        let Some(id) = self.registry.identifier_of(handle).cloned() else {
            debug!(handle = handle.raw(), "unmount for untracked handle ignored");
            return;
        };
        self.store.remove(&id);
        self.roots.remove(&id);
        if self.tracker.clear_unmounted(&id) {
            trace!(%id, "remembered selection cleared by unmount");
        }
        self.emit(BackendEvent::Unmount(id));
        self.registry.forget(handle);
    }

    // ── Inbound commands ─────────────────────────────────────────────

    /// Route one decoded inbound command to its operation.
    pub fn dispatch(&mut self, command: InboundCommand) {
        match command {
            InboundCommand::Mutate {
                kind,
                id,
                path,
                value,
            } => self.apply_mutation(kind, id, &path, value),
            InboundCommand::MakeGlobal { id, path } => self.make_global(&id, &path),
            InboundCommand::Highlight(id) => self.highlight(&id),
            InboundCommand::HighlightMany(ids) => self.highlight_many(&ids),
            InboundCommand::HideHighlight => self.hide_highlight(),
            InboundCommand::Selected(id) => self.on_selected(id),
            InboundCommand::Shutdown => self.shutdown(),
            InboundCommand::RequestCapabilities => self.request_capabilities(),
            InboundCommand::ScrollToNode(id) => self.scroll_to_node(id),
            InboundCommand::PutSelectedNode(node) => self.select_from_native_node(node, false),
            InboundCommand::CheckSelection => self.check_selection(),
        }
    }

    /// Write `value` at `path` inside the chosen snapshot field, hand the
    /// mutation to the host's update capability, and re-emit the mutated
    /// snapshot as an `update`.
    pub fn apply_mutation(
        &mut self,
        kind: MutationKind,
        id: Identifier,
        path: &[PathKey],
        value: Value,
    ) {
        let Some(snapshot) = self.store.get_mut(&id) else {
            warn!(%id, kind = kind.as_str(), "mutation for unknown identifier dropped");
            return;
        };
        let Some(updater) = snapshot.updater.updater().cloned() else {
            warn!(%id, kind = kind.as_str(), "mutation rejected: node has no update capability");
            return;
        };
        let Some(target) = snapshot.field_mut(kind).as_mut() else {
            warn!(%id, kind = kind.as_str(), "mutation target field is absent");
            return;
        };
        if let Err(error) = set_in(target, path, value) {
            warn!(%id, kind = kind.as_str(), %error, "mutation path rejected");
            return;
        }
        if kind == MutationKind::State {
            updater.apply_state(target.clone());
        }
        updater.trigger_update();

        if let Some(wire) = self.wire_for(&id) {
            self.emit(BackendEvent::Update(wire));
        }
    }

    /// Publish a snapshot value (or the public instance, for the literal
    /// `instance` sentinel) to the diagnostic sink's `$tmp` slot.
    pub fn make_global(&mut self, id: &Identifier, path: &GlobalPath) {
        let Some(sink) = self.diagnostics.clone() else {
            debug!(%id, "makeGlobal dropped: no diagnostic sink injected");
            return;
        };
        let Some(snapshot) = self.store.get(id) else {
            warn!(%id, "makeGlobal for unknown identifier dropped");
            return;
        };
        let value = match path {
            GlobalPath::Instance => {
                let Some(updater) = snapshot.updater.updater() else {
                    warn!(%id, "makeGlobal(instance) on a node with no update capability");
                    return;
                };
                updater.public_instance()
            }
            GlobalPath::Keys(keys) => {
                let Some((first, rest)) = keys.split_first() else {
                    warn!(%id, "makeGlobal with an empty path dropped");
                    return;
                };
                let field = match first {
                    PathKey::Key(k) => match k.as_str() {
                        "state" => snapshot.state.as_ref(),
                        "props" => snapshot.props.as_ref(),
                        "context" => snapshot.context.as_ref(),
                        _ => None,
                    },
                    PathKey::Index(_) => None,
                };
                let Some(root) = field else {
                    warn!(%id, key = %first, "makeGlobal field selector did not resolve");
                    return;
                };
                let Some(value) = get_in(root, rest) else {
                    warn!(%id, "makeGlobal path did not resolve");
                    return;
                };
                value.clone()
            }
        };
        sink.publish("$tmp", value);
    }

    /// Reply to `requestCapabilities` with the host's capability descriptor.
    pub fn request_capabilities(&mut self) {
        self.emit(BackendEvent::Capabilities(self.capabilities));
    }

    /// Emit `shutdown` and invoke the adapter's teardown, if one was
    /// injected. Further adapter-dependent operations become no-ops.
    pub fn shutdown(&mut self) {
        self.emit(BackendEvent::Shutdown);
        if let Some(adapter) = self.adapter.take() {
            adapter.teardown();
        }
    }

    /// Announce that the channel binding completed.
    pub fn connected(&mut self) {
        self.emit(BackendEvent::Connected);
    }

    // ── Selection and highlight ──────────────────────────────────────

    /// Select starting from a host-native node. No-op when the adapter is
    /// missing or cannot resolve the node.
    pub fn select_from_native_node(&mut self, node: NativeNode, quiet: bool) {
        let Some(adapter) = self.adapter.clone() else {
            debug!("selection dropped: tree adapter not injected");
            return;
        };
        let Some(handle) = adapter.component_handle(node) else {
            debug!(node = node.raw(), "native node did not resolve to a component");
            return;
        };
        let id = self.registry.identifier_for(&Handle::Component(handle));
        self.tracker.record_sent(Some(node), id.clone());
        self.emit(BackendEvent::SetSelection { id, quiet });
    }

    /// Select a component directly by handle.
    pub fn select_from_handle(&mut self, handle: ComponentHandle, quiet: bool) {
        let node = self
            .adapter
            .as_ref()
            .and_then(|adapter| adapter.native_node(handle));
        let id = self.registry.identifier_for(&Handle::Component(handle));
        self.tracker.record_sent(node, id.clone());
        self.emit(BackendEvent::SetSelection { id, quiet });
    }

    /// The frontend reported a selection; remember it for dedup and expose
    /// the public instance on the `$r` diagnostic slot.
    pub fn on_selected(&mut self, id: Identifier) {
        let node = self.registry.handle_for(&id).and_then(|handle| {
            self.adapter
                .as_ref()
                .and_then(|adapter| adapter.native_node(handle))
        });
        self.tracker.record_sent(node, id.clone());

        if let Some(sink) = self.diagnostics.clone()
            && let Some(snapshot) = self.store.get(&id)
            && let Some(updater) = snapshot.updater.updater()
        {
            sink.publish("$r", updater.public_instance());
        }
    }

    /// Emit a highlight for `id`, carrying the native node, display name,
    /// and props. No-op if the snapshot or the native node cannot be found.
    pub fn highlight(&mut self, id: &Identifier) {
        let Some(adapter) = self.adapter.clone() else {
            debug!(%id, "highlight dropped: tree adapter not injected");
            return;
        };
        let Some(node) = self
            .registry
            .handle_for(id)
            .and_then(|handle| adapter.native_node(handle))
        else {
            debug!(%id, "highlight dropped: no native node");
            return;
        };
        let Some(snapshot) = self.store.get(id) else {
            debug!(%id, "highlight dropped: no snapshot");
            return;
        };
        let event = BackendEvent::Highlight {
            node,
            name: snapshot.name.clone(),
            props: snapshot.props.clone(),
        };
        self.emit(event);
    }

    /// Resolve each id to a native node, skip the unresolved, and emit one
    /// batched highlight, only if at least one node resolved.
    pub fn highlight_many(&mut self, ids: &[Identifier]) {
        let Some(adapter) = self.adapter.clone() else {
            debug!("highlightMany dropped: tree adapter not injected");
            return;
        };
        let nodes: Vec<_> = ids
            .iter()
            .filter_map(|id| {
                self.registry
                    .handle_for(id)
                    .and_then(|handle| adapter.native_node(handle))
            })
            .collect();
        if nodes.is_empty() {
            debug!("highlightMany resolved no nodes");
            return;
        }
        self.emit(BackendEvent::HighlightMany(nodes));
    }

    /// Clear any highlight.
    pub fn hide_highlight(&mut self) {
        self.emit(BackendEvent::HideHighlight);
    }

    /// Scroll the component's native node into view, then highlight it.
    pub fn scroll_to_node(&mut self, id: Identifier) {
        let Some(adapter) = self.adapter.clone() else {
            warn!(%id, "scrollToNode dropped: tree adapter not injected");
            return;
        };
        let Some(node) = self
            .registry
            .handle_for(&id)
            .and_then(|handle| adapter.native_node(handle))
        else {
            warn!(%id, "scrollToNode: native node not found");
            return;
        };
        if !self.capabilities.scroll_into_view {
            warn!(%id, "scrollToNode dropped: host lacks scroll-into-view");
            return;
        }
        adapter.scroll_into_view(node);
        self.highlight(&id);
    }

    /// One selection-polling tick: ask the adapter for the host's observed
    /// selection and, if the dedup machine fires, select from it quietly.
    pub fn check_selection(&mut self) {
        let Some(adapter) = self.adapter.clone() else {
            return;
        };
        let observed = adapter.selected_node();
        if let Some(node) = self.tracker.observe(observed) {
            self.select_from_native_node(node, true);
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;
    use treescope_core::node::{NativeNode, UpdateCapability, Updater};

    #[derive(Default)]
    struct RecordingUpdater {
        triggered: Cell<u32>,
        applied: RefCell<Vec<Value>>,
    }

    impl Updater for RecordingUpdater {
        fn apply_state(&self, new_state: Value) {
            self.applied.borrow_mut().push(new_state);
        }
        fn trigger_update(&self) {
            self.triggered.set(self.triggered.get() + 1);
        }
        fn public_instance(&self) -> Value {
            json!({"instanceOf": "Foo"})
        }
    }

    #[derive(Default)]
    struct FakeAdapter {
        nodes: RefCell<HashMap<u64, u64>>,
        selected: Cell<Option<NativeNode>>,
        scrolled: RefCell<Vec<NativeNode>>,
        torn_down: Cell<bool>,
    }

    impl FakeAdapter {
        fn link(&self, handle: ComponentHandle, node: NativeNode) {
            self.nodes.borrow_mut().insert(handle.raw(), node.raw());
        }
    }

    impl TreeAdapter for FakeAdapter {
        fn native_node(&self, handle: ComponentHandle) -> Option<NativeNode> {
            self.nodes
                .borrow()
                .get(&handle.raw())
                .copied()
                .map(NativeNode::new)
        }
        fn component_handle(&self, node: NativeNode) -> Option<ComponentHandle> {
            self.nodes
                .borrow()
                .iter()
                .find(|(_, n)| **n == node.raw())
                .map(|(h, _)| ComponentHandle::new(*h))
        }
        fn selected_node(&self) -> Option<NativeNode> {
            self.selected.get()
        }
        fn scroll_into_view(&self, node: NativeNode) {
            self.scrolled.borrow_mut().push(node);
        }
        fn teardown(&self) {
            self.torn_down.set(true);
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        published: RefCell<Vec<(String, Value)>>,
    }

    impl DiagnosticSink for RecordingSink {
        fn publish(&self, slot: &str, value: Value) {
            self.published.borrow_mut().push((slot.to_owned(), value));
        }
    }

    fn recording_backend() -> (Backend, Rc<RefCell<Vec<BackendEvent>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut backend = Backend::new();
        let sink = Rc::clone(&events);
        backend.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        (backend, events)
    }

    fn updatable_snapshot(name: &str, props: Value) -> (NodeSnapshot, Rc<RecordingUpdater>) {
        let updater = Rc::new(RecordingUpdater::default());
        let snapshot = NodeSnapshot {
            name: Some(name.to_owned()),
            kind: Some("composite".to_owned()),
            props: Some(props),
            updater: UpdateCapability::Updatable(Rc::clone(&updater) as Rc<dyn Updater>),
            ..NodeSnapshot::default()
        };
        (snapshot, updater)
    }

    #[test]
    fn mount_emits_a_sanitized_wire_snapshot() {
        let (mut backend, events) = recording_backend();
        let (snapshot, _) = updatable_snapshot("Foo", json!({"x": 1}));
        backend.on_mounted(ComponentHandle::new(1), snapshot);

        let events = events.borrow();
        let BackendEvent::Mount(node) = &events[0] else {
            panic!("expected mount, got {:?}", events[0]);
        };
        let wire = serde_json::to_value(node).unwrap();
        assert_eq!(wire["name"], json!("Foo"));
        assert_eq!(wire["props"], json!({"x": 1}));
        assert_eq!(wire["canUpdate"], json!(true));
        assert!(wire.get("type").is_none());
        assert!(wire.get("kind").is_none());
        assert!(wire.get("updater").is_none());
    }

    #[test]
    fn mount_rewrites_children_to_identifiers() {
        let (mut backend, events) = recording_backend();
        let child = ComponentHandle::new(2);
        backend.on_mounted(child, NodeSnapshot::default());
        let child_id = backend.registry().identifier_of(child).cloned().unwrap();

        backend.on_mounted(
            ComponentHandle::new(1),
            NodeSnapshot {
                children: Some(vec![Handle::Component(child), Handle::Text("leaf".into())]),
                ..NodeSnapshot::default()
            },
        );

        let events = events.borrow();
        let BackendEvent::Mount(node) = &events[1] else {
            panic!("expected mount");
        };
        assert_eq!(
            node.children,
            Some(vec![child_id, Identifier::from("leaf")])
        );
    }

    #[test]
    fn root_registers_and_emits() {
        let (mut backend, events) = recording_backend();
        backend.on_root(ComponentHandle::new(1));
        let id = backend
            .registry()
            .identifier_of(ComponentHandle::new(1))
            .cloned()
            .unwrap();
        assert!(backend.roots().contains(&id));
        assert_eq!(events.borrow()[0], BackendEvent::Root(id));
    }

    #[test]
    fn unmount_clears_indices_before_emitting_and_forgets_after() {
        let (mut backend, events) = recording_backend();
        let handle = ComponentHandle::new(1);
        backend.on_root(handle);
        backend.on_mounted(handle, NodeSnapshot::default());
        let id = backend.registry().identifier_of(handle).cloned().unwrap();

        backend.on_unmounted(handle);

        assert!(!backend.store().contains(&id));
        assert!(!backend.roots().contains(&id));
        assert!(backend.registry().identifier_of(handle).is_none());
        assert_eq!(events.borrow().last(), Some(&BackendEvent::Unmount(id)));

        // Re-registration mints a fresh identifier.
        backend.on_mounted(handle, NodeSnapshot::default());
        let fresh = backend.registry().identifier_of(handle).cloned().unwrap();
        let events = events.borrow();
        let BackendEvent::Unmount(old) = &events[2] else {
            panic!("expected unmount");
        };
        assert_ne!(&fresh, old);
    }

    #[test]
    fn update_for_untracked_handle_is_dropped() {
        let (mut backend, events) = recording_backend();
        backend.on_updated(ComponentHandle::new(9), NodeSnapshot::default());
        assert!(events.borrow().is_empty());
        assert!(backend.registry().is_empty());
    }

    #[test]
    fn mutation_writes_triggers_and_re_emits() {
        let (mut backend, events) = recording_backend();
        let handle = ComponentHandle::new(1);
        let (snapshot, updater) = updatable_snapshot("Foo", json!({"x": 1}));
        backend.on_mounted(handle, snapshot);
        let id = backend.registry().identifier_of(handle).cloned().unwrap();

        backend.apply_mutation(
            MutationKind::Props,
            id,
            &[PathKey::Key("x".into())],
            json!(5),
        );

        assert_eq!(updater.triggered.get(), 1);
        assert!(updater.applied.borrow().is_empty());
        let events = events.borrow();
        let BackendEvent::Update(node) = events.last().unwrap() else {
            panic!("expected update");
        };
        assert_eq!(node.props, Some(json!({"x": 5})));
    }

    #[test]
    fn state_mutation_hands_the_whole_state_to_apply_state() {
        let (mut backend, _) = recording_backend();
        let handle = ComponentHandle::new(1);
        let (mut snapshot, updater) = updatable_snapshot("Foo", json!({}));
        snapshot.state = Some(json!({"count": 0, "label": "hi"}));
        backend.on_mounted(handle, snapshot);
        let id = backend.registry().identifier_of(handle).cloned().unwrap();

        backend.apply_mutation(
            MutationKind::State,
            id,
            &[PathKey::Key("count".into())],
            json!(3),
        );

        assert_eq!(
            updater.applied.borrow().as_slice(),
            &[json!({"count": 3, "label": "hi"})]
        );
        assert_eq!(updater.triggered.get(), 1);
    }

    #[test]
    fn mutation_without_updater_emits_nothing() {
        let (mut backend, events) = recording_backend();
        let handle = ComponentHandle::new(1);
        backend.on_mounted(
            handle,
            NodeSnapshot {
                props: Some(json!({"x": 1})),
                ..NodeSnapshot::default()
            },
        );
        let id = backend.registry().identifier_of(handle).cloned().unwrap();
        let before = events.borrow().len();

        backend.apply_mutation(
            MutationKind::Props,
            id.clone(),
            &[PathKey::Key("x".into())],
            json!(5),
        );

        assert_eq!(events.borrow().len(), before);
        assert_eq!(
            backend.store().get(&id).unwrap().props,
            Some(json!({"x": 1}))
        );
    }

    #[test]
    fn mutation_through_missing_intermediate_is_a_no_op() {
        let (mut backend, events) = recording_backend();
        let handle = ComponentHandle::new(1);
        let (snapshot, updater) = updatable_snapshot("Foo", json!({"a": {"b": 1}}));
        backend.on_mounted(handle, snapshot);
        let id = backend.registry().identifier_of(handle).cloned().unwrap();
        let before = events.borrow().len();

        backend.apply_mutation(
            MutationKind::Props,
            id.clone(),
            &[PathKey::Key("missing".into()), PathKey::Key("b".into())],
            json!(2),
        );

        assert_eq!(events.borrow().len(), before);
        assert_eq!(updater.triggered.get(), 0);
        assert_eq!(
            backend.store().get(&id).unwrap().props,
            Some(json!({"a": {"b": 1}}))
        );
    }

    #[test]
    fn make_global_publishes_path_values_and_the_instance_sentinel() {
        let (mut backend, _) = recording_backend();
        let sink = Rc::new(RecordingSink::default());
        backend.set_diagnostic_sink(Rc::clone(&sink) as Rc<dyn DiagnosticSink>);

        let handle = ComponentHandle::new(1);
        let (snapshot, _) = updatable_snapshot("Foo", json!({"x": {"y": 7}}));
        backend.on_mounted(handle, snapshot);
        let id = backend.registry().identifier_of(handle).cloned().unwrap();

        backend.make_global(
            &id,
            &GlobalPath::Keys(vec![
                PathKey::Key("props".into()),
                PathKey::Key("x".into()),
                PathKey::Key("y".into()),
            ]),
        );
        backend.make_global(&id, &GlobalPath::Instance);

        let published = sink.published.borrow();
        assert_eq!(published[0], ("$tmp".to_owned(), json!(7)));
        assert_eq!(published[1], ("$tmp".to_owned(), json!({"instanceOf": "Foo"})));
    }

    #[test]
    fn highlight_carries_node_name_and_props() {
        let (mut backend, events) = recording_backend();
        let adapter = Rc::new(FakeAdapter::default());
        backend.set_tree_adapter(Rc::clone(&adapter) as Rc<dyn TreeAdapter>);

        let handle = ComponentHandle::new(1);
        adapter.link(handle, NativeNode::new(100));
        let (snapshot, _) = updatable_snapshot("Foo", json!({"x": 1}));
        backend.on_mounted(handle, snapshot);
        let id = backend.registry().identifier_of(handle).cloned().unwrap();

        backend.highlight(&id);

        assert_eq!(
            events.borrow().last(),
            Some(&BackendEvent::Highlight {
                node: NativeNode::new(100),
                name: Some("Foo".into()),
                props: Some(json!({"x": 1})),
            })
        );
    }

    #[test]
    fn highlight_many_filters_unresolved_nodes() {
        let (mut backend, events) = recording_backend();
        let adapter = Rc::new(FakeAdapter::default());
        backend.set_tree_adapter(Rc::clone(&adapter) as Rc<dyn TreeAdapter>);

        let a = ComponentHandle::new(1);
        let b = ComponentHandle::new(2);
        adapter.link(a, NativeNode::new(100));
        backend.on_mounted(a, NodeSnapshot::default());
        backend.on_mounted(b, NodeSnapshot::default());
        let id_a = backend.registry().identifier_of(a).cloned().unwrap();
        let id_b = backend.registry().identifier_of(b).cloned().unwrap();

        backend.highlight_many(&[id_a, id_b.clone()]);
        assert_eq!(
            events.borrow().last(),
            Some(&BackendEvent::HighlightMany(vec![NativeNode::new(100)]))
        );

        // Nothing resolved: no event at all.
        let before = events.borrow().len();
        backend.highlight_many(&[id_b]);
        assert_eq!(events.borrow().len(), before);
    }

    #[test]
    fn scroll_to_node_scrolls_then_highlights() {
        let (mut backend, events) = recording_backend();
        let adapter = Rc::new(FakeAdapter::default());
        backend.set_tree_adapter(Rc::clone(&adapter) as Rc<dyn TreeAdapter>);
        backend.set_capabilities(HostCapabilities {
            scroll_into_view: true,
            dom: true,
        });

        let handle = ComponentHandle::new(1);
        adapter.link(handle, NativeNode::new(100));
        let (snapshot, _) = updatable_snapshot("Foo", json!({}));
        backend.on_mounted(handle, snapshot);
        let id = backend.registry().identifier_of(handle).cloned().unwrap();

        backend.scroll_to_node(id);

        assert_eq!(adapter.scrolled.borrow().as_slice(), &[NativeNode::new(100)]);
        assert!(matches!(
            events.borrow().last(),
            Some(BackendEvent::Highlight { .. })
        ));
    }

    #[test]
    fn scroll_to_node_without_capability_is_dropped() {
        let (mut backend, events) = recording_backend();
        let adapter = Rc::new(FakeAdapter::default());
        backend.set_tree_adapter(Rc::clone(&adapter) as Rc<dyn TreeAdapter>);

        let handle = ComponentHandle::new(1);
        adapter.link(handle, NativeNode::new(100));
        backend.on_mounted(handle, NodeSnapshot::default());
        let id = backend.registry().identifier_of(handle).cloned().unwrap();
        let before = events.borrow().len();

        backend.scroll_to_node(id);

        assert!(adapter.scrolled.borrow().is_empty());
        assert_eq!(events.borrow().len(), before);
    }

    #[test]
    fn check_selection_dedups_repeated_probes() {
        let (mut backend, events) = recording_backend();
        let adapter = Rc::new(FakeAdapter::default());
        backend.set_tree_adapter(Rc::clone(&adapter) as Rc<dyn TreeAdapter>);

        let handle = ComponentHandle::new(1);
        adapter.link(handle, NativeNode::new(100));
        backend.on_mounted(handle, NodeSnapshot::default());

        adapter.selected.set(Some(NativeNode::new(100)));
        backend.check_selection();
        backend.check_selection();
        backend.check_selection();

        let selections: Vec<_> = events
            .borrow()
            .iter()
            .filter(|e| matches!(e, BackendEvent::SetSelection { .. }))
            .cloned()
            .collect();
        let id = backend.registry().identifier_of(handle).cloned().unwrap();
        assert_eq!(selections, vec![BackendEvent::SetSelection { id, quiet: true }]);
    }

    #[test]
    fn selection_operations_without_adapter_are_no_ops() {
        let (mut backend, events) = recording_backend();
        backend.select_from_native_node(NativeNode::new(1), false);
        backend.check_selection();
        backend.highlight(&Identifier::from(".404"));
        backend.scroll_to_node(Identifier::from(".404"));
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn select_from_handle_emits_and_suppresses_the_next_probe_tick() {
        let (mut backend, events) = recording_backend();
        let adapter = Rc::new(FakeAdapter::default());
        backend.set_tree_adapter(Rc::clone(&adapter) as Rc<dyn TreeAdapter>);

        let handle = ComponentHandle::new(1);
        adapter.link(handle, NativeNode::new(100));
        backend.on_mounted(handle, NodeSnapshot::default());
        let id = backend.registry().identifier_of(handle).cloned().unwrap();

        backend.select_from_handle(handle, false);
        assert_eq!(
            events.borrow().last(),
            Some(&BackendEvent::SetSelection {
                id,
                quiet: false
            })
        );

        // The selection was recorded, so the probe catching up stays silent.
        adapter.selected.set(Some(NativeNode::new(100)));
        let before = events.borrow().len();
        backend.check_selection();
        assert_eq!(events.borrow().len(), before);
    }

    #[test]
    fn select_from_handle_without_adapter_still_selects() {
        let (mut backend, events) = recording_backend();
        let handle = ComponentHandle::new(1);
        backend.on_mounted(handle, NodeSnapshot::default());
        let id = backend.registry().identifier_of(handle).cloned().unwrap();

        backend.select_from_handle(handle, true);

        assert_eq!(
            events.borrow().last(),
            Some(&BackendEvent::SetSelection { id, quiet: true })
        );
    }

    #[test]
    fn selected_feedback_publishes_the_public_instance() {
        let (mut backend, _) = recording_backend();
        let sink = Rc::new(RecordingSink::default());
        backend.set_diagnostic_sink(Rc::clone(&sink) as Rc<dyn DiagnosticSink>);

        let handle = ComponentHandle::new(1);
        let (snapshot, _) = updatable_snapshot("Foo", json!({}));
        backend.on_mounted(handle, snapshot);
        let id = backend.registry().identifier_of(handle).cloned().unwrap();

        backend.on_selected(id);

        assert_eq!(
            sink.published.borrow().as_slice(),
            &[("$r".to_owned(), json!({"instanceOf": "Foo"}))]
        );
    }

    #[test]
    fn selected_feedback_suppresses_the_next_probe_tick() {
        let (mut backend, events) = recording_backend();
        let adapter = Rc::new(FakeAdapter::default());
        backend.set_tree_adapter(Rc::clone(&adapter) as Rc<dyn TreeAdapter>);

        let handle = ComponentHandle::new(1);
        adapter.link(handle, NativeNode::new(100));
        backend.on_mounted(handle, NodeSnapshot::default());
        let id = backend.registry().identifier_of(handle).cloned().unwrap();

        backend.on_selected(id);
        adapter.selected.set(Some(NativeNode::new(100)));
        let before = events.borrow().len();
        backend.check_selection();
        assert_eq!(events.borrow().len(), before);
    }

    #[test]
    fn shutdown_emits_then_tears_down_the_adapter() {
        let (mut backend, events) = recording_backend();
        let adapter = Rc::new(FakeAdapter::default());
        backend.set_tree_adapter(Rc::clone(&adapter) as Rc<dyn TreeAdapter>);

        backend.shutdown();

        assert!(adapter.torn_down.get());
        assert_eq!(events.borrow().last(), Some(&BackendEvent::Shutdown));
    }

    #[test]
    fn request_capabilities_replies_with_the_descriptor() {
        let (mut backend, events) = recording_backend();
        let caps = HostCapabilities {
            scroll_into_view: true,
            dom: false,
        };
        backend.set_capabilities(caps);
        backend.request_capabilities();
        assert_eq!(events.borrow().last(), Some(&BackendEvent::Capabilities(caps)));
    }
}
