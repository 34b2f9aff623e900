#![forbid(unsafe_code)]

//! Wire vocabulary: outbound backend events and inbound frontend commands.
//!
//! Outbound messages never carry a raw component reference, the host-internal
//! `kind` tag, or the updater capability itself: only identifiers, a derived
//! `canUpdate` boolean, and wire-safe JSON. All field names are camelCase
//! because that is the frontend's vocabulary.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::identity::Identifier;
use crate::node::{Handle, MutationKind, NativeNode, NodeSnapshot};
use crate::path::{PathKey, parse_path};

/// Sanitized outbound projection of a [`NodeSnapshot`].
///
/// `children` are rewritten to identifiers; the host-internal type tag and
/// the updater record are stripped, leaving only `canUpdate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireNode {
    /// Registry identifier for the component.
    pub id: Identifier,
    /// Display name, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Component state, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
    /// Component props, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<Value>,
    /// Component context, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    /// Whether mutation commands can target this node.
    pub can_update: bool,
    /// Children rewritten as identifiers, in host order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Identifier>>,
}

impl WireNode {
    /// Project `snapshot` onto the wire, resolving each child through
    /// `resolve` (normally the identity registry).
    pub fn from_snapshot(
        id: Identifier,
        snapshot: &NodeSnapshot,
        mut resolve: impl FnMut(&Handle) -> Identifier,
    ) -> Self {
        Self {
            id,
            name: snapshot.name.clone(),
            state: snapshot.state.clone(),
            props: snapshot.props.clone(),
            context: snapshot.context.clone(),
            can_update: snapshot.updater.can_update(),
            children: snapshot
                .children
                .as_ref()
                .map(|children| children.iter().map(&mut resolve).collect()),
        }
    }
}

/// Host capability probe, replied to `requestCapabilities`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostCapabilities {
    /// Host can scroll a native node into view.
    pub scroll_into_view: bool,
    /// Host exposes a DOM-like native node tree.
    pub dom: bool,
}

/// Outbound event vocabulary (backend → downstream).
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// A top-level tree was mounted.
    Root(Identifier),
    /// A component mounted; payload is the sanitized snapshot.
    Mount(WireNode),
    /// A component updated; payload is the sanitized snapshot.
    Update(WireNode),
    /// A component unmounted; its identifier is still valid to forward but
    /// resolves to nothing afterward.
    Unmount(Identifier),
    /// Selection changed. `quiet` suppresses frontend-side focus churn.
    SetSelection { id: Identifier, quiet: bool },
    /// Highlight one node in the host UI.
    Highlight {
        node: NativeNode,
        name: Option<String>,
        props: Option<Value>,
    },
    /// Highlight a batch of nodes; never emitted empty.
    HighlightMany(Vec<NativeNode>),
    /// Clear any highlight.
    HideHighlight,
    /// The backend is shutting down.
    Shutdown,
    /// The channel binder finished wiring.
    Connected,
    /// Reply to `requestCapabilities`.
    Capabilities(HostCapabilities),
}

impl BackendEvent {
    /// Channel event name for this message.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Root(_) => "root",
            Self::Mount(_) => "mount",
            Self::Update(_) => "update",
            Self::Unmount(_) => "unmount",
            Self::SetSelection { .. } => "setSelection",
            Self::Highlight { .. } => "highlight",
            Self::HighlightMany(_) => "highlightMany",
            Self::HideHighlight => "hideHighlight",
            Self::Shutdown => "shutdown",
            Self::Connected => "connected",
            Self::Capabilities(_) => "capabilities",
        }
    }

    /// JSON payload for the channel. Events with no payload send `null`.
    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::Root(id) | Self::Unmount(id) => {
                serde_json::to_value(id).unwrap_or(Value::Null)
            }
            Self::Mount(node) | Self::Update(node) => {
                serde_json::to_value(node).unwrap_or(Value::Null)
            }
            Self::SetSelection { id, quiet } => {
                serde_json::json!({ "id": id, "quiet": quiet })
            }
            Self::Highlight { node, name, props } => {
                serde_json::json!({ "node": node, "name": name, "props": props })
            }
            Self::HighlightMany(nodes) => serde_json::to_value(nodes).unwrap_or(Value::Null),
            Self::HideHighlight | Self::Shutdown | Self::Connected => Value::Null,
            Self::Capabilities(caps) => serde_json::to_value(caps).unwrap_or(Value::Null),
        }
    }
}

/// `makeGlobal` target path.
///
/// The inbound `path` parameter is one JSON value that is either the literal
/// string `"instance"` (a sentinel for the updater's public instance) or an
/// array of keys whose first element selects the state/props/context field.
/// The string/sequence conflation is the host protocol's; it is decoded, not
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalPath {
    /// The literal `"instance"` sentinel.
    Instance,
    /// Field selector plus traversal keys.
    Keys(Vec<PathKey>),
}

/// Inbound command vocabulary (downstream → backend).
#[derive(Debug, Clone, PartialEq)]
pub enum InboundCommand {
    /// Write `value` at `path` inside the named snapshot field and trigger a
    /// host re-render.
    Mutate {
        kind: MutationKind,
        id: Identifier,
        path: Vec<PathKey>,
        value: Value,
    },
    /// Publish a value from the snapshot to the diagnostic sink.
    MakeGlobal { id: Identifier, path: GlobalPath },
    /// Highlight one component.
    Highlight(Identifier),
    /// Highlight a batch of components.
    HighlightMany(Vec<Identifier>),
    /// Clear any highlight.
    HideHighlight,
    /// The frontend selected a component.
    Selected(Identifier),
    /// Tear the backend down.
    Shutdown,
    /// Ask for the host capability descriptor.
    RequestCapabilities,
    /// Scroll a component's native node into view, then highlight it.
    ScrollToNode(Identifier),
    /// Host-diagnostic: select starting from a native node.
    PutSelectedNode(NativeNode),
    /// Host-diagnostic: poll the host's observed selection (dedup applies).
    CheckSelection,
}

/// Why an inbound message could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The event name is not part of the inbound vocabulary.
    #[error("unknown command: {name}")]
    UnknownCommand { name: String },

    /// The payload did not deserialize into the command's shape.
    #[error("malformed {command} payload: {source}")]
    BadPayload {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The payload's `path` was neither a key array nor a valid sentinel.
    #[error("malformed {command} path")]
    BadPath { command: &'static str },
}

#[derive(Deserialize)]
struct MutatePayload {
    id: Identifier,
    path: Value,
    value: Value,
}

#[derive(Deserialize)]
struct MakeGlobalPayload {
    id: Identifier,
    path: Value,
}

impl InboundCommand {
    /// Every inbound command name, for channel handler registration.
    pub const NAMES: [&'static str; 13] = [
        "setState",
        "setProps",
        "setContext",
        "makeGlobal",
        "highlight",
        "highlightMany",
        "hideHighlight",
        "selected",
        "shutdown",
        "requestCapabilities",
        "scrollToNode",
        "putSelectedNode",
        "checkSelection",
    ];

    /// Decode a raw channel message into a command.
    pub fn parse(name: &str, payload: Value) -> Result<Self, DecodeError> {
        match name {
            "setState" => Self::parse_mutation("setState", MutationKind::State, payload),
            "setProps" => Self::parse_mutation("setProps", MutationKind::Props, payload),
            "setContext" => Self::parse_mutation("setContext", MutationKind::Context, payload),
            "makeGlobal" => {
                let raw: MakeGlobalPayload = decode("makeGlobal", payload)?;
                let path = match &raw.path {
                    Value::String(s) if s == "instance" => GlobalPath::Instance,
                    other => GlobalPath::Keys(
                        parse_path(other).ok_or(DecodeError::BadPath {
                            command: "makeGlobal",
                        })?,
                    ),
                };
                Ok(Self::MakeGlobal { id: raw.id, path })
            }
            "highlight" => Ok(Self::Highlight(decode("highlight", payload)?)),
            "highlightMany" => Ok(Self::HighlightMany(decode("highlightMany", payload)?)),
            "hideHighlight" => Ok(Self::HideHighlight),
            "selected" => Ok(Self::Selected(decode("selected", payload)?)),
            "shutdown" => Ok(Self::Shutdown),
            "requestCapabilities" => Ok(Self::RequestCapabilities),
            "scrollToNode" => Ok(Self::ScrollToNode(decode("scrollToNode", payload)?)),
            "putSelectedNode" => Ok(Self::PutSelectedNode(decode("putSelectedNode", payload)?)),
            "checkSelection" => Ok(Self::CheckSelection),
            _ => Err(DecodeError::UnknownCommand {
                name: name.to_owned(),
            }),
        }
    }

    fn parse_mutation(
        command: &'static str,
        kind: MutationKind,
        payload: Value,
    ) -> Result<Self, DecodeError> {
        let raw: MutatePayload = decode(command, payload)?;
        let path = parse_path(&raw.path).ok_or(DecodeError::BadPath { command })?;
        Ok(Self::Mutate {
            kind,
            id: raw.id,
            path,
            value: raw.value,
        })
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    command: &'static str,
    payload: Value,
) -> Result<T, DecodeError> {
    serde_json::from_value(payload).map_err(|source| DecodeError::BadPayload { command, source })
}
