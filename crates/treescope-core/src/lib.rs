#![forbid(unsafe_code)]

//! Core: identity tracking, snapshot storage, path access, and the wire
//! vocabulary for the Treescope inspector backend.
//!
//! Pure data and logic: no I/O, no transport, no host integration. The
//! bridge crate composes these pieces into the Backend controller.

pub mod event;
pub mod identity;
pub mod node;
pub mod path;
pub mod store;

pub use event::{BackendEvent, DecodeError, GlobalPath, HostCapabilities, InboundCommand, WireNode};
pub use identity::{Identifier, IdentityRegistry};
pub use node::{
    ComponentHandle, Handle, MutationKind, NativeNode, NodeSnapshot, UpdateCapability, Updater,
};
pub use path::{PathError, PathKey, get_in, parse_path, set_in};
pub use store::{NodeStore, RootSet};
