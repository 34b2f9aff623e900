#![forbid(unsafe_code)]

//! Backend controller and channel binding for the Treescope inspector.
//!
//! Composes the core registries into the identity-tracking and
//! event-normalization engine, and binds it to the injected collaborators:
//! the host tree adapter, the abstract message channel, and the diagnostic
//! sink.

pub mod adapter;
pub mod backend;
pub mod binder;
pub mod selection;

pub use adapter::{DiagnosticSink, MessageChannel, TreeAdapter};
pub use backend::Backend;
pub use binder::ChannelBinder;
pub use selection::SelectionTracker;
