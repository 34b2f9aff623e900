#![forbid(unsafe_code)]

//! Wires the backend's event stream to an abstract message channel.
//!
//! One inbound handler is registered per command name; each parses the raw
//! payload into an [`InboundCommand`] and dispatches it, dropping malformed
//! messages with a warning. Every outbound [`BackendEvent`] is forwarded
//! through `send`, and an `unmount` additionally releases the channel's
//! per-identifier subscriptions via `forget`. The handlers share the backend
//! through `Rc<RefCell<_>>`; the whole pipeline is single-threaded.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;

use treescope_core::event::{BackendEvent, InboundCommand};

use crate::adapter::MessageChannel;
use crate::backend::Backend;

/// Binds a [`Backend`] to a [`MessageChannel`].
pub struct ChannelBinder;

impl ChannelBinder {
    /// Wire both directions and announce `connected`.
    pub fn bind(backend: &Rc<RefCell<Backend>>, channel: &Rc<dyn MessageChannel>) {
        let outbound = Rc::clone(channel);
        backend.borrow_mut().subscribe(move |event| {
            outbound.send(event.name(), event.payload());
            if let BackendEvent::Unmount(id) = event {
                outbound.forget(id.as_str());
            }
        });

        for name in InboundCommand::NAMES {
            let backend = Rc::clone(backend);
            channel.on_receive(
                name,
                Box::new(move |payload| match InboundCommand::parse(name, payload) {
                    Ok(command) => backend.borrow_mut().dispatch(command),
                    Err(error) => {
                        warn!(command = name, %error, "dropping malformed inbound command");
                    }
                }),
            );
        }

        backend.borrow_mut().connected();
    }
}
