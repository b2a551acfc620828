use crate::connection::InboundHandler;
use crate::device_registry::DeviceStore;
use crate::discovery::DiscoveryState;
use crate::inbound::message::InboundMessage;
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, instrument, trace};

/// Routes decoded hub messages to the registry and the discovery state.
#[derive(Debug, Clone)]
pub struct InboundDispatcher {
    devices: DeviceStore,
    discovery: DiscoveryState,
}

impl InboundDispatcher {
    pub fn new(devices: DeviceStore, discovery: DiscoveryState) -> Self {
        InboundDispatcher { devices, discovery }
    }

    pub fn handler(&self) -> InboundHandler {
        let dispatcher = self.clone();
        Arc::new(move |message: Value| dispatcher.dispatch(&message))
    }

    /// Never fails: undecodable messages and panicking listeners are logged and dropped so the stream keeps flowing.
    #[instrument(skip_all)]
    pub fn dispatch(&self, message: &Value) {
        match panic::catch_unwind(AssertUnwindSafe(|| self.route(message))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(payload = %message, "❌ Failed to parse message: {}", e),
            Err(panic) => error!(payload = %message, "❌ Handling message panicked: {}", panic_message(&*panic)),
        }
    }

    fn route(&self, message: &Value) -> Result<(), serde_json::Error> {
        match InboundMessage::from_value(message)? {
            InboundMessage::DeviceList(list) => self.discovery.announce(list.number_of_devices),
            InboundMessage::DeviceFound(found) => self.devices.upsert(&found.uuid, &found.name, found.state),
            InboundMessage::Event(event) => {
                self.devices.update_state(&event.target, event.state);
            }
            InboundMessage::Ping => trace!("Received ping"),
            InboundMessage::Unknown(message_type) => debug!(message_type = %message_type, "Ignoring message"),
        }

        Ok(())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
