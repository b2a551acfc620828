use crate::connection::{ConnectionError, ConnectionManager};
use crate::device_registry::DeviceStore;
use crate::domain::DeviceState;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
pub struct ControlDispatcher {
    devices: DeviceStore,
}

impl ControlDispatcher {
    pub fn new(devices: DeviceStore) -> Self {
        ControlDispatcher { devices }
    }

    /// Sends the new state to the hub. The registry is updated once the connection manager reports completion.
    #[instrument(skip(self, manager))]
    pub async fn control_device(&self, manager: &dyn ConnectionManager, id: &str, state: DeviceState) -> Result<(), ConnectionError> {
        let power = if state.power { "on" } else { "off" };
        info!(device_id = id, dim = ?state.dim, "🟢 Turn {} device '{}'", power, self.devices.get_name(id).unwrap_or_default());

        let devices = self.devices.clone();
        let device_id = id.to_string();
        let completed = Box::new(move || {
            debug!(device_id = %device_id, "🟢 State change completed");
            devices.update_state(&device_id, state);
        });

        manager.send_state_change(id, state, completed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeConnectionManager;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_log::test;

    fn setup() -> (ControlDispatcher, DeviceStore, FakeConnectionManager) {
        let devices = DeviceStore::new();
        devices.upsert("a", "Kitchen", DeviceState::new(false, Some(10)));
        let manager = FakeConnectionManager::new(Arc::new(|_: Value| {}));
        (ControlDispatcher::new(devices.clone()), devices, manager)
    }

    #[test(tokio::test)]
    async fn sends_the_state_change_to_the_connection_manager() -> Result<(), ConnectionError> {
        let (control, _, manager) = setup();

        control.control_device(&manager, "a", DeviceState::new(true, Some(80))).await?;

        assert_eq!(manager.state_changes(), vec![("a".to_string(), DeviceState::new(true, Some(80)))]);
        Ok(())
    }

    #[test(tokio::test)]
    async fn completion_updates_the_registry_and_notifies_the_listener() -> Result<(), ConnectionError> {
        let (control, devices, manager) = setup();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        devices.set_listener("a", Arc::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));

        control.control_device(&manager, "a", DeviceState::new(true, None)).await?;

        assert_eq!(devices.get_state("a"), Some(DeviceState::new(true, None)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test(tokio::test)]
    async fn registry_is_untouched_until_completion() -> Result<(), ConnectionError> {
        let (control, devices, manager) = setup();
        manager.hold_state_changes();

        control.control_device(&manager, "a", DeviceState::new(true, None)).await?;

        assert_eq!(devices.get_state("a"), Some(DeviceState::new(false, Some(10))));
        Ok(())
    }

    #[test(tokio::test)]
    async fn controlling_an_unknown_device_sends_the_request_without_recording_it() -> Result<(), ConnectionError> {
        let (control, devices, manager) = setup();

        control.control_device(&manager, "z", DeviceState::new(true, None)).await?;

        assert_eq!(manager.state_changes().len(), 1);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices.get_state("z"), None);
        Ok(())
    }

    #[test(tokio::test)]
    async fn send_failures_are_returned() {
        let (control, _, manager) = setup();
        manager.fail_sends();

        let result = control.control_device(&manager, "a", DeviceState::new(true, None)).await;

        assert!(matches!(result, Err(ConnectionError::NotConnected)));
    }
}
