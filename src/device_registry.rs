use crate::domain::{Device, DeviceState, StateListener};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use tracing::{debug, info, trace};

#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: HashMap<String, Device>,
}

pub enum StateUpdate {
    UnknownDevice,
    Updated(Option<StateListener>),
}

impl DeviceRegistry {
    /// Records a device, returns `true` if it was not known before. An existing listener is kept.
    pub fn upsert(&mut self, id: &str, name: &str, state: DeviceState) -> bool {
        match self.devices.get_mut(id) {
            Some(device) => {
                device.name = name.to_string();
                device.state = state;
                false
            }
            None => {
                self.devices.insert(id.to_string(), Device::new(id.to_string(), name.to_string(), state));
                true
            }
        }
    }

    /// Stores the new state of a known device and hands back its listener so the caller can notify it.
    pub fn update_state(&mut self, id: &str, state: DeviceState) -> StateUpdate {
        let Some(device) = self.devices.get_mut(id) else {
            return StateUpdate::UnknownDevice;
        };

        device.state = state;
        StateUpdate::Updated(device.listener.clone())
    }

    pub fn set_listener(&mut self, id: &str, listener: StateListener) -> bool {
        let Some(device) = self.devices.get_mut(id) else {
            return false;
        };

        device.listener = Some(listener);
        true
    }

    pub fn get(&self, id: &str) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn get_name(&self, id: &str) -> Option<&str> {
        self.devices.get(id).map(|device| device.name.as_str())
    }

    pub fn get_state(&self, id: &str) -> Option<DeviceState> {
        self.devices.get(id).map(|device| device.state)
    }

    pub fn all(&self) -> &HashMap<String, Device> {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Shared handle to the registry. Every insert publishes the new device count.
#[derive(Debug, Clone)]
pub struct DeviceStore {
    registry: Arc<RwLock<DeviceRegistry>>,
    count_tx: Arc<watch::Sender<usize>>,
}

impl Default for DeviceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceStore {
    pub fn new() -> Self {
        let (count_tx, _) = watch::channel(0);
        DeviceStore {
            registry: Arc::new(RwLock::new(DeviceRegistry::default())),
            count_tx: Arc::new(count_tx),
        }
    }

    pub fn upsert(&self, id: &str, name: &str, state: DeviceState) {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        if registry.upsert(id, name, state) {
            info!(device_id = id, "🔵 Registered device '{}' ({} known)", name, registry.len());
            self.count_tx.send_replace(registry.len());
        } else {
            debug!(device_id = id, "🔵 Refreshed device '{}'", name);
        }
    }

    /// Returns `false` for unknown devices. The listener runs after the write lock is released.
    pub fn update_state(&self, id: &str, state: DeviceState) -> bool {
        let update = self.registry.write().unwrap_or_else(PoisonError::into_inner).update_state(id, state);

        match update {
            StateUpdate::UnknownDevice => {
                trace!(device_id = id, "Ignoring state update for unknown device");
                false
            }
            StateUpdate::Updated(listener) => {
                debug!(device_id = id, power = state.power, dim = ?state.dim, "🟢 Updated device state");
                if let Some(listener) = listener {
                    listener();
                }
                true
            }
        }
    }

    pub fn set_listener(&self, id: &str, listener: StateListener) -> bool {
        self.registry.write().unwrap_or_else(PoisonError::into_inner).set_listener(id, listener)
    }

    pub fn get(&self, id: &str) -> Option<Device> {
        self.read().get(id).cloned()
    }

    pub fn get_name(&self, id: &str) -> Option<String> {
        self.read().get_name(id).map(str::to_string)
    }

    pub fn get_state(&self, id: &str) -> Option<DeviceState> {
        self.read().get_state(id)
    }

    pub fn all(&self) -> HashMap<String, Device> {
        self.read().all().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn subscribe_count(&self) -> watch::Receiver<usize> {
        self.count_tx.subscribe()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, DeviceRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }
}
