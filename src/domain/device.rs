use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Callback fired whenever the power or dim level of a device changes.
pub type StateListener = Arc<dyn Fn() + Send + Sync>;

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct DeviceState {
    pub power: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim: Option<i64>,
}

impl DeviceState {
    pub fn new(power: bool, dim: Option<i64>) -> Self {
        DeviceState { power, dim }
    }
}

#[derive(Clone)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub state: DeviceState,
    pub(crate) listener: Option<StateListener>,
}

impl Device {
    pub fn new(id: String, name: String, state: DeviceState) -> Self {
        Device {
            id,
            name,
            state,
            listener: None,
        }
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }
}

impl Debug for Device {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("listener", &self.listener.as_ref().map(|_| "Fn()"))
            .finish()
    }
}

// Listeners are opaque, equality only covers the observable device data.
impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name && self.state == other.state
    }
}
