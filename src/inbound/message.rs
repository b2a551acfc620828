use crate::domain::DeviceState;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, PartialEq)]
pub enum InboundMessage {
    Ping,
    DeviceList(DeviceList),
    DeviceFound(DeviceFound),
    Event(DeviceEvent),
    Unknown(String),
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct DeviceList {
    pub number_of_devices: usize,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct DeviceFound {
    pub name: String,
    pub uuid: String,
    pub state: DeviceState,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct DeviceEvent {
    pub target: String,
    pub state: DeviceState,
}

impl InboundMessage {
    /// Decodes a message by its `type` discriminant. Types this client does not consume map to `Unknown`.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let message_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| <serde_json::Error as serde::de::Error>::missing_field("type"))?;
        let data = value.get("data").unwrap_or(&Value::Null);

        let message = match message_type {
            "PING" => InboundMessage::Ping,
            "DEVICE_LIST" => InboundMessage::DeviceList(DeviceList::deserialize(data)?),
            "DEVICE_FOUND" => InboundMessage::DeviceFound(DeviceFound::deserialize(data)?),
            "EVENT" => InboundMessage::Event(DeviceEvent::deserialize(data)?),
            _ => InboundMessage::Unknown(message_type.to_string()),
        };

        Ok(message)
    }
}
