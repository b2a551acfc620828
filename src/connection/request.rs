use crate::domain::DeviceState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DESTINATION: &str = "deako";
pub const DEFAULT_SOURCE: &str = "pydeako_default";

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    Ping,
    DeviceList,
    Control,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct ControlData {
    pub target: String,
    pub state: DeviceState,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub transaction_id: String,
    pub dst: String,
    pub src: String,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ControlData>,
}

impl Request {
    fn new(src: &str, transaction_id: Option<String>, request_type: RequestType, data: Option<ControlData>) -> Self {
        Request {
            transaction_id: transaction_id.unwrap_or_else(new_transaction_id),
            dst: DESTINATION.to_string(),
            src: src.to_string(),
            request_type,
            data,
        }
    }

    #[cfg(test)]
    pub(crate) fn ping(src: &str, transaction_id: Option<String>) -> Self {
        Request::new(src, transaction_id, RequestType::Ping, None)
    }

    pub fn device_list(src: &str, transaction_id: Option<String>) -> Self {
        Request::new(src, transaction_id, RequestType::DeviceList, None)
    }

    pub fn state_change(src: &str, transaction_id: Option<String>, target: &str, state: DeviceState) -> Self {
        let data = ControlData {
            target: target.to_string(),
            state,
        };
        Request::new(src, transaction_id, RequestType::Control, Some(data))
    }
}

fn new_transaction_id() -> String {
    Uuid::new_v4().to_string()
}
