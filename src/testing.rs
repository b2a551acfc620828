use crate::connection::{CompletionCallback, ConnectionError, ConnectionManager, InboundHandler};
use crate::domain::DeviceState;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub fn device_list(number_of_devices: usize) -> Value {
    json!({ "type": "DEVICE_LIST", "data": { "number_of_devices": number_of_devices } })
}

pub fn device_found(uuid: &str, power: bool, dim: Option<i64>) -> Value {
    json!({
        "type": "DEVICE_FOUND",
        "data": { "name": format!("Device {}", uuid), "uuid": uuid, "state": state(power, dim) },
    })
}

pub fn event(target: &str, power: bool, dim: Option<i64>) -> Value {
    json!({ "type": "EVENT", "data": { "target": target, "state": state(power, dim) } })
}

fn state(power: bool, dim: Option<i64>) -> Value {
    match dim {
        Some(dim) => json!({ "power": power, "dim": dim }),
        None => json!({ "power": power }),
    }
}

/// In-memory hub: replays scripted messages after a device list request and records what was sent.
pub struct FakeConnectionManager {
    handler: InboundHandler,
    device_list_replies: Mutex<Vec<(Duration, Value)>>,
    device_list_requests: AtomicUsize,
    state_changes: Mutex<Vec<(String, DeviceState)>>,
    connected: AtomicBool,
    complete_state_changes: AtomicBool,
    fail_sends: AtomicBool,
}

impl FakeConnectionManager {
    pub fn new(handler: InboundHandler) -> Self {
        FakeConnectionManager {
            handler,
            device_list_replies: Mutex::new(Vec::new()),
            device_list_requests: AtomicUsize::new(0),
            state_changes: Mutex::new(Vec::new()),
            connected: AtomicBool::new(false),
            complete_state_changes: AtomicBool::new(true),
            fail_sends: AtomicBool::new(false),
        }
    }

    /// Zero delays are delivered before the request returns, others from a spawned task.
    pub fn reply_to_device_list(&self, delay: Duration, message: Value) {
        self.device_list_replies.lock().unwrap().push((delay, message));
    }

    pub fn hold_state_changes(&self) {
        self.complete_state_changes.store(false, Ordering::SeqCst);
    }

    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    pub fn deliver(&self, message: Value) {
        (self.handler)(message);
    }

    pub fn device_list_requests(&self) -> usize {
        self.device_list_requests.load(Ordering::SeqCst)
    }

    pub fn state_changes(&self) -> Vec<(String, DeviceState)> {
        self.state_changes.lock().unwrap().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn check_send(&self) -> Result<(), ConnectionError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ConnectionError::NotConnected);
        }
        Ok(())
    }
}

#[async_trait]
impl ConnectionManager for FakeConnectionManager {
    async fn init_connection(&self) -> Result<(), ConnectionError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn send_get_device_list(&self) -> Result<(), ConnectionError> {
        self.check_send()?;
        self.device_list_requests.fetch_add(1, Ordering::SeqCst);

        let replies = self.device_list_replies.lock().unwrap().drain(..).collect::<Vec<_>>();
        for (delay, message) in replies {
            if delay.is_zero() {
                self.deliver(message);
            } else {
                let handler = self.handler.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    handler(message);
                });
            }
        }
        Ok(())
    }

    async fn send_state_change(&self, uuid: &str, state: DeviceState, completed: CompletionCallback) -> Result<(), ConnectionError> {
        self.check_send()?;
        self.state_changes.lock().unwrap().push((uuid.to_string(), state));

        if self.complete_state_changes.load(Ordering::SeqCst) {
            completed();
        }
        Ok(())
    }
}
