use crate::domain::DeviceState;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Receives every complete message decoded from the hub.
pub type InboundHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// Invoked by the connection manager once a state change has taken effect.
pub type CompletionCallback = Box<dyn FnOnce() + Send>;

#[async_trait]
pub trait ConnectionManager: Send + Sync {
    async fn init_connection(&self) -> Result<(), ConnectionError>;

    async fn close(&self);

    async fn send_get_device_list(&self) -> Result<(), ConnectionError>;

    async fn send_state_change(&self, uuid: &str, state: DeviceState, completed: CompletionCallback) -> Result<(), ConnectionError>;
}

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("not connected to the hub")]
    NotConnected,
    #[error("unable to resolve the hub address: {0}")]
    Address(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
