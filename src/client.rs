use crate::app_config::AppConfig;
use crate::connection::{self, AddressProvider, ConnectionError, ConnectionManager, InboundHandler, TcpConnectionManager};
use crate::control::ControlDispatcher;
use crate::device_registry::DeviceStore;
use crate::discovery::{DiscoveryConfig, DiscoveryCoordinator, DiscoveryError, DiscoveryState};
use crate::domain::{Device, DeviceState};
use crate::inbound::InboundDispatcher;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Live mirror of the devices behind a Deako hub.
pub struct Client<M: ConnectionManager> {
    connection: M,
    devices: DeviceStore,
    discovery: DiscoveryCoordinator,
    control: ControlDispatcher,
}

impl Client<TcpConnectionManager> {
    pub fn new(address: impl AddressProvider + 'static, config: &AppConfig) -> Self {
        let connection_config = connection::Config {
            client_name: config.client().name().to_string(),
            retry_ms: config.hub().retry_ms(),
            retry_max_delay: config.hub().retry_max_delay(),
            connect_attempts: config.hub().connect_attempts(),
        };

        Client::with_connection(config.discovery().to_discovery_config(), |handler| {
            TcpConnectionManager::new(address, handler, connection_config)
        })
    }
}

impl<M: ConnectionManager> Client<M> {
    /// Builds the client around any connection manager. `connect` receives the handler for inbound messages.
    pub fn with_connection<F>(discovery_config: DiscoveryConfig, connect: F) -> Self
    where
        F: FnOnce(InboundHandler) -> M,
    {
        let devices = DeviceStore::new();
        let discovery_state = DiscoveryState::new();
        let dispatcher = InboundDispatcher::new(devices.clone(), discovery_state.clone());

        Client {
            connection: connect(dispatcher.handler()),
            discovery: DiscoveryCoordinator::new(devices.clone(), discovery_state, discovery_config),
            control: ControlDispatcher::new(devices.clone()),
            devices,
        }
    }

    pub fn connection(&self) -> &M {
        &self.connection
    }

    #[instrument(skip_all)]
    pub async fn connect(&self) -> Result<(), ConnectionError> {
        self.connection.init_connection().await?;
        info!("✅  Connected to the hub");
        Ok(())
    }

    /// Closes the connection and cancels any discovery that is still waiting on the hub.
    #[instrument(skip_all)]
    pub async fn disconnect(&self) {
        self.discovery.cancel();
        self.connection.close().await;
    }

    /// Runs discovery, `None` uses the configured device list timeout.
    pub async fn find_devices(&self, timeout: Option<Duration>) -> Result<(), DiscoveryError> {
        let timeout = timeout.unwrap_or(self.discovery.config().device_list_timeout);
        self.discovery.find_devices(&self.connection, timeout).await
    }

    pub async fn control_device(&self, id: &str, power: bool, dim: Option<i64>) -> Result<(), ConnectionError> {
        self.control.control_device(&self.connection, id, DeviceState::new(power, dim)).await
    }

    pub fn get_devices(&self) -> HashMap<String, Device> {
        self.devices.all()
    }

    pub fn get_name(&self, id: &str) -> Option<String> {
        self.devices.get_name(id)
    }

    pub fn get_state(&self, id: &str) -> Option<DeviceState> {
        self.devices.get_state(id)
    }

    /// Replaces the state listener of a known device. Returns `false` if the device is unknown.
    pub fn set_state_callback<F>(&self, id: &str, callback: F) -> bool
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.devices.set_listener(id, Arc::new(callback))
    }
}
