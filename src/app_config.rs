use crate::connection::request::DEFAULT_SOURCE;
use crate::discovery::{DEFAULT_DEVICE_FOUND_TIME_FACTOR, DEFAULT_DEVICE_LIST_TIMEOUT, DiscoveryConfig};
use config::{Config, ConfigError};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    client: Client,
    hub: Hub,
    #[serde(default)]
    discovery: Discovery,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(config::File::with_name("config_local").required(false))
            .add_source(config::Environment::with_prefix("DEAKO").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }
}

#[derive(Debug, Deserialize)]
pub struct Client {
    name: String,
}

impl Default for Client {
    fn default() -> Self {
        Client {
            name: DEFAULT_SOURCE.to_string(),
        }
    }
}

impl Client {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Deserialize)]
pub struct Hub {
    address: String,
    retry_ms: u64,
    #[serde(with = "humantime_serde")]
    retry_max_delay: Duration,
    connect_attempts: usize,
}

impl Hub {
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn retry_ms(&self) -> u64 {
        self.retry_ms
    }

    pub fn retry_max_delay(&self) -> Duration {
        self.retry_max_delay
    }

    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts
    }
}

#[derive(Debug, Deserialize)]
pub struct Discovery {
    #[serde(with = "humantime_serde")]
    device_list_timeout: Duration,
    #[serde(with = "humantime_serde")]
    device_found_time_factor: Duration,
}

impl Default for Discovery {
    fn default() -> Self {
        Discovery {
            device_list_timeout: DEFAULT_DEVICE_LIST_TIMEOUT,
            device_found_time_factor: DEFAULT_DEVICE_FOUND_TIME_FACTOR,
        }
    }
}

impl Discovery {
    pub fn device_list_timeout(&self) -> Duration {
        self.device_list_timeout
    }

    pub fn device_found_time_factor(&self) -> Duration {
        self.device_found_time_factor
    }

    pub fn to_discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            device_list_timeout: self.device_list_timeout,
            device_found_time_factor: self.device_found_time_factor,
        }
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                client: Client::default(),
                hub: Hub {
                    address: "127.0.0.1:23".to_string(),
                    retry_ms: 10,
                    retry_max_delay: Duration::from_millis(50),
                    connect_attempts: 3,
                },
                discovery: Discovery::default(),
            },
        }
    }

    pub fn client_name(mut self, name: &str) -> Self {
        self.config.client.name = name.to_string();
        self
    }

    pub fn hub_address(mut self, address: String) -> Self {
        self.config.hub.address = address;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
