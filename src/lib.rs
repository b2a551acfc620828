//! Local network client for Deako smart lighting hubs.
//!
//! The [`Client`] discovers the devices announced by a hub, mirrors their power and dim state in memory,
//! sends control commands and notifies a per-device listener whenever the state of a device changes.

pub mod app_config;
mod client;
pub mod connection;
mod control;
pub mod device_registry;
pub mod discovery;
pub mod domain;
pub mod inbound;

#[cfg(test)]
mod testing;

pub use client::Client;
pub use connection::{ConnectionError, ConnectionManager};
pub use discovery::DiscoveryError;
pub use domain::{Device, DeviceState};
