use crate::connection::{ConnectionError, ConnectionManager};
use crate::device_registry::DeviceStore;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Notify, watch};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_DEVICE_LIST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_DEVICE_FOUND_TIME_FACTOR: Duration = Duration::from_secs(2);
// Stand-in deadline for waits that would overflow `Instant`, roughly 30 years.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryConfig {
    pub device_list_timeout: Duration,
    /// Time granted per expected device once the hub announced how many it has.
    pub device_found_time_factor: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            device_list_timeout: DEFAULT_DEVICE_LIST_TIMEOUT,
            device_found_time_factor: DEFAULT_DEVICE_FOUND_TIME_FACTOR,
        }
    }
}

/// The device count announced by the hub. The last announcement wins and is kept across discoveries.
#[derive(Debug, Clone)]
pub struct DiscoveryState {
    expected_tx: Arc<watch::Sender<Option<usize>>>,
}

impl Default for DiscoveryState {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryState {
    pub fn new() -> Self {
        let (expected_tx, _) = watch::channel(None);
        DiscoveryState {
            expected_tx: Arc::new(expected_tx),
        }
    }

    pub fn announce(&self, number_of_devices: usize) {
        info!("🔍 Hub announced {} device(s)", number_of_devices);
        self.expected_tx.send_replace(Some(number_of_devices));
    }

    pub fn expected(&self) -> Option<usize> {
        *self.expected_tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<Option<usize>> {
        self.expected_tx.subscribe()
    }
}

#[derive(Debug)]
pub struct DiscoveryCoordinator {
    devices: DeviceStore,
    state: DiscoveryState,
    config: DiscoveryConfig,
    cancel: Notify,
}

impl DiscoveryCoordinator {
    pub fn new(devices: DeviceStore, state: DiscoveryState, config: DiscoveryConfig) -> Self {
        DiscoveryCoordinator {
            devices,
            state,
            config,
            cancel: Notify::new(),
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Wakes every pending `find_devices` call, which then fails with [`DiscoveryError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.notify_waiters();
    }

    #[instrument(skip_all, fields(timeout = ?timeout))]
    pub async fn find_devices(&self, manager: &dyn ConnectionManager, timeout: Duration) -> Result<(), DiscoveryError> {
        let cancelled = self.cancel.notified();
        tokio::pin!(cancelled);
        cancelled.as_mut().enable();

        info!("🔍 Finding devices...");
        manager.send_get_device_list().await?;

        let expected = tokio::select! {
            result = self.await_device_count(timeout) => result?,
            _ = &mut cancelled => return Err(self.cancelled()),
        };

        let budget = self
            .config
            .device_found_time_factor
            .saturating_mul(u32::try_from(expected).unwrap_or(u32::MAX));
        tokio::select! {
            result = self.await_devices(expected, budget) => result?,
            _ = &mut cancelled => return Err(self.cancelled()),
        }

        info!("🔍 Finding devices... OK, {} found", expected);
        Ok(())
    }

    async fn await_device_count(&self, timeout: Duration) -> Result<usize, DiscoveryError> {
        let deadline = deadline_after(timeout);
        let mut expected_rx = self.state.subscribe();

        loop {
            match *expected_rx.borrow_and_update() {
                Some(expected) if expected > 0 => return Ok(expected),
                _ => {}
            }

            debug!(
                "🔍 Waiting for the device list... time remaining: {:?}",
                deadline.saturating_duration_since(Instant::now())
            );
            match timeout_at(deadline, expected_rx.changed()).await {
                Ok(changed) => changed.map_err(|_| DiscoveryError::Cancelled)?,
                Err(_) => {
                    warn!("⚠️ The hub did not announce its devices within {:?}", timeout);
                    return Err(DiscoveryError::DeviceCountTimeout { timeout });
                }
            }
        }
    }

    async fn await_devices(&self, expected: usize, budget: Duration) -> Result<(), DiscoveryError> {
        let deadline = deadline_after(budget);
        let mut found_rx = self.devices.subscribe_count();

        loop {
            let found = *found_rx.borrow_and_update();
            if found == expected {
                return Ok(());
            }

            debug!(
                "🔍 Waiting for devices... expected: {}, received: {}, time remaining: {:?}",
                expected,
                found,
                deadline.saturating_duration_since(Instant::now())
            );
            match timeout_at(deadline, found_rx.changed()).await {
                Ok(changed) => changed.map_err(|_| DiscoveryError::Cancelled)?,
                Err(_) => {
                    let found = self.devices.len();
                    warn!("⚠️ Received {} of {} device(s) within {:?}", found, expected, budget);
                    return Err(DiscoveryError::EnumerationTimeout { expected, found });
                }
            }
        }
    }

    fn cancelled(&self) -> DiscoveryError {
        warn!("🔴 Finding devices... cancelled, {} device(s) known", self.devices.len());
        DiscoveryError::Cancelled
    }
}

fn deadline_after(duration: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(duration).unwrap_or_else(|| now + FAR_FUTURE)
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("the hub did not announce a device count within {timeout:?}")]
    DeviceCountTimeout { timeout: Duration },
    #[error("received {found} of {expected} announced device(s) before timing out")]
    EnumerationTimeout { expected: usize, found: usize },
    #[error("device discovery was cancelled")]
    Cancelled,
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}
