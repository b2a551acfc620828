use deako::Client;
use deako::app_config::AppConfig;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    info!("✅  Loaded configuration");

    let client = Arc::new(Client::new(config.hub().address().to_string(), &config));
    client.connect().await?;

    if let Err(e) = client.find_devices(None).await {
        warn!("⚠️ Device discovery did not complete: {}", e);
    }

    let mut devices = client.get_devices().into_values().collect::<Vec<_>>();
    devices.sort_by(|a, b| a.name.cmp(&b.name));
    for device in &devices {
        info!(device_id = %device.id, power = device.state.power, dim = ?device.state.dim, "💡 {}", device.name);

        let weak_client = Arc::downgrade(&client);
        let device_id = device.id.clone();
        client.set_state_callback(&device.id, move || {
            let Some(client) = weak_client.upgrade() else {
                return;
            };
            if let Some(state) = client.get_state(&device_id) {
                info!(device_id = %device_id, power = state.power, dim = ?state.dim, "💡 {} changed", client.get_name(&device_id).unwrap_or_default());
            }
        });
    }
    info!("🔥 {} is up and running with {} device(s)", env!("CARGO_PKG_NAME"), devices.len());

    tokio::signal::ctrl_c().await?;
    client.disconnect().await;
    info!("👋 Disconnected");

    Ok(())
}
