mod actors;
mod app_system;
mod backends;
mod catalog;
mod clients;
mod config;
mod domain;
mod error;
mod messages;
mod retry;
mod server;
mod templates;

#[cfg(test)]
mod mock_framework;

use tracing::{error, info};

use crate::app_system::{setup_tracing, OrderSystem, SystemSettings};
use crate::backends::Backends;
use crate::config::Config;
use crate::server::{start_server, state::State};

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    info!("Initializing state...");
    let config = Config::load().map_err(|e| {
        error!(error = %e, "Configuration rejected");
        e.to_string()
    })?;
    let backends = Backends::from_config(&config).map_err(|e| e.to_string())?;

    let system = OrderSystem::new(backends, SystemSettings::from(&config));
    let state = State::new(system.order_client.clone(), system.notifier_client.clone(), config.limits);

    let served = start_server(config.port, state).await;
    if let Err(e) = &served {
        error!(error = %e, "Server stopped with an error");
    }

    // Drain submissions and queued emails before exiting
    system.shutdown().await?;

    info!("Application completed successfully");
    served
}
