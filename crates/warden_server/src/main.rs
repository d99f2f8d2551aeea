//! Warden Dedicated Server
//!
//! Usage: `warden_server [config.ron]`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_server::{host, ServerConfig, ServerError};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Warden dedicated server");

    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    let registry = config.load_content()?;
    let rules = config.load_rules()?;
    tracing::info!(
        tick_rate = config.tick_rate,
        unit_types = registry.unit_count(),
        "Content loaded"
    );

    let report = host::run_session(&config, registry, rules).await?;
    tracing::info!(
        ticks = report.ticks,
        shots = report.shots,
        deaths = report.deaths,
        units_left = report.units_left,
        state_hash = report.state_hash,
        "Server stopped"
    );
    Ok(())
}
