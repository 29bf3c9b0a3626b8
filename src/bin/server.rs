use log::{error, info, warn};
use std::net::SocketAddr;

use rusty_relay::config::ServerConfig;
use rusty_relay::core::{PingScheduler, Relay};
use rusty_relay::handlers::routes;
use rusty_relay::metrics::StatsReporter;

#[tokio::main]
async fn main() {
    // Initialize env
    let dotenv_result = dotenvy::dotenv();

    // Initialize logging
    env_logger::init();

    match dotenv_result {
        Ok(path) => info!("Environment variables loaded from {}", path.display()),
        Err(e) => warn!("No .env file loaded: {}", e),
    };

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Configuration: host={}, port={}, max_payload={}",
        config.host, config.port, config.max_payload
    );

    // Create the relay broker and its timers
    let relay = Relay::shared(config.limits());
    PingScheduler::spawn(relay.clone(), config.ping_interval);
    if let Some(period) = config.stats_interval {
        StatsReporter::spawn(relay.clone(), period);
    }

    // Build the server address
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    info!("WebSocket relay running on {}", addr);

    warp::serve(routes(relay, &config)).run(addr).await;
}
