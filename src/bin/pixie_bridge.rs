//! HTTP to BLE bridge server.
//!
//! Run with: cargo run --bin pixie-bridge -- --port 8765

use clap::Parser;
use pixie_ble_bridge::{BridgeConfig, BridgeRuntime, Gateway, Result};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pixie_ble_bridge=info".parse().unwrap()),
        )
        .init();

    let config = BridgeConfig::parse();

    info!(
        "Bridging to '{}' via characteristic {}",
        config.name, config.characteristic
    );

    let bridge = BridgeRuntime::spawn(config.context());

    let listener =
        tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;

    Gateway::new(bridge.handle()).serve(listener).await
}
