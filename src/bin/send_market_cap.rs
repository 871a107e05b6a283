//! One-shot market-cap sender.
//!
//! Fetches a token's market cap, formats it, and performs a single
//! locate, connect, write, disconnect cycle against the display.
//! No long-lived bridge involved.
//!
//! Run with: cargo run --bin send-market-cap

use clap::Parser;
use pixie_ble_bridge::market::{fetch_market_cap, format_cap};
use pixie_ble_bridge::{BleLink, BleTransport, BtleplugTransport, Result, SenderConfig};
use std::time::Duration;
use tracing::info;

/// The one-shot cycle scans a little longer than the bridge does.
const SCAN_TIMEOUT: Duration = Duration::from_secs(6);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pixie_ble_bridge=info".parse().unwrap()),
        )
        .init();

    let config = SenderConfig::parse();

    let (symbol, cap) = fetch_market_cap(&config.token).await?;
    let text = format!("{symbol} ${}", format_cap(cap));

    info!("Sending '{}'", text);

    let transport = BtleplugTransport::new(SCAN_TIMEOUT).await?;
    let address = transport.locate(&config.name).await?;
    let link = transport.connect(&address).await?;

    link.write(config.characteristic, text.as_bytes()).await?;
    link.disconnect().await?;

    println!("Sent: {text}");

    Ok(())
}
