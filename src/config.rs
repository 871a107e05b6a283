//! Process configuration.
//!
//! Parsed once at startup; nothing here is runtime-mutable.

use clap::Parser;
use uuid::Uuid;

use crate::ble::uuids::{DEFAULT_DEVICE_NAME, TEXT_CHARACTERISTIC_UUID};
use crate::bridge::BridgeContext;
use crate::market::USDC_ETH;

/// Command-line configuration for the bridge server.
#[derive(Parser, Debug, Clone)]
#[command(name = "pixie-bridge", about = "HTTP to BLE text bridge")]
pub struct BridgeConfig {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8765)]
    pub port: u16,

    /// Advertised name of the target device.
    #[arg(long, default_value = DEFAULT_DEVICE_NAME)]
    pub name: String,

    /// UUID of the writable text characteristic.
    #[arg(long = "char", default_value_t = TEXT_CHARACTERISTIC_UUID)]
    pub characteristic: Uuid,
}

impl BridgeConfig {
    /// The context handed to the bridge runtime.
    pub fn context(&self) -> BridgeContext {
        BridgeContext::new(self.name.clone(), self.characteristic)
    }
}

/// Command-line configuration for the one-shot market-cap sender.
#[derive(Parser, Debug, Clone)]
#[command(name = "send-market-cap", about = "Fetch a market cap and send it over BLE")]
pub struct SenderConfig {
    /// Advertised name of the target device.
    #[arg(long, default_value = DEFAULT_DEVICE_NAME)]
    pub name: String,

    /// UUID of the writable text characteristic.
    #[arg(long = "char", default_value_t = TEXT_CHARACTERISTIC_UUID)]
    pub characteristic: Uuid,

    /// ERC-20 token address to quote.
    #[arg(long, default_value = USDC_ETH)]
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_defaults() {
        let config = BridgeConfig::try_parse_from(["pixie-bridge"]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8765);
        assert_eq!(config.name, "Pixie BLE Test");
        assert_eq!(config.characteristic, TEXT_CHARACTERISTIC_UUID);
    }

    #[test]
    fn test_bridge_overrides() {
        let config = BridgeConfig::try_parse_from([
            "pixie-bridge",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--name",
            "Other Display",
            "--char",
            "6e400002-b5a3-f393-e0a9-e50e24dcca9e",
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.context().device_name, "Other Display");
        assert_eq!(
            config.characteristic.to_string(),
            "6e400002-b5a3-f393-e0a9-e50e24dcca9e"
        );
    }

    #[test]
    fn test_sender_defaults_to_usdc() {
        let config = SenderConfig::try_parse_from(["send-market-cap"]).unwrap();
        assert_eq!(config.token, USDC_ETH);
    }
}
