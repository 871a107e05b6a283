// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # pixie-ble-bridge
//!
//! Bridges textual message sources to a Pixie BLE display by writing UTF-8
//! text to a known GATT characteristic. Arbitrary HTTP clients that cannot
//! speak BLE drive the display through the bridge server; a one-shot
//! companion sends a formatted market cap the same way.
//!
//! ## Features
//!
//! - **Single cached connection**: one live BLE session, reconnected
//!   lazily when it drops, never duplicated under concurrent demand
//! - **Discovery by name**: time-bounded scans resolve the advertised
//!   device name to a connectable peripheral
//! - **Dedicated BLE runtime**: every radio operation lives on one
//!   single-threaded runtime; HTTP threads hand work across with a
//!   bounded wait
//! - **Fire-and-forget writes**: text is written without response, the
//!   display protocol's only mode
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pixie_ble_bridge::{BridgeContext, BridgeRuntime, Gateway, Result};
//! use pixie_ble_bridge::ble::uuids::TEXT_CHARACTERISTIC_UUID;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let ctx = BridgeContext::new("Pixie BLE Test", TEXT_CHARACTERISTIC_UUID);
//!     let bridge = BridgeRuntime::spawn(ctx);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8765").await?;
//!     Gateway::new(bridge.handle()).serve(listener).await
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.

// Public modules
pub mod ble;
pub mod bridge;
pub mod config;
pub mod error;
pub mod gateway;
pub mod market;

// Re-exports for convenience
pub use ble::connection::ConnectionCache;
pub use ble::transport::{BleLink, BleTransport, BtleplugTransport};
pub use ble::writer::TextWriter;
pub use bridge::{BridgeContext, BridgeHandle, BridgeRuntime};
pub use config::{BridgeConfig, SenderConfig};
pub use error::{Error, Result};
pub use gateway::Gateway;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that key types are exported
        let _ = std::any::TypeId::of::<BridgeRuntime>();
        let _ = std::any::TypeId::of::<BridgeHandle>();
        let _ = std::any::TypeId::of::<ConnectionCache>();
        let _ = std::any::TypeId::of::<TextWriter>();
        let _ = std::any::TypeId::of::<Gateway>();
        let _ = std::any::TypeId::of::<Error>();
    }
}
