//! Error types for the pixie-ble-bridge crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// No advertising device matched the configured name within the scan window.
    #[error("BLE device '{name}' not found")]
    DeviceNotFound {
        /// The advertised name that was searched for.
        name: String,
    },

    /// Failed to establish a connection to the device.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// Characteristic not found on the device.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },

    /// A write failed against a connection that dropped mid-operation.
    #[error("Write failed: {reason}")]
    WriteFailed {
        /// Description of the underlying transport failure.
        reason: String,
    },

    /// Timed out waiting for the bridge runtime to complete a write.
    #[error("Timed out waiting for BLE write")]
    Timeout,

    /// The bridge runtime has shut down and can no longer accept work.
    #[error("Bridge runtime is not running")]
    BridgeClosed,

    /// I/O error from the network listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request to an external API failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The market data API returned no trading pairs for the token.
    #[error("No trading pairs returned for token")]
    NoPairs,

    /// The selected trading pair carries neither a market cap nor an FDV.
    #[error("No marketCap/fdv field in token pair")]
    MissingMarketCap,

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
