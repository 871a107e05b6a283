//! BLE transport abstraction.
//!
//! The connection cache and bridge runtime talk to the radio through the
//! [`BleTransport`] and [`BleLink`] traits; [`BtleplugTransport`] is the
//! production implementation.

use async_trait::async_trait;
use btleplug::api::{Central, Manager as _, Peripheral as _, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, trace, warn};
use uuid::Uuid;

use crate::ble::locator;
use crate::error::{Error, Result};

/// One live BLE session against the target device.
#[async_trait]
pub trait BleLink: Send + Sync {
    /// Liveness predicate: whether the session is still usable.
    async fn is_alive(&self) -> bool;

    /// Fire-and-forget write of `data` to the characteristic `uuid`.
    ///
    /// Completes once the bytes are handed to the radio stack; the
    /// peripheral never acknowledges at the application level.
    async fn write(&self, uuid: Uuid, data: &[u8]) -> Result<()>;

    /// Tear the session down.
    async fn disconnect(&self) -> Result<()>;
}

/// Locates and connects to the target device.
#[async_trait]
pub trait BleTransport: Send + Sync {
    /// Resolve an advertised name to a connectable address.
    ///
    /// The address is ephemeral (BLE stacks may rotate it between scans)
    /// and must never be persisted.
    async fn locate(&self, name: &str) -> Result<String>;

    /// Open a session to a previously resolved address.
    async fn connect(&self, address: &str) -> Result<Arc<dyn BleLink>>;
}

/// Production transport backed by btleplug.
pub struct BtleplugTransport {
    /// The BLE adapter used for scanning and connecting.
    adapter: Adapter,
    /// How long a single locate scan may run.
    scan_timeout: Duration,
}

impl BtleplugTransport {
    /// Create a transport on the first available Bluetooth adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new(scan_timeout: Duration) -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self {
            adapter,
            scan_timeout,
        })
    }

    /// Get the underlying adapter.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Find a peripheral the adapter already knows by its identifier string.
    async fn find_known(&self, address: &str) -> Result<Peripheral> {
        for peripheral in self.adapter.peripherals().await.map_err(Error::Bluetooth)? {
            if peripheral.id().to_string() == address {
                return Ok(peripheral);
            }
        }

        Err(Error::ConnectionFailed {
            reason: format!("peripheral {address} is no longer known to the adapter"),
        })
    }
}

#[async_trait]
impl BleTransport for BtleplugTransport {
    async fn locate(&self, name: &str) -> Result<String> {
        let peripheral = locator::locate_by_name(&self.adapter, name, self.scan_timeout).await?;
        Ok(peripheral.id().to_string())
    }

    async fn connect(&self, address: &str) -> Result<Arc<dyn BleLink>> {
        let peripheral = self.find_known(address).await?;

        peripheral
            .connect()
            .await
            .map_err(|e| Error::ConnectionFailed {
                reason: e.to_string(),
            })?;

        info!("Connected to {}", address);

        if let Err(e) = peripheral.discover_services().await {
            warn!("Failed to discover services: {}", e);
        }

        Ok(Arc::new(BtleplugLink { peripheral }))
    }
}

/// A live btleplug session.
struct BtleplugLink {
    peripheral: Peripheral,
}

#[async_trait]
impl BleLink for BtleplugLink {
    async fn is_alive(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    async fn write(&self, uuid: Uuid, data: &[u8]) -> Result<()> {
        let characteristics = self.peripheral.characteristics();
        let characteristic = characteristics.iter().find(|c| c.uuid == uuid).ok_or_else(|| {
            Error::CharacteristicNotFound {
                uuid: uuid.to_string(),
            }
        })?;

        self.peripheral
            .write(characteristic, data, WriteType::WithoutResponse)
            .await
            .map_err(|e| Error::WriteFailed {
                reason: e.to_string(),
            })?;

        trace!("Wrote {} bytes to characteristic {}", data.len(), uuid);

        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.peripheral.disconnect().await.map_err(Error::Bluetooth)
    }
}
