//! Device discovery.
//!
//! Resolves an advertised device name to a connectable peripheral with a
//! time-bounded scan.

use btleplug::api::{Central, CentralEvent, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Peripheral};
use futures::stream::StreamExt;
use std::time::Duration;
use tracing::{debug, info, trace};

use crate::error::{Error, Result};

/// Scan for a device advertising exactly `name` and return the first match.
///
/// The scan runs for at most `timeout` and is always stopped before this
/// function returns. No match within the window is an error, not an empty
/// result; retrying is the caller's decision.
///
/// # Errors
///
/// Returns [`Error::DeviceNotFound`] if no advertisement matches within the
/// timeout, or a Bluetooth error if the scan itself fails.
pub async fn locate_by_name(
    adapter: &Adapter,
    name: &str,
    timeout: Duration,
) -> Result<Peripheral> {
    info!("Scanning for '{}' (up to {:?})", name, timeout);

    adapter
        .start_scan(ScanFilter::default())
        .await
        .map_err(Error::Bluetooth)?;

    let found = tokio::time::timeout(timeout, watch_for_name(adapter, name)).await;

    // Release the radio before surfacing any outcome.
    if let Err(e) = adapter.stop_scan().await {
        debug!("Failed to stop scan: {}", e);
    }

    match found {
        Ok(result) => result,
        Err(_elapsed) => Err(Error::DeviceNotFound {
            name: name.to_string(),
        }),
    }
}

/// Watch adapter events until a peripheral advertising `name` shows up.
async fn watch_for_name(adapter: &Adapter, name: &str) -> Result<Peripheral> {
    // A peripheral seen by an earlier scan may not advertise again right
    // away, so check the adapter's known set first.
    for peripheral in adapter.peripherals().await.map_err(Error::Bluetooth)? {
        if advertises_name(&peripheral, name).await {
            debug!("'{}' already known to adapter", name);
            return Ok(peripheral);
        }
    }

    let mut events = adapter.events().await.map_err(Error::Bluetooth)?;

    while let Some(event) = events.next().await {
        let id = match event {
            CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
            _ => continue,
        };

        let peripheral = match adapter.peripheral(&id).await {
            Ok(p) => p,
            Err(e) => {
                trace!("Failed to get peripheral: {}", e);
                continue;
            }
        };

        if advertises_name(&peripheral, name).await {
            debug!("Found '{}' at {:?}", name, peripheral.id());
            return Ok(peripheral);
        }
    }

    // The event stream only ends if the adapter goes away.
    Err(Error::BluetoothUnavailable)
}

/// Check whether a peripheral's advertised local name matches exactly.
async fn advertises_name(peripheral: &Peripheral, name: &str) -> bool {
    match peripheral.properties().await {
        Ok(Some(props)) => props.local_name.as_deref() == Some(name),
        _ => false,
    }
}
