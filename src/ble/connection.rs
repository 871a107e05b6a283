//! BLE connection caching.
//!
//! Owns at most one live session to the target device and reconnects
//! lazily when it is absent or has dropped.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::ble::transport::{BleLink, BleTransport};
use crate::error::Result;

/// Cache holding at most one live [`BleLink`] to the configured device.
///
/// The mutex spans the whole connect-or-reuse sequence, so two concurrent
/// callers can never race to open two sessions against the same peripheral.
pub struct ConnectionCache {
    /// Transport used to locate and connect.
    transport: Arc<dyn BleTransport>,
    /// Advertised name of the target device.
    device_name: String,
    /// The cached link, if any. Guards the full connect-or-reuse sequence.
    cached: Mutex<Option<Arc<dyn BleLink>>>,
}

impl ConnectionCache {
    /// Create an empty cache for the named device.
    pub fn new(transport: Arc<dyn BleTransport>, device_name: impl Into<String>) -> Self {
        Self {
            transport,
            device_name: device_name.into(),
            cached: Mutex::new(None),
        }
    }

    /// The advertised name this cache connects to.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Return the cached link if it is still alive, otherwise locate the
    /// device and open a fresh session.
    ///
    /// A dead link is replaced, never repaired. Locate and connect failures
    /// propagate without touching the cache, so the next call re-probes
    /// from scratch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`](crate::Error::DeviceNotFound) if no
    /// advertisement matches within the scan window, or the underlying
    /// connection error.
    pub async fn get_connection(&self) -> Result<Arc<dyn BleLink>> {
        let mut cached = self.cached.lock().await;

        if let Some(link) = cached.as_ref() {
            if link.is_alive().await {
                return Ok(link.clone());
            }
            debug!("Cached connection is no longer alive, reconnecting");
        }

        let address = self.transport.locate(&self.device_name).await?;
        let link = self.transport.connect(&address).await?;

        info!("Connected to '{}'", self.device_name);

        *cached = Some(link.clone());
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::transport::testing::FakeTransport;
    use crate::error::Error;
    use std::time::Duration;

    fn cache_over(transport: Arc<FakeTransport>) -> Arc<ConnectionCache> {
        Arc::new(ConnectionCache::new(transport, "Pixie BLE Test"))
    }

    #[tokio::test]
    async fn test_connection_is_reused_while_alive() {
        let transport = Arc::new(FakeTransport::new());
        let cache = cache_over(transport.clone());

        let first = cache.get_connection().await.unwrap();
        let second = cache.get_connection().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(transport.locate_count(), 1);
        assert_eq!(transport.connect_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_open_a_single_connection() {
        let transport = Arc::new(FakeTransport::new());
        // Keep the first connect in flight long enough for every caller to
        // pile up on the lock.
        transport.set_connect_delay(Duration::from_millis(50));
        let cache = cache_over(transport.clone());

        let callers: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_connection().await })
            })
            .collect();

        for caller in callers {
            caller.await.unwrap().unwrap();
        }

        assert_eq!(transport.connect_count(), 1);
        assert_eq!(transport.locate_count(), 1);
    }

    #[tokio::test]
    async fn test_absent_device_fails_and_caches_nothing() {
        let transport = Arc::new(FakeTransport::new());
        transport.set_absent();
        let cache = cache_over(transport.clone());

        let err = cache.get_connection().await.map(|_| ()).unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound { .. }));
        assert_eq!(transport.connect_count(), 0);

        // Nothing was cached: the next call scans again.
        let err = cache.get_connection().await.map(|_| ()).unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound { .. }));
        assert_eq!(transport.locate_count(), 2);
    }

    #[tokio::test]
    async fn test_dead_link_triggers_one_fresh_cycle() {
        let transport = Arc::new(FakeTransport::new());
        let cache = cache_over(transport.clone());

        let first = cache.get_connection().await.unwrap();
        transport.last_link().unwrap().kill();

        let second = cache.get_connection().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(transport.locate_count(), 2);
        assert_eq!(transport.connect_count(), 2);

        // The replacement is live and gets reused.
        cache.get_connection().await.unwrap();
        assert_eq!(transport.connect_count(), 2);
    }
}
