//! Text writing.
//!
//! Sends UTF-8 text to the display's text characteristic through the
//! connection cache.

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::ble::connection::ConnectionCache;
use crate::error::Result;

/// Writes text payloads to a single GATT characteristic.
#[derive(Clone)]
pub struct TextWriter {
    /// Cache supplying the live connection.
    cache: Arc<ConnectionCache>,
    /// The writable text characteristic.
    characteristic: Uuid,
}

impl TextWriter {
    /// Create a writer targeting `characteristic`.
    pub fn new(cache: Arc<ConnectionCache>, characteristic: Uuid) -> Self {
        Self {
            cache,
            characteristic,
        }
    }

    /// Write `text` to the characteristic, fire-and-forget.
    ///
    /// Empty text is skipped, not an error. Connection and transport
    /// errors propagate unchanged.
    pub async fn write_text(&self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        let link = self.cache.get_connection().await?;
        link.write(self.characteristic, text.as_bytes()).await?;

        debug!("Sent {} bytes", text.len());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::transport::testing::FakeTransport;
    use crate::ble::uuids::TEXT_CHARACTERISTIC_UUID;
    use crate::error::Error;

    fn writer_over(transport: Arc<FakeTransport>) -> TextWriter {
        let cache = Arc::new(ConnectionCache::new(transport, "Pixie BLE Test"));
        TextWriter::new(cache, TEXT_CHARACTERISTIC_UUID)
    }

    #[tokio::test]
    async fn test_empty_text_skips_ble_entirely() {
        let transport = Arc::new(FakeTransport::new());
        let writer = writer_over(transport.clone());

        writer.write_text("").await.unwrap();

        assert_eq!(transport.locate_count(), 0);
        assert_eq!(transport.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_write_goes_through_cached_connection() {
        let transport = Arc::new(FakeTransport::new());
        let writer = writer_over(transport.clone());

        writer.write_text("HELLO").await.unwrap();
        writer.write_text("WORLD").await.unwrap();

        assert_eq!(transport.connect_count(), 1);
        assert_eq!(transport.last_link().unwrap().write_count(), 2);
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let transport = Arc::new(FakeTransport::new());
        transport.fail_writes("link lost");
        let writer = writer_over(transport.clone());

        let err = writer.write_text("HELLO").await.unwrap_err();
        assert!(matches!(err, Error::WriteFailed { .. }));
        assert!(err.to_string().contains("link lost"));
    }
}
