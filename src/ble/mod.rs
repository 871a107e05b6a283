//! BLE communication module.
//!
//! Device discovery, the transport seam, the single-connection cache, and
//! the text writer.

pub mod connection;
pub mod locator;
pub mod transport;
pub mod uuids;
pub mod writer;

pub use connection::ConnectionCache;
pub use transport::{BleLink, BleTransport, BtleplugTransport};
pub use writer::TextWriter;
pub use uuids::*;
