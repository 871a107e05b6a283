//! BLE identity constants.
//!
//! Default device name and characteristic UUID for the Pixie display.

use uuid::Uuid;

/// Advertised name the Pixie display broadcasts by default.
pub const DEFAULT_DEVICE_NAME: &str = "Pixie BLE Test";

/// Writable text characteristic on the Pixie display (write without response).
pub const TEXT_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x1130a240_d747_22b3_af44_4d8c106c7214);
