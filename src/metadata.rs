//! Device metadata snapshot.
//!
//! [`DeviceInfo`] is the owned, cloneable translation of one entry of the
//! transport's enumeration result. The manager captures the list once at
//! init and hands out shared references afterwards; nothing here holds an OS
//! handle.
//!
//! # Conventions
//! - `path` is the transport's open-by-path key. It is also how the manager
//!   identifies a device, so two entries never share a path.
//! - String fields are `None` when the device does not report them.
//! - `interface_number` is `-1` when not applicable (e.g. Bluetooth).
//!
//! ## Persistence notes
//! - `vendor_id`/`product_id` are stable across reconnects and are what
//!   field labels are keyed on (see [`crate::descriptor::field_key`]).
//! - `path` is platform-specific and may change across ports and reconnects;
//!   treat it as diagnostic first, identity second.
//!
//! # Example
//! ```no_run
//! use ffbscope::{DeviceManager, ManagerConfig};
//!
//! let mgr = DeviceManager::hid(ManagerConfig::default()).expect("hidapi");
//! for info in mgr.get_devices() {
//!     println!("{info} at {}", info.path);
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Underlying bus, as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BusType {
    #[default]
    Unknown,
    Usb,
    Bluetooth,
    I2c,
    Spi,
}

impl BusType {
    pub(crate) fn to_byte(self) -> u8 {
        match self {
            BusType::Unknown => 0,
            BusType::Usb => 1,
            BusType::Bluetooth => 2,
            BusType::I2c => 3,
            BusType::Spi => 4,
        }
    }

    /// Unknown codes map to [`BusType::Unknown`].
    pub(crate) fn from_byte(b: u8) -> Self {
        match b {
            1 => BusType::Usb,
            2 => BusType::Bluetooth,
            3 => BusType::I2c,
            4 => BusType::Spi,
            _ => BusType::Unknown,
        }
    }
}

impl fmt::Display for BusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BusType::Unknown => "unknown",
            BusType::Usb => "usb",
            BusType::Bluetooth => "bluetooth",
            BusType::I2c => "i2c",
            BusType::Spi => "spi",
        })
    }
}

/// Snapshot of metadata describing a single HID interface.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Transport path; opaque, used to open the device.
    pub path: String,

    pub vendor_id: u16,
    pub product_id: u16,

    /// Firmware serial number, if present.
    pub serial_number: Option<String>,

    /// Device release number in BCD (`bcdDevice` on USB).
    pub release_number: u16,

    pub manufacturer_string: Option<String>,

    /// Human-readable product name from the firmware.
    pub product_string: Option<String>,

    /// Top-level usage page of the interface (e.g. `0x01` Generic Desktop).
    pub usage_page: u16,

    /// Top-level usage within the page (e.g. `0x04` Joystick).
    pub usage: u16,

    /// Interface index; `-1` when not applicable.
    pub interface_number: i32,

    pub bus_type: BusType,
}

impl DeviceInfo {
    /// Product name, falling back to `VID:PID`.
    pub fn display_name(&self) -> String {
        match self.product_string.as_deref() {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => format!("{:04x}:{:04x}", self.vendor_id, self.product_id),
        }
    }

    /// Whether this device passes a VID/PID filter; `0` matches anything.
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        (vendor_id == 0 || vendor_id == self.vendor_id)
            && (product_id == 0 || product_id == self.product_id)
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:04x}:{:04x}] ({})",
            self.display_name(),
            self.vendor_id,
            self.product_id,
            self.bus_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wheel() -> DeviceInfo {
        DeviceInfo {
            path: "/dev/hidraw0".into(),
            vendor_id: 0x046d,
            product_id: 0xc24f,
            product_string: Some("G29 Driving Force Racing Wheel ".into()),
            bus_type: BusType::Usb,
            interface_number: 0,
            ..Default::default()
        }
    }

    #[test]
    fn display_uses_trimmed_product_name() {
        assert_eq!(
            wheel().to_string(),
            "G29 Driving Force Racing Wheel [046d:c24f] (usb)"
        );
    }

    #[test]
    fn display_name_falls_back_to_ids() {
        let mut info = wheel();
        info.product_string = Some("  ".into());
        assert_eq!(info.display_name(), "046d:c24f");
    }

    #[test]
    fn zero_is_a_wildcard() {
        let info = wheel();
        assert!(info.matches(0, 0));
        assert!(info.matches(0x046d, 0));
        assert!(info.matches(0x046d, 0xc24f));
        assert!(!info.matches(0x044f, 0));
    }

    #[test]
    fn bus_type_bytes() {
        for bus in [BusType::Unknown, BusType::Usb, BusType::Bluetooth, BusType::I2c, BusType::Spi] {
            assert_eq!(BusType::from_byte(bus.to_byte()), bus);
        }
        assert_eq!(BusType::from_byte(0xEE), BusType::Unknown);
    }
}
