//! `hidapi` transport.
//!
//! [`HidApiBackend`] owns the process's `HidApi` context behind a mutex;
//! enumeration refreshes it and translates every `hidapi::DeviceInfo` into an
//! owned [`DeviceInfo`]. [`HidApiHandle`] wraps one open `HidDevice`.

use std::ffi::CString;

use hidapi::{HidApi, HidDevice};
use parking_lot::Mutex;
use tracing::debug;

use crate::device::{HidBackend, HidHandle};
use crate::error::{Error, Result};
use crate::metadata::{BusType, DeviceInfo};

pub struct HidApiBackend {
    api: Mutex<HidApi>,
}

impl HidApiBackend {
    /// Initialize the platform HID library.
    pub fn new() -> Result<Self> {
        Ok(Self {
            api: Mutex::new(HidApi::new()?),
        })
    }
}

fn bus_type(bus: hidapi::BusType) -> BusType {
    match bus {
        hidapi::BusType::Usb => BusType::Usb,
        hidapi::BusType::Bluetooth => BusType::Bluetooth,
        hidapi::BusType::I2c => BusType::I2c,
        hidapi::BusType::Spi => BusType::Spi,
        _ => BusType::Unknown,
    }
}

fn translate(info: &hidapi::DeviceInfo) -> DeviceInfo {
    DeviceInfo {
        path: info.path().to_string_lossy().into_owned(),
        vendor_id: info.vendor_id(),
        product_id: info.product_id(),
        serial_number: info.serial_number().map(str::to_owned),
        release_number: info.release_number(),
        manufacturer_string: info.manufacturer_string().map(str::to_owned),
        product_string: info.product_string().map(str::to_owned),
        usage_page: info.usage_page(),
        usage: info.usage(),
        interface_number: info.interface_number(),
        bus_type: bus_type(info.bus_type()),
    }
}

impl HidBackend for HidApiBackend {
    fn enumerate(&self) -> Result<Vec<DeviceInfo>> {
        let mut api = self.api.lock();
        api.refresh_devices()?;
        let devices: Vec<DeviceInfo> = api.device_list().map(translate).collect();
        debug!(count = devices.len(), "hidapi enumeration");
        Ok(devices)
    }

    fn open(&self, info: &DeviceInfo) -> Result<Box<dyn HidHandle>> {
        let path = CString::new(info.path.as_bytes())
            .map_err(|_| Error::DeviceNotFound(info.path.clone()))?;
        let raw = self.api.lock().open_path(&path)?;
        Ok(Box::new(HidApiHandle { raw }))
    }
}

pub struct HidApiHandle {
    raw: HidDevice,
}

impl HidHandle for HidApiHandle {
    fn set_nonblocking(&mut self, nonblocking: bool) -> Result<()> {
        Ok(self.raw.set_blocking_mode(!nonblocking)?)
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize> {
        Ok(self.raw.read_timeout(buf, timeout_ms)?)
    }

    fn report_descriptor(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.raw.get_report_descriptor(buf)?)
    }

    fn indexed_string(&mut self, index: i32) -> Result<Option<String>> {
        Ok(self.raw.get_indexed_string(index)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_types_map_one_to_one() {
        assert_eq!(bus_type(hidapi::BusType::Usb), BusType::Usb);
        assert_eq!(bus_type(hidapi::BusType::Bluetooth), BusType::Bluetooth);
        assert_eq!(bus_type(hidapi::BusType::I2c), BusType::I2c);
        assert_eq!(bus_type(hidapi::BusType::Spi), BusType::Spi);
        assert_eq!(bus_type(hidapi::BusType::Unknown), BusType::Unknown);
    }
}
