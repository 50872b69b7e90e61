//! Transport seam.
//!
//! The manager never talks to a HID stack directly. It enumerates and opens
//! through a [`HidBackend`] and performs I/O through the [`HidHandle`]s the
//! backend returns. [`crate::backends::hid`] implements both over `hidapi`;
//! [`crate::backends::virtual_input`] implements them in memory for tests.

use crate::error::Result;
use crate::metadata::DeviceInfo;

/// Upper bound on a report descriptor fetched from a device (HID 1.11 limit).
pub const MAX_REPORT_DESCRIPTOR_SIZE: usize = 4096;

/// Enumeration and open-by-path.
pub trait HidBackend: Send + Sync {
    /// All HID interfaces currently present, translated to owned records.
    fn enumerate(&self) -> Result<Vec<DeviceInfo>>;

    /// Open the interface at `info.path`.
    fn open(&self, info: &DeviceInfo) -> Result<Box<dyn HidHandle>>;
}

/// An open HID interface.
///
/// Implementations are moved into poll worker threads, hence `Send`. They
/// are never shared without a lock, so `Sync` is not required.
pub trait HidHandle: Send {
    /// Switch between blocking and non-blocking reads.
    fn set_nonblocking(&mut self, nonblocking: bool) -> Result<()>;

    /// Read one input report, waiting at most `timeout_ms`.
    ///
    /// Returns the number of bytes written into `buf`; `0` means no report
    /// arrived in time.
    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize>;

    /// Copy the raw report descriptor into `buf`, returning its length.
    fn report_descriptor(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// USB string descriptor `index`, if the device has one.
    fn indexed_string(&mut self, index: i32) -> Result<Option<String>>;
}
