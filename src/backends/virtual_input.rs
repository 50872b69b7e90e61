//! In-memory transport.
//!
//! A [`VirtualDevice`] is a scripted HID interface: it carries a report
//! descriptor, optional indexed strings, and a queue of read outcomes that
//! the poll loop consumes one per read. Once the queue is empty every read
//! times out. A [`VirtualFeed`] (from [`VirtualDevice::feed`]) keeps pushing
//! into the queue after the device has been handed to a manager.
//!
//! ```
//! use ffbscope::backends::virtual_input::{VirtualBackend, VirtualDevice};
//!
//! let dev = VirtualDevice::new("virtual:0", 0x1209, 0x0001).with_product("Test Wheel");
//! let feed = dev.feed();
//! let backend = VirtualBackend::new(vec![dev]);
//! feed.push_report(&[0x01, 0x80]);
//! # drop(backend);
//! ```

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::device::{HidBackend, HidHandle};
use crate::error::{Error, Result};
use crate::metadata::{BusType, DeviceInfo};

/// One scripted read outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStep {
    Report(Vec<u8>),
    Timeout,
    Error,
}

#[derive(Debug, Default)]
struct Script {
    steps: Mutex<VecDeque<ReadStep>>,
    reads: AtomicU64,
}

/// Cloneable handle for feeding a virtual device's read queue.
#[derive(Debug, Clone)]
pub struct VirtualFeed {
    script: Arc<Script>,
}

impl VirtualFeed {
    pub fn push(&self, step: ReadStep) {
        self.script.steps.lock().push_back(step);
    }

    pub fn push_report(&self, report: &[u8]) {
        self.push(ReadStep::Report(report.to_vec()));
    }

    pub fn push_timeout(&self) {
        self.push(ReadStep::Timeout);
    }

    pub fn push_error(&self) {
        self.push(ReadStep::Error);
    }

    /// Steps not consumed yet.
    pub fn pending(&self) -> usize {
        self.script.steps.lock().len()
    }

    /// Reads performed so far, including timeouts and errors.
    pub fn reads(&self) -> u64 {
        self.script.reads.load(Ordering::Acquire)
    }
}

/// A scripted device.
#[derive(Debug, Clone)]
pub struct VirtualDevice {
    info: DeviceInfo,
    descriptor: Vec<u8>,
    strings: HashMap<i32, String>,
    script: Arc<Script>,
    fail_open: bool,
}

impl VirtualDevice {
    pub fn new(path: &str, vendor_id: u16, product_id: u16) -> Self {
        Self {
            info: DeviceInfo {
                path: path.to_string(),
                vendor_id,
                product_id,
                interface_number: -1,
                bus_type: BusType::Unknown,
                ..Default::default()
            },
            descriptor: Vec::new(),
            strings: HashMap::new(),
            script: Arc::new(Script::default()),
            fail_open: false,
        }
    }

    pub fn with_product(mut self, product: &str) -> Self {
        self.info.product_string = Some(product.to_string());
        self
    }

    pub fn with_info(mut self, f: impl FnOnce(&mut DeviceInfo)) -> Self {
        f(&mut self.info);
        self
    }

    pub fn with_descriptor(mut self, descriptor: &[u8]) -> Self {
        self.descriptor = descriptor.to_vec();
        self
    }

    pub fn with_string(mut self, index: i32, s: &str) -> Self {
        self.strings.insert(index, s.to_string());
        self
    }

    /// Make [`HidBackend::open`] fail for this device.
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn feed(&self) -> VirtualFeed {
        VirtualFeed {
            script: Arc::clone(&self.script),
        }
    }
}

/// Backend over a fixed set of [`VirtualDevice`]s.
#[derive(Debug, Default)]
pub struct VirtualBackend {
    devices: Vec<VirtualDevice>,
    fail_enumeration: bool,
}

impl VirtualBackend {
    pub fn new(devices: Vec<VirtualDevice>) -> Self {
        Self {
            devices,
            fail_enumeration: false,
        }
    }

    /// A backend whose enumeration always fails.
    pub fn unavailable() -> Self {
        Self {
            devices: Vec::new(),
            fail_enumeration: true,
        }
    }
}

impl HidBackend for VirtualBackend {
    fn enumerate(&self) -> Result<Vec<DeviceInfo>> {
        if self.fail_enumeration {
            return Err(Error::Unsupported("virtual enumeration disabled".into()));
        }
        Ok(self.devices.iter().map(|d| d.info.clone()).collect())
    }

    fn open(&self, info: &DeviceInfo) -> Result<Box<dyn HidHandle>> {
        let dev = self
            .devices
            .iter()
            .find(|d| d.info.path == info.path)
            .ok_or_else(|| Error::DeviceNotFound(info.path.clone()))?;
        if dev.fail_open {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("cannot open {}", info.path),
            )));
        }
        Ok(Box::new(VirtualHandle {
            descriptor: dev.descriptor.clone(),
            strings: dev.strings.clone(),
            script: Arc::clone(&dev.script),
        }))
    }
}

struct VirtualHandle {
    descriptor: Vec<u8>,
    strings: HashMap<i32, String>,
    script: Arc<Script>,
}

impl HidHandle for VirtualHandle {
    fn set_nonblocking(&mut self, _nonblocking: bool) -> Result<()> {
        // Scripted reads never block.
        Ok(())
    }

    fn read_timeout(&mut self, buf: &mut [u8], _timeout_ms: i32) -> Result<usize> {
        let step = self.script.steps.lock().pop_front();
        self.script.reads.fetch_add(1, Ordering::Release);
        match step {
            Some(ReadStep::Report(report)) => {
                let n = report.len().min(buf.len());
                buf[..n].copy_from_slice(&report[..n]);
                Ok(n)
            }
            Some(ReadStep::Timeout) | None => Ok(0),
            Some(ReadStep::Error) => Err(Error::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "scripted read failure",
            ))),
        }
    }

    fn report_descriptor(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.descriptor.len().min(buf.len());
        buf[..n].copy_from_slice(&self.descriptor[..n]);
        Ok(n)
    }

    fn indexed_string(&mut self, index: i32) -> Result<Option<String>> {
        Ok(self.strings.get(&index).cloned())
    }
}
