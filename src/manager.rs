//! Device manager.
//!
//! [`DeviceManager`] opens every matching HID interface once, captures its
//! report descriptor, and samples input reports into a per-device
//! [`ReportRing`] from a small pool of poll workers.
//!
//! # Lifecycle
//! - [`DeviceManager::init`] enumerates, opens, allocates rings and starts
//!   the workers. It runs at most once; [`get_devices`](DeviceManager::get_devices)
//!   calls it lazily. A failed enumeration leaves the manager running with
//!   zero devices.
//! - [`DeviceManager::shutdown`] (also run on drop) raises the stop flag and
//!   joins every worker. A manager that has been shut down does not poll
//!   again.
//!
//! # Threading
//! Devices are dealt round-robin to `min(workers, devices)` threads, where
//! `workers` is `max_workers` or the available hardware parallelism. Each
//! worker ticks on an absolute schedule: for every device it owns it does one
//! bounded read, then publishes or forwards into that device's ring.
//!
//! The device handle sits behind a mutex shared by the poll worker and
//! [`DeviceManager::open_device`], so direct I/O never races the poll loop.
//! The worker never waits for that mutex: while a guard is alive it forwards
//! the device's ring each tick and moves on to the next device.
//! [`open_device`](DeviceManager::open_device) itself may wait for one
//! in-flight bounded read.
//!
//! # Example
//! ```no_run
//! use ffbscope::{DeviceManager, ManagerConfig};
//!
//! let mgr = DeviceManager::hid(ManagerConfig::default())?;
//! for dev in mgr.get_devices() {
//!     let Some(descriptor) = mgr.descriptor(dev) else { continue };
//!     for field in &descriptor.inputs {
//!         let series = mgr.get_input_series(dev, field);
//!         println!("{dev}: {} -> {} samples", field.usage(), series.len());
//!     }
//! }
//! # Ok::<(), ffbscope::Error>(())
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ManagerConfig;
use crate::descriptor::{self, Descriptor, FieldDefinition};
use crate::device::{HidBackend, HidHandle, MAX_REPORT_DESCRIPTOR_SIZE};
use crate::error::{Error, Result};
use crate::extract;
use crate::metadata::DeviceInfo;
use crate::ring::{ReportRing, ReportSnapshot};
use crate::snapshot::DeviceExport;

/// Polling state of one device, for display layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceStatus {
    /// No report received yet.
    Idle,
    /// The last read that returned anything returned a report.
    Streaming,
    /// The last read failed. Cleared by the next successful read.
    ReadError,
}

impl DeviceStatus {
    fn to_u8(self) -> u8 {
        match self {
            DeviceStatus::Idle => 0,
            DeviceStatus::Streaming => 1,
            DeviceStatus::ReadError => 2,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => DeviceStatus::Streaming,
            2 => DeviceStatus::ReadError,
            _ => DeviceStatus::Idle,
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceStatus::Idle => "idle",
            DeviceStatus::Streaming => "streaming",
            DeviceStatus::ReadError => "error reading from device",
        })
    }
}

/// Exclusive access to a device handle. Polling of that device pauses while
/// the guard is alive.
pub type DeviceGuard<'a> = MutexGuard<'a, Box<dyn HidHandle>>;

/// Everything the manager keeps per opened device.
struct DeviceRecord {
    info: DeviceInfo,
    handle: Mutex<Box<dyn HidHandle>>,
    ring: ReportRing,
    /// Raw descriptor bytes captured at open time; empty if the fetch failed.
    report_descriptor: Vec<u8>,
    status: AtomicU8,
}

impl DeviceRecord {
    fn status(&self) -> DeviceStatus {
        DeviceStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    fn set_status(&self, status: DeviceStatus) -> DeviceStatus {
        DeviceStatus::from_u8(self.status.swap(status.to_u8(), Ordering::AcqRel))
    }

    /// One tick for this device: bounded read, then publish or forward.
    /// A handle checked out through [`DeviceManager::open_device`] counts as
    /// a tick with no data.
    fn poll_once(&self, scratch: &mut [u8], timeout_ms: i32) {
        let Some(mut handle) = self.handle.try_lock() else {
            self.ring.forward();
            return;
        };
        let result = handle.read_timeout(scratch, timeout_ms);
        drop(handle);
        let now = Instant::now();

        match result {
            Ok(n) if n > 0 => {
                self.ring.publish(&scratch[..n.min(scratch.len())], now);
                let prev = self.set_status(DeviceStatus::Streaming);
                if prev == DeviceStatus::ReadError {
                    info!(device = %self.info, "device reads recovered");
                }
            }
            Ok(_) => self.ring.forward(),
            Err(e) => {
                self.ring.forward();
                if self.set_status(DeviceStatus::ReadError) != DeviceStatus::ReadError {
                    warn!(device = %self.info, error = %e, "error reading from device");
                }
            }
        }
    }
}

struct Inner {
    devices: Vec<DeviceInfo>,
    records: HashMap<String, Arc<DeviceRecord>>,
}

/// Concurrent HID sampler. See the [module docs](self).
pub struct DeviceManager {
    backend: Box<dyn HidBackend>,
    config: ManagerConfig,
    inner: OnceLock<Inner>,
    running: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl DeviceManager {
    pub fn new(backend: Box<dyn HidBackend>, config: ManagerConfig) -> Self {
        Self {
            backend,
            config: config.clamped(),
            inner: OnceLock::new(),
            running: Arc::new(AtomicBool::new(true)),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// A manager over the platform `hidapi` transport.
    #[cfg(feature = "hid")]
    #[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
    pub fn hid(config: ManagerConfig) -> Result<Self> {
        let backend = crate::backends::hid::HidApiBackend::new()?;
        Ok(Self::new(Box::new(backend), config))
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Enumerate, open and start polling. Later calls do nothing.
    pub fn init(&self) {
        self.inner();
    }

    fn inner(&self) -> &Inner {
        self.inner.get_or_init(|| self.start())
    }

    fn start(&self) -> Inner {
        let listed = match self.backend.enumerate() {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "device enumeration failed; continuing with no devices");
                Vec::new()
            }
        };

        let mut devices = Vec::new();
        let mut records = HashMap::new();
        for info in listed {
            if !info.matches(self.config.vendor_id, self.config.product_id) {
                continue;
            }
            if records.contains_key(&info.path) {
                debug!(path = %info.path, "duplicate device path; skipping");
                continue;
            }
            match self.open_record(&info) {
                Ok(record) => {
                    records.insert(info.path.clone(), Arc::new(record));
                    devices.push(info);
                }
                Err(e) => warn!(device = %info, error = %e, "failed to open device"),
            }
        }
        info!(count = devices.len(), "devices opened");

        // Shard in enumeration order so assignment is deterministic.
        let ordered: Vec<Arc<DeviceRecord>> = devices
            .iter()
            .filter_map(|d| records.get(&d.path).cloned())
            .collect();
        self.spawn_workers(ordered);

        Inner { devices, records }
    }

    fn open_record(&self, info: &DeviceInfo) -> Result<DeviceRecord> {
        let mut handle = self.backend.open(info)?;
        if let Err(e) = handle.set_nonblocking(true) {
            debug!(device = %info, error = %e, "could not enable non-blocking reads");
        }

        let mut buf = vec![0u8; MAX_REPORT_DESCRIPTOR_SIZE];
        let report_descriptor = match handle.report_descriptor(&mut buf) {
            Ok(n) => {
                buf.truncate(n.min(MAX_REPORT_DESCRIPTOR_SIZE));
                buf
            }
            Err(e) => {
                warn!(device = %info, error = %e, "failed to read report descriptor");
                Vec::new()
            }
        };

        Ok(DeviceRecord {
            info: info.clone(),
            handle: Mutex::new(handle),
            ring: ReportRing::new(self.config.ring_slots, self.config.slot_capacity),
            report_descriptor,
            status: AtomicU8::new(DeviceStatus::Idle.to_u8()),
        })
    }

    fn worker_count(&self, devices: usize) -> usize {
        let cap = match self.config.max_workers {
            0 => thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        };
        cap.min(devices)
    }

    fn spawn_workers(&self, records: Vec<Arc<DeviceRecord>>) {
        let count = self.worker_count(records.len());
        if count == 0 {
            return;
        }

        let mut groups: Vec<Vec<Arc<DeviceRecord>>> = vec![Vec::new(); count];
        for (i, record) in records.into_iter().enumerate() {
            groups[i % count].push(record);
        }

        let mut workers = self.workers.lock();
        for (id, group) in groups.into_iter().enumerate() {
            let running = Arc::clone(&self.running);
            let period = self.config.sample_interval();
            let timeout_ms = self.config.read_timeout_ms;
            let capacity = self.config.slot_capacity;
            let devices = group.len();

            let spawned = thread::Builder::new()
                .name(format!("ffbscope-poll-{id}"))
                .spawn(move || poll_loop(id, group, running, period, timeout_ms, capacity));
            match spawned {
                Ok(handle) => {
                    debug!(worker = id, devices, "poll worker started");
                    workers.push(handle);
                }
                Err(e) => warn!(worker = id, error = %e, "failed to spawn poll worker"),
            }
        }
    }

    fn record(&self, device: &DeviceInfo) -> Option<&Arc<DeviceRecord>> {
        self.inner().records.get(&device.path)
    }

    /// Devices opened at init, in enumeration order.
    pub fn get_devices(&self) -> &[DeviceInfo] {
        &self.inner().devices
    }

    /// Most recently published report of `device`.
    pub fn get_latest_report(&self, device: &DeviceInfo) -> Option<ReportSnapshot> {
        self.record(device).map(|r| r.ring.latest())
    }

    /// One sample of `field` per ring slot, in slot order. Rotate by
    /// [`current_index`](Self::current_index) + 1 for chronological order.
    ///
    /// Empty for unknown devices.
    pub fn get_input_series(&self, device: &DeviceInfo, field: &FieldDefinition) -> Vec<f32> {
        self.record(device)
            .map(|r| extract::series(&r.ring, field))
            .unwrap_or_default()
    }

    /// Ring slot currently exposed by [`get_latest_report`](Self::get_latest_report).
    pub fn current_index(&self, device: &DeviceInfo) -> Option<usize> {
        self.record(device).map(|r| r.ring.current_index())
    }

    /// Raw report descriptor captured at open time.
    pub fn report_descriptor(&self, device: &DeviceInfo) -> Option<&[u8]> {
        self.record(device).map(|r| r.report_descriptor.as_slice())
    }

    /// Parsed report descriptor.
    pub fn descriptor(&self, device: &DeviceInfo) -> Option<Descriptor> {
        self.report_descriptor(device).map(descriptor::parse)
    }

    /// Identity and parsed descriptor of every device, ready for
    /// [`write_snapshot`](crate::snapshot::write_snapshot).
    pub fn export(&self) -> Vec<DeviceExport> {
        self.get_devices()
            .iter()
            .map(|d| DeviceExport::new(d, self.descriptor(d).unwrap_or_default()))
            .collect()
    }

    /// Lock the device handle for direct I/O. The device is not sampled
    /// while the guard is alive; other devices keep polling.
    pub fn open_device(&self, device: &DeviceInfo) -> Result<DeviceGuard<'_>> {
        self.record(device)
            .map(|r| r.handle.lock())
            .ok_or_else(|| Error::DeviceNotFound(device.path.clone()))
    }

    /// USB string descriptor `index` of `device`.
    pub fn indexed_string(&self, device: &DeviceInfo, index: i32) -> Result<Option<String>> {
        self.open_device(device)?.indexed_string(index)
    }

    /// Observed sampling rate in Hz.
    pub fn update_rate(&self, device: &DeviceInfo) -> Option<f64> {
        self.record(device).and_then(|r| r.ring.update_rate())
    }

    pub fn device_status(&self, device: &DeviceInfo) -> Option<DeviceStatus> {
        self.record(device).map(|r| r.status())
    }

    /// Stop and join every poll worker. Idempotent.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
        let workers: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        if workers.is_empty() {
            return;
        }
        let count = workers.len();
        for handle in workers {
            if handle.join().is_err() {
                warn!("poll worker panicked");
            }
        }
        info!(workers = count, "poll workers stopped");
    }
}

impl Drop for DeviceManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for DeviceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceManager")
            .field("config", &self.config)
            .field("devices", &self.inner.get().map(|i| i.devices.len()))
            .field("running", &self.running.load(Ordering::Relaxed))
            .finish()
    }
}

/// Next absolute deadline after `deadline`, skipping ticks already missed
/// at `now` so a stall does not cause a burst of catch-up reads.
fn advance_deadline(deadline: Instant, period: Duration, now: Instant) -> Instant {
    let next = deadline + period;
    if next > now {
        return next;
    }
    let behind = now.duration_since(next).as_nanos();
    let skip = behind / period.as_nanos().max(1) + 1;
    next + period.saturating_mul(u32::try_from(skip).unwrap_or(u32::MAX))
}

fn poll_loop(
    id: usize,
    group: Vec<Arc<DeviceRecord>>,
    running: Arc<AtomicBool>,
    period: Duration,
    timeout_ms: i32,
    capacity: usize,
) {
    let mut scratch = vec![0u8; capacity];
    let mut deadline = Instant::now() + period;

    while running.load(Ordering::Acquire) {
        for record in &group {
            record.poll_once(&mut scratch, timeout_ms);
        }

        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
        deadline = advance_deadline(deadline, period, Instant::now());
    }

    debug!(worker = id, "poll worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::{VirtualBackend, VirtualDevice};

    fn quick_config() -> ManagerConfig {
        ManagerConfig {
            sample_interval_us: 200,
            ring_slots: 8,
            slot_capacity: 16,
            ..Default::default()
        }
    }

    #[test]
    fn deadlines_are_absolute() {
        let t0 = Instant::now();
        let p = Duration::from_millis(10);
        // On time: exactly one period later, regardless of jitter before it.
        assert_eq!(advance_deadline(t0, p, t0 + Duration::from_millis(3)), t0 + p);
        // 25ms late: ticks at 10 and 20 were missed, next is 30.
        assert_eq!(
            advance_deadline(t0, p, t0 + Duration::from_millis(25)),
            t0 + Duration::from_millis(30)
        );
    }

    #[test]
    fn worker_count_is_bounded_by_devices() {
        let cfg = ManagerConfig {
            max_workers: 4,
            ..quick_config()
        };
        let mgr = DeviceManager::new(Box::new(VirtualBackend::default()), cfg);
        assert_eq!(mgr.worker_count(0), 0);
        assert_eq!(mgr.worker_count(2), 2);
        assert_eq!(mgr.worker_count(9), 4);
    }

    #[test]
    fn init_is_idempotent() {
        let backend = VirtualBackend::new(vec![VirtualDevice::new("v0", 1, 1)]);
        let mgr = DeviceManager::new(Box::new(backend), quick_config());
        mgr.init();
        mgr.init();
        assert_eq!(mgr.get_devices().len(), 1);
        assert_eq!(mgr.workers.lock().len(), 1);
        mgr.shutdown();
        assert!(mgr.workers.lock().is_empty());
    }

    #[test]
    fn status_tracks_reads() {
        let dev = VirtualDevice::new("v0", 1, 1);
        let feed = dev.feed();
        let backend = VirtualBackend::new(vec![dev.clone()]);
        let info = dev.info().clone();
        let handle = backend.open(&info).unwrap();
        let record = DeviceRecord {
            info,
            handle: Mutex::new(handle),
            ring: ReportRing::new(4, 4),
            report_descriptor: Vec::new(),
            status: AtomicU8::new(DeviceStatus::Idle.to_u8()),
        };
        let mut scratch = [0u8; 4];

        record.poll_once(&mut scratch, 0);
        assert_eq!(record.status(), DeviceStatus::Idle);

        feed.push_report(&[7]);
        record.poll_once(&mut scratch, 0);
        assert_eq!(record.status(), DeviceStatus::Streaming);

        feed.push_error();
        record.poll_once(&mut scratch, 0);
        assert_eq!(record.status(), DeviceStatus::ReadError);
        assert_eq!(record.ring.latest().bytes(), &[7]);

        // A timeout does not clear the error.
        record.poll_once(&mut scratch, 0);
        assert_eq!(record.status(), DeviceStatus::ReadError);

        feed.push_report(&[8]);
        record.poll_once(&mut scratch, 0);
        assert_eq!(record.status(), DeviceStatus::Streaming);
    }

    #[test]
    fn checked_out_handle_is_skipped() {
        let dev = VirtualDevice::new("v0", 1, 1);
        let feed = dev.feed();
        let backend = VirtualBackend::new(vec![dev.clone()]);
        let info = dev.info().clone();
        let record = DeviceRecord {
            info: info.clone(),
            handle: Mutex::new(backend.open(&info).unwrap()),
            ring: ReportRing::new(4, 4),
            report_descriptor: Vec::new(),
            status: AtomicU8::new(DeviceStatus::Idle.to_u8()),
        };
        let mut scratch = [0u8; 4];

        feed.push_report(&[3]);
        record.poll_once(&mut scratch, 0);
        feed.push_report(&[4]);

        let guard = record.handle.lock();
        record.poll_once(&mut scratch, 0);
        assert_eq!(feed.pending(), 1);
        assert_eq!(record.ring.latest().bytes(), &[3]);
        let next = (record.ring.current_index() + 1) % 4;
        assert_eq!(record.ring.slot(next).unwrap().bytes(), &[3]);
        drop(guard);

        record.poll_once(&mut scratch, 0);
        assert_eq!(record.ring.latest().bytes(), &[4]);
    }
}
