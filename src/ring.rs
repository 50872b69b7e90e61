//! Per-device report ring.
//!
//! A [`ReportRing`] holds a fixed number of [`ReportSnapshot`] slots and a
//! cursor naming the most recently published one. Exactly one thread writes
//! (the poll worker that owns the device); any number of threads read.
//!
//! # Publish rules
//! - The writer fills slot `current + 1` (wrapping) completely, then stores
//!   the cursor with `Release`. Readers load it with `Acquire`, so a slot
//!   named by the cursor is always fully written.
//! - Each slot sits behind its own `RwLock`, held only for the copy in or
//!   out. Readers walking every slot for a series therefore never see a
//!   torn report either, and no lock is held while the writer blocks on the
//!   device.
//! - A read that produced no data [`forward`](ReportRing::forward)s the
//!   current slot into the next one without moving the cursor, so the next
//!   slot never holds zeroed or stale-by-a-lap data.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::RwLock;

/// One captured report.
#[derive(Debug, Clone)]
pub struct ReportSnapshot {
    len: usize,
    data: Box<[u8]>,
    captured_at: Option<Instant>,
}

impl ReportSnapshot {
    fn empty(capacity: usize) -> Self {
        Self {
            len: 0,
            data: vec![0u8; capacity].into_boxed_slice(),
            captured_at: None,
        }
    }

    /// Number of valid bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The report bytes as read from the device.
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Slot capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// When the report was read; `None` for a slot that was never written.
    pub fn captured_at(&self) -> Option<Instant> {
        self.captured_at
    }

    fn fill(&mut self, report: &[u8], at: Instant) {
        let n = report.len().min(self.data.len());
        self.data[..n].copy_from_slice(&report[..n]);
        self.len = n;
        self.captured_at = Some(at);
    }

    fn copy_from(&mut self, other: &ReportSnapshot) {
        let n = other.len.min(self.data.len());
        self.data[..n].copy_from_slice(&other.data[..n]);
        self.len = n;
        self.captured_at = other.captured_at;
    }
}

impl PartialEq for ReportSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.bytes() == other.bytes() && self.captured_at == other.captured_at
    }
}

impl Eq for ReportSnapshot {}

/// Fixed-size single-writer, multi-reader ring of reports.
#[derive(Debug)]
pub struct ReportRing {
    slots: Box<[RwLock<ReportSnapshot>]>,
    current: AtomicUsize,
    published: AtomicU64,
}

impl ReportRing {
    /// A ring of `slots` slots (at least 2) of `capacity` bytes (at least 1).
    pub fn new(slots: usize, capacity: usize) -> Self {
        let slots = slots.max(2);
        let capacity = capacity.max(1);
        Self {
            slots: (0..slots)
                .map(|_| RwLock::new(ReportSnapshot::empty(capacity)))
                .collect(),
            current: AtomicUsize::new(0),
            published: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bytes per slot.
    pub fn slot_capacity(&self) -> usize {
        self.slots[0].read().capacity()
    }

    /// Index of the most recently published slot.
    pub fn current_index(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    /// Number of reports published since creation.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Copy of the most recently published report. Never blocks on the
    /// device; at worst waits for one in-flight slot copy.
    pub fn latest(&self) -> ReportSnapshot {
        let idx = self.current_index();
        self.slots[idx].read().clone()
    }

    /// Copy of slot `index`, if it exists.
    pub fn slot(&self, index: usize) -> Option<ReportSnapshot> {
        self.slots.get(index).map(|s| s.read().clone())
    }

    /// Visit every slot in index order.
    pub fn for_each_slot(&self, mut f: impl FnMut(usize, &ReportSnapshot)) {
        for (i, slot) in self.slots.iter().enumerate() {
            f(i, &slot.read());
        }
    }

    fn next_index(&self, current: usize) -> usize {
        (current + 1) % self.slots.len()
    }

    /// Write `report` into the next slot and make it current.
    ///
    /// Must only be called from the ring's single writer. An empty report is
    /// treated as "no data" and [`forward`](Self::forward)ed instead.
    pub fn publish(&self, report: &[u8], captured_at: Instant) {
        if report.is_empty() {
            self.forward();
            return;
        }

        let next = self.next_index(self.current.load(Ordering::Relaxed));
        self.slots[next].write().fill(report, captured_at);
        self.current.store(next, Ordering::Release);
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current slot into the next one without publishing it.
    ///
    /// Must only be called from the ring's single writer.
    pub fn forward(&self) {
        let current = self.current.load(Ordering::Relaxed);
        let next = self.next_index(current);
        let prev = self.slots[current].read();
        self.slots[next].write().copy_from(&prev);
    }

    /// Observed publish rate in Hz, from the spread of distinct capture
    /// timestamps held in the ring. `None` until two reports were captured.
    pub fn update_rate(&self) -> Option<f64> {
        let mut stamps: Vec<Instant> = Vec::with_capacity(self.slots.len());
        self.for_each_slot(|_, s| stamps.extend(s.captured_at()));
        stamps.sort_unstable();
        stamps.dedup();

        let (first, last) = (stamps.first()?, stamps.last()?);
        let span = last.duration_since(*first).as_secs_f64();
        if stamps.len() < 2 || span <= 0.0 {
            return None;
        }
        Some((stamps.len() - 1) as f64 / span)
    }
}
