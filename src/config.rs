//! Manager configuration.
//!
//! Every key is optional; missing keys take the defaults below.
//!
//! ```toml
//! sample_interval_us = 8333   # ~120 Hz
//! ring_slots = 1200
//! slot_capacity = 256
//! read_timeout_ms = 1
//! max_workers = 0             # 0 = one per hardware thread
//! vendor_id = 0x046d          # 0 = any
//! product_id = 0
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Poll period per worker, in microseconds.
    pub sample_interval_us: u64,
    /// Report slots per device ring.
    pub ring_slots: usize,
    /// Bytes per slot; longer reports are truncated.
    pub slot_capacity: usize,
    /// Bounded read timeout per device per tick.
    pub read_timeout_ms: i32,
    /// Worker thread cap; `0` uses the available hardware parallelism.
    pub max_workers: usize,
    /// Enumeration filter; `0` matches any vendor.
    pub vendor_id: u16,
    /// Enumeration filter; `0` matches any product.
    pub product_id: u16,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            sample_interval_us: 8333,
            ring_slots: 1200,
            slot_capacity: 256,
            read_timeout_ms: 1,
            max_workers: 0,
            vendor_id: 0,
            product_id: 0,
        }
    }
}

impl ManagerConfig {
    /// Parse TOML, then clamp out-of-range values.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s)?;
        Ok(cfg.clamped())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Raise every value to its usable minimum.
    pub fn clamped(mut self) -> Self {
        self.sample_interval_us = self.sample_interval_us.max(1);
        self.ring_slots = self.ring_slots.max(2);
        self.slot_capacity = self.slot_capacity.max(1);
        self.read_timeout_ms = self.read_timeout_ms.max(0);
        self
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_micros(self.sample_interval_us.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(ManagerConfig::from_toml_str("").unwrap(), ManagerConfig::default());
    }

    #[test]
    fn partial_documents_keep_defaults() {
        let cfg = ManagerConfig::from_toml_str("ring_slots = 64\nvendor_id = 0x046d\n").unwrap();
        assert_eq!(cfg.ring_slots, 64);
        assert_eq!(cfg.vendor_id, 0x046d);
        assert_eq!(cfg.slot_capacity, 256);
        assert_eq!(cfg.sample_interval(), Duration::from_micros(8333));
    }

    #[test]
    fn values_are_clamped() {
        let cfg = ManagerConfig::from_toml_str(
            "ring_slots = 0\nslot_capacity = 0\nsample_interval_us = 0\nread_timeout_ms = -5\n",
        )
        .unwrap();
        assert_eq!(cfg.ring_slots, 2);
        assert_eq!(cfg.slot_capacity, 1);
        assert_eq!(cfg.sample_interval_us, 1);
        assert_eq!(cfg.read_timeout_ms, 0);
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = ManagerConfig::from_toml_str("ring_slots = \"many\"").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn load_reads_a_file() {
        let path = std::env::temp_dir().join(format!("ffbscope-config-{}.toml", std::process::id()));
        std::fs::write(&path, "max_workers = 3\n").unwrap();
        let cfg = ManagerConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(cfg.max_workers, 3);
    }
}
