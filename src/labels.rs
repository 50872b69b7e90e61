//! User-chosen display names for decoded fields.
//!
//! Labels are keyed by [`field_key`](crate::descriptor::field_key), so they
//! follow a field across reconnects and across identical devices. On disk a
//! label file is a plain sequence of records, with no header:
//!
//! ```text
//! key: u64 LE | len: u8 | label: [u8; len] (UTF-8)
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descriptor::FieldDefinition;
use crate::error::{Error, Result};
use crate::metadata::DeviceInfo;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelStore {
    labels: BTreeMap<u64, String>,
}

impl LabelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: u64) -> Option<&str> {
        self.labels.get(&key).map(String::as_str)
    }

    /// Label of `field` on `device`, if one was set.
    pub fn label_for(&self, device: &DeviceInfo, field: &FieldDefinition) -> Option<&str> {
        self.get(field.key(device.vendor_id, device.product_id))
    }

    /// Set a label, returning the one it replaced. Labels longer than 255
    /// bytes do not fit a record and are rejected.
    pub fn set(&mut self, key: u64, label: impl Into<String>) -> Result<Option<String>> {
        let label = label.into();
        if label.len() > usize::from(u8::MAX) {
            return Err(Error::LabelTooLong(label.len()));
        }
        Ok(self.labels.insert(key, label))
    }

    /// [`set`](Self::set) keyed by `field` on `device`.
    pub fn set_field(
        &mut self,
        device: &DeviceInfo,
        field: &FieldDefinition,
        label: impl Into<String>,
    ) -> Result<Option<String>> {
        self.set(field.key(device.vendor_id, device.product_id), label)
    }

    pub fn remove(&mut self, key: u64) -> Option<String> {
        self.labels.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)> {
        self.labels.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Read records until end of input. A record cut short is an error;
    /// invalid UTF-8 is replaced rather than rejected.
    pub fn read_from(mut reader: impl Read) -> Result<Self> {
        let mut store = Self::new();
        loop {
            let mut key = [0u8; 8];
            if !read_record_start(&mut reader, &mut key)? {
                break;
            }
            let mut len = [0u8; 1];
            reader.read_exact(&mut len)?;
            let mut bytes = vec![0u8; usize::from(len[0])];
            reader.read_exact(&mut bytes)?;
            store.labels.insert(
                u64::from_le_bytes(key),
                String::from_utf8_lossy(&bytes).into_owned(),
            );
        }
        Ok(store)
    }

    /// Write all records in key order.
    pub fn write_to(&self, mut writer: impl Write) -> Result<()> {
        for (key, label) in &self.labels {
            let len = u8::try_from(label.len()).map_err(|_| Error::LabelTooLong(label.len()))?;
            writer.write_all(&key.to_le_bytes())?;
            writer.write_all(&[len])?;
            writer.write_all(label.as_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Load a label file; a missing file is an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        match File::open(path) {
            Ok(f) => Self::read_from(BufReader::new(f)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.write_to(BufWriter::new(File::create(path)?))
    }
}

/// Fill `buf`, or return `false` on a clean end of input before any byte.
fn read_record_start(reader: &mut impl Read, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated label record",
                )))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}
