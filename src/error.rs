//! Crate error type.
//!
//! Only the edges of the crate return errors: the transport seam, config
//! loading, and the label/snapshot files. Descriptor parsing, usage lookups,
//! field extraction and the poll loop degrade instead of failing.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[cfg(feature = "hid")]
    #[error("HID transport error: {0}")]
    Hid(#[from] hidapi::HidError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("operation not supported: {0}")]
    Unsupported(String),

    #[error("invalid snapshot file: {0}")]
    InvalidSnapshot(String),

    #[error("label is {0} bytes; at most 255 fit in a label record")]
    LabelTooLong(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
