//! ffbscope: HID force-feedback inspector.
//!
//! Decodes HID report descriptors into typed field lists and samples live
//! input reports from many devices at once into per-device report rings.
//!
//! - [`descriptor::parse`] turns raw descriptor bytes into a [`Descriptor`].
//! - [`usage::find_usage_definition`] names a `(page, usage)` pair.
//! - [`DeviceManager`] opens devices, polls them on worker threads and
//!   serves the latest report or a per-field time series.
//! - [`extract`] pulls one field's value out of a report.
//!
//! The manager talks to hardware through the [`HidBackend`] trait; the
//! default `hid` feature provides a `hidapi` implementation and
//! [`backends::virtual_input`] provides a scripted one.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod backends;
pub mod config;
pub mod descriptor;
pub mod device;
pub mod error;
pub mod extract;
pub mod labels;
pub mod manager;
pub mod metadata;
pub mod ring;
pub mod snapshot;
pub mod unit;
pub mod usage;

pub use config::ManagerConfig;
pub use descriptor::{Descriptor, FieldDefinition, FieldKind, FieldProperties, UsagePage};
pub use device::{HidBackend, HidHandle};
pub use error::{Error, Result};
pub use labels::LabelStore;
pub use manager::{DeviceManager, DeviceStatus};
pub use metadata::{BusType, DeviceInfo};
pub use ring::{ReportRing, ReportSnapshot};
pub use usage::{find_usage_definition, UsageDef};
