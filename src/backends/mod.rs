//! Transport backends for `ffbscope`.
//!
//! Implementations of [`HidBackend`](crate::device::HidBackend) /
//! [`HidHandle`](crate::device::HidHandle).
//!
//! # Feature flags
//! - **`hid`** (default) enables the `hidapi` backend.
//!
//! The virtual backend is always available; it needs no hardware and is what
//! the test suite drives the manager with.

#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod hid;

pub mod virtual_input;
