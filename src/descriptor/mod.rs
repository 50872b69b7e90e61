//! HID report descriptor model.
//!
//! [`parse`] turns the raw descriptor bytes fetched from a device into a
//! [`Descriptor`]: three ordered lists of [`FieldDefinition`]s (Input, Output,
//! Feature). Every field records where it lives in a report (`report_index`,
//! an absolute bit offset, and `report_size` in bits) together with the
//! usage, logical/physical ranges and unit that give the bits a meaning.
//!
//! Parsing is infallible. Device-supplied bytes are untrusted, so malformed
//! input produces a best-effort partial descriptor instead of an error.
//!
//! # Example
//! ```
//! use ffbscope::descriptor::{parse, UsagePage};
//!
//! // Usage Page (Button), Usage Min (1), Usage Max (4),
//! // Report Size (1), Report Count (4), Input (Data,Var,Abs)
//! let bytes = [0x05, 0x09, 0x19, 0x01, 0x29, 0x04, 0x75, 0x01, 0x95, 0x04, 0x81, 0x02];
//! let descriptor = parse(&bytes);
//!
//! assert_eq!(descriptor.inputs.len(), 4);
//! assert_eq!(descriptor.inputs[0].usage_page, UsagePage::BUTTON);
//! assert_eq!(descriptor.inputs[0].usage_id, 4);
//! ```

pub(crate) mod item;
mod parser;

pub use parser::parse;

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::usage::{find_usage_definition, UsageDef};

/// HID usage page identifier.
///
/// A thin wrapper rather than a closed enum: vendor pages (`0xFF00..`) and
/// pages newer than the usage table must round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsagePage(pub u16);

impl UsagePage {
    pub const UNDEFINED: Self = Self(0x00);
    pub const GENERIC_DESKTOP: Self = Self(0x01);
    pub const SIMULATION: Self = Self(0x02);
    pub const VIRTUAL_REALITY: Self = Self(0x03);
    pub const SPORT_CONTROLS: Self = Self(0x04);
    pub const GAME_CONTROLS: Self = Self(0x05);
    pub const GENERIC_DEVICE_CONTROLS: Self = Self(0x06);
    pub const KEYBOARD: Self = Self(0x07);
    pub const LED: Self = Self(0x08);
    pub const BUTTON: Self = Self(0x09);
    pub const ORDINAL: Self = Self(0x0A);
    pub const TELEPHONY: Self = Self(0x0B);
    pub const CONSUMER: Self = Self(0x0C);
    pub const DIGITIZER: Self = Self(0x0D);
    pub const HAPTICS: Self = Self(0x0E);
    pub const PID: Self = Self(0x0F);
    pub const UNICODE: Self = Self(0x10);
    pub const EYE_HEAD_TRACKER: Self = Self(0x12);
    pub const AUXILIARY_DISPLAY: Self = Self(0x14);
    pub const SENSORS: Self = Self(0x20);
    pub const MEDICAL_INSTRUMENT: Self = Self(0x40);
    pub const BRAILLE_DISPLAY: Self = Self(0x41);
    pub const LIGHTING_ILLUMINATION: Self = Self(0x59);
    pub const BAR_CODE_SCANNER: Self = Self(0x8C);

    pub fn is_vendor_defined(self) -> bool {
        self.0 >= 0xFF00
    }

    /// Human-readable page name, if the page is a known one.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::GENERIC_DESKTOP => "Generic Desktop",
            Self::SIMULATION => "Simulation Controls",
            Self::VIRTUAL_REALITY => "VR Controls",
            Self::SPORT_CONTROLS => "Sport Controls",
            Self::GAME_CONTROLS => "Game Controls",
            Self::GENERIC_DEVICE_CONTROLS => "Generic Device Controls",
            Self::KEYBOARD => "Keyboard/Keypad",
            Self::LED => "LED",
            Self::BUTTON => "Button",
            Self::ORDINAL => "Ordinal",
            Self::TELEPHONY => "Telephony Device",
            Self::CONSUMER => "Consumer",
            Self::DIGITIZER => "Digitizers",
            Self::HAPTICS => "Haptics",
            Self::PID => "Physical Input Device",
            Self::UNICODE => "Unicode",
            Self::EYE_HEAD_TRACKER => "Eye and Head Trackers",
            Self::AUXILIARY_DISPLAY => "Auxiliary Display",
            Self::SENSORS => "Sensors",
            Self::MEDICAL_INSTRUMENT => "Medical Instrument",
            Self::BRAILLE_DISPLAY => "Braille Display",
            Self::LIGHTING_ILLUMINATION => "Lighting And Illumination",
            Self::BAR_CODE_SCANNER => "Barcode Scanner",
            p if p.is_vendor_defined() => "Vendor-Defined",
            _ => return None,
        };
        Some(name)
    }
}

impl From<u16> for UsagePage {
    fn from(page: u16) -> Self {
        Self(page)
    }
}

impl From<UsagePage> for u16 {
    fn from(page: UsagePage) -> u16 {
        page.0
    }
}

impl fmt::Display for UsagePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({:#06x})", self.0),
            None => write!(f, "{:#06x}", self.0),
        }
    }
}

/// Which main item produced a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Input,
    Output,
    Feature,
}

impl FieldKind {
    pub(crate) fn to_byte(self) -> u8 {
        match self {
            FieldKind::Input => 0,
            FieldKind::Output => 1,
            FieldKind::Feature => 2,
        }
    }

    pub(crate) fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(FieldKind::Input),
            1 => Some(FieldKind::Output),
            2 => Some(FieldKind::Feature),
            _ => None,
        }
    }
}

bitflags! {
    /// Main item data bits (HID 1.11, section 6.2.2.5).
    ///
    /// Named after the meaning of the bit when set; the cleared state is the
    /// default (Data, Array, Absolute, ...).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FieldProperties: u16 {
        const CONSTANT = 1 << 0;
        const VARIABLE = 1 << 1;
        const RELATIVE = 1 << 2;
        const WRAP = 1 << 3;
        const NON_LINEAR = 1 << 4;
        const NO_PREFERRED_STATE = 1 << 5;
        const NULL_STATE = 1 << 6;
        /// Output and Feature only; reserved on Input items.
        const VOLATILE = 1 << 7;
        const BUFFERED_BYTES = 1 << 8;
    }
}

impl FieldProperties {
    /// Property bits 0..=8 of a main item payload.
    pub fn from_payload(kind: FieldKind, data: u32) -> Self {
        let props = Self::from_bits_truncate((data & 0x1FF) as u16);
        match kind {
            FieldKind::Input => props - Self::VOLATILE,
            FieldKind::Output | FieldKind::Feature => props,
        }
    }
}

/// One field of a report, as declared by the descriptor.
///
/// Input, Output and Feature fields share this layout; `kind` tells them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub kind: FieldKind,
    pub usage_page: UsagePage,
    pub report_id: u16,
    pub usage_id: u16,
    pub designator_index: u32,
    pub string_index: u32,
    /// Width of the field in bits.
    pub report_size: u8,
    /// Absolute bit offset of the field from the start of the report body.
    pub report_index: u32,
    pub logical_min: i32,
    pub logical_max: i32,
    pub physical_min: i32,
    pub physical_max: i32,
    /// Raw HID unit code; see [`crate::unit::Unit`].
    pub unit: u32,
    pub unit_exponent: i8,
    pub properties: FieldProperties,
}

impl FieldDefinition {
    /// Usage table entry for this field's `(usage_page, usage_id)`.
    pub fn usage(&self) -> UsageDef {
        find_usage_definition(self.usage_page.0, self.usage_id)
    }

    pub fn is_constant(&self) -> bool {
        self.properties.contains(FieldProperties::CONSTANT)
    }

    pub fn is_variable(&self) -> bool {
        self.properties.contains(FieldProperties::VARIABLE)
    }

    /// First bit past the end of this field.
    pub fn end_bit(&self) -> u64 {
        u64::from(self.report_index) + u64::from(self.report_size)
    }

    /// Stable identity of this field on a given device model.
    pub fn key(&self, vendor_id: u16, product_id: u16) -> u64 {
        field_key(vendor_id, product_id, self.report_id, self.report_index)
    }
}

/// Compose the 64-bit identity used to persist per-field labels.
///
/// Layout: `vid:16 | pid:16 | report_id:8 | report_index:24`.
pub fn field_key(vendor_id: u16, product_id: u16, report_id: u16, report_index: u32) -> u64 {
    (u64::from(vendor_id) << 48)
        | (u64::from(product_id) << 32)
        | (u64::from(report_id & 0xFF) << 24)
        | u64::from(report_index & 0x00FF_FFFF)
}

/// Result of one [`parse`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub inputs: Vec<FieldDefinition>,
    pub outputs: Vec<FieldDefinition>,
    pub features: Vec<FieldDefinition>,
}

impl Descriptor {
    pub fn fields(&self, kind: FieldKind) -> &[FieldDefinition] {
        match kind {
            FieldKind::Input => &self.inputs,
            FieldKind::Output => &self.outputs,
            FieldKind::Feature => &self.features,
        }
    }

    pub(crate) fn fields_mut(&mut self, kind: FieldKind) -> &mut Vec<FieldDefinition> {
        match kind {
            FieldKind::Input => &mut self.inputs,
            FieldKind::Output => &mut self.outputs,
            FieldKind::Feature => &mut self.features,
        }
    }

    /// All fields in Input, Output, Feature order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .chain(self.features.iter())
    }

    pub fn len(&self) -> usize {
        self.inputs.len() + self.outputs.len() + self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct report IDs used by any field, ascending.
    pub fn report_ids(&self) -> Vec<u16> {
        let mut ids: Vec<u16> = self.iter().map(|f| f.report_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Whether the device declares force-feedback (PID page) fields.
    pub fn has_force_feedback(&self) -> bool {
        self.iter().any(|f| f.usage_page == UsagePage::PID)
    }
}
