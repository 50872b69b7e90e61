//! HID unit decoding (HID 1.11, section 6.2.2.7).
//!
//! A unit code packs a measuring system and six signed 4-bit dimension
//! exponents into one 32-bit value, low nibble first:
//!
//! | nibble | meaning            |
//! |--------|--------------------|
//! | 0      | system             |
//! | 1      | length             |
//! | 2      | mass               |
//! | 3      | time               |
//! | 4      | temperature        |
//! | 5      | current            |
//! | 6      | luminous intensity |
//!
//! The separate `Unit Exponent` global scales the value by a power of ten.
//!
//! ```
//! use ffbscope::unit::Unit;
//!
//! // SI Linear, length^1, time^-2: an acceleration.
//! assert_eq!(Unit::new(0xE011, 0).to_string(), "cm·s^-2");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitSystem {
    None,
    SiLinear,
    SiRotation,
    EnglishLinear,
    EnglishRotation,
    VendorDefined,
    Reserved(u8),
}

impl UnitSystem {
    fn from_nibble(n: u8) -> Self {
        match n {
            0x0 => UnitSystem::None,
            0x1 => UnitSystem::SiLinear,
            0x2 => UnitSystem::SiRotation,
            0x3 => UnitSystem::EnglishLinear,
            0x4 => UnitSystem::EnglishRotation,
            0xF => UnitSystem::VendorDefined,
            other => UnitSystem::Reserved(other),
        }
    }

    /// Symbols for length, mass, time, temperature, current, luminous intensity.
    fn symbols(self) -> Option<[&'static str; 6]> {
        match self {
            UnitSystem::SiLinear => Some(["cm", "g", "s", "K", "A", "cd"]),
            UnitSystem::SiRotation => Some(["rad", "g", "s", "K", "A", "cd"]),
            UnitSystem::EnglishLinear => Some(["in", "slug", "s", "°F", "A", "cd"]),
            UnitSystem::EnglishRotation => Some(["deg", "slug", "s", "°F", "A", "cd"]),
            UnitSystem::None | UnitSystem::VendorDefined | UnitSystem::Reserved(_) => None,
        }
    }
}

/// Decoded unit of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    pub system: UnitSystem,
    /// Exponents for length, mass, time, temperature, current and luminous
    /// intensity, in that order.
    pub dimensions: [i8; 6],
    /// Power of ten applied to the value.
    pub exponent: i8,
}

impl Unit {
    pub fn new(code: u32, unit_exponent: i8) -> Self {
        let nibble = |i: u32| ((code >> (i * 4)) & 0xF) as u8;
        let mut dimensions = [0i8; 6];
        for (i, d) in dimensions.iter_mut().enumerate() {
            *d = signed_nibble(nibble(i as u32 + 1));
        }
        Self {
            system: UnitSystem::from_nibble(nibble(0)),
            dimensions,
            exponent: unit_exponent,
        }
    }

    /// Unit of a parsed field.
    pub fn of(field: &crate::descriptor::FieldDefinition) -> Self {
        Self::new(field.unit, field.unit_exponent)
    }

    /// True for unitless values.
    pub fn is_none(&self) -> bool {
        self.system == UnitSystem::None || self.dimensions.iter().all(|&d| d == 0)
    }
}

fn signed_nibble(n: u8) -> i8 {
    if n >= 8 {
        n as i8 - 16
    } else {
        n as i8
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.system {
            UnitSystem::VendorDefined => return f.write_str("vendor-defined"),
            UnitSystem::Reserved(n) => return write!(f, "reserved ({n:#x})"),
            _ => {}
        }

        let Some(symbols) = self.system.symbols().filter(|_| !self.is_none()) else {
            return Ok(());
        };

        let mut first = true;
        for (symbol, &power) in symbols.iter().zip(self.dimensions.iter()) {
            if power == 0 {
                continue;
            }
            if !first {
                f.write_str("·")?;
            }
            first = false;
            match power {
                1 => f.write_str(symbol)?,
                p => write!(f, "{symbol}^{p}")?,
            }
        }

        if self.exponent != 0 {
            write!(f, " ×10^{}", self.exponent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_system_and_dimensions() {
        let u = Unit::new(0xE011, 0);
        assert_eq!(u.system, UnitSystem::SiLinear);
        assert_eq!(u.dimensions, [1, 0, -2, 0, 0, 0]);
    }

    #[test]
    fn renders_common_units() {
        assert_eq!(Unit::new(0x14, 0).to_string(), "deg");
        assert_eq!(Unit::new(0x1001, 0).to_string(), "s");
        assert_eq!(Unit::new(0xE111, 0).to_string(), "cm·g·s^-2");
        assert_eq!(Unit::new(0xF012, 0).to_string(), "rad·s^-1");
    }

    #[test]
    fn exponent_is_appended() {
        assert_eq!(Unit::new(0x14, -2).to_string(), "deg ×10^-2");
    }

    #[test]
    fn unitless_values_render_empty() {
        assert!(Unit::new(0, 0).is_none());
        assert_eq!(Unit::new(0, 0).to_string(), "");
        // A system with no dimensions is still unitless.
        assert_eq!(Unit::new(0x1, 3).to_string(), "");
    }

    #[test]
    fn vendor_and_reserved_systems() {
        assert_eq!(Unit::new(0xF, 0).to_string(), "vendor-defined");
        assert_eq!(Unit::new(0x15, 0).system, UnitSystem::Reserved(5));
    }
}
