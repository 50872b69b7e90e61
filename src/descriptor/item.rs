//! Short/long item framing (HID 1.11, section 6.2.2.2).
//!
//! A short item is a prefix byte followed by 0, 1, 2 or 4 payload bytes:
//!
//! ```text
//!   7   6   5   4   3   2   1   0
//! +---+---+---+---+---+---+---+---+
//! |      bTag     | bType | bSize |
//! +---+---+---+---+---+---+---+---+
//! ```
//!
//! `bSize == 3` means **four** payload bytes. The prefix `0xFE` introduces a
//! long item, whose payload length is carried in the next byte.

use tracing::trace;

const SIZE_MASK: u8 = 0b0000_0011;
const TYPE_MASK: u8 = 0b0000_1100;
const LONG_ITEM_PREFIX: u8 = 0xFE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemType {
    Main,
    Global,
    Local,
    Reserved,
}

/// One decoded item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Item {
    pub item_type: ItemType,
    pub tag: u8,
    /// Payload length in bytes (0, 1, 2 or 4).
    pub size: u8,
    /// Payload, little-endian, zero-extended.
    pub data: u32,
    /// Offset of the prefix byte in the descriptor.
    pub offset: usize,
}

impl Item {
    /// Payload sign-extended from its width.
    pub fn signed(&self) -> i32 {
        match self.size {
            1 => self.data as u8 as i8 as i32,
            2 => self.data as u16 as i16 as i32,
            4 => self.data as i32,
            _ => 0,
        }
    }

    /// Payload read as an unsigned number.
    pub fn unsigned(&self) -> u32 {
        self.data
    }
}

#[inline]
pub(crate) fn payload_len(prefix: u8) -> usize {
    match prefix & SIZE_MASK {
        3 => 4,
        n => n as usize,
    }
}

/// Iterator over the items of a descriptor.
///
/// Stops at the first item whose payload runs past the end of the buffer.
/// Long items are skipped whole; they carry no standard meaning.
pub(crate) struct Items<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Items<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }
}

impl Iterator for Items<'_> {
    type Item = Item;

    fn next(&mut self) -> Option<Item> {
        loop {
            let offset = self.offset;
            let prefix = *self.bytes.get(offset)?;

            if prefix == LONG_ITEM_PREFIX {
                // [0xFE][bDataSize][bLongItemTag][data...]
                let Some(&len) = self.bytes.get(offset + 1) else {
                    trace!(offset, "truncated long item");
                    self.offset = self.bytes.len();
                    return None;
                };
                self.offset = offset + 3 + len as usize;
                trace!(offset, len, "skipping long item");
                continue;
            }

            let size = payload_len(prefix);
            let start = offset + 1;
            let Some(payload) = self.bytes.get(start..start + size) else {
                trace!(offset, size, "truncated item at end of descriptor");
                self.offset = self.bytes.len();
                return None;
            };

            let data = payload
                .iter()
                .rev()
                .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));

            let item_type = match (prefix & TYPE_MASK) >> 2 {
                0 => ItemType::Main,
                1 => ItemType::Global,
                2 => ItemType::Local,
                _ => ItemType::Reserved,
            };

            self.offset = start + size;
            return Some(Item {
                item_type,
                tag: prefix >> 4,
                size: size as u8,
                data,
                offset,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(bytes: &[u8]) -> Vec<Item> {
        Items::new(bytes).collect()
    }

    #[test]
    fn size_three_means_four_bytes() {
        assert_eq!(payload_len(0x27), 4);
        let v = items(&[0x27, 0xFF, 0xFF, 0x00, 0x00]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].size, 4);
        assert_eq!(v[0].data, 0xFFFF);
    }

    #[test]
    fn decodes_type_and_tag() {
        // Usage Page (Generic Desktop), Usage (Joystick), Collection (Application)
        let v = items(&[0x05, 0x01, 0x09, 0x04, 0xA1, 0x01]);
        assert_eq!(v[0].item_type, ItemType::Global);
        assert_eq!(v[0].tag, 0);
        assert_eq!(v[1].item_type, ItemType::Local);
        assert_eq!(v[1].tag, 0);
        assert_eq!(v[2].item_type, ItemType::Main);
        assert_eq!(v[2].tag, 0b1010);
        assert_eq!(v[2].offset, 4);
    }

    #[test]
    fn signed_and_unsigned_views() {
        // Logical Minimum (-127)
        let v = items(&[0x15, 0x81]);
        assert_eq!(v[0].signed(), -127);
        assert_eq!(v[0].unsigned(), 0x81);

        // Logical Minimum (-32768), two bytes
        let v = items(&[0x16, 0x00, 0x80]);
        assert_eq!(v[0].signed(), -32768);

        // Zero-length payload is zero.
        let v = items(&[0xC0]);
        assert_eq!(v[0].signed(), 0);
        assert_eq!(v[0].size, 0);
    }

    #[test]
    fn truncated_item_stops_iteration() {
        // Second item declares two payload bytes but only one is present.
        let v = items(&[0x05, 0x01, 0x26, 0xFF]);
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn reserved_type_is_reported_not_dropped() {
        let v = items(&[0x0D, 0x01, 0x05, 0x09]);
        assert_eq!(v[0].item_type, ItemType::Reserved);
        assert_eq!(v[1].item_type, ItemType::Global);
    }

    #[test]
    fn long_items_are_skipped() {
        let v = items(&[0xFE, 0x02, 0x10, 0xAA, 0xBB, 0x05, 0x0F]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].data, 0x0F);
        assert_eq!(v[0].offset, 5);
    }
}
