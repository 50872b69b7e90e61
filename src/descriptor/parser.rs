//! Stack-based report descriptor parser.
//!
//! All parser state lives in a [`ParseContext`] created per [`parse`] call, so
//! concurrent parses never share a bit cursor.

use std::collections::{HashMap, VecDeque};

use tracing::trace;

use super::item::{Item, ItemType, Items};
use super::{Descriptor, FieldDefinition, FieldKind, FieldProperties, UsagePage};

/// Upper bound on fields emitted by one parse. A hostile `Report Count`
/// would otherwise allocate without limit; the bit cursor keeps advancing.
const MAX_FIELDS: usize = 1 << 16;

/// Global item tags, in the index order of [`GlobalParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum GlobalTag {
    UsagePage = 0,
    LogicalMinimum = 1,
    LogicalMaximum = 2,
    PhysicalMinimum = 3,
    PhysicalMaximum = 4,
    UnitExponent = 5,
    Unit = 6,
    ReportSize = 7,
    ReportId = 8,
    ReportCount = 9,
    Push = 10,
    Pop = 11,
}

impl GlobalTag {
    fn from_tag(tag: u8) -> Option<Self> {
        use GlobalTag::*;
        Some(match tag {
            0 => UsagePage,
            1 => LogicalMinimum,
            2 => LogicalMaximum,
            3 => PhysicalMinimum,
            4 => PhysicalMaximum,
            5 => UnitExponent,
            6 => Unit,
            7 => ReportSize,
            8 => ReportId,
            9 => ReportCount,
            10 => Push,
            11 => Pop,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LocalTag {
    Usage,
    UsageMinimum,
    UsageMaximum,
    DesignatorIndex,
    DesignatorMinimum,
    DesignatorMaximum,
    StringIndex,
    StringMinimum,
    StringMaximum,
    Delimiter,
}

impl LocalTag {
    fn from_tag(tag: u8) -> Option<Self> {
        use LocalTag::*;
        Some(match tag {
            0 => Usage,
            1 => UsageMinimum,
            2 => UsageMaximum,
            3 => DesignatorIndex,
            4 => DesignatorMinimum,
            5 => DesignatorMaximum,
            7 => StringIndex,
            8 => StringMinimum,
            9 => StringMaximum,
            10 => Delimiter,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MainTag {
    Input,
    Output,
    Collection,
    Feature,
    EndCollection,
}

impl MainTag {
    fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0b1000 => MainTag::Input,
            0b1001 => MainTag::Output,
            0b1010 => MainTag::Collection,
            0b1011 => MainTag::Feature,
            0b1100 => MainTag::EndCollection,
            _ => return None,
        })
    }
}

/// The ten global numeric parameters, indexed by [`GlobalTag`].
type GlobalParams = [i32; 10];

/// Pending local items, consumed in declaration order.
type LocalParams = HashMap<LocalTag, VecDeque<u32>>;

struct ParseContext {
    /// Global parameter stack; never empty.
    globals: Vec<GlobalParams>,
    locals: LocalParams,
    collection_depth: u32,
    /// Running bit offset shared by every emitted field.
    bit_cursor: u32,
    descriptor: Descriptor,
}

impl ParseContext {
    fn new() -> Self {
        Self {
            globals: vec![[0; 10]],
            locals: HashMap::new(),
            collection_depth: 0,
            bit_cursor: 0,
            descriptor: Descriptor::default(),
        }
    }

    fn top(&self) -> &GlobalParams {
        // The stack is created with one frame and `pop` never removes the last.
        &self.globals[self.globals.len() - 1]
    }

    fn top_mut(&mut self) -> &mut GlobalParams {
        let last = self.globals.len() - 1;
        &mut self.globals[last]
    }

    fn global(&self, tag: GlobalTag) -> i32 {
        self.top()[tag as usize]
    }

    fn run(mut self, bytes: &[u8]) -> Descriptor {
        for item in Items::new(bytes) {
            match item.item_type {
                ItemType::Main => self.main_item(&item),
                ItemType::Global => self.global_item(&item),
                ItemType::Local => self.local_item(&item),
                ItemType::Reserved => {
                    trace!(offset = item.offset, "ignoring reserved item type");
                }
            }
        }
        self.descriptor
    }

    fn global_item(&mut self, item: &Item) {
        let Some(tag) = GlobalTag::from_tag(item.tag) else {
            trace!(offset = item.offset, tag = item.tag, "ignoring reserved global tag");
            return;
        };

        let value = match tag {
            GlobalTag::Push => {
                let top = *self.top();
                self.globals.push(top);
                return;
            }
            GlobalTag::Pop => {
                if self.globals.len() > 1 {
                    self.globals.pop();
                }
                return;
            }
            GlobalTag::LogicalMinimum | GlobalTag::PhysicalMinimum => item.signed(),
            // A maximum is unsigned when its minimum is non-negative, so that
            // e.g. `Logical Maximum (255)` encoded in one byte stays 255.
            GlobalTag::LogicalMaximum => self.maximum(item, GlobalTag::LogicalMinimum),
            GlobalTag::PhysicalMaximum => self.maximum(item, GlobalTag::PhysicalMinimum),
            GlobalTag::UnitExponent => unit_exponent(item),
            GlobalTag::UsagePage
            | GlobalTag::Unit
            | GlobalTag::ReportSize
            | GlobalTag::ReportId
            | GlobalTag::ReportCount => item.unsigned() as i32,
        };

        self.top_mut()[tag as usize] = value;
    }

    fn maximum(&self, item: &Item, minimum: GlobalTag) -> i32 {
        if self.global(minimum) >= 0 {
            item.unsigned() as i32
        } else {
            item.signed()
        }
    }

    fn local_item(&mut self, item: &Item) {
        let Some(tag) = LocalTag::from_tag(item.tag) else {
            trace!(offset = item.offset, tag = item.tag, "ignoring reserved local tag");
            return;
        };

        // Four-byte usages carry their own usage page in the upper half.
        let mut value = item.unsigned();
        if item.size < 4
            && matches!(tag, LocalTag::Usage | LocalTag::UsageMinimum | LocalTag::UsageMaximum)
        {
            value &= 0xFFFF;
        }

        self.locals.entry(tag).or_default().push_back(value);
    }

    fn take_local(&mut self, tag: LocalTag) -> Option<u32> {
        self.locals.get_mut(&tag)?.pop_front()
    }

    fn has_local(&self, tag: LocalTag) -> bool {
        self.locals.get(&tag).is_some_and(|v| !v.is_empty())
    }

    fn main_item(&mut self, item: &Item) {
        match MainTag::from_tag(item.tag) {
            Some(MainTag::Input) => self.emit_fields(FieldKind::Input, item.data),
            Some(MainTag::Output) => self.emit_fields(FieldKind::Output, item.data),
            Some(MainTag::Feature) => self.emit_fields(FieldKind::Feature, item.data),
            Some(MainTag::Collection) => {
                self.collection_depth = self.collection_depth.saturating_add(1);
                // Locals declared before a collection describe the collection.
                self.locals.clear();
            }
            Some(MainTag::EndCollection) => {
                self.collection_depth = self.collection_depth.saturating_sub(1);
                self.locals.clear();
            }
            None => {
                trace!(offset = item.offset, tag = item.tag, "ignoring reserved main tag");
            }
        }

        if self.collection_depth == 0 {
            self.locals.clear();
        }
    }

    /// Expand one Input/Output/Feature item into `Report Count` fields.
    fn emit_fields(&mut self, kind: FieldKind, data: u32) {
        let params = *self.top();
        let report_count = params[GlobalTag::ReportCount as usize].max(0) as u32;
        let report_size = params[GlobalTag::ReportSize as usize].clamp(0, 255) as u8;
        let global_page = params[GlobalTag::UsagePage as usize] as u16;
        let properties = FieldProperties::from_payload(kind, data);

        // A usage range is consumed once per main item; ids count down from
        // the maximum.
        let range = if self.has_local(LocalTag::UsageMinimum) && self.has_local(LocalTag::UsageMaximum) {
            match (
                self.take_local(LocalTag::UsageMinimum),
                self.take_local(LocalTag::UsageMaximum),
            ) {
                (Some(min), Some(max)) => Some((min, max)),
                _ => None,
            }
        } else {
            None
        };

        for i in 0..report_count {
            if self.descriptor.len() >= MAX_FIELDS {
                let remaining = u64::from(report_count - i) * u64::from(report_size);
                let remaining = u32::try_from(remaining).unwrap_or(u32::MAX);
                self.bit_cursor = self.bit_cursor.saturating_add(remaining);
                trace!(kind = ?kind, "field limit reached; dropping remaining fields");
                break;
            }

            let usage = match range {
                Some((min, max)) => {
                    let lowest = min as u16;
                    let id = (max as u16).saturating_sub(i.min(u32::from(u16::MAX)) as u16);
                    (max & 0xFFFF_0000) | u32::from(id.max(lowest))
                }
                None => self.take_local(LocalTag::Usage).unwrap_or(0),
            };
            let designator_index = self.take_local(LocalTag::DesignatorIndex).unwrap_or(0);
            let string_index = self.take_local(LocalTag::StringIndex).unwrap_or(0);

            let usage_page = match usage >> 16 {
                0 => global_page,
                page => page as u16,
            };

            let report_index = self.bit_cursor;
            self.bit_cursor = self.bit_cursor.saturating_add(u32::from(report_size));

            self.descriptor.fields_mut(kind).push(FieldDefinition {
                kind,
                usage_page: UsagePage(usage_page),
                report_id: params[GlobalTag::ReportId as usize] as u16,
                usage_id: usage as u16,
                designator_index,
                string_index,
                report_size,
                report_index,
                logical_min: params[GlobalTag::LogicalMinimum as usize],
                logical_max: params[GlobalTag::LogicalMaximum as usize],
                physical_min: params[GlobalTag::PhysicalMinimum as usize],
                physical_max: params[GlobalTag::PhysicalMaximum as usize],
                unit: params[GlobalTag::Unit as usize] as u32,
                unit_exponent: params[GlobalTag::UnitExponent as usize].clamp(-128, 127) as i8,
                properties,
            });
        }
    }
}

/// Unit exponents are a signed nibble in practice (`0x0E` is -2), though some
/// descriptors encode a plain signed byte.
fn unit_exponent(item: &Item) -> i32 {
    let raw = item.unsigned();
    if item.size == 1 && raw <= 0x0F {
        if raw >= 0x08 {
            raw as i32 - 0x10
        } else {
            raw as i32
        }
    } else {
        item.signed()
    }
}

/// Decode a raw report descriptor.
///
/// Never fails: unknown items are skipped and a truncated trailing item ends
/// the walk, returning whatever fields were complete.
pub fn parse(bytes: &[u8]) -> Descriptor {
    ParseContext::new().run(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// A force-feedback wheel, trimmed: one steering axis, eight buttons,
    /// padding, then a PID output report and a feature report.
    const WHEEL: &[u8] = &[
        0x05, 0x01, //       Usage Page (Generic Desktop)
        0x09, 0x04, //       Usage (Joystick)
        0xA1, 0x01, //       Collection (Application)
        0x85, 0x01, //         Report ID (1)
        0x05, 0x02, //         Usage Page (Simulation Controls)
        0x09, 0xC8, //         Usage (Steering)
        0x15, 0x00, //         Logical Minimum (0)
        0x26, 0xFF, 0xFF, //   Logical Maximum (65535)
        0x75, 0x10, //         Report Size (16)
        0x95, 0x01, //         Report Count (1)
        0x81, 0x02, //         Input (Data,Var,Abs)
        0x05, 0x09, //         Usage Page (Button)
        0x19, 0x01, //         Usage Minimum (1)
        0x29, 0x08, //         Usage Maximum (8)
        0x25, 0x01, //         Logical Maximum (1)
        0x75, 0x01, //         Report Size (1)
        0x95, 0x08, //         Report Count (8)
        0x81, 0x02, //         Input (Data,Var,Abs)
        0x75, 0x08, //         Report Size (8)
        0x95, 0x01, //         Report Count (1)
        0x81, 0x03, //         Input (Const,Var,Abs)
        0x05, 0x0F, //         Usage Page (PID)
        0x09, 0x97, //         Usage (DC Enable Actuators)
        0x15, 0x00, //         Logical Minimum (0)
        0x25, 0x01, //         Logical Maximum (1)
        0x75, 0x08, //         Report Size (8)
        0x95, 0x01, //         Report Count (1)
        0x91, 0x82, //         Output (Data,Var,Abs,Vol)
        0x09, 0x7E, //         Usage (Device Gain)
        0x26, 0xFF, 0x00, //   Logical Maximum (255)
        0xB1, 0x02, //         Feature (Data,Var,Abs)
        0xC0, //             End Collection
    ];

    fn assert_contiguous(fields: &[&FieldDefinition]) {
        for pair in fields.windows(2) {
            assert_eq!(
                pair[1].report_index,
                pair[0].report_index + u32::from(pair[0].report_size)
            );
        }
    }

    #[test]
    fn parses_wheel_inputs() {
        let d = parse(WHEEL);
        assert_eq!(d.inputs.len(), 1 + 8 + 1);

        let steering = &d.inputs[0];
        assert_eq!(steering.usage_page, UsagePage::SIMULATION);
        assert_eq!(steering.usage_id, 0xC8);
        assert_eq!(steering.usage().name, "Steering");
        assert_eq!(steering.report_id, 1);
        assert_eq!(steering.report_size, 16);
        assert_eq!(steering.report_index, 0);
        assert_eq!(steering.logical_min, 0);
        assert_eq!(steering.logical_max, 65535);
        assert!(steering.is_variable());

        let buttons: Vec<u16> = d.inputs[1..9].iter().map(|f| f.usage_id).collect();
        assert_eq!(buttons, vec![8, 7, 6, 5, 4, 3, 2, 1]);
        assert!(d.inputs[1..9].iter().all(|f| f.usage_page == UsagePage::BUTTON));
        assert_eq!(d.inputs[1].report_index, 16);

        let padding = &d.inputs[9];
        assert!(padding.is_constant());
        assert_eq!(padding.usage_id, 0);
        assert_eq!(padding.report_index, 24);
    }

    #[test]
    fn output_and_feature_fields_are_emitted() {
        let d = parse(WHEEL);

        assert_eq!(d.outputs.len(), 1);
        let enable = &d.outputs[0];
        assert_eq!(enable.kind, FieldKind::Output);
        assert_eq!(enable.usage_page, UsagePage::PID);
        assert_eq!(enable.usage_id, 0x97);
        assert!(enable.properties.contains(FieldProperties::VOLATILE));
        assert_eq!(enable.report_index, 32);

        assert_eq!(d.features.len(), 1);
        let gain = &d.features[0];
        assert_eq!(gain.usage_id, 0x7E);
        assert_eq!(gain.logical_max, 255);
        assert_eq!(gain.report_index, 40);

        assert!(d.has_force_feedback());
        assert_eq!(d.report_ids(), vec![1]);
    }

    #[test]
    fn bit_offsets_are_strictly_additive() {
        let d = parse(WHEEL);
        let mut all: Vec<&FieldDefinition> = d.iter().collect();
        all.sort_by_key(|f| f.report_index);
        assert_contiguous(&all);
    }

    #[test]
    fn usage_range_counts_down() {
        // Usage Minimum (1), Usage Maximum (4), Report Size (1), Report Count (4), Input
        let bytes = [0x05, 0x09, 0x19, 0x01, 0x29, 0x04, 0x75, 0x01, 0x95, 0x04, 0x81, 0x02];
        let d = parse(&bytes);
        let ids: Vec<u16> = d.inputs.iter().map(|f| f.usage_id).collect();
        assert_eq!(ids, vec![0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn short_usage_range_saturates_at_minimum() {
        let bytes = [0x05, 0x09, 0x19, 0x01, 0x29, 0x02, 0x75, 0x01, 0x95, 0x04, 0x81, 0x02];
        let d = parse(&bytes);
        let ids: Vec<u16> = d.inputs.iter().map(|f| f.usage_id).collect();
        assert_eq!(ids, vec![2, 1, 1, 1]);
    }

    #[test]
    fn usages_are_consumed_in_declaration_order() {
        let bytes = [
            0x05, 0x01, // Usage Page (Generic Desktop)
            0x09, 0x30, // Usage (X)
            0x09, 0x31, // Usage (Y)
            0x09, 0x32, // Usage (Z)
            0x75, 0x08, // Report Size (8)
            0x95, 0x04, // Report Count (4)
            0x81, 0x02, // Input
        ];
        let d = parse(&bytes);
        let ids: Vec<u16> = d.inputs.iter().map(|f| f.usage_id).collect();
        assert_eq!(ids, vec![0x30, 0x31, 0x32, 0]);
    }

    #[test]
    fn collection_usage_is_not_handed_to_fields() {
        let bytes = [
            0x05, 0x01, 0x09, 0x04, 0xA1, 0x01, // Joystick collection
            0x09, 0x30, 0x75, 0x08, 0x95, 0x01, 0x81, 0x02, // X
            0xC0,
        ];
        let d = parse(&bytes);
        assert_eq!(d.inputs.len(), 1);
        assert_eq!(d.inputs[0].usage_id, 0x30);
    }

    #[test]
    fn locals_are_cleared_outside_collections() {
        let bytes = [
            0x09, 0x30, 0x09, 0x31, // X, Y pending
            0x75, 0x08, 0x95, 0x01, 0x81, 0x02, // Input consumes X
            0x95, 0x01, 0x81, 0x02, // depth 0: Y was discarded
        ];
        let d = parse(&bytes);
        assert_eq!(d.inputs[0].usage_id, 0x30);
        assert_eq!(d.inputs[1].usage_id, 0);
    }

    #[test]
    fn extended_usage_overrides_page() {
        // Usage (Button:3) as a four-byte usage, under the Generic Desktop page.
        let bytes = [
            0x05, 0x01, 0x0B, 0x03, 0x00, 0x09, 0x00, 0x75, 0x01, 0x95, 0x01, 0x81, 0x02,
        ];
        let d = parse(&bytes);
        assert_eq!(d.inputs[0].usage_page, UsagePage::BUTTON);
        assert_eq!(d.inputs[0].usage_id, 3);
    }

    #[test]
    fn signed_logical_range() {
        // Logical Minimum (-127), Logical Maximum (127)
        let bytes = [0x15, 0x81, 0x25, 0x7F, 0x75, 0x08, 0x95, 0x01, 0x81, 0x02];
        let d = parse(&bytes);
        assert_eq!(d.inputs[0].logical_min, -127);
        assert_eq!(d.inputs[0].logical_max, 127);

        // Logical Minimum (-1) makes a 0xFF maximum negative too.
        let bytes = [0x15, 0xFF, 0x25, 0xFF, 0x75, 0x08, 0x95, 0x01, 0x81, 0x02];
        let d = parse(&bytes);
        assert_eq!(d.inputs[0].logical_max, -1);
    }

    #[test]
    fn unit_and_exponent_are_recorded() {
        // Unit (English Rotation, degrees), Unit Exponent (-2)
        let bytes = [0x65, 0x14, 0x55, 0x0E, 0x75, 0x10, 0x95, 0x01, 0x81, 0x02];
        let d = parse(&bytes);
        assert_eq!(d.inputs[0].unit, 0x14);
        assert_eq!(d.inputs[0].unit_exponent, -2);
    }

    #[test]
    fn push_pop_restores_globals() {
        let bytes = [
            0x75, 0x08, // Report Size (8)
            0x95, 0x01, // Report Count (1)
            0xA4, // Push
            0x75, 0x10, // Report Size (16)
            0xA4, // Push
            0x75, 0x20, // Report Size (32)
            0xB4, // Pop
            0xB4, // Pop
            0xB4, // Pop on a single frame: no-op
            0x81, 0x02,
        ];
        let d = parse(&bytes);
        assert_eq!(d.inputs.len(), 1);
        assert_eq!(d.inputs[0].report_size, 8);
    }

    #[test]
    fn truncated_trailing_item_keeps_earlier_fields() {
        let mut bytes = vec![0x75, 0x08, 0x95, 0x02, 0x81, 0x02];
        bytes.extend_from_slice(&[0x26, 0xFF]); // Logical Maximum, one byte short
        let d = parse(&bytes);
        assert_eq!(d.inputs.len(), 2);
    }

    #[test]
    fn garbage_never_panics() {
        let d = parse(&[0xFF, 0xFF, 0xFF, 0x03, 0x00]);
        assert!(d.len() <= MAX_FIELDS);
        assert!(parse(&[]).is_empty());
    }

    #[test]
    fn huge_report_count_is_capped() {
        // Report Size (1), Report Count (0x7FFFFFFF), Input
        let bytes = [0x75, 0x01, 0x97, 0xFF, 0xFF, 0xFF, 0x7F, 0x81, 0x02];
        let d = parse(&bytes);
        assert_eq!(d.inputs.len(), MAX_FIELDS);
    }

    #[test]
    fn reserved_items_are_skipped() {
        let bytes = [
            0x05, 0x01, // Usage Page (Generic Desktop)
            0x09, 0x30, // Usage (X)
            0x75, 0x08, // Report Size (8)
            0x95, 0x01, // Report Count (1)
            0x0D, 0xAA, // reserved type, one payload byte
            0x81, 0x02, // Input
            0x09, 0x31, // Usage (Y)
            0x75, 0x04, // Report Size (4)
            0x81, 0x02, // Input
        ];
        let d = parse(&bytes);
        assert_eq!(d.inputs.len(), 2);
        assert_eq!(d.inputs[0].usage_id, 0x30);
        assert_eq!((d.inputs[0].report_index, d.inputs[0].report_size), (0, 8));
        assert_eq!(d.inputs[1].usage_id, 0x31);
        assert_eq!((d.inputs[1].report_index, d.inputs[1].report_size), (8, 4));
    }

    /// Encode a short item with a payload of the given width.
    fn item(prefix: u8, value: u32, width: usize) -> Vec<u8> {
        let size_bits = match width {
            0 => 0,
            1 => 1,
            2 => 2,
            _ => 3,
        };
        let mut out = vec![prefix | size_bits];
        out.extend_from_slice(&value.to_le_bytes()[..width.min(4)]);
        out
    }

    proptest! {
        #[test]
        fn offsets_follow_report_sizes(
            groups in proptest::collection::vec((1u8..=32, 1u8..=8, 0u8..3), 1..12)
        ) {
            let mut bytes = Vec::new();
            for (size, count, main) in &groups {
                bytes.extend(item(0x74, u32::from(*size), 1)); // Report Size
                bytes.extend(item(0x94, u32::from(*count), 1)); // Report Count
                let prefix = [0x80, 0x90, 0xB0][*main as usize];
                bytes.extend(item(prefix, 0x02, 1));
            }
            let d = parse(&bytes);

            let expected: usize = groups.iter().map(|(_, c, _)| *c as usize).sum();
            prop_assert_eq!(d.len(), expected);

            let mut all: Vec<&FieldDefinition> = d.iter().collect();
            all.sort_by_key(|f| f.report_index);
            prop_assert_eq!(all[0].report_index, 0);
            for pair in all.windows(2) {
                prop_assert_eq!(
                    pair[1].report_index,
                    pair[0].report_index + u32::from(pair[0].report_size)
                );
            }
        }

        #[test]
        fn balanced_push_pop_is_transparent(depth in 1usize..16, size in 1u8..=32) {
            let mut bytes = item(0x74, u32::from(size), 1);
            bytes.extend(item(0x94, 1, 1));
            for n in 0..depth {
                bytes.push(0xA4); // Push
                bytes.extend(item(0x74, 33 + n as u32, 1));
            }
            for _ in 0..depth {
                bytes.push(0xB4); // Pop
            }
            bytes.extend(item(0x80, 0x02, 1));

            let d = parse(&bytes);
            prop_assert_eq!(d.inputs.len(), 1);
            prop_assert_eq!(d.inputs[0].report_size, size);
        }

        #[test]
        fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = parse(&bytes);
        }
    }
}
