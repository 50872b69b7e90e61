//! Descriptor snapshot export.
//!
//! A snapshot file records, for a set of devices, their identity and every
//! decoded field, so a capture can be inspected without the hardware.
//!
//! # Format
//! All integers are little-endian.
//!
//! ```text
//! "FFBT" | version: u8 (= 1) | device count: u8
//! per device:
//!   vendor id: u16 | product id: u16 | bus type: u8
//!   manufacturer, product, serial: len: u8 (UTF-16 code units) | [u16; len]
//!   inputs, outputs, features: count: u8 | count × field record
//! ```
//!
//! A field record is a fixed 43 bytes:
//!
//! ```text
//! kind u8 | properties u16 | usage page u16 | report id u16 | usage id u16
//! designator index u32 | string index u32 | report size u8 | report index u32
//! logical min i32 | logical max i32 | physical min i32 | physical max i32
//! unit u32 | unit exponent i8
//! ```
//!
//! Strings longer than 255 code units are truncated on write. Devices and
//! per-kind field lists are limited to 255 entries; exceeding either is an
//! error rather than a silently short file.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::descriptor::{Descriptor, FieldDefinition, FieldKind, FieldProperties, UsagePage};
use crate::error::{Error, Result};
use crate::metadata::{BusType, DeviceInfo};

pub const MAGIC: [u8; 4] = *b"FFBT";
pub const VERSION: u8 = 0x01;
/// Size of one encoded [`FieldDefinition`].
pub const FIELD_RECORD_LEN: usize = 43;

const KINDS: [FieldKind; 3] = [FieldKind::Input, FieldKind::Output, FieldKind::Feature];

/// One device's entry in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceExport {
    pub vendor_id: u16,
    pub product_id: u16,
    pub bus_type: BusType,
    pub manufacturer: String,
    pub product: String,
    pub serial: String,
    pub descriptor: Descriptor,
}

impl DeviceExport {
    pub fn new(info: &DeviceInfo, descriptor: Descriptor) -> Self {
        Self {
            vendor_id: info.vendor_id,
            product_id: info.product_id,
            bus_type: info.bus_type,
            manufacturer: info.manufacturer_string.clone().unwrap_or_default(),
            product: info.product_string.clone().unwrap_or_default(),
            serial: info.serial_number.clone().unwrap_or_default(),
            descriptor,
        }
    }
}

fn count_u8(n: usize, what: &str) -> Result<u8> {
    u8::try_from(n)
        .map_err(|_| Error::Unsupported(format!("{n} {what}; a snapshot holds at most 255")))
}

/// Encode `devices` as a snapshot file.
pub fn write_snapshot(mut w: impl Write, devices: &[DeviceExport]) -> Result<()> {
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.push(VERSION);
    out.push(count_u8(devices.len(), "devices")?);

    for dev in devices {
        out.extend_from_slice(&dev.vendor_id.to_le_bytes());
        out.extend_from_slice(&dev.product_id.to_le_bytes());
        out.push(dev.bus_type.to_byte());
        for s in [&dev.manufacturer, &dev.product, &dev.serial] {
            encode_string(s, &mut out);
        }
        for kind in KINDS {
            let fields = dev.descriptor.fields(kind);
            out.push(count_u8(fields.len(), "fields of one kind")?);
            for field in fields {
                encode_field(field, &mut out);
            }
        }
    }

    w.write_all(&out)?;
    w.flush()?;
    Ok(())
}

/// Decode a snapshot file.
pub fn read_snapshot(mut r: impl Read) -> Result<Vec<DeviceExport>> {
    let magic: [u8; 4] = read_array(&mut r)?;
    if magic != MAGIC {
        return Err(Error::InvalidSnapshot(format!("bad magic {magic:02x?}")));
    }
    let [version] = read_array::<1>(&mut r)?;
    if version != VERSION {
        return Err(Error::InvalidSnapshot(format!("unsupported version {version}")));
    }
    let [count] = read_array::<1>(&mut r)?;

    let mut devices = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let vendor_id = u16::from_le_bytes(read_array(&mut r)?);
        let product_id = u16::from_le_bytes(read_array(&mut r)?);
        let [bus] = read_array::<1>(&mut r)?;
        let manufacturer = read_string(&mut r)?;
        let product = read_string(&mut r)?;
        let serial = read_string(&mut r)?;

        let mut descriptor = Descriptor::default();
        for kind in KINDS {
            let [n] = read_array::<1>(&mut r)?;
            let fields = descriptor.fields_mut(kind);
            for _ in 0..n {
                let record: [u8; FIELD_RECORD_LEN] = read_array(&mut r)?;
                let field = decode_field(&record)?;
                if field.kind != kind {
                    return Err(Error::InvalidSnapshot(format!(
                        "{:?} record in the {kind:?} list",
                        field.kind
                    )));
                }
                fields.push(field);
            }
        }

        devices.push(DeviceExport {
            vendor_id,
            product_id,
            bus_type: BusType::from_byte(bus),
            manufacturer,
            product,
            serial,
            descriptor,
        });
    }
    Ok(devices)
}

fn read_array<const N: usize>(r: &mut impl Read) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

fn encode_string(s: &str, out: &mut Vec<u8>) {
    let units: Vec<u16> = s.encode_utf16().take(usize::from(u8::MAX)).collect();
    out.push(units.len() as u8);
    for unit in units {
        out.extend_from_slice(&unit.to_le_bytes());
    }
}

fn read_string(r: &mut impl Read) -> Result<String> {
    let [len] = read_array::<1>(r)?;
    let mut bytes = vec![0u8; usize::from(len) * 2];
    r.read_exact(&mut bytes)?;
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}

fn encode_field(f: &FieldDefinition, out: &mut Vec<u8>) {
    out.push(f.kind.to_byte());
    out.extend_from_slice(&f.properties.bits().to_le_bytes());
    out.extend_from_slice(&f.usage_page.0.to_le_bytes());
    out.extend_from_slice(&f.report_id.to_le_bytes());
    out.extend_from_slice(&f.usage_id.to_le_bytes());
    out.extend_from_slice(&f.designator_index.to_le_bytes());
    out.extend_from_slice(&f.string_index.to_le_bytes());
    out.push(f.report_size);
    out.extend_from_slice(&f.report_index.to_le_bytes());
    out.extend_from_slice(&f.logical_min.to_le_bytes());
    out.extend_from_slice(&f.logical_max.to_le_bytes());
    out.extend_from_slice(&f.physical_min.to_le_bytes());
    out.extend_from_slice(&f.physical_max.to_le_bytes());
    out.extend_from_slice(&f.unit.to_le_bytes());
    out.extend_from_slice(&f.unit_exponent.to_le_bytes());
}

/// Reads fixed-width values off the front of one field record.
struct Fields<'a>(&'a [u8]);

impl Fields<'_> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        if let Some(src) = self.0.get(..N) {
            out.copy_from_slice(src);
            self.0 = &self.0[N..];
        }
        out
    }
}

fn decode_field(record: &[u8; FIELD_RECORD_LEN]) -> Result<FieldDefinition> {
    let mut c = Fields(record);
    let [kind] = c.take::<1>();
    let kind = FieldKind::from_byte(kind)
        .ok_or_else(|| Error::InvalidSnapshot(format!("unknown field kind {kind}")))?;

    Ok(FieldDefinition {
        kind,
        properties: FieldProperties::from_bits_truncate(u16::from_le_bytes(c.take())),
        usage_page: UsagePage(u16::from_le_bytes(c.take())),
        report_id: u16::from_le_bytes(c.take()),
        usage_id: u16::from_le_bytes(c.take()),
        designator_index: u32::from_le_bytes(c.take()),
        string_index: u32::from_le_bytes(c.take()),
        report_size: u8::from_le_bytes(c.take()),
        report_index: u32::from_le_bytes(c.take()),
        logical_min: i32::from_le_bytes(c.take()),
        logical_max: i32::from_le_bytes(c.take()),
        physical_min: i32::from_le_bytes(c.take()),
        physical_max: i32::from_le_bytes(c.take()),
        unit: u32::from_le_bytes(c.take()),
        unit_exponent: i8::from_le_bytes(c.take()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::parse;

    // Steering axis (signed, with unit) plus one PID output and one feature.
    const DESCRIPTOR: &[u8] = &[
        0x05, 0x02, 0x09, 0xC8, 0x16, 0x00, 0x80, 0x26, 0xFF, 0x7F, 0x65, 0x14, 0x55, 0x0E,
        0x75, 0x10, 0x95, 0x01, 0x81, 0x02, //
        0x05, 0x0F, 0x09, 0x97, 0x15, 0x00, 0x25, 0x01, 0x65, 0x00, 0x55, 0x00, 0x75, 0x08,
        0x91, 0x82, //
        0x09, 0x7E, 0xB1, 0x02,
    ];

    fn export() -> DeviceExport {
        let info = DeviceInfo {
            vendor_id: 0x1209,
            product_id: 0xFFB0,
            bus_type: BusType::Usb,
            manufacturer_string: Some("Open FFBoard".into()),
            product_string: Some("FFBoard wheel ⚙".into()),
            ..Default::default()
        };
        DeviceExport::new(&info, parse(DESCRIPTOR))
    }

    #[test]
    fn field_records_are_fixed_size() {
        let d = parse(DESCRIPTOR);
        for f in d.iter() {
            let mut out = Vec::new();
            encode_field(f, &mut out);
            assert_eq!(out.len(), FIELD_RECORD_LEN);
        }
    }

    #[test]
    fn header_and_device_layout() {
        let mut out = Vec::new();
        write_snapshot(&mut out, &[export()]).unwrap();

        assert_eq!(&out[..4], b"FFBT");
        assert_eq!(out[4], VERSION);
        assert_eq!(out[5], 1);
        assert_eq!(&out[6..8], &0x1209u16.to_le_bytes());
        assert_eq!(&out[8..10], &0xFFB0u16.to_le_bytes());
        assert_eq!(out[10], 1); // usb
        assert_eq!(out[11], 12); // "Open FFBoard" in UTF-16 units
        assert_eq!(&out[12..14], &[b'O', 0]);

        let strings = 3 + 2 * (12 + 15);
        let fields = 3 + 3 * FIELD_RECORD_LEN;
        assert_eq!(out.len(), 6 + 5 + strings + fields);
    }

    #[test]
    fn reads_back_devices() {
        let devices = vec![export(), DeviceExport::default()];
        let mut out = Vec::new();
        write_snapshot(&mut out, &devices).unwrap();
        let back = read_snapshot(out.as_slice()).unwrap();
        assert_eq!(back, devices);
        assert_eq!(back[0].descriptor.inputs[0].logical_min, -32768);
        assert_eq!(back[0].descriptor.inputs[0].unit_exponent, -2);
    }

    #[test]
    fn rejects_foreign_files() {
        assert!(matches!(
            read_snapshot(&b"FFBX\x01\x00"[..]),
            Err(Error::InvalidSnapshot(_))
        ));
        assert!(matches!(
            read_snapshot(&b"FFBT\x02\x00"[..]),
            Err(Error::InvalidSnapshot(_))
        ));
        assert!(matches!(read_snapshot(&b"FFBT\x01\x01\x00"[..]), Err(Error::Io(_))));
    }

    #[test]
    fn misplaced_records_are_rejected() {
        let mut out = Vec::new();
        write_snapshot(&mut out, &[export()]).unwrap();
        // The single input record starts right after the input count.
        let input_record = 6 + 5 + 3 + 2 * (12 + 15) + 1;
        out[input_record] = FieldKind::Feature.to_byte();
        assert!(matches!(read_snapshot(out.as_slice()), Err(Error::InvalidSnapshot(_))));
    }

    #[test]
    fn long_strings_are_truncated() {
        let mut dev = DeviceExport::default();
        dev.serial = "S".repeat(300);
        let mut out = Vec::new();
        write_snapshot(&mut out, &[dev]).unwrap();
        let back = read_snapshot(out.as_slice()).unwrap();
        assert_eq!(back[0].serial.len(), 255);
    }

    #[test]
    fn too_many_fields_is_an_error() {
        let mut dev = export();
        let field = dev.descriptor.inputs[0].clone();
        dev.descriptor.inputs = vec![field; 256];
        let err = write_snapshot(Vec::new(), &[dev]).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }
}
