//! Field extraction from raw report bytes.
//!
//! A field's `report_index` is a bit offset into the report exactly as the
//! transport returned it, and `report_size` its width in bits (at most 32).
//! Values are little-endian.

use crate::descriptor::FieldDefinition;
use crate::ring::ReportRing;

/// Widest field [`extract`] will decode.
pub const MAX_FIELD_BITS: u8 = 32;

/// Whether `field` lies entirely within a report of `len` bytes.
#[inline]
pub fn fits(len: usize, field: &FieldDefinition) -> bool {
    field.report_size <= MAX_FIELD_BITS && (len as u64) * 8 >= field.end_bit()
}

/// Raw unsigned value of `field` in `report`.
///
/// Returns `None` when the field is wider than 32 bits or runs past the end
/// of the buffer.
pub fn extract(report: &[u8], field: &FieldDefinition) -> Option<u32> {
    if !fits(report.len(), field) {
        return None;
    }

    let size = u32::from(field.report_size);
    if size == 0 {
        return Some(0);
    }

    let start = (field.report_index / 8) as usize;
    let shift = field.report_index % 8;
    let span = (shift + size).div_ceil(8) as usize;

    let raw = report
        .get(start..start + span)?
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));

    let mask = (1u64 << size) - 1;
    Some(((raw >> shift) & mask) as u32)
}

/// Like [`extract`], but sign-extends fields whose logical minimum is negative.
pub fn extract_signed(report: &[u8], field: &FieldDefinition) -> Option<i32> {
    let raw = extract(report, field)?;
    let size = u32::from(field.report_size);
    if field.logical_min >= 0 || size == 0 || size >= 32 {
        return Some(raw as i32);
    }
    let pad = 32 - size;
    Some(((raw << pad) as i32) >> pad)
}

/// One display sample; `0.0` when the field is absent from `report`.
#[inline]
pub fn sample(report: &[u8], field: &FieldDefinition) -> f32 {
    extract_signed(report, field).map_or(0.0, |v| v as f32)
}

/// One sample per ring slot, in slot order (not chronological order).
pub fn series(ring: &ReportRing, field: &FieldDefinition) -> Vec<f32> {
    let mut out = Vec::with_capacity(ring.len());
    ring.for_each_slot(|_, snapshot| out.push(sample(snapshot.bytes(), field)));
    out
}
