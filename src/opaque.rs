// ABOUTME: Text rendering for opaque JSONB values (MySQL column payloads embedded in JSON).
// ABOUTME: Decimal and temporal payloads become their canonical text; anything else is base64.

use crate::error::{Error, Result};
use crate::trace::debug;
use crate::types::field_type;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use std::fmt::Write;

/// Bytes needed to store 0..=9 leftover decimal digits.
const DIG2BYTES: [usize; 10] = [0, 1, 1, 2, 2, 3, 3, 4, 4, 4];
const DIGITS_PER_CHUNK: usize = 9;
const MAX_CHUNK: u32 = 999_999_999;
const MAX_PRECISION: usize = 65;
const MAX_SCALE: usize = 30;

/// Render an opaque payload as text according to its MySQL column type.
pub fn render(field_type: u8, payload: &[u8]) -> Result<String> {
    match field_type {
        field_type::NEWDECIMAL => decode_decimal(payload),
        field_type::TIME => decode_time(payload),
        field_type::DATE => decode_datetime(payload, false),
        field_type::DATETIME | field_type::TIMESTAMP => decode_datetime(payload, true),
        _ => {
            debug!(field_type, len = payload.len(), "rendering opaque value as base64");
            Ok(format!("base64:type{field_type}:{}", BASE64_STANDARD.encode(payload)))
        }
    }
}

fn read_be(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
}

/// Decode MySQL's packed binary DECIMAL: precision byte, scale byte, digit groups.
fn decode_decimal(payload: &[u8]) -> Result<String> {
    let [precision, scale, rest @ ..] = payload else {
        return Err(Error::InvalidOpaque("decimal missing precision/scale".into()));
    };
    let (precision, scale) = (usize::from(*precision), usize::from(*scale));
    if precision == 0 || precision > MAX_PRECISION || scale > MAX_SCALE || scale > precision {
        return Err(Error::InvalidOpaque(format!(
            "decimal precision {precision} scale {scale} out of range"
        )));
    }

    let integral = precision - scale;
    let full_int = integral / DIGITS_PER_CHUNK;
    let lead_int = integral % DIGITS_PER_CHUNK;
    let full_frac = scale / DIGITS_PER_CHUNK;
    let tail_frac = scale % DIGITS_PER_CHUNK;
    let bin_size = DIG2BYTES[lead_int] + full_int * 4 + full_frac * 4 + DIG2BYTES[tail_frac];

    if rest.len() < bin_size {
        return Err(Error::InvalidOpaque("decimal payload too short".into()));
    }

    let mut buf = rest[..bin_size].to_vec();
    let negative = buf[0] & 0x80 == 0;
    buf[0] ^= 0x80;
    if negative {
        for b in &mut buf {
            *b ^= 0xff;
        }
    }

    let mut int_digits = String::new();
    let mut pos = 0;
    let chunk = |buf: &[u8], pos: usize, size: usize, max: u32| -> Result<u32> {
        let value = read_be(&buf[pos..pos + size]);
        if value > max {
            return Err(Error::InvalidOpaque(format!("decimal digit group {value} out of range")));
        }
        Ok(value)
    };

    let lead_size = DIG2BYTES[lead_int];
    if lead_size > 0 {
        let value = chunk(&buf, pos, lead_size, 10u32.pow(lead_int as u32) - 1)?;
        let _ = write!(int_digits, "{value}");
        pos += lead_size;
    }
    for _ in 0..full_int {
        let value = chunk(&buf, pos, 4, MAX_CHUNK)?;
        let _ = write!(int_digits, "{value:09}");
        pos += 4;
    }

    let mut frac_digits = String::new();
    for _ in 0..full_frac {
        let value = chunk(&buf, pos, 4, MAX_CHUNK)?;
        let _ = write!(frac_digits, "{value:09}");
        pos += 4;
    }
    let tail_size = DIG2BYTES[tail_frac];
    if tail_size > 0 {
        let value = chunk(&buf, pos, tail_size, 10u32.pow(tail_frac as u32) - 1)?;
        let _ = write!(frac_digits, "{value:0width$}", width = tail_frac);
    }

    let int_digits = int_digits.trim_start_matches('0');
    let mut out = String::with_capacity(precision + 3);
    if negative {
        out.push('-');
    }
    out.push_str(if int_digits.is_empty() { "0" } else { int_digits });
    if !frac_digits.is_empty() {
        out.push('.');
        out.push_str(&frac_digits);
    }
    Ok(out)
}

fn read_packed(payload: &[u8]) -> Result<i64> {
    let bytes: [u8; 8] = payload
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| Error::InvalidOpaque("temporal payload shorter than 8 bytes".into()))?;
    Ok(i64::from_le_bytes(bytes))
}

fn push_fraction(out: &mut String, frac: u64) {
    if frac != 0 {
        let _ = write!(out, ".{frac:06}");
    }
}

/// Decode a packed TIME value: sign, then hour(10) minute(6) second(6) << 24 | microseconds.
fn decode_time(payload: &[u8]) -> Result<String> {
    let packed = read_packed(payload)?;
    let raw = packed.unsigned_abs();
    let int_part = raw >> 24;
    let frac = raw % (1 << 24);
    let hour = (int_part >> 12) % (1 << 10);
    let minute = (int_part >> 6) % (1 << 6);
    let second = int_part % (1 << 6);

    let mut out = String::with_capacity(16);
    if packed < 0 {
        out.push('-');
    }
    let _ = write!(out, "{hour:02}:{minute:02}:{second:02}");
    push_fraction(&mut out, frac);
    Ok(out)
}

/// Decode a packed DATETIME value:
/// ((year * 13 + month) << 5 | day) << 17 | hour << 12 | minute << 6 | second,
/// then << 24 | microseconds.
fn decode_datetime(payload: &[u8], with_time: bool) -> Result<String> {
    let raw = read_packed(payload)?.unsigned_abs();
    let int_part = raw >> 24;
    let frac = raw % (1 << 24);
    let ymd = int_part >> 17;
    let ym = ymd >> 5;
    let hms = int_part % (1 << 17);

    let year = ym / 13;
    let month = ym % 13;
    let day = ymd % (1 << 5);

    let mut out = String::with_capacity(26);
    let _ = write!(out, "{year:04}-{month:02}-{day:02}");
    if with_time {
        let hour = hms >> 12;
        let minute = (hms >> 6) % (1 << 6);
        let second = hms % (1 << 6);
        let _ = write!(out, " {hour:02}:{minute:02}:{second:02}");
        push_fraction(&mut out, frac);
    }
    Ok(out)
}
