//! Per-shape decode and encode rules.
//!
//! Decoding turns whatever the reader (or an edit) stored into the canonical
//! [`Value`] variant for a shape; [`TagShape::from_decoded`] then unwraps it.
//! Dispatch goes through a table keyed by [`Shape`], so adding a shape means
//! adding one decoder and one table row.
//!
//! [`TagShape::from_decoded`]: crate::shape::TagShape::from_decoded

use chrono::NaiveDateTime;

use crate::rational::Rational;
use crate::shape::Shape;
use crate::value::{TIMESTAMP_FORMAT, Value, ValueKind, format_timestamp};

/// A decoder either yields the canonical value or reports what it found.
pub type Decoder = fn(&Value) -> Result<Value, ValueKind>;

/// The decoder for a shape.
pub fn decoder(shape: Shape) -> Decoder {
    match shape {
        Shape::Byte => decode_byte,
        Shape::ByteArray => decode_byte_array,
        Shape::Short => decode_short,
        Shape::ShortArray => decode_short_array,
        Shape::Long => decode_long,
        Shape::LongArray => decode_long_array,
        Shape::Float => decode_float,
        Shape::FloatArray => decode_float_array,
        Shape::Double => decode_double,
        Shape::DoubleArray => decode_double_array,
        Shape::Rational => decode_rational,
        Shape::RationalArray => decode_rational_array,
        Shape::String => decode_string,
        Shape::StringArray => decode_string_array,
        Shape::Timestamp => decode_timestamp,
        Shape::GpsText => decode_gps_text,
        Shape::Unknown => decode_unknown,
    }
}

/// Decode `value` as `shape`. On failure the error is the stored kind.
pub fn decode(shape: Shape, value: &Value) -> Result<Value, ValueKind> {
    decoder(shape)(value)
}

/// Encode a pending value as the text written back to the file.
///
/// Only text-shaped tags are writable, and only from text or timestamp
/// values. Everything else is reported as the offending value kind. Text
/// with an embedded NUL is refused: ASCII fields use NUL as a separator, so
/// it would read back as several strings.
pub fn encode(shape: Shape, value: &Value) -> Result<String, ValueKind> {
    match (shape, value) {
        (Shape::String | Shape::Timestamp, Value::Text(text)) if !text.contains('\0') => {
            Ok(text.clone())
        }
        (Shape::String | Shape::Timestamp, Value::Timestamp(ts)) => Ok(format_timestamp(ts)),
        _ => Err(value.kind()),
    }
}

// ── integers ─────────────────────────────────────────────────────────

fn integer<T: TryFrom<i64>>(value: &Value) -> Result<T, ValueKind> {
    value
        .as_integer()
        .and_then(|v| T::try_from(v).ok())
        .ok_or(value.kind())
}

fn decode_byte(value: &Value) -> Result<Value, ValueKind> {
    integer::<u8>(value).map(Value::Byte)
}

fn decode_short(value: &Value) -> Result<Value, ValueKind> {
    integer::<u16>(value).map(Value::Short)
}

fn decode_long(value: &Value) -> Result<Value, ValueKind> {
    integer::<i64>(value).map(Value::Long)
}

// ── floating point ───────────────────────────────────────────────────

fn decode_float(value: &Value) -> Result<Value, ValueKind> {
    match value {
        Value::Float(v) => Ok(Value::Float(*v)),
        other => Err(other.kind()),
    }
}

fn decode_double(value: &Value) -> Result<Value, ValueKind> {
    match value {
        Value::Float(v) => Ok(Value::Double(f64::from(*v))),
        Value::Double(v) => Ok(Value::Double(*v)),
        other => Err(other.kind()),
    }
}

// ── exact arrays ─────────────────────────────────────────────────────

macro_rules! exact_array {
    ($name:ident, $variant:ident) => {
        fn $name(value: &Value) -> Result<Value, ValueKind> {
            match value {
                Value::$variant(v) => Ok(Value::$variant(v.clone())),
                other => Err(other.kind()),
            }
        }
    };
}

exact_array!(decode_byte_array, Bytes);
exact_array!(decode_short_array, Shorts);
exact_array!(decode_long_array, Longs);
exact_array!(decode_float_array, Floats);
exact_array!(decode_double_array, Doubles);

// ── rationals ────────────────────────────────────────────────────────

fn decode_rational(value: &Value) -> Result<Value, ValueKind> {
    match value {
        Value::Rational(r) => Ok(Value::Rational(*r)),
        Value::Text(text) => text
            .parse::<Rational>()
            .map(Value::Rational)
            .map_err(|_| ValueKind::Text),
        other => Err(other.kind()),
    }
}

// A single-element TIFF field reads as a scalar, so a lone fraction is a
// one-element sequence.
fn decode_rational_array(value: &Value) -> Result<Value, ValueKind> {
    match value {
        Value::Rationals(v) => Ok(Value::Rationals(v.clone())),
        Value::Rational(r) => Ok(Value::Rationals(vec![*r])),
        other => Err(other.kind()),
    }
}

// ── text ─────────────────────────────────────────────────────────────

fn decode_string(value: &Value) -> Result<Value, ValueKind> {
    let text = match value {
        Value::Text(text) => text.clone(),
        Value::Rational(r) => r.to_string(),
        Value::Timestamp(ts) => format_timestamp(ts),
        other => other.to_string(),
    };
    Ok(Value::Text(text))
}

fn decode_string_array(value: &Value) -> Result<Value, ValueKind> {
    value
        .elements_as_text()
        .map(Value::Texts)
        .ok_or(value.kind())
}

fn decode_timestamp(value: &Value) -> Result<Value, ValueKind> {
    match value {
        Value::Timestamp(ts) => Ok(Value::Timestamp(*ts)),
        Value::Text(text) => NaiveDateTime::parse_from_str(text.trim_end_matches('\0'), TIMESTAMP_FORMAT)
            .map(Value::Timestamp)
            .map_err(|_| ValueKind::Text),
        other => Err(other.kind()),
    }
}

// 8-byte character code prefixes of EXIF comment fields.
const CODE_ASCII: &[u8; 8] = b"ASCII\0\0\0";
const CODE_UNICODE: &[u8; 8] = b"UNICODE\0";
const CODE_JIS: &[u8; 8] = b"JIS\0\0\0\0\0";
const CODE_UNDEFINED: &[u8; 8] = &[0; 8];

fn decode_gps_text(value: &Value) -> Result<Value, ValueKind> {
    let text = match value {
        Value::Text(text) => text.clone(),
        Value::Bytes(bytes) => comment_text(bytes),
        other => return Err(other.kind()),
    };
    Ok(Value::Text(text.replace('\0', "")))
}

fn comment_text(bytes: &[u8]) -> String {
    match bytes.split_first_chunk::<8>() {
        Some((CODE_UNICODE, rest)) => utf16_text(rest),
        Some((code, rest)) if code == CODE_ASCII || code == CODE_JIS || code == CODE_UNDEFINED => {
            String::from_utf8_lossy(rest).into_owned()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

// The comment does not record its byte order; for mostly-Latin text the
// high byte of each unit is zero, which tells the two orders apart.
fn utf16_text(bytes: &[u8]) -> String {
    let zeros_at = |parity: usize| {
        bytes
            .iter()
            .skip(parity)
            .step_by(2)
            .filter(|&&b| b == 0)
            .count()
    };
    let big_endian = zeros_at(0) > zeros_at(1);
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| {
            let pair = [pair[0], pair[1]];
            if big_endian {
                u16::from_be_bytes(pair)
            } else {
                u16::from_le_bytes(pair)
            }
        })
        .collect();
    String::from_utf16_lossy(&units)
}

fn decode_unknown(value: &Value) -> Result<Value, ValueKind> {
    Ok(value.clone())
}
