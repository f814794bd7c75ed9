//! The untyped stored value union.
//!
//! The reader produces one [`Value`] per field; pending edits are stored as
//! values too. Scalars are produced for TIFF fields with a count of one,
//! array variants otherwise.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::rational::Rational;

/// Text layout of EXIF timestamps: `yyyy:MM:dd HH:mm:ss`.
pub const TIMESTAMP_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// BYTE, SBYTE and UNDEFINED fields with a single element.
    Byte(u8),
    Bytes(Vec<u8>),
    Short(u16),
    Shorts(Vec<u16>),
    /// LONG, SLONG and SSHORT fields, widened.
    Long(i64),
    Longs(Vec<i64>),
    Float(f32),
    Floats(Vec<f32>),
    Double(f64),
    Doubles(Vec<f64>),
    Rational(Rational),
    Rationals(Vec<Rational>),
    Text(String),
    /// ASCII fields holding more than one NUL-separated string.
    Texts(Vec<String>),
    /// Only ever produced by edits; the reader yields `Text` for timestamps.
    Timestamp(#[serde(serialize_with = "serialize_timestamp")] NaiveDateTime),
    /// A field this crate cannot decode: unknown TIFF format, or a rational
    /// with a zero denominator.
    Opaque { format: u16, count: u32, data: Vec<u8> },
}

/// The runtime representation of a [`Value`], for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Byte,
    Bytes,
    Short,
    Shorts,
    Long,
    Longs,
    Float,
    Floats,
    Double,
    Doubles,
    Rational,
    Rationals,
    Text,
    Texts,
    Timestamp,
    Opaque,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Byte(_) => ValueKind::Byte,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Short(_) => ValueKind::Short,
            Value::Shorts(_) => ValueKind::Shorts,
            Value::Long(_) => ValueKind::Long,
            Value::Longs(_) => ValueKind::Longs,
            Value::Float(_) => ValueKind::Float,
            Value::Floats(_) => ValueKind::Floats,
            Value::Double(_) => ValueKind::Double,
            Value::Doubles(_) => ValueKind::Doubles,
            Value::Rational(_) => ValueKind::Rational,
            Value::Rationals(_) => ValueKind::Rationals,
            Value::Text(_) => ValueKind::Text,
            Value::Texts(_) => ValueKind::Texts,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Opaque { .. } => ValueKind::Opaque,
        }
    }

    /// The value as a signed integer, if it is integer-like.
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Value::Byte(v) => Some(v.into()),
            Value::Short(v) => Some(v.into()),
            Value::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Each element's generic text form, if the value is a sequence.
    pub fn elements_as_text(&self) -> Option<Vec<String>> {
        fn each<T: ToString>(items: &[T]) -> Vec<String> {
            items.iter().map(ToString::to_string).collect()
        }
        match self {
            Value::Bytes(v) => Some(each(v)),
            Value::Shorts(v) => Some(each(v)),
            Value::Longs(v) => Some(each(v)),
            Value::Floats(v) => Some(each(v)),
            Value::Doubles(v) => Some(each(v)),
            Value::Rationals(v) => Some(each(v)),
            Value::Texts(v) => Some(v.clone()),
            _ => None,
        }
    }
}

pub(crate) fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn serialize_timestamp<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Generic text form: scalars as themselves, sequences comma-separated.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Byte(v) => write!(f, "{v}"),
            Value::Bytes(v) => join(f, v),
            Value::Short(v) => write!(f, "{v}"),
            Value::Shorts(v) => join(f, v),
            Value::Long(v) => write!(f, "{v}"),
            Value::Longs(v) => join(f, v),
            Value::Float(v) => write!(f, "{v}"),
            Value::Floats(v) => join(f, v),
            Value::Double(v) => write!(f, "{v}"),
            Value::Doubles(v) => join(f, v),
            Value::Rational(v) => write!(f, "{v}"),
            Value::Rationals(v) => join(f, v),
            Value::Text(v) => f.write_str(v),
            Value::Texts(v) => join(f, v),
            Value::Timestamp(v) => write!(f, "{}", v.format(TIMESTAMP_FORMAT)),
            Value::Opaque { format, count, .. } => write!(f, "<format {format}, {count} item(s)>"),
        }
    }
}

macro_rules! value_from {
    ($( $ty:ty => $variant:ident ),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )+
    };
}

value_from! {
    u8 => Byte,
    Vec<u8> => Bytes,
    u16 => Short,
    Vec<u16> => Shorts,
    i64 => Long,
    Vec<i64> => Longs,
    f32 => Float,
    Vec<f32> => Floats,
    f64 => Double,
    Vec<f64> => Doubles,
    Rational => Rational,
    Vec<Rational> => Rationals,
    String => Text,
    Vec<String> => Texts,
    NaiveDateTime => Timestamp,
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Long(v.into())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}
