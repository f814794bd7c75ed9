//! Value shapes: the semantic type each catalogue tag is bound to.
//!
//! [`Shape`] is the runtime form used for dispatch and diagnostics. Each
//! shape also has a zero-sized marker type implementing [`TagShape`], so a
//! [`TypedTag`](crate::TypedTag) can carry its shape in the type system and
//! [`Session::read`](crate::Session::read) returns the right Rust type.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

use crate::rational::Rational as Fraction;
use crate::value::Value;

/// The closed set of value shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Shape {
    Byte,
    ByteArray,
    Short,
    ShortArray,
    Long,
    LongArray,
    Float,
    FloatArray,
    Double,
    DoubleArray,
    Rational,
    RationalArray,
    String,
    StringArray,
    Timestamp,
    /// Fixed-width, NUL-padded text such as `UserComment`.
    GpsText,
    /// Opaque passthrough.
    Unknown,
}

impl Shape {
    pub const ALL: [Shape; 17] = [
        Shape::Byte,
        Shape::ByteArray,
        Shape::Short,
        Shape::ShortArray,
        Shape::Long,
        Shape::LongArray,
        Shape::Float,
        Shape::FloatArray,
        Shape::Double,
        Shape::DoubleArray,
        Shape::Rational,
        Shape::RationalArray,
        Shape::String,
        Shape::StringArray,
        Shape::Timestamp,
        Shape::GpsText,
        Shape::Unknown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Shape::Byte => "Byte",
            Shape::ByteArray => "ByteArray",
            Shape::Short => "Short",
            Shape::ShortArray => "ShortArray",
            Shape::Long => "Long",
            Shape::LongArray => "LongArray",
            Shape::Float => "Float",
            Shape::FloatArray => "FloatArray",
            Shape::Double => "Double",
            Shape::DoubleArray => "DoubleArray",
            Shape::Rational => "Rational",
            Shape::RationalArray => "RationalArray",
            Shape::String => "String",
            Shape::StringArray => "StringArray",
            Shape::Timestamp => "Timestamp",
            Shape::GpsText => "GPSText",
            Shape::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type-level shape marker.
///
/// `from_decoded` receives a value that has already been through
/// [`coerce::decode`](crate::coerce::decode) for [`Self::SHAPE`], so it only
/// unwraps the canonical variant.
pub trait TagShape {
    const SHAPE: Shape;
    type Output;

    fn from_decoded(value: Value) -> Option<Self::Output>;
}

macro_rules! shape_markers {
    ( $( $marker:ident => $output:ty, $variant:ident; )+ ) => {
        $(
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct $marker;

            impl TagShape for $marker {
                const SHAPE: Shape = Shape::$marker;
                type Output = $output;

                fn from_decoded(value: Value) -> Option<$output> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )+
    };
}

/// Marker types, one per [`Shape`].
pub mod markers {
    use super::*;

    shape_markers! {
        Byte => u8, Byte;
        ByteArray => Vec<u8>, Bytes;
        Short => u16, Short;
        ShortArray => Vec<u16>, Shorts;
        Long => i64, Long;
        LongArray => Vec<i64>, Longs;
        Float => f32, Float;
        FloatArray => Vec<f32>, Floats;
        Double => f64, Double;
        DoubleArray => Vec<f64>, Doubles;
        Rational => Fraction, Rational;
        RationalArray => Vec<Fraction>, Rationals;
        String => std::string::String, Text;
        StringArray => Vec<std::string::String>, Texts;
        Timestamp => NaiveDateTime, Timestamp;
        GpsText => std::string::String, Text;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Unknown;

    impl TagShape for Unknown {
        const SHAPE: Shape = Shape::Unknown;
        type Output = Value;

        fn from_decoded(value: Value) -> Option<Value> {
            Some(value)
        }
    }
}
