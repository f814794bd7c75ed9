use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};
use kamadak_exif::{Context, In, Reader};
use std::path::{Path, PathBuf};

use super::writer::ByteOrder;
use crate::error::{Error, ReadCause, Result};
use crate::rational::Rational;
use crate::tag::{Directory, TagId};
use crate::value::Value;

const FORMAT_RATIONAL: u16 = 5;
const FORMAT_SRATIONAL: u16 = 10;

/// Raw EXIF contents of one JPEG file.
#[derive(Debug, Clone, Default)]
pub struct ExifContents {
    /// Every primary-image field of IFD0, the EXIF IFD and the
    /// Interoperability IFD.
    pub fields: Vec<(TagId, Value)>,
    /// The TIFF payload of the EXIF segment, if the file has one.
    pub tiff: Option<Vec<u8>>,
}

/// Read the EXIF fields of a JPEG file.
///
/// A JPEG without an EXIF segment yields empty contents, not an error.
pub fn read_exif(path: &Path) -> Result<ExifContents> {
    let fail = |source: ReadCause| Error::Read { path: PathBuf::from(path), source };

    let file_bytes = std::fs::read(path).map_err(|e| fail(e.into()))?;
    let jpeg = Jpeg::from_bytes(Bytes::from(file_bytes))
        .map_err(|e| fail(ReadCause::Jpeg(e.to_string())))?;

    let Some(exif) = jpeg.exif() else {
        log::debug!("No EXIF data found in {}", path.display());
        return Ok(ExifContents::default());
    };

    let fields = parse_tiff(&exif).map_err(|e| fail(e.into()))?;
    log::debug!("Read {} EXIF field(s) from {}", fields.len(), path.display());
    Ok(ExifContents { fields, tiff: Some(exif.to_vec()) })
}

/// Parse the primary-image fields of a TIFF payload.
///
/// Thumbnail (IFD1) and GPS fields are left to the writer, which carries
/// them through a rewrite untouched.
pub fn parse_tiff(data: &[u8]) -> std::result::Result<Vec<(TagId, Value)>, kamadak_exif::Error> {
    let exif = Reader::new().read_raw(data.to_vec())?;
    let order = if exif.little_endian() { ByteOrder::Little } else { ByteOrder::Big };

    let mut fields: Vec<(TagId, Value)> = Vec::with_capacity(exif.fields().len());
    for field in exif.fields() {
        if field.ifd_num != In::PRIMARY {
            continue;
        }
        let Some(directory) = directory_of(field.tag.0) else {
            continue;
        };
        let id = TagId::new(directory, field.tag.1);
        if fields.iter().any(|(seen, _)| *seen == id) {
            log::debug!("Ignoring duplicate field {id}");
            continue;
        }
        fields.push((id, convert(&field.value, order)));
    }
    Ok(fields)
}

fn directory_of(context: Context) -> Option<Directory> {
    match context {
        Context::Tiff => Some(Directory::Primary),
        Context::Exif => Some(Directory::Exif),
        Context::Interop => Some(Directory::Interop),
        Context::Gps => None,
        _ => None,
    }
}

/// Map a parsed field value onto [`Value`]. Single-element fields become
/// scalars; signed integers widen to `Long`.
fn convert(value: &kamadak_exif::Value, order: ByteOrder) -> Value {
    use kamadak_exif::Value as Raw;

    match value {
        Raw::Byte(v) | Raw::Undefined(v, _) => scalar_or(v.clone(), Value::Byte, Value::Bytes),
        Raw::SByte(v) => scalar_or(v.iter().map(|&b| b as u8).collect(), Value::Byte, Value::Bytes),
        Raw::Ascii(parts) => ascii(&parts.join(&0u8)),
        Raw::Short(v) => scalar_or(v.clone(), Value::Short, Value::Shorts),
        Raw::SShort(v) => scalar_or(v.iter().map(|&x| i64::from(x)).collect(), Value::Long, Value::Longs),
        Raw::Long(v) => scalar_or(v.iter().map(|&x| i64::from(x)).collect(), Value::Long, Value::Longs),
        Raw::SLong(v) => scalar_or(v.iter().map(|&x| i64::from(x)).collect(), Value::Long, Value::Longs),
        Raw::Rational(v) => {
            let pairs = v.iter().map(|r| (i64::from(r.num), i64::from(r.denom))).collect();
            rationals(pairs, FORMAT_RATIONAL, order)
        }
        Raw::SRational(v) => {
            let pairs = v.iter().map(|r| (i64::from(r.num), i64::from(r.denom))).collect();
            rationals(pairs, FORMAT_SRATIONAL, order)
        }
        Raw::Float(v) => scalar_or(v.clone(), Value::Float, Value::Floats),
        Raw::Double(v) => scalar_or(v.clone(), Value::Double, Value::Doubles),
        Raw::Unknown(format, count, _) => {
            Value::Opaque { format: *format, count: *count, data: Vec::new() }
        }
    }
}

fn scalar_or<T>(mut items: Vec<T>, one: fn(T) -> Value, many: fn(Vec<T>) -> Value) -> Value {
    if items.len() == 1 {
        one(items.remove(0))
    } else {
        many(items)
    }
}

// A zero denominator keeps the field, as raw pairs in file byte order.
fn rationals(pairs: Vec<(i64, i64)>, format: u16, order: ByteOrder) -> Value {
    let reduced: Option<Vec<Rational>> =
        pairs.iter().map(|&(n, d)| Rational::new(n, d).ok()).collect();
    match reduced {
        Some(items) => scalar_or(items, Value::Rational, Value::Rationals),
        None => {
            let mut data = Vec::with_capacity(pairs.len() * 8);
            for (n, d) in &pairs {
                data.extend_from_slice(&order.encode_u32(*n as u32));
                data.extend_from_slice(&order.encode_u32(*d as u32));
            }
            Value::Opaque { format, count: pairs.len() as u32, data }
        }
    }
}

/// ASCII fields: trailing NULs dropped, inner NULs separate strings.
fn ascii(bytes: &[u8]) -> Value {
    let trimmed = match bytes.iter().rposition(|&b| b != 0) {
        Some(last) => &bytes[..=last],
        None => &[][..],
    };
    let mut parts: Vec<String> = trimmed
        .split(|&b| b == 0)
        .map(|part| String::from_utf8_lossy(part).into_owned())
        .collect();
    if parts.len() == 1 {
        Value::Text(parts.remove(0))
    } else {
        Value::Texts(parts)
    }
}
