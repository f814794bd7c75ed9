use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};
use kamadak_exif::experimental::Writer;
use kamadak_exif::{Context, Exif, Field, In, Reader, Tag as RawTag, Value as RawValue};
use std::ffi::OsString;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::config::SessionOptions;
use crate::error::{Error, Result, WriteCause};
use crate::tag::Directory;

// "Exif\0\0" plus the two segment length bytes.
const APP1_OVERHEAD: usize = 8;

// TIFF header, IFD entry count, one IFD entry, next-IFD offset.
const HEADER_LEN: i64 = 8;
const COUNT_LEN: i64 = 2;
const ENTRY_LEN: i64 = 12;
const NEXT_LEN: i64 = 4;

const TAG_EXIF_VERSION: u16 = 0x9000;
const EXIF_VERSION: &[u8; 4] = b"0232";

/// Byte order of a TIFF payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// "MM", Motorola.
    Big,
    /// "II", Intel.
    Little,
}

impl ByteOrder {
    pub fn encode_u32(self, value: u32) -> [u8; 4] {
        match self {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        }
    }
}

/// Offset of the EXIF IFD in a payload built from scratch whose IFD0 holds
/// `primary_fields` fields besides the EXIF pointer.
///
/// IFD0 follows the header and the EXIF IFD follows IFD0's entry table;
/// field data comes after both.
pub fn fresh_exif_ifd_offset(primary_fields: usize) -> i64 {
    let entries = primary_fields as i64 + 1;
    HEADER_LEN + COUNT_LEN + ENTRY_LEN * entries + NEXT_LEN
}

/// Thumbnail image data referenced from IFD1.
#[derive(Debug, Clone, PartialEq)]
enum Thumbnail {
    Jpeg(Vec<u8>),
    Strips(Vec<Vec<u8>>),
}

/// A mutable view of one directory of an [`OutputSet`].
#[derive(Debug)]
pub struct OutputDirectory<'a> {
    fields: &'a mut Vec<Field>,
    context: Context,
}

impl OutputDirectory<'_> {
    fn tag(&self, number: u16) -> RawTag {
        RawTag(self.context, number)
    }

    /// Insert a field, replacing any field with the same number.
    pub fn insert(&mut self, number: u16, value: RawValue) {
        self.remove(number);
        let tag = self.tag(number);
        self.fields.push(Field { tag, ifd_num: In::PRIMARY, value });
    }

    pub fn remove(&mut self, number: u16) -> Option<Field> {
        let tag = self.tag(number);
        let at = self
            .fields
            .iter()
            .position(|f| f.ifd_num == In::PRIMARY && f.tag == tag)?;
        Some(self.fields.remove(at))
    }

    /// Add an ASCII field. The terminating NUL is added on write.
    pub fn add_ascii(&mut self, number: u16, text: &str) {
        self.insert(number, RawValue::Ascii(vec![text.as_bytes().to_vec()]));
    }

    pub fn add_short(&mut self, number: u16, value: u16) {
        self.insert(number, RawValue::Short(vec![value]));
    }

    pub fn add_rational(&mut self, number: u16, numerator: u32, denominator: u32) {
        let ratio = kamadak_exif::Rational { num: numerator, denom: denominator };
        self.insert(number, RawValue::Rational(vec![ratio]));
    }

    pub fn add_undefined(&mut self, number: u16, bytes: &[u8]) {
        self.insert(number, RawValue::Undefined(bytes.to_vec(), 0));
    }
}

/// The mutable output structure a TIFF payload is rebuilt from.
///
/// Every field of every IFD is kept, including GPS, maker notes and the
/// thumbnail directory. [`to_tiff`](OutputSet::to_tiff) serializes them from
/// scratch, so the payload is as compact after a rewrite as a fresh one, and
/// sub-directory pointers and thumbnail offsets are recomputed.
#[derive(Debug, Clone)]
pub struct OutputSet {
    order: ByteOrder,
    fields: Vec<Field>,
    thumbnail: Option<Thumbnail>,
}

impl OutputSet {
    /// An empty set. The EXIF directory starts with an ExifVersion field so
    /// that it is always written.
    pub fn new(order: ByteOrder) -> Self {
        let mut set = Self { order, fields: Vec::new(), thumbnail: None };
        set.directory_mut(Directory::Exif)
            .add_undefined(TAG_EXIF_VERSION, EXIF_VERSION);
        set
    }

    /// Load every field of an existing TIFF payload.
    pub fn from_tiff(data: &[u8]) -> std::result::Result<Self, kamadak_exif::Error> {
        let exif = Reader::new().read_raw(data.to_vec())?;
        let order = if exif.little_endian() { ByteOrder::Little } else { ByteOrder::Big };
        let thumbnail = thumbnail(&exif);
        if thumbnail.is_none() && exif.fields().any(|f| f.ifd_num == In::THUMBNAIL) {
            log::debug!("Thumbnail data could not be located; keeping IFD1 fields only");
        }

        let mut fields: Vec<Field> = Vec::with_capacity(exif.fields().len());
        for field in exif.fields() {
            if is_structural(field.tag) {
                continue;
            }
            if let RawValue::Unknown(format, ..) = field.value {
                log::debug!("Dropping {} with unknown field format {format}", field.tag);
                continue;
            }
            if fields.iter().any(|f| f.tag == field.tag && f.ifd_num == field.ifd_num) {
                continue;
            }
            fields.push(field.clone());
        }
        Ok(Self { order, fields, thumbnail })
    }

    /// Get a primary-image directory for editing. Directories are created by
    /// adding fields to them.
    pub fn directory_mut(&mut self, directory: Directory) -> OutputDirectory<'_> {
        let context = match directory {
            Directory::Primary => Context::Tiff,
            Directory::Exif => Context::Exif,
            Directory::Interop => Context::Interop,
        };
        OutputDirectory { fields: &mut self.fields, context }
    }

    /// Serialize to a TIFF payload.
    pub fn to_tiff(&self) -> std::result::Result<Vec<u8>, kamadak_exif::Error> {
        let strips: Vec<&[u8]>;
        let mut writer = Writer::new();
        for field in &self.fields {
            writer.push_field(field);
        }
        match &self.thumbnail {
            Some(Thumbnail::Jpeg(jpeg)) => writer.set_jpeg(jpeg, In::THUMBNAIL),
            Some(Thumbnail::Strips(blocks)) => {
                strips = blocks.iter().map(Vec::as_slice).collect();
                writer.set_strips(&strips, In::THUMBNAIL);
            }
            None => {}
        }

        let mut out = Cursor::new(Vec::new());
        writer.write(&mut out, self.order == ByteOrder::Little)?;
        Ok(out.into_inner())
    }
}

/// Fields the writer derives from the layout: sub-directory pointers and
/// thumbnail data locations.
fn is_structural(tag: RawTag) -> bool {
    matches!(
        tag,
        RawTag::ExifIFDPointer
            | RawTag::GPSInfoIFDPointer
            | RawTag::InteropIFDPointer
            | RawTag::JPEGInterchangeFormat
            | RawTag::JPEGInterchangeFormatLength
            | RawTag::StripOffsets
            | RawTag::StripByteCounts
            | RawTag::TileOffsets
            | RawTag::TileByteCounts
    )
}

fn thumbnail(exif: &Exif) -> Option<Thumbnail> {
    let uints = |tag: RawTag| -> Option<Vec<u32>> {
        match &exif.get_field(tag, In::THUMBNAIL)?.value {
            RawValue::Long(v) => Some(v.clone()),
            RawValue::Short(v) => Some(v.iter().map(|&x| u32::from(x)).collect()),
            _ => None,
        }
    };
    let block = |offset: u32, len: u32| -> Option<Vec<u8>> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(usize::try_from(len).ok()?)?;
        exif.buf().get(start..end).map(<[u8]>::to_vec)
    };

    if let Some(offsets) = uints(RawTag::JPEGInterchangeFormat) {
        let lengths = uints(RawTag::JPEGInterchangeFormatLength)?;
        return block(*offsets.first()?, *lengths.first()?).map(Thumbnail::Jpeg);
    }
    let offsets = uints(RawTag::StripOffsets)?;
    let counts = uints(RawTag::StripByteCounts)?;
    offsets
        .iter()
        .zip(&counts)
        .map(|(&offset, &len)| block(offset, len))
        .collect::<Option<Vec<_>>>()
        .map(Thumbnail::Strips)
}

/// Rewrite the EXIF segment of a JPEG file from `set`.
///
/// Strategy:
/// 1. Serialize the output set and check it fits one APP1 segment
/// 2. Re-read the JPEG with img-parts (preserves all other segments)
/// 3. Replace the EXIF segment, keeping its original position
/// 4. Write to a sibling temporary file, then rename it over the original
pub fn write_exif(path: &Path, set: &OutputSet, options: &SessionOptions) -> Result<()> {
    let fail = |source: WriteCause| Error::Write { path: PathBuf::from(path), source };

    let tiff_data = set.to_tiff().map_err(|e| fail(WriteCause::Exif(e)))?;
    if tiff_data.len() + APP1_OVERHEAD > usize::from(u16::MAX) {
        return Err(fail(WriteCause::SegmentTooLarge(tiff_data.len())));
    }

    let file_bytes = std::fs::read(path).map_err(|e| fail(e.into()))?;
    let mut jpeg = Jpeg::from_bytes(Bytes::from(file_bytes))
        .map_err(|e| fail(WriteCause::Jpeg(e.to_string())))?;

    let orig_exif_pos = find_exif_segment_pos(&jpeg);
    jpeg.set_exif(Some(Bytes::from(tiff_data)));

    // set_exif() inserts at a fixed position; move the segment back to where
    // it was, or right after APP0 for a file that had none.
    if let Some(new_pos) = find_exif_segment_pos(&jpeg) {
        let target_pos = orig_exif_pos.unwrap_or(1);
        if target_pos < new_pos {
            let segments = jpeg.segments_mut();
            let seg = segments.remove(new_pos);
            segments.insert(target_pos, seg);
        }
    }

    if options.backup_originals {
        backup_file(path).map_err(|e| fail(e.into()))?;
    }

    let output = jpeg.encoder().bytes();
    let temp_path = temp_path(path, &options.temp_suffix);
    let replaced = std::fs::write(&temp_path, &output)
        .and_then(|()| std::fs::rename(&temp_path, path));
    if let Err(e) = replaced {
        // The original has not been touched; only the temporary is stale.
        let _ = std::fs::remove_file(&temp_path);
        return Err(fail(e.into()));
    }

    log::info!("Wrote EXIF metadata to {}", path.display());
    Ok(())
}

/// Find the position of the EXIF APP1 segment in a JPEG.
/// EXIF segments have marker 0xE1 (APP1) and contents starting with "Exif\0\0".
fn find_exif_segment_pos(jpeg: &Jpeg) -> Option<usize> {
    const EXIF_PREFIX: &[u8] = b"Exif\0\0";
    jpeg.segments()
        .iter()
        .position(|s| s.marker() == 0xE1 && s.contents().starts_with(EXIF_PREFIX))
}

/// `photo.jpg` → `photo.jpg.working`.
fn temp_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Copy `photo.jpg` to `photo.jpg.bak` unless a backup already exists.
fn backup_file(path: &Path) -> std::io::Result<PathBuf> {
    let backup_path = temp_path(path, ".bak");
    if !backup_path.exists() {
        std::fs::copy(path, &backup_path)?;
        log::debug!("Backup created: {}", backup_path.display());
    }
    Ok(backup_path)
}
