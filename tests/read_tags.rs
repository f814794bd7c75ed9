mod common;

use chrono::NaiveDate;
use exif_typed::exif::{ByteOrder, OutputSet, fresh_exif_ifd_offset};
use exif_typed::shape::markers;
use exif_typed::{Directory, Error, Rational, Session, Shape, Tag, TagId, Value, open_jpeg, typed};
use tempfile::TempDir;

use common::{jpeg_with_exif, jpeg_without_exif, sample_jpeg, sample_tiff, write_fixture};

/// Call the getter matching the tag's shape; `Ok(true)` if it found a value.
fn matching_getter_finds(session: &Session, tag: Tag) -> Result<bool, Error> {
    Ok(match tag.shape() {
        Shape::Byte => session.get_byte(tag)?.is_some(),
        Shape::ByteArray => session.get_byte_array(tag)?.is_some(),
        Shape::Short => session.get_short(tag)?.is_some(),
        Shape::ShortArray => session.get_short_array(tag)?.is_some(),
        Shape::Long => session.get_long(tag)?.is_some(),
        Shape::LongArray => session.get_long_array(tag)?.is_some(),
        Shape::Float => session.get_float(tag)?.is_some(),
        Shape::FloatArray => session.get_float_array(tag)?.is_some(),
        Shape::Double => session.get_double(tag)?.is_some(),
        Shape::DoubleArray => session.get_double_array(tag)?.is_some(),
        Shape::Rational => session.get_rational(tag)?.is_some(),
        Shape::RationalArray => session.get_rational_array(tag)?.is_some(),
        Shape::String => session.get_string(tag)?.is_some(),
        Shape::StringArray => session.get_string_array(tag)?.is_some(),
        Shape::Timestamp => session.get_timestamp(tag)?.is_some(),
        Shape::GpsText => session.get_gps_text(tag)?.is_some(),
        Shape::Unknown => session.get_unknown(tag)?.is_some(),
    })
}

// ── images without EXIF ──────────────────────────────────────────────

#[test]
fn image_without_exif_has_empty_map() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "0000.jpg", &jpeg_without_exif());

    let session = open_jpeg(&path).unwrap();
    assert!(session.as_map().is_empty());
}

#[test]
fn image_without_exif_has_only_the_exif_offset() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "0000.jpg", &jpeg_without_exif());
    let session = open_jpeg(&path).unwrap();

    for &tag in Tag::all() {
        let found = matching_getter_finds(&session, tag).unwrap();
        assert_eq!(found, tag == Tag::ExifOffset, "{tag}");
    }
    assert_eq!(session.get_long(Tag::ExifOffset).unwrap(), Some(fresh_exif_ifd_offset(0)));
}

// ── typed reads ──────────────────────────────────────────────────────

#[test]
fn timestamp_reads_as_text_and_as_date() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "0001.jpg", &sample_jpeg());
    let session = open_jpeg(&path).unwrap();

    assert_eq!(
        session.get_string(Tag::DateTimeOriginal).unwrap().as_deref(),
        Some("2020:11:26 12:13:14")
    );
    let expected = NaiveDate::from_ymd_opt(2020, 11, 26)
        .unwrap()
        .and_hms_opt(12, 13, 14)
        .unwrap();
    assert_eq!(session.get_timestamp(Tag::DateTimeOriginal).unwrap(), Some(expected));
    assert_eq!(session.read(typed::DateTimeOriginal).unwrap(), Some(expected));
}

#[test]
fn resolution_reads_as_text_and_as_rational() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "0001.jpg", &sample_jpeg());
    let session = open_jpeg(&path).unwrap();

    assert_eq!(session.get_string(Tag::XResolution).unwrap().as_deref(), Some("96/1"));
    let expected: Rational = "96/1".parse().unwrap();
    assert_eq!(session.get_rational(Tag::XResolution).unwrap(), Some(expected));
    assert_eq!(session.read(typed::YResolution).unwrap(), Some(expected));
}

#[test]
fn scalar_and_array_shapes() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "0001.jpg", &sample_jpeg());
    let session = open_jpeg(&path).unwrap();

    assert_eq!(session.get_short(Tag::ResolutionUnit).unwrap(), Some(2));
    assert_eq!(session.read(typed::ColorSpace).unwrap(), Some(1));
    assert_eq!(
        session.get_byte_array(Tag::ComponentsConfiguration).unwrap(),
        Some(vec![1, 2, 3, 0])
    );
    assert_eq!(session.read(typed::ExifVersion).unwrap(), Some(b"0232".to_vec()));
    // Header, then IFD0 with four fields and the EXIF pointer.
    assert_eq!(session.get_long(Tag::ExifOffset).unwrap(), Some(74));
    assert_eq!(session.get_as::<markers::Short>(Tag::YCbCrPositioning).unwrap(), Some(1));
}

#[test]
fn as_map_lists_every_stored_tag() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "0001.jpg", &sample_jpeg());
    let map = open_jpeg(&path).unwrap().as_map();

    let tags: Vec<Tag> = map.keys().copied().collect();
    let mut expected = vec![
        Tag::ColorSpace,
        Tag::ComponentsConfiguration,
        Tag::DateTimeOriginal,
        Tag::ExifOffset,
        Tag::ExifVersion,
        Tag::FlashpixVersion,
        Tag::ResolutionUnit,
        Tag::XResolution,
        Tag::YCbCrPositioning,
        Tag::YResolution,
    ];
    expected.sort();
    assert_eq!(tags, expected);
    assert_eq!(map[&Tag::XResolution], Value::Rational(Rational::new(96, 1).unwrap()));
    assert_eq!(map[&Tag::ExifVersion], Value::Bytes(b"0232".to_vec()));
    assert_eq!(map[&Tag::DateTimeOriginal], Value::Text("2020:11:26 12:13:14".into()));
}

#[test]
fn little_endian_files_read_the_same() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(
        dir.path(),
        "intel.jpg",
        &jpeg_with_exif(sample_tiff(ByteOrder::Little)),
    );
    let session = open_jpeg(&path).unwrap();
    assert_eq!(
        session.get_rational(Tag::XResolution).unwrap(),
        Some(Rational::new(96, 1).unwrap())
    );
    assert_eq!(
        session.get_string(Tag::DateTimeOriginal).unwrap().as_deref(),
        Some("2020:11:26 12:13:14")
    );
}

// ── errors ───────────────────────────────────────────────────────────

#[test]
fn mismatched_getters_are_coercion_errors() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "0001.jpg", &sample_jpeg());
    let session = open_jpeg(&path).unwrap();

    let err = session.get_long(Tag::DateTimeOriginal).unwrap_err();
    assert!(err.is_coercion());
    let err = session.get_short(Tag::Make).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { tag: Tag::Make, .. }));
}

#[test]
fn uncatalogued_fields_are_skipped_on_open() {
    let mut set = OutputSet::from_tiff(&sample_tiff(ByteOrder::Big)).unwrap();
    set.directory_mut(Directory::Primary).add_short(0x0FFF, 7);
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "extra.jpg", &jpeg_with_exif(set.to_tiff().unwrap()));

    let session = open_jpeg(&path).unwrap();
    assert_eq!(session.as_map().len(), 10);

    let id = TagId::new(Directory::Primary, 0x0FFF);
    assert!(matches!(Tag::from_id(id), Err(Error::NotFound(found)) if found == id));
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let err = open_jpeg(dir.path().join("absent.jpg")).unwrap_err();
    assert!(matches!(err, Error::Read { .. }));
}

#[test]
fn non_jpeg_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "fake.jpg", b"GIF89a");
    assert!(matches!(open_jpeg(&path), Err(Error::Read { .. })));
}

#[test]
fn malformed_exif_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "bad.jpg", &jpeg_with_exif(b"XX\0\0garbage".to_vec()));
    let err = open_jpeg(&path).unwrap_err();
    assert!(matches!(err, Error::Read { .. }));
    assert!(err.to_string().contains("malformed EXIF data"));
}
