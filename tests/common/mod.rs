//! JPEG fixtures built in memory.
#![allow(dead_code)]

use exif_typed::Directory;
use exif_typed::exif::{ByteOrder, OutputSet};
use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};
use std::path::{Path, PathBuf};

fn segment(out: &mut Vec<u8>, marker: u8, contents: &[u8]) {
    out.extend_from_slice(&[0xFF, marker]);
    out.extend_from_slice(&((contents.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(contents);
}

/// A 1x1 baseline JPEG with a JFIF header and no EXIF segment.
pub fn jpeg_without_exif() -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    segment(&mut out, 0xE0, b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0");
    let mut dqt = vec![0x00];
    dqt.extend_from_slice(&[1; 64]);
    segment(&mut out, 0xDB, &dqt);
    segment(&mut out, 0xC0, &[8, 0, 1, 0, 1, 1, 1, 0x11, 0]);
    let mut dc = vec![0x00];
    dc.extend_from_slice(&[0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    dc.extend_from_slice(&[0]);
    segment(&mut out, 0xC4, &dc);
    let mut ac = vec![0x10];
    ac.extend_from_slice(&[0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    ac.extend_from_slice(&[0]);
    segment(&mut out, 0xC4, &ac);
    segment(&mut out, 0xDA, &[1, 1, 0x00, 0, 63, 0]);
    out.extend_from_slice(&[0x12, 0x34, 0x56, 0x00]);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

/// The EXIF payload of a typical camera-less export: resolution, colour
/// space and one capture timestamp.
pub fn sample_tiff(order: ByteOrder) -> Vec<u8> {
    let mut set = OutputSet::new(order);

    let mut ifd0 = set.directory_mut(Directory::Primary);
    ifd0.add_rational(0x011A, 96, 1); // XResolution
    ifd0.add_rational(0x011B, 96, 1); // YResolution
    ifd0.add_short(0x0128, 2); // ResolutionUnit
    ifd0.add_short(0x0213, 1); // YCbCrPositioning

    let mut exif = set.directory_mut(Directory::Exif);
    exif.add_undefined(0x9000, b"0232"); // ExifVersion
    exif.add_ascii(0x9003, "2020:11:26 12:13:14"); // DateTimeOriginal
    exif.add_undefined(0x9101, &[1, 2, 3, 0]); // ComponentsConfiguration
    exif.add_undefined(0xA000, b"0100"); // FlashpixVersion
    exif.add_short(0xA001, 1); // ColorSpace

    set.to_tiff().unwrap()
}

/// Embed a TIFF payload as the EXIF segment of the base fixture.
pub fn jpeg_with_exif(tiff: Vec<u8>) -> Vec<u8> {
    let mut jpeg = Jpeg::from_bytes(Bytes::from(jpeg_without_exif())).unwrap();
    jpeg.set_exif(Some(Bytes::from(tiff)));
    // Keep EXIF directly after APP0, where cameras put it.
    let segments = jpeg.segments_mut();
    let pos = segments
        .iter()
        .position(|s| s.marker() == 0xE1)
        .unwrap();
    let seg = segments.remove(pos);
    segments.insert(1, seg);
    jpeg.encoder().bytes().to_vec()
}

pub fn sample_jpeg() -> Vec<u8> {
    jpeg_with_exif(sample_tiff(ByteOrder::Big))
}

pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// `(marker, contents)` of every segment except EXIF.
pub fn non_exif_segments(bytes: &[u8]) -> Vec<(u8, Vec<u8>)> {
    let jpeg = Jpeg::from_bytes(Bytes::copy_from_slice(bytes)).unwrap();
    jpeg.segments()
        .iter()
        .filter(|s| !(s.marker() == 0xE1 && s.contents().starts_with(b"Exif\0\0")))
        .map(|s| (s.marker(), s.contents().to_vec()))
        .collect()
}

/// Index of the EXIF segment.
pub fn exif_position(bytes: &[u8]) -> Option<usize> {
    let jpeg = Jpeg::from_bytes(Bytes::copy_from_slice(bytes)).unwrap();
    jpeg.segments()
        .iter()
        .position(|s| s.marker() == 0xE1 && s.contents().starts_with(b"Exif\0\0"))
}
