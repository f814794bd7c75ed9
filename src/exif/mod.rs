//! EXIF reading, writing, and the typed metadata session.
//!
//! - [`read_exif`] parses the EXIF segment of a JPEG into raw fields
//! - [`OutputSet`] is the mutable directory structure a write is built from
//! - [`write_exif`] replaces the EXIF segment, leaving every other segment
//!   byte-for-byte intact
//! - [`Session`] ties them together behind typed getters and pending edits
//!
//! TIFF parsing and serialization are done by `kamadak-exif`.

mod reader;
mod session;
mod writer;

pub use reader::{ExifContents, parse_tiff, read_exif};
pub use session::{Session, open_jpeg, with_jpeg};
pub use writer::{ByteOrder, OutputDirectory, OutputSet, fresh_exif_ifd_offset, write_exif};
