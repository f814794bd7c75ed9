use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::rational::RationalError;
use crate::shape::Shape;
use crate::tag::{Tag, TagId};
use crate::value::ValueKind;

/// Errors surfaced by the library.
///
/// A tag that is simply absent is never an error: typed getters return
/// `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum Error {
    /// The file could not be read, or is not a parseable JPEG/EXIF image.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ReadCause,
    },

    /// A binary tag identifier has no catalogue entry.
    #[error("no catalogue tag for identifier {0}")]
    NotFound(TagId),

    /// A tag name has no catalogue entry.
    #[error("no catalogue tag named {0:?}")]
    UnknownTagName(String),

    /// The stored value cannot be decoded as the requested shape.
    #[error("cannot decode {tag} as {requested}: stored value is {found}")]
    Coercion {
        tag: Tag,
        requested: Shape,
        found: ValueKind,
    },

    /// A typed getter was called for a shape other than the tag's own.
    /// Raised whether or not the tag is present.
    #[error("{tag} is {declared}, not {requested}")]
    ShapeMismatch {
        tag: Tag,
        requested: Shape,
        declared: Shape,
    },

    /// A pending value cannot be encoded for write-back. Only text values
    /// of text-shaped tags are writable, and the text may not contain NUL.
    #[error("cannot write {tag} ({shape}) from a {found} value: only NUL-free text values of text tags are writable")]
    UnsupportedEncoding {
        tag: Tag,
        shape: Shape,
        found: ValueKind,
    },

    #[error(transparent)]
    Rational(#[from] RationalError),

    /// Rebuilding or replacing the file failed. The original file is left
    /// untouched.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: WriteCause,
    },
}

#[derive(Debug, Error)]
pub enum ReadCause {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("not a JPEG image: {0}")]
    Jpeg(String),

    #[error("malformed EXIF data: {0}")]
    Exif(#[from] kamadak_exif::Error),
}

#[derive(Debug, Error)]
pub enum WriteCause {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("not a JPEG image: {0}")]
    Jpeg(String),

    #[error("cannot rebuild EXIF data: {0}")]
    Exif(kamadak_exif::Error),

    #[error("EXIF data is {0} bytes, larger than one APP1 segment can hold")]
    SegmentTooLarge(usize),
}

impl Error {
    /// Whether this is a decoding failure of either kind.
    pub fn is_coercion(&self) -> bool {
        matches!(self, Error::Coercion { .. } | Error::ShapeMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
