//! The closed tag catalogue.
//!
//! Every [`Tag`] is bound at definition time to one [`TagId`] (directory +
//! TIFF tag number) and one [`Shape`]. The catalogue is a bijection: no two
//! tags share an identifier, and [`Tag::from_id`] fails for identifiers the
//! catalogue does not know.
//!
//! Statically shaped handles for the same tags live in [`typed`]:
//!
//! ```rust
//! use exif_typed::{Shape, Tag, typed};
//!
//! assert_eq!(Tag::XResolution.shape(), Shape::Rational);
//! assert_eq!(Tag::from(typed::XResolution), Tag::XResolution);
//! ```

use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::Error;
use crate::shape::{Shape, TagShape};

/// The image file directory a field lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Directory {
    /// IFD0, the primary image directory.
    Primary,
    /// The EXIF sub-directory referenced from IFD0.
    Exif,
    /// The Interoperability directory referenced from the EXIF directory.
    Interop,
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Directory::Primary => "IFD0",
            Directory::Exif => "ExifIFD",
            Directory::Interop => "InteropIFD",
        })
    }
}

/// The binary identifier of a field: its directory and TIFF tag number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagId {
    pub directory: Directory,
    pub number: u16,
}

impl TagId {
    pub const fn new(directory: Directory, number: u16) -> Self {
        Self { directory, number }
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:#06x}", self.directory, self.number)
    }
}

/// A tag handle that carries its shape in the type.
pub struct TypedTag<S> {
    tag: Tag,
    shape: PhantomData<fn() -> S>,
}

impl<S: TagShape> TypedTag<S> {
    const fn new(tag: Tag) -> Self {
        Self { tag, shape: PhantomData }
    }

    pub fn tag(self) -> Tag {
        self.tag
    }
}

impl<S> Clone for TypedTag<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for TypedTag<S> {}

impl<S> fmt::Debug for TypedTag<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedTag({})", self.tag)
    }
}

impl<S> From<TypedTag<S>> for Tag {
    fn from(typed: TypedTag<S>) -> Tag {
        typed.tag
    }
}

macro_rules! catalogue {
    ( $( $(#[$doc:meta])* $name:ident = ($dir:ident, $number:literal, $shape:ident); )+ ) => {
        /// A catalogue tag.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[non_exhaustive]
        pub enum Tag {
            $( $(#[$doc])* $name, )+
        }

        impl Tag {
            /// Every catalogue tag, in declaration order.
            pub const ALL: &'static [Tag] = &[ $( Tag::$name, )+ ];

            pub fn id(self) -> TagId {
                match self {
                    $( Tag::$name => TagId::new(Directory::$dir, $number), )+
                }
            }

            pub fn shape(self) -> Shape {
                match self {
                    $( Tag::$name => Shape::$shape, )+
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $( Tag::$name => stringify!($name), )+
                }
            }
        }

        /// Statically shaped handles, named after their [`Tag`] variants.
        #[allow(non_upper_case_globals)]
        pub mod typed {
            use super::{Tag, TypedTag};
            use crate::shape::markers;

            $(
                pub const $name: TypedTag<markers::$shape> = TypedTag::new(Tag::$name);
            )+
        }
    };
}

catalogue! {
    // ── IFD0 ─────────────────────────────────────────────────────────
    ImageWidth = (Primary, 0x0100, Long);
    ImageLength = (Primary, 0x0101, Long);
    BitsPerSample = (Primary, 0x0102, ShortArray);
    Compression = (Primary, 0x0103, Short);
    ImageDescription = (Primary, 0x010E, String);
    Make = (Primary, 0x010F, String);
    Model = (Primary, 0x0110, String);
    StripOffsets = (Primary, 0x0111, LongArray);
    Orientation = (Primary, 0x0112, Short);
    StripByteCounts = (Primary, 0x0117, LongArray);
    XResolution = (Primary, 0x011A, Rational);
    YResolution = (Primary, 0x011B, Rational);
    ResolutionUnit = (Primary, 0x0128, Short);
    Software = (Primary, 0x0131, String);
    DateTime = (Primary, 0x0132, Timestamp);
    Artist = (Primary, 0x013B, String);
    WhitePoint = (Primary, 0x013E, RationalArray);
    PrimaryChromaticities = (Primary, 0x013F, RationalArray);
    YCbCrCoefficients = (Primary, 0x0211, RationalArray);
    YCbCrSubSampling = (Primary, 0x0212, ShortArray);
    YCbCrPositioning = (Primary, 0x0213, Short);
    ReferenceBlackWhite = (Primary, 0x0214, RationalArray);
    Rating = (Primary, 0x4746, Short);
    RatingPercent = (Primary, 0x4749, Short);
    Copyright = (Primary, 0x8298, String);
    /// Offset of the EXIF directory. Computed by the format, never user data.
    ExifOffset = (Primary, 0x8769, Long);
    /// Offset of the GPS directory. The GPS directory itself is not decoded.
    GPSInfo = (Primary, 0x8825, Long);
    XPTitle = (Primary, 0x9C9B, ByteArray);
    XPComment = (Primary, 0x9C9C, ByteArray);
    XPAuthor = (Primary, 0x9C9D, ByteArray);
    XPKeywords = (Primary, 0x9C9E, ByteArray);
    XPSubject = (Primary, 0x9C9F, ByteArray);
    /// Placeholder entry for opaque values; no real field uses 0xFFFF.
    Unknown = (Primary, 0xFFFF, Unknown);

    // ── EXIF IFD ─────────────────────────────────────────────────────
    ExposureTime = (Exif, 0x829A, RationalArray);
    FNumber = (Exif, 0x829D, RationalArray);
    ExposureProgram = (Exif, 0x8822, Short);
    /// ISO speed. Older writers call this ISOSpeedRatings.
    PhotographicSensitivity = (Exif, 0x8827, Short);
    ExifVersion = (Exif, 0x9000, ByteArray);
    DateTimeOriginal = (Exif, 0x9003, Timestamp);
    DateTimeDigitized = (Exif, 0x9004, Timestamp);
    OffsetTime = (Exif, 0x9010, String);
    OffsetTimeOriginal = (Exif, 0x9011, String);
    OffsetTimeDigitized = (Exif, 0x9012, String);
    ComponentsConfiguration = (Exif, 0x9101, ByteArray);
    CompressedBitsPerPixel = (Exif, 0x9102, Rational);
    ShutterSpeedValue = (Exif, 0x9201, Rational);
    ApertureValue = (Exif, 0x9202, Rational);
    BrightnessValue = (Exif, 0x9203, Rational);
    ExposureCompensation = (Exif, 0x9204, RationalArray);
    MaxApertureValue = (Exif, 0x9205, Rational);
    SubjectDistance = (Exif, 0x9206, Rational);
    MeteringMode = (Exif, 0x9207, Short);
    LightSource = (Exif, 0x9208, Short);
    Flash = (Exif, 0x9209, Short);
    FocalLength = (Exif, 0x920A, RationalArray);
    SubjectArea = (Exif, 0x9214, ShortArray);
    /// Vendor-specific notes, kept as raw bytes.
    MakerNote = (Exif, 0x927C, ByteArray);
    UserComment = (Exif, 0x9286, GpsText);
    SubSecTime = (Exif, 0x9290, String);
    SubSecTimeOriginal = (Exif, 0x9291, String);
    SubSecTimeDigitized = (Exif, 0x9292, String);
    FlashpixVersion = (Exif, 0xA000, ByteArray);
    ColorSpace = (Exif, 0xA001, Short);
    ExifImageWidth = (Exif, 0xA002, Short);
    ExifImageLength = (Exif, 0xA003, Short);
    RelatedSoundFile = (Exif, 0xA004, String);
    /// Offset of the Interoperability directory.
    InteropOffset = (Exif, 0xA005, Long);
    FocalPlaneXResolution = (Exif, 0xA20E, Rational);
    FocalPlaneYResolution = (Exif, 0xA20F, Rational);
    FocalPlaneResolutionUnit = (Exif, 0xA210, Short);
    SensingMethod = (Exif, 0xA217, Short);
    FileSource = (Exif, 0xA300, Byte);
    SceneType = (Exif, 0xA301, Byte);
    CustomRendered = (Exif, 0xA401, Short);
    ExposureMode = (Exif, 0xA402, Short);
    WhiteBalance = (Exif, 0xA403, Short);
    DigitalZoomRatio = (Exif, 0xA404, Rational);
    FocalLengthIn35mmFilm = (Exif, 0xA405, Short);
    SceneCaptureType = (Exif, 0xA406, Short);
    GainControl = (Exif, 0xA407, Short);
    Contrast = (Exif, 0xA408, Short);
    Saturation = (Exif, 0xA409, Short);
    Sharpness = (Exif, 0xA40A, Short);
    SubjectDistanceRange = (Exif, 0xA40C, Short);
    ImageUniqueID = (Exif, 0xA420, String);
    CameraOwnerName = (Exif, 0xA430, String);
    BodySerialNumber = (Exif, 0xA431, String);
    LensSpecification = (Exif, 0xA432, RationalArray);
    LensMake = (Exif, 0xA433, String);
    LensModel = (Exif, 0xA434, String);
    Gamma = (Exif, 0xA500, Rational);

    // ── Interoperability IFD ─────────────────────────────────────────
    InteroperabilityIndex = (Interop, 0x0001, String);
    InteroperabilityVersion = (Interop, 0x0002, ByteArray);
    RelatedImageWidth = (Interop, 0x1001, Long);
    RelatedImageLength = (Interop, 0x1002, Long);
}

static BY_ID: LazyLock<HashMap<TagId, Tag>> =
    LazyLock::new(|| Tag::ALL.iter().map(|&tag| (tag.id(), tag)).collect());

static BY_NAME: LazyLock<HashMap<&'static str, Tag>> =
    LazyLock::new(|| Tag::ALL.iter().map(|&tag| (tag.name(), tag)).collect());

impl Tag {
    /// Every catalogue tag.
    pub fn all() -> &'static [Tag] {
        Self::ALL
    }

    /// Look up the tag registered for a binary identifier.
    pub fn from_id(id: TagId) -> Result<Tag, Error> {
        BY_ID.get(&id).copied().ok_or(Error::NotFound(id))
    }

    /// Look up a tag by its EXIF name, e.g. `"DateTimeOriginal"`.
    pub fn from_name(name: &str) -> Option<Tag> {
        BY_NAME.get(name).copied()
    }
}

impl FromStr for Tag {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Tag::from_name(name).ok_or_else(|| Error::UnknownTagName(name.to_string()))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
