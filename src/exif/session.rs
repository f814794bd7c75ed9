use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use super::reader::read_exif;
use super::writer::{ByteOrder, OutputSet, fresh_exif_ifd_offset, write_exif};
use crate::coerce;
use crate::config::SessionOptions;
use crate::error::{Error, Result, WriteCause};
use crate::shape::{Shape, TagShape, markers};
use crate::tag::{Directory, Tag, TypedTag};
use crate::value::Value;

/// Open a JPEG file for typed EXIF access with default options.
pub fn open_jpeg(path: impl AsRef<Path>) -> Result<Session> {
    Session::open_with(path, SessionOptions::default())
}

/// Open a JPEG file, run `f` on the session, then close it.
///
/// The session is closed on every path, including when `f` fails; `f`'s
/// error takes precedence over a close error.
pub fn with_jpeg<T, F>(path: impl AsRef<Path>, f: F) -> Result<T>
where
    F: FnOnce(&mut Session) -> Result<T>,
{
    let mut session = open_jpeg(path)?;
    let outcome = f(&mut session);
    let closed = session.close();
    let value = outcome?;
    closed?;
    Ok(value)
}

/// Typed EXIF access to one JPEG file.
///
/// Reads go to pending edits first, then to the values read at open time.
/// Edits stay in memory until [`close`](Session::close); dropping a session
/// with pending edits flushes them best-effort.
///
/// ```rust,no_run
/// use exif_typed::{Tag, open_jpeg, typed};
///
/// let mut session = open_jpeg("photo.jpg")?;
/// let taken = session.read(typed::DateTimeOriginal)?;
/// let width = session.get_rational(Tag::XResolution)?;
/// session.set(Tag::Artist, "Jane Doe")?;
/// session.close()?;
/// # Ok::<(), exif_typed::Error>(())
/// ```
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    options: SessionOptions,
    base: HashMap<Tag, Value>,
    overlay: HashMap<Tag, Value>,
    /// Values implied by the file structure rather than stored in it.
    computed: HashMap<Tag, Value>,
    tiff: Option<Vec<u8>>,
}

impl Session {
    pub fn open_with(path: impl AsRef<Path>, options: SessionOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = read_exif(&path)?;

        let mut base = HashMap::with_capacity(contents.fields.len());
        for (id, value) in contents.fields {
            match Tag::from_id(id) {
                Ok(tag) => {
                    base.insert(tag, value);
                }
                Err(_) => log::debug!("Skipping uncatalogued field {id} in {}", path.display()),
            }
        }

        log::debug!("Opened {} with {} catalogued tag(s)", path.display(), base.len());
        let mut session = Self {
            path,
            options,
            base,
            overlay: HashMap::new(),
            computed: HashMap::new(),
            tiff: contents.tiff,
        };
        session.refresh_computed();
        Ok(session)
    }

    // Without an EXIF segment, the first write lays the payload out from
    // scratch, and the EXIF IFD lands right after IFD0's entries.
    fn refresh_computed(&mut self) {
        if self.tiff.is_some() {
            return;
        }
        let primary = self
            .overlay
            .keys()
            .filter(|tag| tag.id().directory == Directory::Primary)
            .count();
        self.computed
            .insert(Tag::ExifOffset, Value::Long(fresh_exif_ifd_offset(primary)));
    }

    /// The stored value of `tag`: a pending edit, else the value read from
    /// the file, else a structural value.
    pub fn get(&self, tag: Tag) -> Option<&Value> {
        self.overlay
            .get(&tag)
            .or_else(|| self.base.get(&tag))
            .or_else(|| self.computed.get(&tag))
    }

    /// Typed read through a handle from [`typed`](crate::typed).
    pub fn read<S: TagShape>(&self, tag: TypedTag<S>) -> Result<Option<S::Output>> {
        self.decode_as::<S>(tag.tag())
    }

    /// Typed read checked at runtime: `tag` must have shape `S`.
    pub fn get_as<S: TagShape>(&self, tag: Tag) -> Result<Option<S::Output>> {
        if tag.shape() != S::SHAPE {
            return Err(Error::ShapeMismatch {
                tag,
                requested: S::SHAPE,
                declared: tag.shape(),
            });
        }
        self.decode_as::<S>(tag)
    }

    fn decode_as<S: TagShape>(&self, tag: Tag) -> Result<Option<S::Output>> {
        let Some(stored) = self.get(tag) else {
            return Ok(None);
        };
        let coercion = |found| Error::Coercion { tag, requested: S::SHAPE, found };
        let decoded = coerce::decode(S::SHAPE, stored).map_err(coercion)?;
        let found = decoded.kind();
        S::from_decoded(decoded).map(Some).ok_or_else(|| coercion(found))
    }

    /// The text form of any tag, whatever its shape.
    ///
    /// Comment-style tags are rendered through their own decoding, so the
    /// character code prefix and NUL padding are dropped.
    pub fn get_string(&self, tag: Tag) -> Result<Option<String>> {
        match tag.shape() {
            Shape::GpsText => self.decode_as::<markers::GpsText>(tag),
            _ => self.decode_as::<markers::String>(tag),
        }
    }

    /// Queue `value` for `tag`, replacing any earlier pending value.
    ///
    /// With [`SessionOptions::validate_on_set`], a value that does not decode
    /// under the tag's shape is rejected here. Only text values of text tags
    /// can be written back; anything else fails at [`close`](Session::close).
    pub fn set(&mut self, tag: Tag, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        if self.options.validate_on_set {
            coerce::decode(tag.shape(), &value).map_err(|found| Error::Coercion {
                tag,
                requested: tag.shape(),
                found,
            })?;
        }
        log::debug!("Pending {tag} = {value}");
        self.overlay.insert(tag, value);
        self.refresh_computed();
        Ok(())
    }

    pub fn set_string(&mut self, tag: Tag, text: &str) -> Result<()> {
        self.set(tag, text)
    }

    pub fn set_timestamp(&mut self, tag: Tag, timestamp: NaiveDateTime) -> Result<()> {
        self.set(tag, timestamp)
    }

    /// Edits not yet written to the file.
    pub fn pending(&self) -> BTreeMap<Tag, &Value> {
        self.overlay.iter().map(|(tag, value)| (*tag, value)).collect()
    }

    /// Every tag read from the file, with pending edits applied.
    ///
    /// Tags that only exist as pending edits are not listed; see
    /// [`pending`](Session::pending). Rational-shaped tags are decoded.
    pub fn as_map(&self) -> BTreeMap<Tag, Value> {
        self.base
            .iter()
            .map(|(&tag, stored)| {
                let value = self.overlay.get(&tag).unwrap_or(stored);
                let value = match tag.shape() {
                    Shape::Rational | Shape::RationalArray => {
                        coerce::decode(tag.shape(), value).unwrap_or_else(|_| value.clone())
                    }
                    _ => value.clone(),
                };
                (tag, value)
            })
            .collect()
    }

    /// Write pending edits to the file and end the session.
    ///
    /// Without pending edits the file is not touched.
    pub fn close(mut self) -> Result<()> {
        self.flush()
    }

    /// End the session, dropping pending edits.
    pub fn discard(mut self) {
        if !self.overlay.is_empty() {
            log::debug!(
                "Discarding {} pending edit(s) for {}",
                self.overlay.len(),
                self.path.display()
            );
        }
        self.overlay.clear();
    }

    fn flush(&mut self) -> Result<()> {
        if self.overlay.is_empty() {
            log::debug!("No pending edits for {}", self.path.display());
            return Ok(());
        }
        let mut pending: Vec<(Tag, Value)> = std::mem::take(&mut self.overlay).into_iter().collect();
        pending.sort_by_key(|(tag, _)| *tag);

        let mut set = match &self.tiff {
            Some(tiff) => OutputSet::from_tiff(tiff).map_err(|e| Error::Write {
                path: self.path.clone(),
                source: WriteCause::Exif(e),
            })?,
            None => OutputSet::new(ByteOrder::Big),
        };

        for (tag, value) in &pending {
            let text = coerce::encode(tag.shape(), value).map_err(|found| {
                Error::UnsupportedEncoding { tag: *tag, shape: tag.shape(), found }
            })?;
            let id = tag.id();
            let mut directory = set.directory_mut(id.directory);
            directory.remove(id.number);
            directory.add_ascii(id.number, &text);
        }

        write_exif(&self.path, &set, &self.options)?;
        log::debug!("Flushed {} edit(s) to {}", pending.len(), self.path.display());
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.overlay.is_empty() {
            return;
        }
        if let Err(e) = self.flush() {
            log::warn!("Failed to write pending edits to {}: {e}", self.path.display());
        }
    }
}

macro_rules! typed_getters {
    ( $( $name:ident => $marker:ident; )+ ) => {
        impl Session {
            $(
                #[doc = concat!("Read a `", stringify!($marker), "`-shaped tag.")]
                pub fn $name(&self, tag: Tag) -> Result<Option<<markers::$marker as TagShape>::Output>> {
                    self.get_as::<markers::$marker>(tag)
                }
            )+
        }
    };
}

typed_getters! {
    get_byte => Byte;
    get_byte_array => ByteArray;
    get_short => Short;
    get_short_array => ShortArray;
    get_long => Long;
    get_long_array => LongArray;
    get_float => Float;
    get_float_array => FloatArray;
    get_double => Double;
    get_double_array => DoubleArray;
    get_rational => Rational;
    get_rational_array => RationalArray;
    get_string_array => StringArray;
    get_timestamp => Timestamp;
    get_gps_text => GpsText;
    get_unknown => Unknown;
}
