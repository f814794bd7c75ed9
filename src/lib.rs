//! # exif-typed
//!
//! Typed EXIF tag access for JPEG files: read camera settings, timestamps and
//! resolutions as real Rust types, queue text edits, and rewrite the file
//! losslessly when the session closes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exif_typed::{Tag, open_jpeg, typed};
//!
//! fn main() -> exif_typed::Result<()> {
//!     let mut session = open_jpeg("photo.jpg")?;
//!
//!     // Statically typed: the handle fixes the return type.
//!     if let Some(taken) = session.read(typed::DateTimeOriginal)? {
//!         println!("Taken at {taken}");
//!     }
//!
//!     // Checked at runtime: asking for the wrong shape is an error.
//!     if let Some(dpi) = session.get_rational(Tag::XResolution)? {
//!         println!("{dpi} dpi ({:.1})", dpi.to_f64());
//!     }
//!
//!     // Any tag as text.
//!     println!("{:?}", session.get_string(Tag::Make)?);
//!
//!     session.set(Tag::Artist, "Jane Doe")?;
//!     session.close()
//! }
//! ```
//!
//! [`with_jpeg`] is the scoped form: the session is closed however the
//! closure exits.
//!
//! ## Modules
//!
//! - [`rational`]: exact fractions, as stored in RATIONAL fields
//! - [`shape`]: the value shapes a tag can have, and their marker types
//! - [`tag`]: the tag catalogue
//! - [`value`]: the untyped stored value
//! - [`coerce`]: per-shape decoding and encoding
//! - [`exif`]: JPEG/TIFF reading and writing, and the metadata session
//! - [`config`]: configuration types and loading/saving
//! - [`pipeline`]: batch helpers behind the CLI

pub mod coerce;
pub mod config;
pub mod error;
pub mod exif;
pub mod pipeline;
pub mod rational;
pub mod shape;
pub mod tag;
pub mod value;

pub use error::{Error, Result};
pub use exif::{Session, open_jpeg, with_jpeg};
pub use rational::Rational;
pub use shape::{Shape, TagShape};
pub use tag::{Directory, Tag, TagId, TypedTag, typed};
pub use value::Value;
