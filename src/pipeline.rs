use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::exif::Session;
use crate::tag::Tag;
use crate::value::Value;

/// Extensions of the files sessions can open.
const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg", "jpe", "jfif"];

/// The tags of one image, as shown by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    pub path: PathBuf,
    pub tags: BTreeMap<Tag, Value>,
}

/// The outcome of applying edits to one image.
#[derive(Debug, Clone, Serialize)]
pub struct EditResult {
    pub path: PathBuf,
    /// Tags whose edits were accepted (and written, unless dry run).
    pub applied: Vec<Tag>,
    pub dry_run: bool,
    pub error: Option<String>,
}

/// Collect JPEG files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// recursively (following symlinks).
///
/// # Example
///
/// ```rust,no_run
/// use exif_typed::pipeline::collect_images;
/// use std::path::PathBuf;
///
/// let images = collect_images(&[
///     PathBuf::from("photo.jpg"),       // single file
///     PathBuf::from("./photos/"),        // entire directory
/// ]);
/// println!("Found {} images", images.len());
/// ```
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_jpeg(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping non-JPEG file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && is_jpeg(p) {
                    images.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Check if a file has a JPEG extension.
pub fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| JPEG_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Parse a `Tag=value` assignment.
pub fn parse_assignment(text: &str) -> Result<(Tag, String)> {
    let (name, value) = text
        .split_once('=')
        .with_context(|| format!("Expected TAG=VALUE, got {text:?}"))?;
    let tag = name.trim().parse::<Tag>()?;
    Ok((tag, value.to_string()))
}

/// Read the tags of one image: all of them, or only `tags` if not empty.
pub fn show(path: &Path, tags: &[Tag], config: &Config) -> Result<ImageReport> {
    let session = Session::open_with(path, config.session.clone())?;
    let tags = if tags.is_empty() {
        session.as_map()
    } else {
        tags.iter()
            .filter_map(|&tag| session.get(tag).map(|value| (tag, value.clone())))
            .collect()
    };
    session.close()?;
    Ok(ImageReport { path: path.to_path_buf(), tags })
}

/// Apply text edits to one image.
///
/// Either every edit is written or none is: a rejected edit aborts the image
/// before anything touches the file. With `output.dry_run`, edits are
/// validated and then discarded.
pub fn apply_edits(path: &Path, edits: &[(Tag, String)], config: &Config) -> EditResult {
    let dry_run = config.output.dry_run;
    let mut result = EditResult {
        path: path.to_path_buf(),
        applied: Vec::new(),
        dry_run,
        error: None,
    };

    let mut session = match Session::open_with(path, config.session.clone()) {
        Ok(session) => session,
        Err(e) => {
            result.error = Some(e.to_string());
            return result;
        }
    };

    for (tag, value) in edits {
        if let Err(e) = session.set_string(*tag, value) {
            result.error = Some(e.to_string());
            result.applied.clear();
            session.discard();
            return result;
        }
        log::debug!("  {tag} = {value}");
        result.applied.push(*tag);
    }

    if dry_run {
        log::info!("Dry run: {} edit(s) for {} not written", edits.len(), path.display());
        session.discard();
    } else if let Err(e) = session.close() {
        result.error = Some(e.to_string());
        result.applied.clear();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::open_jpeg;
    use std::fs;
    use tempfile::TempDir;

    fn segment(out: &mut Vec<u8>, marker: u8, contents: &[u8]) {
        out.extend_from_slice(&[0xFF, marker]);
        out.extend_from_slice(&((contents.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(contents);
    }

    /// A JFIF image with no EXIF segment.
    fn write_jpeg(dir: &Path, name: &str) -> PathBuf {
        let mut out = vec![0xFF, 0xD8];
        segment(&mut out, 0xE0, b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0");
        segment(&mut out, 0xC0, &[8, 0, 1, 0, 1, 1, 1, 0x11, 0]);
        segment(&mut out, 0xDA, &[1, 1, 0x00, 0, 63, 0]);
        out.extend_from_slice(&[0x12, 0x34, 0xFF, 0xD9]);
        let path = dir.join(name);
        fs::write(&path, out).unwrap();
        path
    }

    // ── is_jpeg ──────────────────────────────────────────────────────

    #[test]
    fn jpeg_extensions() {
        assert!(is_jpeg(Path::new("photo.jpg")));
        assert!(is_jpeg(Path::new("photo.JPEG")));
        assert!(is_jpeg(Path::new("scan.jfif")));
        assert!(!is_jpeg(Path::new("photo.png")));
        assert!(!is_jpeg(Path::new("photo")));
    }

    // ── parse_assignment ─────────────────────────────────────────────

    #[test]
    fn assignment_splits_on_first_equals() {
        let (tag, value) = parse_assignment("ImageDescription=a=b").unwrap();
        assert_eq!(tag, Tag::ImageDescription);
        assert_eq!(value, "a=b");
    }

    #[test]
    fn assignment_rejects_unknown_tags_and_missing_value() {
        assert!(parse_assignment("NoSuchTag=1").is_err());
        assert!(parse_assignment("Artist").is_err());
    }

    // ── collect_images ───────────────────────────────────────────────

    #[test]
    fn collect_images_single_file() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("test.jpg");
        fs::write(&jpg, b"fake").unwrap();

        let images = collect_images(&[jpg.clone()]);
        assert_eq!(images, vec![jpg]);
    }

    #[test]
    fn collect_images_skips_other_formats() {
        let dir = TempDir::new().unwrap();
        let png = dir.path().join("image.png");
        fs::write(&png, b"fake").unwrap();

        assert!(collect_images(&[png]).is_empty());
    }

    #[test]
    fn collect_images_directory_recursive() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        fs::write(dir.path().join("a.jpg"), b"fake").unwrap();
        fs::write(sub.join("b.jpeg"), b"fake").unwrap();
        fs::write(sub.join("c.txt"), b"fake").unwrap();

        let images = collect_images(&[dir.path().to_path_buf()]);
        assert_eq!(images.len(), 2);
    }

    #[test]
    fn collect_images_nonexistent_path() {
        let images = collect_images(&[PathBuf::from("/nonexistent/path")]);
        assert!(images.is_empty());
    }

    // ── apply_edits ──────────────────────────────────────────────────

    #[test]
    fn apply_edits_reports_unreadable_files() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("broken.jpg");
        fs::write(&jpg, b"not a jpeg").unwrap();

        let result = apply_edits(&jpg, &[(Tag::Artist, "me".into())], &Config::default());
        assert!(result.error.is_some());
        assert!(result.applied.is_empty());
        assert_eq!(fs::read(&jpg).unwrap(), b"not a jpeg");
    }

    #[test]
    fn apply_edits_writes_every_edit() {
        let dir = TempDir::new().unwrap();
        let jpg = write_jpeg(dir.path(), "a.jpg");
        let edits = vec![
            (Tag::Artist, "Jane Doe".to_string()),
            (Tag::DateTimeOriginal, "2021:02:03 04:05:06".to_string()),
        ];

        let result = apply_edits(&jpg, &edits, &Config::default());
        assert_eq!(result.error, None);
        assert_eq!(result.applied, vec![Tag::Artist, Tag::DateTimeOriginal]);
        assert!(!result.dry_run);

        let session = open_jpeg(&jpg).unwrap();
        assert_eq!(session.get_string(Tag::Artist).unwrap().as_deref(), Some("Jane Doe"));
        assert_eq!(
            session.get_string(Tag::DateTimeOriginal).unwrap().as_deref(),
            Some("2021:02:03 04:05:06")
        );
    }

    #[test]
    fn dry_run_leaves_the_file_alone() {
        let dir = TempDir::new().unwrap();
        let jpg = write_jpeg(dir.path(), "a.jpg");
        let before = fs::read(&jpg).unwrap();
        let mut config = Config::default();
        config.output.dry_run = true;

        let result = apply_edits(&jpg, &[(Tag::Artist, "Jane Doe".into())], &config);
        assert_eq!(result.error, None);
        assert_eq!(result.applied, vec![Tag::Artist]);
        assert!(result.dry_run);
        assert_eq!(fs::read(&jpg).unwrap(), before);
    }

    #[test]
    fn rejected_edit_at_set_discards_earlier_ones() {
        let dir = TempDir::new().unwrap();
        let jpg = write_jpeg(dir.path(), "a.jpg");
        let before = fs::read(&jpg).unwrap();
        let edits = vec![
            (Tag::Artist, "Jane Doe".to_string()),
            (Tag::DateTimeOriginal, "last tuesday".to_string()),
        ];

        let result = apply_edits(&jpg, &edits, &Config::default());
        assert!(result.error.is_some());
        assert!(result.applied.is_empty());
        assert_eq!(fs::read(&jpg).unwrap(), before);
    }

    #[test]
    fn rejected_edit_at_close_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let jpg = write_jpeg(dir.path(), "a.jpg");
        let before = fs::read(&jpg).unwrap();
        // A valid rational, but rational tags are not writable.
        let edits = vec![
            (Tag::Artist, "Jane Doe".to_string()),
            (Tag::XResolution, "300/1".to_string()),
        ];

        let result = apply_edits(&jpg, &edits, &Config::default());
        assert!(result.error.unwrap().contains("XResolution"));
        assert!(result.applied.is_empty());
        assert_eq!(fs::read(&jpg).unwrap(), before);
    }

    // ── show ─────────────────────────────────────────────────────────

    #[test]
    fn show_with_tag_list_reports_only_present_tags() {
        let dir = TempDir::new().unwrap();
        let jpg = write_jpeg(dir.path(), "a.jpg");
        let edits = vec![(Tag::Artist, "Jane Doe".to_string())];
        assert_eq!(apply_edits(&jpg, &edits, &Config::default()).error, None);

        let report = show(&jpg, &[Tag::Artist, Tag::Copyright], &Config::default()).unwrap();
        assert_eq!(report.path, jpg);
        let tags: Vec<Tag> = report.tags.keys().copied().collect();
        assert_eq!(tags, vec![Tag::Artist]);
        assert_eq!(report.tags[&Tag::Artist], Value::Text("Jane Doe".into()));

        let all = show(&jpg, &[], &Config::default()).unwrap();
        assert!(all.tags.contains_key(&Tag::Artist));
        assert!(all.tags.contains_key(&Tag::ExifVersion));
        assert!(!all.tags.contains_key(&Tag::Copyright));
    }
}
