//! Keeps a JPEG's embedded capture time in line with the post it was attached to.
//!
//! Only JPEG containers are handled. The existing EXIF block is rewritten with the
//! three time fields replaced; when it cannot be read (absent or corrupt segment) a
//! minimal block with `DateTime` and `DateTimeOriginal` is written instead.

use archive_core::{
    ArchiveError, ErrorExt, ErrorReporter, MetadataError, Severity, TimestampReconciler,
};
use chrono::{DateTime, Utc};
use exif::experimental::Writer;
use exif::{Exif, Field, In, Reader, Tag, Value};
use img_parts::jpeg::{markers, Jpeg, JpegSegment};
use img_parts::{Bytes, ImageEXIF};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;
use tracing::{debug, info};

pub const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

const EXIF_SEGMENT_PREFIX: &[u8] = b"Exif\0\0";
const EXIF_SEGMENT_INDEX: usize = 3;
const SUPPORTED_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];
const TIME_TAGS: [Tag; 3] = [Tag::DateTime, Tag::DateTimeOriginal, Tag::DateTimeDigitized];
const MINIMAL_TIME_TAGS: [Tag; 2] = [Tag::DateTime, Tag::DateTimeOriginal];

/// [`TimestampReconciler`] backed by the EXIF block of JPEG files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifReconciler;

impl TimestampReconciler for ExifReconciler {
    fn reconcile_timestamp(&self, path: &Path, target: DateTime<Utc>) -> bool {
        reconcile_timestamp(path, target)
    }
}

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// Returns `true` only when the file was rewritten.
pub fn reconcile_timestamp(path: &Path, target: DateTime<Utc>) -> bool {
    match try_reconcile_timestamp(path, target) {
        Ok(updated) => updated,
        Err(e) if e.severity() == Severity::Skip => {
            debug!("[{}] {}", e.error_code(), e);
            false
        }
        Err(e) => {
            ErrorReporter::new().report_warning(&ArchiveError::from(e));
            false
        }
    }
}

pub fn try_reconcile_timestamp(
    path: &Path,
    target: DateTime<Utc>,
) -> Result<bool, MetadataError> {
    if !is_supported(path) {
        return Err(MetadataError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }

    let stamp = target.format(EXIF_DATETIME_FORMAT).to_string();
    match rewrite_existing(path, &stamp) {
        Ok(updated) => Ok(updated),
        Err(e) => {
            debug!("Writing fresh EXIF block for {}: {}", path.display(), e);
            write_minimal(path, &stamp)?;
            info!("Set capture time of {} to {}", display_name(path), stamp);
            Ok(true)
        }
    }
}

/// Current `DateTimeOriginal` value, `None` when the file has EXIF but not that field.
pub fn read_capture_time(path: &Path) -> Result<Option<String>, MetadataError> {
    let exif = read_exif(path)?;
    Ok(exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .and_then(ascii_value))
}

fn rewrite_existing(path: &Path, stamp: &str) -> Result<bool, MetadataError> {
    let exif = read_exif(path)?;
    let current = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .and_then(ascii_value);
    if current.as_deref() == Some(stamp) {
        return Ok(false);
    }

    info!("Updating capture time of {} to {}", display_name(path), stamp);
    let replacements = time_fields(stamp, &TIME_TAGS);
    let kept = exif.fields().filter(|field| {
        (field.ifd_num == In::THUMBNAIL
            || (field.ifd_num == In::PRIMARY && !TIME_TAGS.contains(&field.tag)))
            && !matches!(field.value, Value::Unknown(..))
    });

    let block = encode(
        kept.chain(replacements.iter()),
        thumbnail(&exif),
        exif.little_endian(),
    )?;
    splice(path, block)?;
    Ok(true)
}

/// Bytes of the IFD1 JPEG thumbnail, when the block carries one.
fn thumbnail(exif: &Exif) -> Option<&[u8]> {
    let offset = exif
        .get_field(Tag::JPEGInterchangeFormat, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    let len = exif
        .get_field(Tag::JPEGInterchangeFormatLength, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    exif.buf().get(offset..offset.checked_add(len)?)
}

fn write_minimal(path: &Path, stamp: &str) -> Result<(), MetadataError> {
    let fields = time_fields(stamp, &MINIMAL_TIME_TAGS);
    let block = encode(fields.iter(), None, false)?;
    splice(path, block)
}

fn read_exif(path: &Path) -> Result<Exif, MetadataError> {
    let file = File::open(path).map_err(|e| MetadataError::Read {
        details: e.to_string(),
    })?;
    Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .map_err(|e| MetadataError::Read {
            details: e.to_string(),
        })
}

fn ascii_value(field: &Field) -> Option<String> {
    match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string()),
        _ => None,
    }
}

fn time_fields(stamp: &str, tags: &[Tag]) -> Vec<Field> {
    tags.iter()
        .map(|&tag| Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![stamp.as_bytes().to_vec()]),
        })
        .collect()
}

/// Serialises `fields` into a TIFF-structured EXIF block.
fn encode<'a>(
    fields: impl Iterator<Item = &'a Field>,
    thumbnail: Option<&'a [u8]>,
    little_endian: bool,
) -> Result<Vec<u8>, MetadataError> {
    let mut writer = Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    if let Some(jpeg) = thumbnail {
        writer.set_jpeg(jpeg, In::THUMBNAIL);
    }

    let mut buf = Cursor::new(Vec::new());
    writer
        .write(&mut buf, little_endian)
        .map_err(|e| MetadataError::Encode {
            details: e.to_string(),
        })?;
    Ok(buf.into_inner())
}

/// Replaces the APP1 EXIF segment of the JPEG at `path` with `block`.
///
/// The segment goes where `set_exif` would put it (after the third segment), or at
/// the end for files with fewer segments.
fn splice(path: &Path, block: Vec<u8>) -> Result<(), MetadataError> {
    let write_error = |details: String| MetadataError::Write {
        path: path.to_path_buf(),
        details,
    };

    let data = std::fs::read(path).map_err(|e| write_error(e.to_string()))?;
    let mut jpeg = Jpeg::from_bytes(Bytes::from(data)).map_err(|e| write_error(e.to_string()))?;
    jpeg.set_exif(None);

    let mut contents = Vec::with_capacity(EXIF_SEGMENT_PREFIX.len() + block.len());
    contents.extend_from_slice(EXIF_SEGMENT_PREFIX);
    contents.extend_from_slice(&block);
    let segment = JpegSegment::new_with_contents(markers::APP1, Bytes::from(contents));

    let segments = jpeg.segments_mut();
    let index = segments.len().min(EXIF_SEGMENT_INDEX);
    segments.insert(index, segment);

    let mut out = Vec::new();
    jpeg.encoder()
        .write_to(&mut out)
        .map_err(|e| write_error(e.to_string()))?;
    std::fs::write(path, out).map_err(|e| write_error(e.to_string()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
