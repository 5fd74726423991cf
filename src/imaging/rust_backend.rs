//! Pure Rust decoder backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with guessed format |
//! | Camera tags | `kamadak-exif` (`exif::Reader::read_from_container`) |

use super::backend::{BackendError, ImageBackend, TagMap, TagRecord};
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Production backend using the `image` and `kamadak-exif` crates.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical tag name for the overlay's key set.
///
/// EXIF 2.3 renamed ISOSpeedRatings to PhotographicSensitivity; the overlay
/// keys off the older name.
fn canonical_name(tag: exif::Tag) -> String {
    match tag {
        exif::Tag::PhotographicSensitivity => "ISOSpeedRatings".to_string(),
        other => other.to_string(),
    }
}

fn describe(field: &exif::Field) -> String {
    let text = field.display_value().to_string();
    let text = text.trim_matches('"').trim().to_string();
    if field.tag == exif::Tag::FNumber && !text.starts_with("f/") {
        format!("f/{text}")
    } else {
        text
    }
}

/// Collect primary-image tags into a name-keyed map.
fn tags_from_exif(exif: &exif::Exif) -> TagMap {
    exif.fields()
        .filter(|field| field.ifd_num == exif::In::PRIMARY)
        .map(|field| (canonical_name(field.tag), TagRecord::new(describe(field))))
        .filter(|(_, record)| !record.description.is_empty())
        .collect()
}

impl ImageBackend for RustBackend {
    fn read_tags(&self, bytes: &[u8]) -> Result<TagMap, BackendError> {
        let exif = exif::Reader::new()
            .read_from_container(&mut Cursor::new(bytes))
            .map_err(|e| BackendError::Metadata(e.to_string()))?;
        Ok(tags_from_exif(&exif))
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{jpeg_bytes, png_bytes};

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "tif", "tiff", "webp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
        assert!(!exts.contains(&"avif"));
    }

    #[test]
    fn decode_synthetic_jpeg() {
        let img = RustBackend::new().decode(&jpeg_bytes(200, 150)).unwrap();
        assert_eq!((img.width(), img.height()), (200, 150));
    }

    #[test]
    fn decode_synthetic_png() {
        let img = RustBackend::new().decode(&png_bytes(64, 48)).unwrap();
        assert_eq!((img.width(), img.height()), (64, 48));
    }

    #[test]
    fn decode_garbage_errors() {
        let result = RustBackend::new().decode(b"definitely not an image");
        assert!(result.is_err());
    }

    #[test]
    fn read_tags_without_exif_is_unavailable() {
        let result = RustBackend::new().read_tags(&jpeg_bytes(32, 32));
        assert!(matches!(result, Err(BackendError::Metadata(_))));
    }

    /// Little-endian TIFF holding an Exif IFD with FNumber 28/10, ISO 200
    /// and a 35mm focal length of 50.
    fn exposure_tiff() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"II\x2a\x00");
        out.extend_from_slice(&8u32.to_le_bytes());

        // IFD0 at 8: one ExifIFDPointer entry, Exif IFD follows at 26.
        out.extend_from_slice(&1u16.to_le_bytes());
        push_entry(&mut out, 0x8769, 4, 1, 26);
        out.extend_from_slice(&0u32.to_le_bytes());

        // Exif IFD at 26: three entries, rational payload at 68.
        out.extend_from_slice(&3u16.to_le_bytes());
        push_entry(&mut out, 0x829d, 5, 1, 68);
        push_entry(&mut out, 0x8827, 3, 1, 200);
        push_entry(&mut out, 0xa405, 3, 1, 50);
        out.extend_from_slice(&0u32.to_le_bytes());

        out.extend_from_slice(&28u32.to_le_bytes());
        out.extend_from_slice(&10u32.to_le_bytes());
        out
    }

    fn push_entry(out: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: u32) {
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&value.to_le_bytes());
    }

    #[test]
    fn exposure_tags_use_overlay_names() {
        let exif = exif::Reader::new().read_raw(exposure_tiff()).unwrap();
        let tags = tags_from_exif(&exif);

        assert_eq!(tags["FNumber"].description, "f/2.8");
        assert_eq!(tags["ISOSpeedRatings"].description, "200");
        assert_eq!(tags["FocalLengthIn35mmFilm"].description, "50");
        assert!(!tags.contains_key("PhotographicSensitivity"));
    }
}
