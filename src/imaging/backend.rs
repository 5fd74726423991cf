//! Decoder backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two collaborators ingestion needs:
//! a metadata decoder ([`read_tags`](ImageBackend::read_tags)) and a raster
//! decoder ([`decode`](ImageBackend::decode)). Both take the raw bytes of one
//! input file.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): `image` crate decoders
//! plus `kamadak-exif` for tags. Tests use the `MockBackend` in this module.

use image::DynamicImage;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("metadata unavailable: {0}")]
    Metadata(String),
}

/// One decoded metadata tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    /// Human-readable rendering of the tag value, e.g. `"f/2.8"` or `"1/250"`.
    pub description: String,
}

impl TagRecord {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// Tag name → decoded record, e.g. `"FNumber"` → `"f/2.8"`.
pub type TagMap = BTreeMap<String, TagRecord>;

/// Trait for decoder backends.
///
/// `read_tags` may fail or return a partial map on malformed input; callers
/// treat any error as "no metadata". `decode` failures are fatal for the file.
pub trait ImageBackend: Send + Sync {
    /// Decode embedded camera metadata into named tags.
    fn read_tags(&self, bytes: &[u8]) -> Result<TagMap, BackendError>;

    /// Decode the raster.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;
}
