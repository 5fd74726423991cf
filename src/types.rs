//! Shared types used across ingestion, the session store and the compositor.

use crate::metadata::ExposureInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tiny_skia::Pixmap;

/// Read-only handle to one input file.
///
/// Cheap to clone; in-memory payloads are shared, not copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFile {
    Disk(PathBuf),
    Memory { name: String, bytes: Arc<[u8]> },
}

impl SourceFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        SourceFile::Disk(path.into())
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        SourceFile::Memory {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// File name without directories, used for display and export naming.
    pub fn name(&self) -> String {
        match self {
            SourceFile::Disk(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned()),
            SourceFile::Memory { name, .. } => name.clone(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            SourceFile::Disk(path) => Some(path),
            SourceFile::Memory { .. } => None,
        }
    }

    /// Load the raw bytes.
    pub fn read(&self) -> std::io::Result<Arc<[u8]>> {
        match self {
            SourceFile::Disk(path) => Ok(std::fs::read(path)?.into()),
            SourceFile::Memory { bytes, .. } => Ok(Arc::clone(bytes)),
        }
    }
}

/// One ingested photograph. Immutable once built.
///
/// `width`/`height` are the dimensions of the fitted working raster, not of
/// the original file; the compositor fits again at draw time from them.
pub struct PhotoRecord {
    source: SourceFile,
    display_jpeg: Vec<u8>,
    raster: Pixmap,
    metadata: ExposureInfo,
}

impl PhotoRecord {
    pub(crate) fn new(
        source: SourceFile,
        display_jpeg: Vec<u8>,
        raster: Pixmap,
        metadata: ExposureInfo,
    ) -> Self {
        Self {
            source,
            display_jpeg,
            raster,
            metadata,
        }
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn name(&self) -> String {
        self.source.name()
    }

    /// Pre-fit JPEG thumbnail of the working raster.
    pub fn display_jpeg(&self) -> &[u8] {
        &self.display_jpeg
    }

    pub fn raster(&self) -> &Pixmap {
        &self.raster
    }

    pub fn metadata(&self) -> &ExposureInfo {
        &self.metadata
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn aspect(&self) -> f32 {
        self.width() as f32 / self.height() as f32
    }
}

impl fmt::Debug for PhotoRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoRecord")
            .field("name", &self.name())
            .field("width", &self.width())
            .field("height", &self.height())
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Mat colour family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatTone {
    Light,
    #[default]
    Dark,
}

impl fmt::Display for MatTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatTone::Light => f.write_str("light"),
            MatTone::Dark => f.write_str("dark"),
        }
    }
}

/// Session-wide look of every rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayOptions {
    pub rounded_corners: bool,
    pub show_metadata_overlay: bool,
    pub mat: MatTone,
    pub glow: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            rounded_corners: true,
            show_metadata_overlay: false,
            mat: MatTone::Dark,
            glow: false,
        }
    }
}

/// A single named option change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayOption {
    RoundedCorners(bool),
    MetadataOverlay(bool),
    Mat(MatTone),
    Glow(bool),
}

impl DisplayOptions {
    pub fn apply(&mut self, option: DisplayOption) {
        match option {
            DisplayOption::RoundedCorners(on) => self.rounded_corners = on,
            DisplayOption::MetadataOverlay(on) => self.show_metadata_overlay = on,
            DisplayOption::Mat(tone) => self.mat = tone,
            DisplayOption::Glow(on) => self.glow = on,
        }
    }
}
