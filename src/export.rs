//! Frame export: encode the rendered surface and hand it to a save target.
//!
//! The save collaborator is the [`SaveTarget`] trait; the CLI uses
//! [`DirectoryTarget`], tests plug in their own. The file name offered to the
//! target is always derived from the source photo via
//! [`naming::export_file_name`](crate::naming::export_file_name).

use crate::compositor::RenderError;
use crate::imaging::{Quality, Surface, operations};
use crate::naming::{disambiguate, export_file_name};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to save {name}: {source}")]
    Save {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to render frame: {0}")]
    Render(#[from] RenderError),
}

/// Where exported bytes go.
pub trait SaveTarget {
    /// Store `bytes` under the suggested file `name` and return where they
    /// ended up. The target may pick a different final name.
    fn save(&mut self, name: &str, bytes: &[u8]) -> io::Result<PathBuf>;
}

/// Saves into one directory, created on construction.
///
/// Names already written through this target get a `-2`, `-3`, ... suffix
/// instead of being overwritten; files from earlier runs are replaced.
#[derive(Debug)]
pub struct DirectoryTarget {
    dir: PathBuf,
    written: HashSet<String>,
}

impl DirectoryTarget {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            written: HashSet::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveTarget for DirectoryTarget {
    fn save(&mut self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let name = disambiguate(name, &self.written);
        let path = self.dir.join(&name);
        fs::write(&path, bytes)?;
        self.written.insert(name);
        Ok(path)
    }
}

/// One exported frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportReceipt {
    /// Name of the photo the frame was rendered from.
    pub source: String,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

/// Encode the whole surface as JPEG.
pub fn encode_surface(surface: &Surface, quality: Quality) -> Result<Vec<u8>, ExportError> {
    Ok(operations::encode_jpeg(surface.pixmap(), quality)?)
}

/// Encode `surface` and save it under the name derived from `source_name`.
pub fn export_surface(
    surface: &Surface,
    source_name: &str,
    quality: Quality,
    target: &mut impl SaveTarget,
) -> Result<ExportReceipt, ExportError> {
    let bytes = encode_surface(surface, quality)?;
    let name = export_file_name(source_name);
    let path = target
        .save(&name, &bytes)
        .map_err(|source| ExportError::Save {
            name: name.clone(),
            source,
        })?;
    debug!(path = %path.display(), bytes = bytes.len(), "saved frame");

    Ok(ExportReceipt {
        source: source_name.to_string(),
        path,
        width: surface.width(),
        height: surface.height(),
        bytes: bytes.len(),
    })
}
