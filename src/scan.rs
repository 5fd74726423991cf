//! Command-line input expansion.
//!
//! Turns the paths given on the command line into the ordered file list of
//! one batch:
//!
//! - a file is taken as-is, in command-line position, whatever its extension
//!   (an undecodable file fails on its own during ingestion);
//! - a directory contributes its direct children with a supported image
//!   extension, sorted by name. Hidden files and subdirectories are skipped.
//!
//! ```text
//! photo-mat render b.jpg shoot/ a.jpg
//!
//! shoot/
//! ├── .thumb.jpg      # hidden, skipped
//! ├── 02.png          #   → 3rd
//! ├── 01.JPG          #   → 2nd
//! ├── notes.txt       # unsupported, skipped
//! └── raw/            # not descended into
//!
//! batch: b.jpg, shoot/01.JPG, shoot/02.png, a.jpg
//! ```

use crate::imaging::rust_backend::supported_input_extensions;
use crate::types::SourceFile;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("input not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to list {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Expand `inputs` into the files of one batch, in batch order.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<SourceFile>, ScanError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(directory_images(input)?.into_iter().map(SourceFile::from_path));
        } else if input.is_file() {
            files.push(SourceFile::from_path(input));
        } else {
            return Err(ScanError::NotFound(input.clone()));
        }
    }
    Ok(files)
}

fn directory_images(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut images = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|source| ScanError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && !is_hidden(entry.path()) && is_image(entry.path()) {
            images.push(entry.into_path());
        }
    }
    Ok(images)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

fn is_image(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    supported_input_extensions().contains(&ext.as_str())
}
