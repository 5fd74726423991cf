//! Export filename derivation.
//!
//! An exported frame is named after the photo it came from: the source's
//! extension separator becomes `_mat` and the file is always a `.jpeg`.
//!
//! - `photo.jpg` → `photo_mat.jpeg`
//! - `IMG_0042.HEIC.jpg` → `IMG_0042_HEIC_mat.jpeg` (inner dots become `_`)
//! - `holiday/beach.png` → `beach_mat.jpeg` (directories are dropped)
//! - `README` → `README_mat.jpeg`
//! - `.jpg` → `untitled_mat.jpeg`

use std::collections::HashSet;

/// Suffix appended to every export stem.
pub const EXPORT_SUFFIX: &str = "_mat";
/// Extension of every exported file.
pub const EXPORT_EXTENSION: &str = "jpeg";

/// Stem of the source name with its extension removed and any remaining
/// dots replaced by `_`.
pub fn export_stem(source_name: &str) -> String {
    let base = source_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source_name);
    let stem = match base.rfind('.') {
        Some(dot) => &base[..dot],
        None => base,
    };
    let stem = stem.trim();
    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem.replace('.', "_")
    }
}

/// Suggested filename for the exported frame of `source_name`.
pub fn export_file_name(source_name: &str) -> String {
    format!(
        "{}{EXPORT_SUFFIX}.{EXPORT_EXTENSION}",
        export_stem(source_name)
    )
}

/// Return `name`, or `stem-2.ext`, `stem-3.ext`, ... if `name` is taken.
pub fn disambiguate(name: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(name) {
        return name.to_string();
    }
    let (stem, ext) = match name.rfind('.') {
        Some(dot) => (&name[..dot], &name[dot..]),
        None => (name, ""),
    };
    (2..)
        .map(|n| format!("{stem}-{n}{ext}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}
