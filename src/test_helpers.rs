//! Shared test utilities for the photo-mat test suite.
//!
//! Provides synthetic image bytes, in-memory source files and a scaled-down
//! configuration so compositing tests stay fast.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let file = memory_file("dawn.jpg", &jpeg_bytes(300, 200));
//! let config = small_config();
//! assert_eq!(config.canvas.width, 120);
//! ```

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use crate::config::MatConfig;
use crate::types::SourceFile;

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Encode a gradient of the given size as JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut out = Vec::new();
    JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Encode a gradient of the given size as PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Write a gradient JPEG to `path`.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, jpeg_bytes(width, height)).unwrap();
}

// =========================================================================
// Sources and configuration
// =========================================================================

/// Source file held in memory.
///
/// With `MockBackend` the payload is the mock's script (`"WxH"`, `"broken"`);
/// with the real backend it must be encoded image bytes.
pub fn memory_file(name: &str, payload: &[u8]) -> SourceFile {
    SourceFile::from_bytes(name, payload.to_vec())
}

/// Stock configuration scaled down to a 120px canvas.
pub fn small_config() -> MatConfig {
    let mut config = MatConfig::default();
    config.canvas.width = 120;
    config.canvas.height = 120;
    config.canvas.margin = 5;
    config.canvas.overlay_margin = 20;
    config.canvas.corner_radius = 6;
    config.working.width = 120;
    config.working.height = 120;
    config.working.margin = 5;
    config.overlay.font_size = 8.0;
    config.overlay.baseline_offset = 10.0;
    config.glow.blur_radius = 16.0;
    config.processing.max_processes = Some(2);
    config
}
