//! Image processing and drawing in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (JPEG, PNG, TIFF, WebP) |
//! | **Camera tags** | `kamadak-exif` |
//! | **Fitted resize** | `image` Lanczos3 |
//! | **Glow blur** | `image::imageops::blur` on a downsampled copy |
//! | **Drawing + clipping** | `tiny-skia` pixmaps and masks |
//! | **Overlay text** | `cosmic-text` shaping + swash rasterisation |
//! | **Encode** | `image::codecs::jpeg::JpegEncoder` |
//!
//! The module is split into:
//! - **Geometry**: Rounded-rect clip outlines from arc-to segments (pure)
//! - **Calculations**: Fit/placement math (pure, unit testable)
//! - **Parameters**: Quality, colours, glow and overlay styling
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Surface**: Render target with scoped clipping
//! - **Operations**: Raster conversions, glow layer, JPEG encoding

pub mod backend;
mod calculations;
pub mod geometry;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod surface;
pub mod text;

pub use backend::{BackendError, ImageBackend, TagMap, TagRecord};
pub use calculations::{FitRegime, Margins, Placement, aspect_ratio, compute_fit, raster_size};
pub use geometry::{ClipPath, rect_path, rounded_rect_path};
pub use params::{GlowParams, OverlayStyle, ParseColorError, Quality, Rgb};
pub use rust_backend::RustBackend;
pub use surface::{ClipScope, Surface, SurfaceError};
