//! Raster operations.
//!
//! These functions bridge the `image` crate (decode, resample, blur, encode)
//! and `tiny-skia` pixmaps (drawing). Pixmaps hold premultiplied RGBA; every
//! conversion here keeps that invariant.

use super::calculations::Placement;
use super::params::{GlowParams, Quality};
use super::surface::SurfaceError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use tiny_skia::{IntSize, Pixmap};

/// Halo rasters are computed at this fraction of canvas resolution.
const GLOW_DOWNSAMPLE: f32 = 8.0;

/// Resample `img` to exactly `width × height` and upload it as a pixmap.
pub fn fit_raster(img: &DynamicImage, width: u32, height: u32) -> Result<Pixmap, SurfaceError> {
    let resized = img.resize_exact(width, height, FilterType::Lanczos3).to_rgba8();
    pixmap_from_rgba(resized)
}

/// Wrap straight-alpha RGBA as a premultiplied pixmap.
pub fn pixmap_from_rgba(img: RgbaImage) -> Result<Pixmap, SurfaceError> {
    let (width, height) = img.dimensions();
    let mut data = img.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a < 255 {
            for c in &mut px[..3] {
                *c = ((*c as u16 * a + 127) / 255) as u8;
            }
        }
    }
    premultiplied_pixmap(data, width, height)
}

fn premultiplied_pixmap(data: Vec<u8>, width: u32, height: u32) -> Result<Pixmap, SurfaceError> {
    IntSize::from_wh(width, height)
        .and_then(|size| Pixmap::from_vec(data, size))
        .ok_or(SurfaceError::InvalidSize { width, height })
}

/// Encode a pixmap as baseline JPEG.
///
/// Transparent areas come out black: premultiplied colour is exactly the
/// pixel composited over black, so the alpha channel is simply dropped.
pub fn encode_jpeg(pixmap: &Pixmap, quality: Quality) -> Result<Vec<u8>, image::ImageError> {
    let rgb: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.as_u8()).write_image(
        &rgb,
        pixmap.width(),
        pixmap.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}

/// Blurred halo and the canvas rectangle it should be stretched over.
pub struct GlowLayer {
    pub pixmap: Pixmap,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Build the halo drawn beneath a photo at `placement`.
///
/// The raster is shrunk, padded with transparency so the blur can spread past
/// the photo edges, then Gaussian-blurred. Blurring premultiplied data keeps
/// edges from darkening.
pub fn glow_layer(
    raster: &Pixmap,
    placement: &Placement,
    params: &GlowParams,
) -> Result<GlowLayer, SurfaceError> {
    let halo_w = placement.width * params.scale;
    let halo_h = placement.height * params.scale;
    let halo_x = placement.x + placement.width / 2.0 - halo_w / 2.0;
    let halo_y = placement.y + placement.height / 2.0 - halo_h / 2.0;

    let inner_w = (halo_w / GLOW_DOWNSAMPLE).ceil().max(1.0) as u32;
    let inner_h = (halo_h / GLOW_DOWNSAMPLE).ceil().max(1.0) as u32;
    let sigma = (params.blur_radius / GLOW_DOWNSAMPLE).max(0.0);
    let pad = (sigma * 2.0).ceil() as u32;

    let source = RgbaImage::from_raw(raster.width(), raster.height(), raster.data().to_vec())
        .ok_or(SurfaceError::InvalidSize {
            width: raster.width(),
            height: raster.height(),
        })?;
    let small = imageops::resize(&source, inner_w, inner_h, FilterType::Triangle);

    let mut padded = RgbaImage::new(inner_w + 2 * pad, inner_h + 2 * pad);
    imageops::replace(&mut padded, &small, pad as i64, pad as i64);
    let blurred = if sigma > 0.0 {
        imageops::blur(&padded, sigma)
    } else {
        padded
    };

    let (out_w, out_h) = blurred.dimensions();
    let mut data = blurred.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = px[3];
        for c in &mut px[..3] {
            *c = (*c).min(a);
        }
    }

    let step_x = halo_w / inner_w as f32;
    let step_y = halo_h / inner_h as f32;
    Ok(GlowLayer {
        pixmap: premultiplied_pixmap(data, out_w, out_h)?,
        x: halo_x - pad as f32 * step_x,
        y: halo_y - pad as f32 * step_y,
        width: out_w as f32 * step_x,
        height: out_h as f32 * step_y,
    })
}
