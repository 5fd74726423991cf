//! Pure calculation functions for photo placement.
//!
//! All functions here are pure and testable without any I/O or images.

/// Space reserved between the canvas edge and the photo, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Margins {
    pub fn uniform(margin: f32) -> Self {
        Self {
            left: margin,
            right: margin,
            top: margin,
            bottom: margin,
        }
    }

    pub fn with_bottom(self, bottom: f32) -> Self {
        Self { bottom, ..self }
    }
}

/// Which dimension bound the fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitRegime {
    /// Width fills the horizontal content area; the photo is centred vertically.
    Landscape,
    /// Height fills the vertical content area; the photo is centred horizontally.
    Portrait,
}

/// Where a photo lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub regime: FitRegime,
}

/// Fit a source with aspect ratio `aspect` (width / height) inside the canvas.
///
/// The landscape regime is tried first: width takes the whole horizontal
/// content area. If the resulting height overflows the vertical content area
/// the portrait regime takes over and height is pinned instead.
///
/// Positioning is deliberately asymmetric:
/// - landscape: `x = margins.left`, vertically centred on the canvas
/// - portrait: horizontally centred on the canvas, `y = margins.top`
///
/// The regime chosen for sizing is the one used for positioning; the height is
/// never re-compared.
///
/// # Examples
/// ```
/// # use photo_mat::imaging::{compute_fit, FitRegime, Margins};
/// let fit = compute_fit(1440.0, 1440.0, &Margins::uniform(25.0), 1.5);
/// assert_eq!(fit.regime, FitRegime::Landscape);
/// assert_eq!((fit.x, fit.width), (25.0, 1390.0));
/// ```
pub fn compute_fit(canvas_w: f32, canvas_h: f32, margins: &Margins, aspect: f32) -> Placement {
    let content_w = canvas_w - margins.left - margins.right;
    let content_h = canvas_h - margins.top - margins.bottom;

    let landscape_h = content_w / aspect;
    let (width, height, regime) = if landscape_h > content_h {
        (content_h * aspect, content_h, FitRegime::Portrait)
    } else {
        (content_w, landscape_h, FitRegime::Landscape)
    };

    let (x, y) = match regime {
        FitRegime::Landscape => (margins.left, canvas_h * 0.5 - height * 0.5),
        FitRegime::Portrait => (canvas_w * 0.5 - width * 0.5, margins.top),
    };

    Placement {
        x,
        y,
        width,
        height,
        regime,
    }
}

/// Aspect ratio of a decoded raster, or `None` when it cannot drive a fit.
///
/// This is the guard at the point where natural dimensions are first seen:
/// zero-sized sources never reach [`compute_fit`].
pub fn aspect_ratio(width: u32, height: u32) -> Option<f32> {
    if width == 0 || height == 0 {
        return None;
    }
    let aspect = width as f32 / height as f32;
    (aspect.is_finite() && aspect > 0.0).then_some(aspect)
}

/// Whole-pixel size of a raster allocated for `placement`.
///
/// Fractional sizes truncate, as a canvas does when given a float dimension,
/// but never below one pixel.
pub fn raster_size(placement: &Placement) -> (u32, u32) {
    let w = placement.width.floor().max(1.0) as u32;
    let h = placement.height.floor().max(1.0) as u32;
    (w, h)
}
