//! Drawing surface with scoped clipping.
//!
//! [`Surface`] wraps a premultiplied `tiny_skia::Pixmap` plus a clip stack.
//! Clips are only ever installed through [`Surface::push_clip`], which returns
//! a [`ClipScope`] guard; dropping the guard pops the clip, so the surface is
//! restored on every exit path, early returns and `?` included.

use super::geometry::{ClipPath, ResolvedSegment};
use super::params::Rgb;
use std::ops::{Deref, DerefMut};
use thiserror::Error;
use tiny_skia::{
    BlendMode, Color, FillRule, FilterQuality, Mask, Paint, PathBuilder, Pixmap, PixmapPaint,
    Rect, Transform,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("cannot allocate a {width}x{height} surface")]
    InvalidSize { width: u32, height: u32 },
    #[error("clip outline encloses no area")]
    EmptyClip,
}

/// Render target.
pub struct Surface {
    pixmap: Pixmap,
    /// One entry per live [`ClipScope`]; each holds the effective clip
    /// (already intersected with its parent), `None` meaning unclipped.
    clips: Vec<Option<Mask>>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        let pixmap = Pixmap::new(width, height).ok_or(SurfaceError::InvalidSize { width, height })?;
        Ok(Self {
            pixmap,
            clips: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Number of clip scopes currently open.
    pub fn clip_depth(&self) -> usize {
        self.clips.len()
    }

    fn current_clip(&self) -> Option<&Mask> {
        self.clips.last().and_then(Option::as_ref)
    }

    /// Reset every pixel to transparent, ignoring any clip.
    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    /// Paint the whole (clipped) surface with an opaque colour.
    pub fn fill(&mut self, color: Rgb) {
        let color = Color::from_rgba8(color.r, color.g, color.b, 255);
        match self.clips.last().and_then(Option::as_ref) {
            None => self.pixmap.fill(color),
            Some(mask) => {
                let mut paint = Paint::default();
                paint.set_color(color);
                if let Some(full) =
                    Rect::from_xywh(0.0, 0.0, self.pixmap.width() as f32, self.pixmap.height() as f32)
                {
                    self.pixmap
                        .fill_rect(full, &paint, Transform::identity(), Some(mask));
                }
            }
        }
    }

    /// Draw `raster` stretched over the rectangle `(x, y, width, height)`.
    pub fn draw_raster(
        &mut self,
        raster: &Pixmap,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        opacity: f32,
    ) {
        let sx = width / raster.width() as f32;
        let sy = height / raster.height() as f32;
        let paint = PixmapPaint {
            opacity: opacity.clamp(0.0, 1.0),
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Bicubic,
        };
        let mask = self.clips.last().and_then(Option::as_ref);
        self.pixmap.draw_pixmap(
            0,
            0,
            raster.as_ref(),
            &paint,
            Transform::from_row(sx, 0.0, 0.0, sy, x, y),
            mask,
        );
    }

    /// Restrict drawing to the intersection of `paths` (and any enclosing
    /// clip) until the returned guard is dropped. An empty slice opens a
    /// scope that adds no restriction.
    pub fn push_clip(&mut self, paths: &[ClipPath]) -> Result<ClipScope<'_>, SurfaceError> {
        let mask = self.build_clip(paths)?;
        self.clips.push(mask);
        Ok(ClipScope { surface: self })
    }

    fn build_clip(&self, paths: &[ClipPath]) -> Result<Option<Mask>, SurfaceError> {
        let Some((first, rest)) = paths.split_first() else {
            return Ok(self.current_clip().cloned());
        };

        let (width, height) = (self.width(), self.height());
        let mut mask = Mask::new(width, height).ok_or(SurfaceError::InvalidSize { width, height })?;
        mask.fill_path(&to_skia_path(first)?, FillRule::Winding, true, Transform::identity());
        for path in rest {
            mask.intersect_path(&to_skia_path(path)?, FillRule::Winding, true, Transform::identity());
        }

        if let Some(parent) = self.current_clip() {
            for (coverage, outer) in mask.data_mut().iter_mut().zip(parent.data()) {
                *coverage = ((*coverage as u16 * *outer as u16 + 127) / 255) as u8;
            }
        }
        Ok(Some(mask))
    }
}

/// Open clip scope. Derefs to the [`Surface`]; dropping it restores the
/// previous clip.
pub struct ClipScope<'a> {
    surface: &'a mut Surface,
}

impl Deref for ClipScope<'_> {
    type Target = Surface;

    fn deref(&self) -> &Surface {
        self.surface
    }
}

impl DerefMut for ClipScope<'_> {
    fn deref_mut(&mut self) -> &mut Surface {
        self.surface
    }
}

impl Drop for ClipScope<'_> {
    fn drop(&mut self) {
        self.surface.clips.pop();
    }
}

/// Build a fillable `tiny_skia::Path` from a clip outline.
pub fn to_skia_path(path: &ClipPath) -> Result<tiny_skia::Path, SurfaceError> {
    let mut pb = PathBuilder::new();
    for segment in path.resolve() {
        match segment {
            ResolvedSegment::MoveTo(p) => pb.move_to(p.x, p.y),
            ResolvedSegment::LineTo(p) => pb.line_to(p.x, p.y),
            ResolvedSegment::CubicTo(c1, c2, end) => {
                pb.cubic_to(c1.x, c1.y, c2.x, c2.y, end.x, end.y)
            }
            ResolvedSegment::Close => pb.close(),
        }
    }
    pb.finish().ok_or(SurfaceError::EmptyClip)
}
