//! Single-line overlay text via `cosmic-text`.
//!
//! The exposure line is always set in the bundled DejaVu Sans Mono Bold, so
//! frames come out the same whatever fonts the host has installed. Building a
//! [`FontSystem`] still scans the system fonts, so callers create one
//! [`OverlayText`] lazily and keep it for the session.

use super::params::Rgb;
use cosmic_text::{
    Attrs as TextAttrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache, Weight,
};
use tiny_skia::Pixmap;

/// Line box height relative to the font size.
const LINE_HEIGHT: f32 = 1.2;

const OVERLAY_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSansMono-Bold.ttf");
const OVERLAY_FAMILY: &str = "DejaVu Sans Mono";

pub struct OverlayText {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

impl OverlayText {
    pub fn new() -> Self {
        let mut font_system = FontSystem::new();
        font_system.db_mut().load_font_data(OVERLAY_FONT.to_vec());
        Self {
            font_system,
            swash_cache: SwashCache::new(),
        }
    }

    /// Rasterise `text` in bold monospace as a tight premultiplied pixmap
    /// one line box tall.
    ///
    /// Returns `None` when nothing would be visible, such as blank text.
    pub fn rasterize(&mut self, text: &str, font_size: f32, color: Rgb) -> Option<Pixmap> {
        if text.trim().is_empty() {
            return None;
        }

        let line_height = font_size * LINE_HEIGHT;
        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(font_size, line_height));
        buffer.set_size(&mut self.font_system, None, None);

        let attrs = TextAttrs::new()
            .family(Family::Name(OVERLAY_FAMILY))
            .weight(Weight::BOLD);
        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let text_width = buffer
            .layout_runs()
            .flat_map(|run| run.glyphs.iter().map(|glyph| glyph.x + glyph.w))
            .fold(0.0f32, f32::max);
        let width = text_width.ceil() as u32;
        let height = line_height.ceil() as u32;
        let mut pixmap = Pixmap::new(width, height)?;

        let stride = width as usize * 4;
        let data = pixmap.data_mut();
        let text_color = Color::rgba(color.r, color.g, color.b, 255);
        let mut painted = false;
        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            text_color,
            |x, y, w, h, color| {
                let alpha = color.a() as u32;
                if alpha == 0 {
                    return;
                }
                for py in y.max(0)..(y + h as i32).min(height as i32) {
                    for px in x.max(0)..(x + w as i32).min(width as i32) {
                        let idx = py as usize * stride + px as usize * 4;
                        let src = [color.r(), color.g(), color.b()];
                        for (c, s) in data[idx..idx + 3].iter_mut().zip(src) {
                            let premul = s as u32 * alpha / 255;
                            *c = (premul + *c as u32 * (255 - alpha) / 255).min(255) as u8;
                        }
                        let a = &mut data[idx + 3];
                        *a = (alpha + *a as u32 * (255 - alpha) / 255).min(255) as u8;
                        painted = true;
                    }
                }
            },
        );

        painted.then_some(pixmap)
    }
}

impl Default for OverlayText {
    fn default() -> Self {
        Self::new()
    }
}
