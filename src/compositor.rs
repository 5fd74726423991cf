//! Frame compositing.
//!
//! [`Compositor::render`] paints one photo onto a [`Surface`]:
//!
//! 1. clear, then fill with the mat colour
//! 2. reserve the overlay margin at the bottom if the exposure line will be drawn
//! 3. fit the photo inside the margins
//! 4. optionally draw the blurred halo
//! 5. draw the photo, clipped to a rounded rectangle when corners are rounded
//! 6. optionally draw the exposure line, centred on its baseline offset
//!
//! Every pass overwrites the whole surface, so rendering the same inputs twice
//! gives identical pixels.

use crate::config::MatConfig;
use crate::imaging::text::OverlayText;
use crate::imaging::{
    ClipPath, GlowParams, Margins, OverlayStyle, Placement, Rgb, Surface, SurfaceError,
    compute_fit, operations, rect_path, rounded_rect_path,
};
use crate::metadata::format_overlay;
use crate::types::{DisplayOptions, MatTone, PhotoRecord};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),
}

/// Fixed geometry and colours of every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub margin: f32,
    pub overlay_margin: f32,
    pub corner_radius: f32,
    pub mat_light: Rgb,
    pub mat_dark: Rgb,
    pub glow: GlowParams,
    pub overlay: OverlayStyle,
}

impl Layout {
    pub fn from_config(config: &MatConfig) -> Self {
        Self {
            width: config.canvas.width,
            height: config.canvas.height,
            margin: config.canvas.margin as f32,
            overlay_margin: config.canvas.overlay_margin as f32,
            corner_radius: config.canvas.corner_radius as f32,
            mat_light: config.mat.light,
            mat_dark: config.mat.dark,
            glow: config.glow.params(),
            overlay: config.overlay.style(),
        }
    }

    pub fn mat_color(&self, tone: MatTone) -> Rgb {
        match tone {
            MatTone::Light => self.mat_light,
            MatTone::Dark => self.mat_dark,
        }
    }

    /// Overlay text colour that reads against the `tone` mat.
    pub fn text_color(&self, tone: MatTone) -> Rgb {
        match tone {
            MatTone::Light => self.overlay.on_light,
            MatTone::Dark => self.overlay.on_dark,
        }
    }

    /// Margins around the photo. Only the bottom one depends on the overlay.
    pub fn margins(&self, with_overlay: bool) -> Margins {
        let margins = Margins::uniform(self.margin);
        if with_overlay {
            margins.with_bottom(self.overlay_margin)
        } else {
            margins
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::from_config(&MatConfig::default())
    }
}

/// What a render pass drew.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub placement: Placement,
    /// Exposure line, if one was drawn.
    pub overlay: Option<String>,
}

pub struct Compositor {
    layout: Layout,
    /// Created on first use; building it scans the system fonts.
    text: Option<OverlayText>,
}

impl Compositor {
    pub fn new(layout: Layout) -> Self {
        Self { layout, text: None }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// A blank surface of the layout's canvas size.
    pub fn new_surface(&self) -> Result<Surface, SurfaceError> {
        Surface::new(self.layout.width, self.layout.height)
    }

    /// Paint `photo` onto `surface`, replacing everything on it.
    pub fn render(
        &mut self,
        surface: &mut Surface,
        photo: &PhotoRecord,
        options: &DisplayOptions,
    ) -> Result<Frame, RenderError> {
        surface.clear();
        surface.fill(self.layout.mat_color(options.mat));

        let overlay = options
            .show_metadata_overlay
            .then(|| format_overlay(photo.metadata()))
            .filter(|line| !line.is_empty());

        let placement = compute_fit(
            surface.width() as f32,
            surface.height() as f32,
            &self.layout.margins(overlay.is_some()),
            photo.aspect(),
        );

        if options.glow {
            let glow = operations::glow_layer(photo.raster(), &placement, &self.layout.glow)?;
            surface.draw_raster(
                &glow.pixmap,
                glow.x,
                glow.y,
                glow.width,
                glow.height,
                self.layout.glow.opacity,
            );
        }

        {
            let clip = if options.rounded_corners {
                self.photo_clip(&placement)
            } else {
                Vec::new()
            };
            let mut scope = surface.push_clip(&clip)?;
            scope.draw_raster(
                photo.raster(),
                placement.x,
                placement.y,
                placement.width,
                placement.height,
                1.0,
            );
        }

        if let Some(line) = &overlay {
            self.draw_overlay(surface, line, options.mat);
        }

        debug!(
            photo = %photo.name(),
            x = placement.x,
            y = placement.y,
            width = placement.width,
            height = placement.height,
            "rendered frame"
        );
        Ok(Frame { placement, overlay })
    }

    /// Placement rectangle intersected with its rounded outline.
    fn photo_clip(&self, placement: &Placement) -> Vec<ClipPath> {
        let Placement {
            x,
            y,
            width,
            height,
            ..
        } = *placement;
        let radius = self.layout.corner_radius.min(width.min(height) / 2.0).max(0.0);
        vec![
            rect_path(x, y, width, height),
            rounded_rect_path(x, y, width, height, radius),
        ]
    }

    fn draw_overlay(&mut self, surface: &mut Surface, line: &str, tone: MatTone) {
        let style = self.layout.overlay;
        let color = self.layout.text_color(tone);
        let text = self.text.get_or_insert_with(OverlayText::new);

        let Some(pixmap) = text.rasterize(line, style.font_size, color) else {
            warn!(line, "overlay text produced no glyphs");
            return;
        };
        let (w, h) = (pixmap.width() as f32, pixmap.height() as f32);
        let x = (surface.width() as f32 / 2.0 - w / 2.0).round();
        let y = (surface.height() as f32 - style.baseline_offset - h / 2.0).round();
        surface.draw_raster(&pixmap, x, y, w, h, 1.0);
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(Layout::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MOCK_PIXEL, MockBackend};
    use crate::imaging::FitRegime;
    use crate::ingest::{WorkingCanvas, ingest};
    use crate::test_helpers::{memory_file, small_config};

    fn compositor() -> Compositor {
        Compositor::new(Layout::from_config(&small_config()))
    }

    /// Record decoded by the mock: a solid `MOCK_PIXEL` raster.
    fn photo(payload: &str, tags: &[(&str, &str)]) -> PhotoRecord {
        let backend = MockBackend::new().with_tags(payload, tags);
        let canvas = WorkingCanvas::from_config(&small_config());
        ingest(&backend, &memory_file("photo.jpg", payload.as_bytes()), &canvas).unwrap()
    }

    fn landscape() -> PhotoRecord {
        photo("300x200", &[])
    }

    fn portrait_with_exposure() -> PhotoRecord {
        photo(
            "200x400",
            &[
                ("FocalLengthIn35mmFilm", "50"),
                ("FNumber", "f/2.8"),
                ("ISOSpeedRatings", "200"),
            ],
        )
    }

    fn pixel(surface: &Surface, x: u32, y: u32) -> [u8; 4] {
        let px = surface.pixmap().pixel(x, y).unwrap();
        [px.red(), px.green(), px.blue(), px.alpha()]
    }

    fn assert_near(actual: [u8; 4], expected: [u8; 4]) {
        assert!(
            actual.iter().zip(expected).all(|(a, e)| a.abs_diff(e) <= 2),
            "expected {expected:?}, got {actual:?}"
        );
    }

    const PHOTO: [u8; 4] = [MOCK_PIXEL[0], MOCK_PIXEL[1], MOCK_PIXEL[2], 255];

    // =========================================================================
    // Layout
    // =========================================================================

    #[test]
    fn layout_from_stock_config() {
        let layout = Layout::default();
        assert_eq!((layout.width, layout.height), (1440, 1440));
        assert_eq!(layout.margins(false), Margins::uniform(25.0));
        assert_eq!(layout.margins(true).bottom, 100.0);
        assert_eq!(layout.margins(true).top, 25.0);
        assert_eq!(layout.mat_color(MatTone::Light), Rgb::WHITE);
        assert_eq!(layout.text_color(MatTone::Dark), Rgb::new(0x99, 0x99, 0x99));
    }

    #[test]
    fn new_surface_uses_canvas_size() {
        let surface = compositor().new_surface().unwrap();
        assert_eq!((surface.width(), surface.height()), (120, 120));
    }

    // =========================================================================
    // Mat and placement
    // =========================================================================

    #[test]
    fn mat_fills_the_border() {
        let mut compositor = compositor();
        let mut surface = compositor.new_surface().unwrap();
        let record = landscape();

        let light = DisplayOptions {
            mat: MatTone::Light,
            ..DisplayOptions::default()
        };
        compositor.render(&mut surface, &record, &light).unwrap();
        assert_eq!(pixel(&surface, 0, 0), [255, 255, 255, 255]);
        assert_eq!(pixel(&surface, 119, 119), [255, 255, 255, 255]);

        compositor
            .render(&mut surface, &record, &DisplayOptions::default())
            .unwrap();
        assert_eq!(pixel(&surface, 0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn landscape_photo_is_left_anchored_and_centred_vertically() {
        let mut compositor = compositor();
        let mut surface = compositor.new_surface().unwrap();
        let frame = compositor
            .render(&mut surface, &landscape(), &DisplayOptions::default())
            .unwrap();

        assert_eq!(frame.placement.regime, FitRegime::Landscape);
        assert_eq!(frame.placement.x, 5.0);
        assert_eq!(frame.placement.width, 110.0);
        let centre = frame.placement.y + frame.placement.height / 2.0;
        assert!((centre - 60.0).abs() < 1e-3);
        assert_near(pixel(&surface, 60, 60), PHOTO);
    }

    #[test]
    fn overlay_reserves_bottom_margin() {
        let mut compositor = compositor();
        let mut surface = compositor.new_surface().unwrap();
        let record = portrait_with_exposure();

        let plain = compositor
            .render(&mut surface, &record, &DisplayOptions::default())
            .unwrap();
        assert_eq!(plain.overlay, None);
        assert_eq!(plain.placement.height, 110.0);

        let options = DisplayOptions {
            show_metadata_overlay: true,
            ..DisplayOptions::default()
        };
        let frame = compositor.render(&mut surface, &record, &options).unwrap();
        assert_eq!(frame.overlay.as_deref(), Some("50mm | f/2.8 | ISO200"));
        assert_eq!(frame.placement.regime, FitRegime::Portrait);
        assert_eq!((frame.placement.y, frame.placement.height), (5.0, 95.0));
    }

    #[test]
    fn empty_exposure_line_keeps_standard_margin() {
        let mut compositor = compositor();
        let mut surface = compositor.new_surface().unwrap();
        let options = DisplayOptions {
            show_metadata_overlay: true,
            ..DisplayOptions::default()
        };
        let frame = compositor
            .render(&mut surface, &photo("200x400", &[]), &options)
            .unwrap();
        assert_eq!(frame.overlay, None);
        assert_eq!(frame.placement.height, 110.0);
    }

    // =========================================================================
    // Corners and glow
    // =========================================================================

    #[test]
    fn rounded_corners_show_mat_at_photo_corner() {
        let mut compositor = compositor();
        let mut surface = compositor.new_surface().unwrap();
        let record = landscape();

        // Photo spans x 5..115, y 23.5..96.5; pixel (5, 24) is its top-left corner.
        compositor
            .render(&mut surface, &record, &DisplayOptions::default())
            .unwrap();
        assert_eq!(pixel(&surface, 5, 24), [0, 0, 0, 255]);
        assert_near(pixel(&surface, 60, 24), PHOTO);

        let square = DisplayOptions {
            rounded_corners: false,
            ..DisplayOptions::default()
        };
        compositor.render(&mut surface, &record, &square).unwrap();
        assert_near(pixel(&surface, 5, 24), PHOTO);
    }

    #[test]
    fn oversized_radius_is_clamped() {
        let mut config = small_config();
        config.canvas.corner_radius = 500;
        let mut compositor = Compositor::new(Layout::from_config(&config));
        let mut surface = compositor.new_surface().unwrap();

        compositor
            .render(&mut surface, &landscape(), &DisplayOptions::default())
            .unwrap();
        // A full pill still covers the photo centre.
        assert_near(pixel(&surface, 60, 60), PHOTO);
        assert_eq!(surface.clip_depth(), 0);
    }

    #[test]
    fn glow_lights_the_mat_next_to_the_photo() {
        let mut compositor = compositor();
        let mut surface = compositor.new_surface().unwrap();
        let record = photo("200x400", &[]);

        // Portrait photo spans x 32.5..87.5; pixel 30 is just left of it.
        compositor
            .render(&mut surface, &record, &DisplayOptions::default())
            .unwrap();
        assert_eq!(pixel(&surface, 30, 60), [0, 0, 0, 255]);

        let glow = DisplayOptions {
            glow: true,
            ..DisplayOptions::default()
        };
        compositor.render(&mut surface, &record, &glow).unwrap();
        let [r, _, _, a] = pixel(&surface, 30, 60);
        assert!(r > 10, "expected halo, got red {r}");
        assert_eq!(a, 255);
        assert_near(pixel(&surface, 60, 60), PHOTO);
    }

    // =========================================================================
    // Idempotence
    // =========================================================================

    #[test]
    fn rendering_twice_is_pixel_identical() {
        let mut compositor = compositor();
        let record = portrait_with_exposure();
        let options = DisplayOptions {
            rounded_corners: true,
            show_metadata_overlay: true,
            mat: MatTone::Light,
            glow: true,
        };

        let mut surface = compositor.new_surface().unwrap();
        compositor.render(&mut surface, &record, &options).unwrap();
        let first = surface.pixmap().data().to_vec();
        compositor.render(&mut surface, &record, &options).unwrap();
        assert_eq!(surface.pixmap().data(), first.as_slice());
    }

    // =========================================================================
    // Exposure line
    // =========================================================================

    /// Bounding box and count of pixels at or below `from_y` that differ from
    /// `mat`: `(min_x, max_x, min_y, max_y, count)`.
    fn ink_below(surface: &Surface, from_y: u32, mat: Rgb) -> Option<(u32, u32, u32, u32, usize)> {
        let mat = [mat.r, mat.g, mat.b, 255];
        let mut bounds: Option<(u32, u32, u32, u32, usize)> = None;
        for y in from_y..surface.height() {
            for x in 0..surface.width() {
                let px = pixel(surface, x, y);
                if px.iter().zip(mat).all(|(a, m)| a.abs_diff(m) <= 8) {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, x, y, y, 1),
                    Some((x0, x1, y0, y1, n)) => (x0.min(x), x1.max(x), y0.min(y), y1.max(y), n + 1),
                });
            }
        }
        bounds
    }

    fn overlay_on(tone: MatTone) -> DisplayOptions {
        DisplayOptions {
            show_metadata_overlay: true,
            mat: tone,
            ..DisplayOptions::default()
        }
    }

    #[test]
    fn exposure_line_is_centred_on_its_baseline_offset() {
        let mut compositor = Compositor::default();
        let mut surface = compositor.new_surface().unwrap();
        let frame = compositor
            .render(&mut surface, &portrait_with_exposure(), &overlay_on(MatTone::Dark))
            .unwrap();
        assert_eq!(frame.placement.y + frame.placement.height, 1340.0);

        let (x0, x1, y0, y1, count) = ink_below(&surface, 1341, Rgb::BLACK).unwrap();
        assert!(count > 500, "only {count} text pixels");
        let centre_x = (x0 + x1) as f32 / 2.0;
        assert!((centre_x - 720.0).abs() <= 6.0, "text spans x {x0}..{x1}");
        let centre_y = (y0 + y1) as f32 / 2.0;
        assert!((centre_y - (1440.0 - 48.0)).abs() <= 12.0, "text spans y {y0}..{y1}");
        // Twenty-one monospace cells at 42px, well inside the canvas.
        assert!((400..700).contains(&(x1 - x0)), "text width {}", x1 - x0);
    }

    #[test]
    fn exposure_line_contrasts_with_either_mat() {
        let mut compositor = Compositor::default();
        let mut surface = compositor.new_surface().unwrap();
        let record = portrait_with_exposure();

        compositor
            .render(&mut surface, &record, &overlay_on(MatTone::Dark))
            .unwrap();
        let brightest = (1341..1440)
            .flat_map(|y| (0..1440).map(move |x| (x, y)))
            .map(|(x, y)| pixel(&surface, x, y)[0])
            .max()
            .unwrap();
        assert!(brightest.abs_diff(0x99) <= 2, "brightest text pixel {brightest}");

        compositor
            .render(&mut surface, &record, &overlay_on(MatTone::Light))
            .unwrap();
        let darkest = (1341..1440)
            .flat_map(|y| (0..1440).map(move |x| (x, y)))
            .map(|(x, y)| pixel(&surface, x, y)[0])
            .min()
            .unwrap();
        assert!(darkest.abs_diff(0x66) <= 2, "darkest text pixel {darkest}");
    }

    #[test]
    fn no_exposure_line_without_the_option() {
        let mut compositor = Compositor::default();
        let mut surface = compositor.new_surface().unwrap();
        compositor
            .render(&mut surface, &portrait_with_exposure(), &DisplayOptions::default())
            .unwrap();
        assert_eq!(ink_below(&surface, 1416, Rgb::BLACK), None);
    }

    #[test]
    fn render_overwrites_previous_frame() {
        let mut compositor = compositor();
        let options = DisplayOptions::default();

        let mut fresh = compositor.new_surface().unwrap();
        compositor.render(&mut fresh, &landscape(), &options).unwrap();

        let mut reused = compositor.new_surface().unwrap();
        let busy = DisplayOptions {
            glow: true,
            mat: MatTone::Light,
            rounded_corners: false,
            show_metadata_overlay: true,
        };
        compositor
            .render(&mut reused, &portrait_with_exposure(), &busy)
            .unwrap();
        compositor.render(&mut reused, &landscape(), &options).unwrap();

        assert_eq!(reused.pixmap().data(), fresh.pixmap().data());
    }
}
