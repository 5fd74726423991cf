//! Parameter types for drawing and encoding.
//!
//! These structs describe *what* to draw or encode, not *how*. They are the
//! interface between configuration (which decides the look of a mat) and the
//! compositor and encoders (which do the pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`Rgb`]: Opaque colour, written as `#rgb` or `#rrggbb` in config files.
//! - [`GlowParams`]: Blur radius, opacity and enlargement of the ambient halo.
//! - [`OverlayStyle`]: Font size, placement and per-mat colours of the exposure line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality as the `u8` the JPEG encoder takes.
    pub fn as_u8(self) -> u8 {
        self.0 as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Opaque 8-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid colour {0:?}: expected #rgb or #rrggbb")]
pub struct ParseColorError(String);

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| err());

        match hex.len() {
            3 => {
                let expand = |i: usize| channel(&hex[i..i + 1].repeat(2));
                Ok(Rgb::new(expand(0)?, expand(1)?, expand(2)?))
            }
            6 => Ok(Rgb::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Soft halo drawn beneath the photo.
///
/// - `blur_radius`: Gaussian standard deviation in canvas pixels
/// - `opacity`: alpha of the halo layer (0–1)
/// - `scale`: halo size relative to the photo placement, centred on it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowParams {
    pub blur_radius: f32,
    pub opacity: f32,
    pub scale: f32,
}

impl Default for GlowParams {
    fn default() -> Self {
        Self {
            blur_radius: 300.0,
            opacity: 0.65,
            scale: 1.08,
        }
    }
}

/// Placement and colours of the exposure overlay line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub font_size: f32,
    /// Distance from the bottom canvas edge to the text's vertical centre.
    pub baseline_offset: f32,
    pub on_light: Rgb,
    pub on_dark: Rgb,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            font_size: 42.0,
            baseline_offset: 48.0,
            on_light: Rgb::new(0x66, 0x66, 0x66),
            on_dark: Rgb::new(0x99, 0x99, 0x99),
        }
    }
}
