//! Mat configuration module.
//!
//! Handles loading, validating, and merging `mat.toml`. Stock defaults are
//! serialized to a TOML table and the user file is deep-merged on top, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [canvas]
//! width = 1440              # Output canvas size in pixels
//! height = 1440
//! margin = 25               # Mat around the photo on every side
//! overlay_margin = 100      # Bottom margin while the exposure line is shown
//! corner_radius = 30        # Radius of rounded photo corners
//!
//! [working]
//! width = 1440              # Canvas photos are pre-fitted into at load time
//! height = 1440
//! margin = 25
//!
//! [overlay]
//! font_size = 42.0
//! baseline_offset = 48.0    # Text centre, measured up from the bottom edge
//!
//! [overlay.color]
//! light = "#666666"         # Text colour on the light mat
//! dark = "#999999"          # Text colour on the dark mat
//!
//! [mat]
//! light = "#ffffff"
//! dark = "#000000"
//!
//! [glow]
//! blur_radius = 300.0
//! opacity = 0.65
//! scale = 1.08
//!
//! [export]
//! quality = 100             # Exported frame JPEG quality (1-100)
//! thumbnail_quality = 80    # Filmstrip preview JPEG quality (1-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel decoders (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{GlowParams, OverlayStyle, Rgb};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "mat.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `mat.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatConfig {
    /// Output canvas geometry.
    pub canvas: CanvasConfig,
    /// Working canvas used when photos are loaded.
    pub working: WorkingConfig,
    /// Exposure overlay text.
    pub overlay: OverlayConfig,
    /// Mat colours.
    pub mat: MatColors,
    /// Ambient halo behind the photo.
    pub glow: GlowConfig,
    /// JPEG encoding qualities.
    pub export: ExportConfig,
    /// Parallel decoding settings.
    pub processing: ProcessingConfig,
}

impl MatConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

        let canvas = &self.canvas;
        if canvas.width == 0 || canvas.height == 0 {
            return invalid("canvas.width and canvas.height must be non-zero");
        }
        if canvas.margin.saturating_mul(2) >= canvas.width
            || canvas.margin.saturating_add(canvas.margin.max(canvas.overlay_margin))
                >= canvas.height
        {
            return invalid("canvas margins leave no room for the photo");
        }

        let working = &self.working;
        if working.width == 0 || working.height == 0 {
            return invalid("working.width and working.height must be non-zero");
        }
        if working.margin.saturating_mul(2) >= working.width.min(working.height) {
            return invalid("working.margin leaves no room for the photo");
        }

        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(self.overlay.font_size) {
            return invalid("overlay.font_size must be positive");
        }
        if !(0.0..=1.0).contains(&self.glow.opacity) {
            return invalid("glow.opacity must be 0-1");
        }
        if !(self.glow.blur_radius == 0.0 || positive(self.glow.blur_radius)) {
            return invalid("glow.blur_radius must not be negative");
        }
        if !positive(self.glow.scale) {
            return invalid("glow.scale must be positive");
        }
        for (key, quality) in [
            ("export.quality", self.export.quality),
            ("export.thumbnail_quality", self.export.thumbnail_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(ConfigError::Validation(format!("{key} must be 1-100")));
            }
        }
        Ok(())
    }
}

/// Output canvas geometry, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    /// Bottom margin used instead of `margin` while the overlay is shown.
    pub overlay_margin: u32,
    /// Requested corner radius. Clamped to half the photo's shorter side
    /// at draw time.
    pub corner_radius: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 1440,
            margin: 25,
            overlay_margin: 100,
            corner_radius: 30,
        }
    }
}

/// Working canvas every photo is pre-fitted into when it is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkingConfig {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
}

impl Default for WorkingConfig {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 1440,
            margin: 25,
        }
    }
}

/// Exposure overlay line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
    pub font_size: f32,
    /// Distance from the bottom edge to the vertical centre of the text.
    pub baseline_offset: f32,
    pub color: OverlayColors,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        let style = OverlayStyle::default();
        Self {
            font_size: style.font_size,
            baseline_offset: style.baseline_offset,
            color: OverlayColors::default(),
        }
    }
}

impl OverlayConfig {
    pub fn style(&self) -> OverlayStyle {
        OverlayStyle {
            font_size: self.font_size,
            baseline_offset: self.baseline_offset,
            on_light: self.color.light,
            on_dark: self.color.dark,
        }
    }
}

/// Overlay text colour per mat tone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayColors {
    /// Used on the light mat.
    pub light: Rgb,
    /// Used on the dark mat.
    pub dark: Rgb,
}

impl Default for OverlayColors {
    fn default() -> Self {
        let style = OverlayStyle::default();
        Self {
            light: style.on_light,
            dark: style.on_dark,
        }
    }
}

/// Mat fill colour per tone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatColors {
    pub light: Rgb,
    pub dark: Rgb,
}

impl Default for MatColors {
    fn default() -> Self {
        Self {
            light: Rgb::WHITE,
            dark: Rgb::BLACK,
        }
    }
}

/// Ambient halo settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlowConfig {
    /// Gaussian standard deviation in canvas pixels.
    pub blur_radius: f32,
    pub opacity: f32,
    /// Halo size relative to the photo.
    pub scale: f32,
}

impl Default for GlowConfig {
    fn default() -> Self {
        let params = GlowParams::default();
        Self {
            blur_radius: params.blur_radius,
            opacity: params.opacity,
            scale: params.scale,
        }
    }
}

impl GlowConfig {
    pub fn params(&self) -> GlowParams {
        GlowParams {
            blur_radius: self.blur_radius,
            opacity: self.opacity,
            scale: self.scale,
        }
    }
}

/// JPEG qualities, 1-100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub quality: u32,
    pub thumbnail_quality: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            quality: 100,
            thumbnail_quality: 80,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel decoding workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least 1
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(MatConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<MatConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: MatConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the file at `path`, falling back to stock defaults when
/// it does not exist.
pub fn load_config(path: &Path) -> Result<MatConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(path)?)
}

/// Returns a fully-commented stock `mat.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Photo Mat Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output canvas
# ---------------------------------------------------------------------------
[canvas]
# Size of every exported frame, in pixels.
width = 1440
height = 1440

# Mat visible around the photo on each side.
margin = 25

# Bottom margin used while the exposure overlay is shown.
overlay_margin = 100

# Radius of rounded photo corners. Never more than half the photo's
# shorter side is used.
corner_radius = 30

# ---------------------------------------------------------------------------
# Working canvas
# ---------------------------------------------------------------------------
[working]
# Photos are resampled to fit this canvas when loaded. Larger values keep
# more detail at the cost of memory.
width = 1440
height = 1440
margin = 25

# ---------------------------------------------------------------------------
# Exposure overlay
# ---------------------------------------------------------------------------
[overlay]
font_size = 42.0

# Vertical centre of the text, measured up from the bottom edge.
baseline_offset = 48.0

[overlay.color]
light = "#666666"    # On the light mat
dark = "#999999"     # On the dark mat

# ---------------------------------------------------------------------------
# Mat colours
# ---------------------------------------------------------------------------
[mat]
light = "#ffffff"
dark = "#000000"

# ---------------------------------------------------------------------------
# Glow
# ---------------------------------------------------------------------------
[glow]
# Blur strength in canvas pixels.
blur_radius = 300.0

# Halo opacity (0 = invisible, 1 = opaque).
opacity = 0.65

# Halo size relative to the photo.
scale = 1.08

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[export]
# JPEG quality of exported frames (1 = worst, 100 = best).
quality = 100

# JPEG quality of filmstrip previews.
thumbnail_quality = 80

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel decoders while loading a batch.
# Omit or comment out to auto-detect (= number of CPU cores).
# Set to 1 for strictly sequential loading.
# max_processes = 4
"##
}
