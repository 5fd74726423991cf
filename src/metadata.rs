//! Camera exposure metadata and the overlay line.
//!
//! ## Key set
//!
//! Only four exposure values are kept, out of everything the tag decoder
//! reports. Each maps from one or more decoder tag names:
//!
//! | Field | Tag name(s) | Overlay rendering |
//! |---|---|---|
//! | focal length | `FocalLengthIn35mmFilm` | `50` → `50mm` |
//! | aperture | `FNumber` | `f/2.8` as-is |
//! | ISO | `ISOSpeedRatings`, `PhotographicSensitivity` | `200` → `ISO200` |
//! | exposure time | `ExposureTime` | `1/250` → `1/250s` |
//!
//! Values are trimmed; a blank value counts as absent.
//!
//! ## Overlay
//!
//! [`format_overlay`] renders present fields in the order above, joined with
//! `" | "`. Absent fields leave no trace, so the separator never sits next to a
//! gap. No fields at all yields the empty string.

use crate::imaging::TagMap;
use serde::Serialize;

/// Separator between overlay fields.
pub const OVERLAY_SEPARATOR: &str = " | ";

/// One member of the closed exposure key set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureField {
    FocalLength,
    Aperture,
    Iso,
    ExposureTime,
}

impl ExposureField {
    /// Overlay order.
    pub const ALL: [ExposureField; 4] = [
        ExposureField::FocalLength,
        ExposureField::Aperture,
        ExposureField::Iso,
        ExposureField::ExposureTime,
    ];

    /// Decoder tag names, most preferred first.
    pub fn tag_names(self) -> &'static [&'static str] {
        match self {
            ExposureField::FocalLength => &["FocalLengthIn35mmFilm"],
            ExposureField::Aperture => &["FNumber"],
            ExposureField::Iso => &["ISOSpeedRatings", "PhotographicSensitivity"],
            ExposureField::ExposureTime => &["ExposureTime"],
        }
    }

    fn render(self, value: &str) -> String {
        match self {
            ExposureField::FocalLength => format!("{value}mm"),
            ExposureField::Aperture => value.to_string(),
            ExposureField::Iso => format!("ISO{value}"),
            ExposureField::ExposureTime => format!("{value}s"),
        }
    }
}

/// Exposure values of one photo. Immutable once ingested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExposureInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aperture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_time: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.trim()).filter(|s| !s.is_empty()).map(String::from)
}

impl ExposureInfo {
    /// Pick the exposure fields out of a decoded tag map.
    pub fn from_tags(tags: &TagMap) -> Self {
        ExposureField::ALL
            .into_iter()
            .fold(Self::default(), |info, field| {
                let value = field
                    .tag_names()
                    .iter()
                    .filter_map(|name| tags.get(*name))
                    .find_map(|record| non_empty(&record.description));
                match value {
                    Some(value) => info.with(field, value),
                    None => info,
                }
            })
    }

    pub fn get(&self, field: ExposureField) -> Option<&str> {
        match field {
            ExposureField::FocalLength => self.focal_length.as_deref(),
            ExposureField::Aperture => self.aperture.as_deref(),
            ExposureField::Iso => self.iso.as_deref(),
            ExposureField::ExposureTime => self.exposure_time.as_deref(),
        }
    }

    /// Set `field`; a blank value clears it.
    pub fn with(mut self, field: ExposureField, value: impl AsRef<str>) -> Self {
        let value = non_empty(value.as_ref());
        match field {
            ExposureField::FocalLength => self.focal_length = value,
            ExposureField::Aperture => self.aperture = value,
            ExposureField::Iso => self.iso = value,
            ExposureField::ExposureTime => self.exposure_time = value,
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        ExposureField::ALL.iter().all(|f| self.get(*f).is_none())
    }
}

/// Render the overlay line for `info`.
pub fn format_overlay(info: &ExposureInfo) -> String {
    ExposureField::ALL
        .iter()
        .filter_map(|field| info.get(*field).map(|value| field.render(value)))
        .collect::<Vec<_>>()
        .join(OVERLAY_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::TagRecord;

    fn tags(pairs: &[(&str, &str)]) -> TagMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), TagRecord::new(*v)))
            .collect()
    }

    // =========================================================================
    // format_overlay
    // =========================================================================

    #[test]
    fn missing_exposure_is_elided() {
        let info = ExposureInfo::default()
            .with(ExposureField::FocalLength, "50")
            .with(ExposureField::Aperture, "f/2.8")
            .with(ExposureField::Iso, "200");
        assert_eq!(format_overlay(&info), "50mm | f/2.8 | ISO200");
    }

    #[test]
    fn all_fields_render_in_fixed_order() {
        let info = ExposureInfo::default()
            .with(ExposureField::ExposureTime, "1/250")
            .with(ExposureField::Iso, "100")
            .with(ExposureField::Aperture, "f/8")
            .with(ExposureField::FocalLength, "35");
        assert_eq!(format_overlay(&info), "35mm | f/8 | ISO100 | 1/250s");
    }

    #[test]
    fn empty_info_formats_to_empty_string() {
        assert_eq!(format_overlay(&ExposureInfo::default()), "");
    }

    #[test]
    fn single_field_has_no_separator() {
        let info = ExposureInfo::default().with(ExposureField::Iso, "3200");
        assert_eq!(format_overlay(&info), "ISO3200");
    }

    #[test]
    fn separators_never_border_a_gap() {
        let values = ["35", "f/1.4", "800", "1/60"];
        for mask in 0u8..16 {
            let info = ExposureField::ALL
                .iter()
                .zip(values)
                .enumerate()
                .filter(|(i, _)| (mask >> i) & 1 == 1)
                .fold(ExposureInfo::default(), |info, (_, (field, value))| {
                    info.with(*field, value)
                });

            let line = format_overlay(&info);
            assert!(!line.starts_with(" |") && !line.ends_with("| "), "{line:?}");
            assert!(!line.contains("|  |"), "{line:?}");
            let present = mask.count_ones() as usize;
            assert_eq!(
                line.matches(OVERLAY_SEPARATOR).count(),
                present.saturating_sub(1)
            );
            assert_eq!(format_overlay(&info), line);
        }
    }

    // =========================================================================
    // from_tags
    // =========================================================================

    #[test]
    fn from_tags_picks_exposure_fields() {
        let info = ExposureInfo::from_tags(&tags(&[
            ("FocalLengthIn35mmFilm", "50"),
            ("FNumber", "f/2.8"),
            ("ISOSpeedRatings", "200"),
            ("ExposureTime", "1/125"),
            ("Make", "Canon"),
        ]));
        assert_eq!(info.focal_length.as_deref(), Some("50"));
        assert_eq!(info.aperture.as_deref(), Some("f/2.8"));
        assert_eq!(info.iso.as_deref(), Some("200"));
        assert_eq!(info.exposure_time.as_deref(), Some("1/125"));
    }

    #[test]
    fn from_tags_accepts_newer_iso_name() {
        let info = ExposureInfo::from_tags(&tags(&[("PhotographicSensitivity", "640")]));
        assert_eq!(info.iso.as_deref(), Some("640"));
    }

    #[test]
    fn blank_descriptions_count_as_absent() {
        let info =
            ExposureInfo::from_tags(&tags(&[("FNumber", "  "), ("ExposureTime", " 1/30 ")]));
        assert_eq!(info.aperture, None);
        assert_eq!(info.exposure_time.as_deref(), Some("1/30"));
        assert!(!info.is_empty());
    }

    #[test]
    fn empty_tag_map_yields_empty_info() {
        let info = ExposureInfo::from_tags(&TagMap::new());
        assert!(info.is_empty());
        assert_eq!(format_overlay(&info), "");
    }
}
