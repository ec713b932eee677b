//! Style resolved once per source text shape.

use std::str::FromStr;

use crate::markup::Element;
use crate::units::{self, Length, UnitError};

/// Font size used when a shape names none.
pub const DEFAULT_FONT_SIZE_PT: f64 = 12.0;

/// Layout direction of a text shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritingMode {
    #[default]
    HorizontalTb,
    VerticalRl,
    VerticalLr,
}

impl WritingMode {
    /// Read a `writing-mode` attribute value, falling back to `horizontal-tb`.
    #[must_use]
    pub fn from_attribute(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    /// Local `(x, y)` of a line whose cumulative offset is `offset`.
    ///
    /// The cross axis is pinned at the shape origin. Lines in `vertical-rl`
    /// advance toward negative x.
    #[must_use]
    pub fn position(self, offset: f64) -> (f64, f64) {
        match self {
            Self::HorizontalTb => (0.0, offset),
            Self::VerticalRl => (-offset, 0.0),
            Self::VerticalLr => (offset, 0.0),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HorizontalTb => "horizontal-tb",
            Self::VerticalRl => "vertical-rl",
            Self::VerticalLr => "vertical-lr",
        }
    }
}

impl FromStr for WritingMode {
    type Err = String;

    // SVG 1.1 keywords map onto their CSS writing-modes equivalents.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal-tb" | "lr" | "lr-tb" | "rl" | "rl-tb" => Ok(Self::HorizontalTb),
            "vertical-rl" | "tb" | "tb-rl" => Ok(Self::VerticalRl),
            "vertical-lr" => Ok(Self::VerticalLr),
            other => Err(format!("unknown writing-mode: {other}")),
        }
    }
}

/// Fallbacks applied while resolving a shape's style.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDefaults {
    pub font_size: f64,
    pub font_unit: String,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE_PT,
            font_unit: "pt".to_string(),
        }
    }
}

/// Font metrics and attributes shared by every line split out of one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub font_size: Length,
    pub line_height: Length,
    pub writing_mode: WritingMode,
    pub preserved_attributes: Vec<(String, String)>,
}

impl ResolvedStyle {
    /// Resolve the style of a source `<text>` root.
    ///
    /// `line-height` defaults to the resolved font size, value and unit alike.
    #[must_use]
    pub fn resolve(root: &Element, defaults: &StyleDefaults) -> Self {
        let preserved_attributes: Vec<(String, String)> = root
            .attributes()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let font_size = units::resolve(root, "font-size", defaults.font_size, &defaults.font_unit);
        let line_height = units::resolve(root, "line-height", font_size.value, &font_size.unit);
        let writing_mode = WritingMode::from_attribute(root.attr("writing-mode"));

        Self {
            font_size,
            line_height,
            writing_mode,
            preserved_attributes,
        }
    }

    /// Font size in points. Relative units scale against `base_font_size`.
    pub fn font_size_pt(&self, base_font_size: f64) -> Result<f64, UnitError> {
        to_points(&self.font_size, base_font_size)
    }

    /// Line height in points, relative units scaling against the font size in points.
    pub fn line_height_pt(&self, font_size_pt: f64) -> Result<f64, UnitError> {
        to_points(&self.line_height, font_size_pt)
    }

    /// A fresh element carrying the preserved attributes of the source root.
    #[must_use]
    pub fn element(&self, name: &str) -> Element {
        let mut element = Element::new(name);
        for (key, value) in &self.preserved_attributes {
            element.set_attr(key.as_str(), value.as_str());
        }
        element
    }
}

fn to_points(length: &Length, base_font_size: f64) -> Result<f64, UnitError> {
    if length.is_pt() {
        Ok(length.value)
    } else {
        length.to_pt(base_font_size)
    }
}
