//! CSS length resolution and unit conversion.
//!
//! The two entry points follow different failure policies:
//!
//! - [`resolve`] is permissive. It never fails and substitutes the caller's
//!   default for anything missing, malformed or non-positive. This keeps a
//!   sloppy document from blocking a split, at the cost of masking authoring
//!   mistakes upstream.
//! - [`convert_to_pt`] is strict and reports unknown units and unusable
//!   magnitudes as [`UnitError`].
//!
//! # Unit table
//!
//! | Unit | Points per unit |
//! |------|-----------------|
//! | `pt`, `px` | 1 |
//! | `mm` | 2.83465 |
//! | `cm` | 28.3465 |
//! | `Q` | 0.7086625 |
//! | `in` | 72 |
//! | `pc` | 12 |
//! | `em`, `lines` | base font size |
//! | `ex` | base font size / 2 |
//! | `%`, `percent` | base font size / 100 |

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::markup::Element;

/// Points per millimetre.
pub const PT_PER_MM: f64 = 2.834_65;

/// Unit used when neither the document nor the caller names one.
const FALLBACK_UNIT: &str = "pt";

/// Leading `<number><unit>` of a CSS value, e.g. `14px`, `1.5em`, `120%`.
static NUMBER_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)\s*([A-Za-z%]*)").unwrap()
});

/// Strict conversion errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("invalid unit: {0:?}")]
    InvalidUnit(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, UnitError>;

/// Supported length units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Pt,
    Em,
    Ex,
    Percent,
    Lines,
    Px,
    Mm,
    Cm,
    Q,
    In,
    Pc,
}

impl Unit {
    /// Canonical lowercase symbol.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Pt => "pt",
            Self::Em => "em",
            Self::Ex => "ex",
            Self::Percent => "%",
            Self::Lines => "lines",
            Self::Px => "px",
            Self::Mm => "mm",
            Self::Cm => "cm",
            Self::Q => "q",
            Self::In => "in",
            Self::Pc => "pc",
        }
    }

    /// Whether the unit scales with the base font size.
    #[must_use]
    pub fn is_relative(self) -> bool {
        matches!(self, Self::Em | Self::Ex | Self::Percent | Self::Lines)
    }

    /// Points in one unit.
    #[must_use]
    pub fn points_per_unit(self, base_font_size: f64) -> f64 {
        match self {
            Self::Pt | Self::Px => 1.0,
            Self::Em | Self::Lines => base_font_size,
            Self::Ex => base_font_size * 0.5,
            Self::Percent => base_font_size / 100.0,
            Self::Mm => PT_PER_MM,
            Self::Cm => PT_PER_MM * 10.0,
            Self::Q => PT_PER_MM / 4.0,
            Self::In => 72.0,
            Self::Pc => 12.0,
        }
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pt" => Ok(Self::Pt),
            "em" => Ok(Self::Em),
            "ex" => Ok(Self::Ex),
            "%" | "percent" => Ok(Self::Percent),
            "lines" => Ok(Self::Lines),
            "px" => Ok(Self::Px),
            "mm" => Ok(Self::Mm),
            "cm" => Ok(Self::Cm),
            "q" => Ok(Self::Q),
            "in" => Ok(Self::In),
            "pc" => Ok(Self::Pc),
            _ => Err(UnitError::InvalidUnit(s.to_string())),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A magnitude paired with its (lowercase) unit symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: String,
}

impl Length {
    #[must_use]
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    /// Express this length in points.
    pub fn to_pt(&self, base_font_size: f64) -> Result<f64> {
        convert_to_pt(self.value, &self.unit, base_font_size)
    }

    #[must_use]
    pub fn is_pt(&self) -> bool {
        self.unit == Unit::Pt.symbol()
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}

/// Resolve a CSS length property on `element`.
///
/// Lookup order:
/// 1. a direct attribute named `property`, parsed as a bare number;
/// 2. otherwise a `property: <number><unit>` declaration in the inline `style`.
///
/// A missing, unparsable, non-finite or non-positive magnitude is replaced by
/// `default_value`. A missing unit is replaced by `default_unit`. The unit is
/// always returned trimmed and lowercase.
pub fn resolve(element: &Element, property: &str, default_value: f64, default_unit: &str) -> Length {
    let (value, unit) = if let Some(raw) = element.attr(property) {
        (raw.trim().parse::<f64>().ok(), None)
    } else if let Some(style) = element.attr("style") {
        match style_declaration(style, property).and_then(split_number_unit) {
            Some((value, unit)) => (Some(value), unit),
            None => (None, None),
        }
    } else {
        (None, None)
    };

    let value = value
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(default_value);

    let unit = unit
        .map(|u| normalize_unit(&u))
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| normalize_unit(default_unit));
    let unit = if unit.is_empty() {
        FALLBACK_UNIT.to_string()
    } else {
        unit
    };

    Length { value, unit }
}

/// Convert `value` expressed in `unit` to points.
///
/// `base_font_size` (in points) scales the relative units `em`, `ex`, `%` and `lines`.
pub fn convert_to_pt(value: f64, unit: &str, base_font_size: f64) -> Result<f64> {
    let factor = factor_for(value, unit, base_font_size)?;
    Ok(value * factor)
}

/// Convert `points` back into `unit`.
pub fn convert_from_pt(points: f64, unit: &str, base_font_size: f64) -> Result<f64> {
    let factor = factor_for(points, unit, base_font_size)?;
    if factor == 0.0 {
        return Err(UnitError::InvalidValue(format!(
            "cannot express {points}pt in {unit} with base font size {base_font_size}"
        )));
    }
    Ok(points / factor)
}

/// Strictly parse a `<number><unit>` string such as `12mm` or `1.5em`.
///
/// The unit may be absent, in which case it is returned empty and a later
/// [`convert_to_pt`] reports it as [`UnitError::InvalidValue`].
pub fn parse_length(text: &str) -> Result<Length> {
    let caps = NUMBER_UNIT
        .captures(text)
        .ok_or_else(|| UnitError::InvalidValue(text.to_string()))?;
    if caps[0].len() != text.trim_end().len() {
        return Err(UnitError::InvalidValue(text.to_string()));
    }
    let value = caps[1]
        .parse::<f64>()
        .map_err(|_| UnitError::InvalidValue(text.to_string()))?;
    Ok(Length::new(value, normalize_unit(&caps[2])))
}

fn factor_for(value: f64, unit: &str, base_font_size: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(UnitError::InvalidValue(value.to_string()));
    }
    if unit.trim().is_empty() {
        return Err(UnitError::InvalidValue(format!("{value} has no unit")));
    }
    let unit: Unit = unit.parse()?;
    if unit.is_relative() && !base_font_size.is_finite() {
        return Err(UnitError::InvalidValue(format!(
            "base font size {base_font_size} for {unit}"
        )));
    }
    Ok(unit.points_per_unit(base_font_size))
}

fn normalize_unit(unit: &str) -> String {
    unit.trim().to_ascii_lowercase()
}

/// Value of the first `property: value` declaration in an inline style.
fn style_declaration<'a>(style: &'a str, property: &str) -> Option<&'a str> {
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case(property)
            .then_some(value.trim())
    })
}

fn split_number_unit(value: &str) -> Option<(f64, Option<String>)> {
    let caps = NUMBER_UNIT.captures(value)?;
    let number = caps[1].parse::<f64>().ok()?;
    let unit = caps.get(2).map(|m| m.as_str().to_string()).filter(|u| !u.is_empty());
    Some((number, unit))
}
