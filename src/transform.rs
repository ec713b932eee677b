//! 2D affine transforms in SVG notation.
//!
//! Coefficients follow the SVG `matrix(a b c d e f)` order, which is also
//! the order of [`kurbo::Affine::as_coeffs`].

use std::sync::LazyLock;

use kurbo::{Affine, Vec2};
use regex::Regex;
use thiserror::Error;

/// One `name(args)` item of a transform list.
static TRANSFORM_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,?\s*([A-Za-z]+)\s*\(([^)]*)\)").unwrap());

static ARG_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s,]+").unwrap());

/// Transform list parse errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("unknown transform function: {0}")]
    UnknownFunction(String),

    #[error("{name}() takes {expected} arguments, got {got}")]
    Arity {
        name: String,
        expected: &'static str,
        got: usize,
    },

    #[error("invalid number in transform: {0:?}")]
    Number(String),

    #[error("unexpected text in transform: {0:?}")]
    Syntax(String),
}

pub type Result<T> = std::result::Result<T, TransformError>;

/// Serialize as `matrix(a b c d e f)`.
#[must_use]
pub fn to_svg_matrix(transform: &Affine) -> String {
    let [a, b, c, d, e, f] = transform.as_coeffs();
    format!(
        "matrix({} {} {} {} {} {})",
        svg_number(a),
        svg_number(b),
        svg_number(c),
        svg_number(d),
        svg_number(e),
        svg_number(f)
    )
}

/// Format a number for an SVG attribute: at most six decimals, no trailing
/// zeros, and never `-0`.
#[must_use]
pub fn svg_number(value: f64) -> String {
    let fixed = format!("{value:.6}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Parse an SVG `transform` attribute into a single matrix.
///
/// Supports `matrix`, `translate`, `scale`, `rotate` (with optional centre),
/// `skewX` and `skewY`. Items compose left to right, so the rightmost item is
/// applied to points first. An empty list is the identity.
pub fn parse_transform_list(list: &str) -> Result<Affine> {
    let mut result = Affine::IDENTITY;
    let mut consumed = 0;

    for caps in TRANSFORM_ITEM.captures_iter(list) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        if whole.start != consumed {
            return Err(TransformError::Syntax(list[consumed..whole.start].to_string()));
        }
        consumed = whole.end;

        let args = parse_args(&caps[2])?;
        result = result * transform_item(&caps[1], &args)?;
    }

    let rest = list[consumed..].trim_matches(|c: char| c.is_whitespace() || c == ',');
    if !rest.is_empty() {
        return Err(TransformError::Syntax(rest.to_string()));
    }
    Ok(result)
}

fn parse_args(raw: &str) -> Result<Vec<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    ARG_SEPARATOR
        .split(raw)
        .map(|n| {
            n.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| TransformError::Number(n.to_string()))
        })
        .collect()
}

fn transform_item(name: &str, args: &[f64]) -> Result<Affine> {
    let arity = |expected: &'static str| TransformError::Arity {
        name: name.to_string(),
        expected,
        got: args.len(),
    };

    match name {
        "matrix" => match *args {
            [a, b, c, d, e, f] => Ok(Affine::new([a, b, c, d, e, f])),
            _ => Err(arity("6")),
        },
        "translate" => match *args {
            [tx] => Ok(Affine::translate(Vec2::new(tx, 0.0))),
            [tx, ty] => Ok(Affine::translate(Vec2::new(tx, ty))),
            _ => Err(arity("1 or 2")),
        },
        "scale" => match *args {
            [s] => Ok(Affine::scale(s)),
            [sx, sy] => Ok(Affine::scale_non_uniform(sx, sy)),
            _ => Err(arity("1 or 2")),
        },
        "rotate" => match *args {
            [deg] => Ok(Affine::rotate(deg.to_radians())),
            [deg, cx, cy] => Ok(Affine::translate(Vec2::new(cx, cy))
                * Affine::rotate(deg.to_radians())
                * Affine::translate(Vec2::new(-cx, -cy))),
            _ => Err(arity("1 or 3")),
        },
        "skewX" => match *args {
            [deg] => Ok(Affine::skew(deg.to_radians().tan(), 0.0)),
            _ => Err(arity("1")),
        },
        "skewY" => match *args {
            [deg] => Ok(Affine::skew(0.0, deg.to_radians().tan())),
            _ => Err(arity("1")),
        },
        other => Err(TransformError::UnknownFunction(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_coeffs(t: Affine, expected: [f64; 6]) {
        for (got, want) in t.as_coeffs().iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{:?} != {expected:?}", t.as_coeffs());
        }
    }

    #[test]
    fn identity_matrix_string() {
        assert_eq!(to_svg_matrix(&Affine::IDENTITY), "matrix(1 0 0 1 0 0)");
    }

    #[test]
    fn matrix_string_keeps_coefficient_order() {
        let t = Affine::new([1.0, 0.5, -0.25, 2.0, 10.5, -3.0]);
        assert_eq!(to_svg_matrix(&t), "matrix(1 0.5 -0.25 2 10.5 -3)");
    }

    #[test]
    fn svg_number_trims() {
        assert_eq!(svg_number(14.0), "14");
        assert_eq!(svg_number(19.8378), "19.8378");
        assert_eq!(svg_number(0.1 + 0.2), "0.3");
        assert_eq!(svg_number(-0.000_000_1), "0");
        assert_eq!(svg_number(-17.0), "-17");
    }

    #[test]
    fn parses_single_functions() {
        assert_coeffs(parse_transform_list("translate(10)").unwrap(), [1.0, 0.0, 0.0, 1.0, 10.0, 0.0]);
        assert_coeffs(
            parse_transform_list("translate(10, 20)").unwrap(),
            [1.0, 0.0, 0.0, 1.0, 10.0, 20.0],
        );
        assert_coeffs(parse_transform_list("scale(2 3)").unwrap(), [2.0, 0.0, 0.0, 3.0, 0.0, 0.0]);
        assert_coeffs(
            parse_transform_list("matrix(1,2,3,4,5,6)").unwrap(),
            [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        );
        assert_coeffs(parse_transform_list("rotate(90)").unwrap(), [0.0, 1.0, -1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn list_composes_left_to_right() {
        let t = parse_transform_list("translate(10 20) scale(2)").unwrap();
        assert_coeffs(t, [2.0, 0.0, 0.0, 2.0, 10.0, 20.0]);
        let p = t * kurbo::Point::new(1.0, 1.0);
        assert!((p.x - 12.0).abs() < 1e-9 && (p.y - 22.0).abs() < 1e-9);
    }

    #[test]
    fn rotate_about_centre_keeps_centre_fixed() {
        let t = parse_transform_list("rotate(45 5 5)").unwrap();
        let p = t * kurbo::Point::new(5.0, 5.0);
        assert!((p.x - 5.0).abs() < 1e-9 && (p.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn empty_list_is_identity() {
        assert_eq!(parse_transform_list("  ").unwrap(), Affine::IDENTITY);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            parse_transform_list("wobble(1)"),
            Err(TransformError::UnknownFunction(_))
        ));
        assert!(matches!(
            parse_transform_list("matrix(1 2 3)"),
            Err(TransformError::Arity { .. })
        ));
        assert!(matches!(parse_transform_list("scale(x)"), Err(TransformError::Number(_))));
        assert!(matches!(
            parse_transform_list("translate(1) garbage"),
            Err(TransformError::Syntax(_))
        ));
    }
}
