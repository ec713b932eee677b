//! Multi-line text shape splitting.
//!
//! Takes one serialized `<text>` shape and its absolute transform and
//! produces one self-contained `<text>` element per line. Every produced
//! element carries the absolute transform as `matrix(...)`, so its local
//! coordinates (measured from the shape origin) still land where the line was
//! drawn on the canvas.
//!
//! Lines come from two places, emitted in this order:
//!
//! 1. **Direct text** of the root, split on line breaks. Each non-empty
//!    trimmed line advances the offset by the line height.
//! 2. **`<tspan>` children**. Each span advances the offset by its own `dy`,
//!    or by the font size when it has none, and is re-emitted with its
//!    position attributes removed.
//!
//! # Example
//!
//! ```rust
//! use kurbo::Affine;
//! use tsplit::split::split;
//!
//! let lines = split("<text>first\nsecond</text>", &Affine::IDENTITY).unwrap();
//! assert_eq!(lines.len(), 2);
//! assert!(lines[1].contains(r#"y="24""#));
//! ```

mod style;

use kurbo::Affine;
use thiserror::Error;
use tracing::debug;

use crate::markup::{self, Element, MarkupError};
use crate::transform::{svg_number, to_svg_matrix};
use crate::units::{self, UnitError};

pub use style::{ResolvedStyle, StyleDefaults, WritingMode, DEFAULT_FONT_SIZE_PT};

/// Characters that end a line of direct text.
const LINE_BREAKS: [char; 2] = ['\n', '\r'];

/// Attributes dropped from re-emitted spans at every depth.
pub const POSITION_ATTRIBUTES: [&str; 3] = ["x", "y", "dy"];

/// Splitting errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplitError {
    #[error("malformed markup: {0}")]
    MalformedMarkup(MarkupError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error("failed to serialize fragment: {0}")]
    Serialize(MarkupError),
}

pub type Result<T> = std::result::Result<T, SplitError>;

/// Splits text shapes using a fixed set of style defaults.
#[derive(Debug, Clone, Default)]
pub struct Splitter {
    defaults: StyleDefaults,
}

impl Splitter {
    #[must_use]
    pub fn new(defaults: StyleDefaults) -> Self {
        Self { defaults }
    }

    #[must_use]
    pub fn defaults(&self) -> &StyleDefaults {
        &self.defaults
    }

    /// Split serialized shape markup into serialized single-line fragments.
    ///
    /// Returns an empty vector when the shape holds neither text nor spans.
    pub fn split(&self, markup: &str, transform: &Affine) -> Result<Vec<String>> {
        let root = markup::parse_fragment(markup).map_err(SplitError::MalformedMarkup)?;
        self.split_element(&root, transform)?
            .iter()
            .map(|el| el.to_markup().map_err(SplitError::Serialize))
            .collect()
    }

    /// Split an already parsed shape root into fresh single-line elements.
    pub fn split_element(&self, root: &Element, transform: &Affine) -> Result<Vec<Element>> {
        let Metrics {
            style,
            font_size_pt,
            line_height_pt,
        } = self.metrics(root)?;
        let matrix = to_svg_matrix(transform);

        let mut offset = 0.0;
        let mut produced = Vec::new();

        if let Some(text) = root.text.as_deref() {
            for line in text.split(LINE_BREAKS).map(str::trim).filter(|l| !l.is_empty()) {
                offset += line_height_pt;
                // Lines from direct text are sized by the line pitch.
                let mut element = line_element(root, &style, &matrix, line_height_pt, offset);
                element.text = Some(line.to_string());
                produced.push(element);
            }
        }
        let text_lines = produced.len();

        for span in root.children_named("tspan") {
            offset += span_advance(span, font_size_pt);
            let mut element = line_element(root, &style, &matrix, font_size_pt, offset);
            element.children.push(clean_span(span));
            if let Some(tail) = span.tail.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                element.children.push(Element::new(span.name.as_str()).with_text(tail));
            }
            produced.push(element);
        }

        debug!(
            text_lines,
            span_lines = produced.len() - text_lines,
            font_size_pt,
            line_height_pt,
            writing_mode = style.writing_mode.as_str(),
            "split text shape"
        );
        Ok(produced)
    }

    /// Local position of the first line [`Splitter::split_element`] would
    /// produce, or `None` when the shape has no lines.
    pub fn first_line_position(&self, root: &Element) -> Result<Option<(f64, f64)>> {
        let metrics = self.metrics(root)?;
        let has_text_line = root
            .text
            .as_deref()
            .is_some_and(|text| text.split(LINE_BREAKS).any(|l| !l.trim().is_empty()));
        let advance = if has_text_line {
            Some(metrics.line_height_pt)
        } else {
            root.children_named("tspan")
                .next()
                .map(|span| span_advance(span, metrics.font_size_pt))
        };
        Ok(advance.map(|offset| metrics.style.writing_mode.position(offset)))
    }

    fn metrics(&self, root: &Element) -> Result<Metrics> {
        let style = ResolvedStyle::resolve(root, &self.defaults);
        let base_pt = units::convert_to_pt(
            self.defaults.font_size,
            &self.defaults.font_unit,
            DEFAULT_FONT_SIZE_PT,
        )?;
        let font_size_pt = style.font_size_pt(base_pt)?;
        let line_height_pt = style.line_height_pt(font_size_pt)?;
        Ok(Metrics {
            style,
            font_size_pt,
            line_height_pt,
        })
    }
}

struct Metrics {
    style: ResolvedStyle,
    font_size_pt: f64,
    line_height_pt: f64,
}

/// Split `markup` with the default 12pt font size.
pub fn split(markup: &str, transform: &Affine) -> Result<Vec<String>> {
    Splitter::default().split(markup, transform)
}

fn line_element(
    root: &Element,
    style: &ResolvedStyle,
    matrix: &str,
    font_size: f64,
    offset: f64,
) -> Element {
    let (x, y) = style.writing_mode.position(offset);
    let mut element = style.element(&root.name);
    element.set_attr("transform", matrix);
    element.set_attr("font-size", svg_number(font_size));
    element.set_attr("x", svg_number(x));
    element.set_attr("y", svg_number(y));
    element
}

/// Offset increment for a span: its leading `dy` value, else the font size.
fn span_advance(span: &Element, font_size_pt: f64) -> f64 {
    span.attr("dy")
        .and_then(|dy| dy.split(|c: char| c.is_whitespace() || c == ',').find(|s| !s.is_empty()))
        .and_then(|first| units::parse_length(first).ok())
        .and_then(|len| {
            if len.unit.is_empty() {
                Some(len.value)
            } else {
                len.to_pt(font_size_pt).ok()
            }
        })
        .filter(|v| v.is_finite())
        .unwrap_or(font_size_pt)
}

/// Copy of a span without position attributes or trailing line breaks.
///
/// The span's own tail is dropped; the caller re-emits it as a sibling.
fn clean_span(span: &Element) -> Element {
    let mut cleaned = trim_line_breaks(span.without_attributes(&POSITION_ATTRIBUTES));
    cleaned.tail = None;
    cleaned
}

fn trim_line_breaks(mut element: Element) -> Element {
    element.text = element.text.map(trim_trailing_breaks);
    element.tail = element.tail.map(trim_trailing_breaks);
    element.children = element.children.into_iter().map(trim_line_breaks).collect();
    element
}

fn trim_trailing_breaks(text: String) -> String {
    text.trim_end_matches(LINE_BREAKS).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(fragments: &[String]) -> Vec<Element> {
        fragments
            .iter()
            .map(|f| markup::parse_fragment(f).unwrap())
            .collect()
    }

    fn num(el: &Element, attr: &str) -> f64 {
        el.attr(attr).unwrap().parse().unwrap()
    }

    #[test]
    fn direct_text_lines_advance_by_line_height() {
        let out = split("<text line-height=\"10\">a\n  b  \n\n c\n</text>", &Affine::IDENTITY).unwrap();
        let els = parsed(&out);
        assert_eq!(els.len(), 3);
        let ys: Vec<f64> = els.iter().map(|e| num(e, "y")).collect();
        assert_eq!(ys, vec![10.0, 20.0, 30.0]);
        assert_eq!(els[1].text.as_deref(), Some("b"));
        assert!(els.iter().all(|e| e.attr("x") == Some("0")));
        assert!(els.iter().all(|e| e.attr("font-size") == Some("10")));
    }

    #[test]
    fn spans_advance_by_dy_or_font_size() {
        let out = split(
            r#"<text><tspan dy="5">Hi</tspan><tspan>Bye</tspan><tspan dy="2.5">!</tspan></text>"#,
            &Affine::IDENTITY,
        )
        .unwrap();
        let els = parsed(&out);
        let ys: Vec<f64> = els.iter().map(|e| num(e, "y")).collect();
        assert_eq!(ys, vec![5.0, 17.0, 19.5]);
        assert!(els.iter().all(|e| e.attr("font-size") == Some("12")));
    }

    #[test]
    fn dy_with_unit_or_list_uses_first_value() {
        let root = markup::parse_fragment(
            r#"<text><tspan dy="1in">a</tspan><tspan dy="3 4 5">b</tspan><tspan dy="oops">c</tspan></text>"#,
        )
        .unwrap();
        let els = Splitter::default().split_element(&root, &Affine::IDENTITY).unwrap();
        let ys: Vec<f64> = els.iter().map(|e| num(e, "y")).collect();
        assert_eq!(ys, vec![72.0, 75.0, 87.0]);
    }

    #[test]
    fn text_lines_come_before_spans() {
        let out = split(
            "<text>one\ntwo<tspan>three</tspan></text>",
            &Affine::IDENTITY,
        )
        .unwrap();
        let els = parsed(&out);
        assert_eq!(els.len(), 3);
        assert_eq!(els[0].text.as_deref(), Some("one"));
        assert_eq!(els[1].text.as_deref(), Some("two"));
        assert_eq!(els[2].children[0].text.as_deref(), Some("three"));
        assert_eq!(num(&els[2], "y"), 36.0);
    }

    #[test]
    fn non_span_children_are_ignored() {
        let out = split("<text><title>t</title><tspan>a</tspan></text>", &Affine::IDENTITY).unwrap();
        assert_eq!(out.len(), 1);
        assert!(!out[0].contains("title"));
    }

    #[test]
    fn transform_is_baked_into_every_fragment() {
        let t = Affine::new([1.0, 0.0, 0.0, 1.0, 100.0, 50.5]);
        let out = split("<text>a\nb<tspan>c</tspan></text>", &t).unwrap();
        assert_eq!(out.len(), 3);
        for frag in &out {
            assert!(frag.contains(r#"transform="matrix(1 0 0 1 100 50.5)""#), "{frag}");
        }
    }

    #[test]
    fn source_transform_and_position_are_overridden() {
        let out = split(
            r#"<text id="s" transform="translate(9 9)" x="4" y="4" fill="blue">a</text>"#,
            &Affine::IDENTITY,
        )
        .unwrap();
        let el = markup::parse_fragment(&out[0]).unwrap();
        assert_eq!(el.attr("id"), Some("s"));
        assert_eq!(el.attr("fill"), Some("blue"));
        assert_eq!(el.attr("transform"), Some("matrix(1 0 0 1 0 0)"));
        assert_eq!(el.attr("x"), Some("0"));
        assert_eq!(el.attr("y"), Some("12"));
    }

    #[test]
    fn vertical_modes_move_along_x() {
        let rl = split("<text writing-mode=\"vertical-rl\">a\nb</text>", &Affine::IDENTITY).unwrap();
        let rl = parsed(&rl);
        assert_eq!(num(&rl[0], "x"), -12.0);
        assert_eq!(num(&rl[1], "x"), -24.0);
        assert!(rl.iter().all(|e| e.attr("y") == Some("0")));

        let lr = split(r#"<text writing-mode="vertical-lr"><tspan>a</tspan></text>"#, &Affine::IDENTITY).unwrap();
        assert_eq!(num(&parsed(&lr)[0], "x"), 12.0);
    }

    #[test]
    fn cleaned_span_drops_positions_at_every_depth() {
        let out = split(
            r#"<text><tspan x="0" y="1" dy="3" fill="red">a<tspan x="2" dy="1" style="font-weight:bold">b</tspan>c</tspan></text>"#,
            &Affine::IDENTITY,
        )
        .unwrap();
        let el = markup::parse_fragment(&out[0]).unwrap();
        let span = &el.children[0];
        assert_eq!(span.attributes().collect::<Vec<_>>(), vec![("fill", "red")]);
        let inner = &span.children[0];
        assert_eq!(
            inner.attributes().collect::<Vec<_>>(),
            vec![("style", "font-weight:bold")]
        );
        assert_eq!(inner.tail.as_deref(), Some("c"));
    }

    #[test]
    fn trailing_line_breaks_are_stripped_from_span_text() {
        let out = split(
            "<text><tspan>a\n<tspan>b\r\n</tspan>c\n</tspan></text>",
            &Affine::IDENTITY,
        )
        .unwrap();
        assert_eq!(
            out[0],
            r#"<text transform="matrix(1 0 0 1 0 0)" font-size="12" x="0" y="12"><tspan>a<tspan>b</tspan>c</tspan></text>"#
        );
    }

    #[test]
    fn span_tail_becomes_a_sibling_span() {
        let out = split(
            "<text><tspan>a</tspan>  tail text \n<tspan>b</tspan>\n</text>",
            &Affine::IDENTITY,
        )
        .unwrap();
        let els = parsed(&out);
        assert_eq!(els[0].children.len(), 2);
        assert_eq!(els[0].children[0].tail, None);
        assert_eq!(els[0].children[1].name, "tspan");
        assert_eq!(els[0].children[1].text.as_deref(), Some("tail text"));
        assert!(els[0].children[1].attributes().next().is_none());
        // whitespace-only tails add nothing
        assert_eq!(els[1].children.len(), 1);
    }

    #[test]
    fn first_line_position_matches_split_output() {
        let splitter = Splitter::default();
        for markup in [
            "<text style=\"font-size:10pt\">a\nb</text>",
            "<text><tspan dy=\"7\">a</tspan><tspan>b</tspan></text>",
            "<text writing-mode=\"vertical-rl\">a\nb</text>",
        ] {
            let root = markup::parse_fragment(markup).unwrap();
            let first = &splitter.split_element(&root, &Affine::IDENTITY).unwrap()[0];
            let (x, y) = splitter.first_line_position(&root).unwrap().unwrap();
            assert_eq!((num(first, "x"), num(first, "y")), (x, y), "{markup}");
        }

        let empty = markup::parse_fragment("<text/>").unwrap();
        assert_eq!(splitter.first_line_position(&empty).unwrap(), None);
    }

    #[test]
    fn carriage_returns_break_lines() {
        let els = parsed(&split("<text>a\rb\r\nc</text>", &Affine::IDENTITY).unwrap());
        let lines: Vec<_> = els.iter().map(|e| e.text.as_deref().unwrap()).collect();
        assert_eq!(lines, vec!["a", "b", "c"]);
        assert_eq!(num(&els[2], "y"), 36.0);
    }

    #[test]
    fn empty_shape_produces_nothing() {
        assert!(split("<text/>", &Affine::IDENTITY).unwrap().is_empty());
        assert!(split("<text>\n  \n</text>", &Affine::IDENTITY).unwrap().is_empty());
    }

    #[test]
    fn malformed_markup_is_reported() {
        assert!(matches!(
            split("<text><unterminated", &Affine::IDENTITY),
            Err(SplitError::MalformedMarkup(_))
        ));
    }

    #[test]
    fn unknown_font_unit_is_reported() {
        assert!(matches!(
            split(r#"<text style="font-size:4furlongs">a</text>"#, &Affine::IDENTITY),
            Err(SplitError::Unit(UnitError::InvalidUnit(_)))
        ));
    }

    #[test]
    fn custom_defaults_apply() {
        let splitter = Splitter::new(StyleDefaults {
            font_size: 10.0,
            font_unit: "mm".to_string(),
        });
        let out = splitter.split("<text><tspan>a</tspan></text>", &Affine::IDENTITY).unwrap();
        assert!(out[0].contains(r#"font-size="28.3465""#), "{}", out[0]);
    }
}
