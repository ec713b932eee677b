//! End-to-end splitting scenarios through the public API.

use kurbo::Affine;
use tsplit::host::{LogNotifier, ShapeLayer};
use tsplit::transform::parse_transform_list;
use tsplit::{parse_fragment, split, split_selection, Config, SplitError, SvgFileLayer};

fn attr_f64(fragment: &str, name: &str) -> f64 {
    parse_fragment(fragment)
        .unwrap()
        .attr(name)
        .unwrap_or_else(|| panic!("missing {name} in {fragment}"))
        .parse()
        .unwrap()
}

#[test]
fn pixel_font_size_gives_two_evenly_spaced_lines() {
    let out = split(
        "<text style=\"font-size:14px\">Line A\nLine B</text>",
        &Affine::IDENTITY,
    )
    .unwrap();

    assert_eq!(out.len(), 2);
    for fragment in &out {
        assert_eq!(attr_f64(fragment, "font-size"), 14.0);
    }
    let first = attr_f64(&out[0], "y");
    let second = attr_f64(&out[1], "y");
    assert!(first > 0.0);
    assert!((second - 2.0 * first).abs() < 1e-9);
}

#[test]
fn span_offsets_accumulate_dy_then_font_size() {
    let out = split(
        r#"<text style="font-size:12pt"><tspan dy="5">Hi</tspan><tspan>Bye</tspan></text>"#,
        &Affine::IDENTITY,
    )
    .unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(attr_f64(&out[0], "y"), 5.0);
    assert_eq!(attr_f64(&out[1], "y"), 17.0);
    assert!(out[0].contains(">Hi</tspan>"));
    assert!(out[1].contains(">Bye</tspan>"));
}

#[test]
fn malformed_fragment_signals_error() {
    let err = split("<text><unterminated", &Affine::IDENTITY).unwrap_err();
    assert!(matches!(err, SplitError::MalformedMarkup(_)), "{err}");
}

#[test]
fn every_fragment_is_standalone_markup() {
    let out = split(
        "<text fill=\"red\">one &amp; two\n<b>x</b><tspan>three</tspan></text>",
        &Affine::IDENTITY,
    )
    .unwrap();
    assert!(!out.is_empty());
    for fragment in &out {
        let el = parse_fragment(fragment).unwrap();
        assert_eq!(el.name, "text");
        assert_eq!(el.attr("fill"), Some("red"));
    }
}

#[test]
fn transform_composition_is_baked() {
    let transform = parse_transform_list("translate(10 20) scale(2)").unwrap();
    let out = split("<text>a</text>", &transform).unwrap();
    assert!(out[0].contains(r#"transform="matrix(2 0 0 2 10 20)""#), "{}", out[0]);
}

#[test]
fn malformed_shape_is_left_in_the_document() {
    // An unknown font unit fails only that shape.
    let doc = r#"<svg width="100" height="100">
  <text id="good">a
b</text>
  <text id="bad" style="font-size:3parsecs">c
d</text>
</svg>"#;
    let mut layer = SvgFileLayer::parse(doc).unwrap();
    let page = layer.page_size();
    let report = split_selection(&mut layer, page, &LogNotifier, &Config::default());

    assert_eq!(report.split.len(), 1);
    assert_eq!(report.split[0].name, "good");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].name, "bad");

    let svg = layer.to_svg().unwrap();
    assert!(svg.contains("3parsecs"));
    assert!(svg.contains(">a</text>"));
    assert!(svg.contains(">b</text>"));
    assert!(layer.is_vector_layer());
}
