//! A [`ShapeLayer`] backed by a standalone SVG document.
//!
//! Shapes are the drawable elements directly under the root `<svg>` or under
//! nested `<g>` groups. A shape's absolute transform is the composition of its
//! ancestors' and its own `transform` attributes; its serialized form omits
//! its own `transform`, which travels separately as the absolute transform.
//!
//! A text shape positioned with `x`/`y` gets that position folded into its
//! transform, offset so its first produced line lands on the source baseline.
//!
//! Removal and insertion are recorded and applied when the document is
//! written back with [`SvgFileLayer::to_svg`]. Inserted elements whose `id`
//! is already used in the document get a numbered suffix.

use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use kurbo::Affine;
use tracing::{debug, warn};

use super::{PageSize, ShapeId, ShapeLayer, ShapeSnapshot, TEXT_SHAPE_KIND};
use crate::markup::{parse_fragment, Element};
use crate::split::{Splitter, StyleDefaults};
use crate::transform::parse_transform_list;
use crate::units;

const DRAWABLE: [&str; 9] = [
    "text", "rect", "circle", "ellipse", "line", "polyline", "polygon", "path", "image",
];

#[derive(Debug, Clone)]
struct ShapeEntry {
    /// Child indices from the root down to the shape.
    path: Vec<usize>,
    transform: Affine,
}

/// An SVG document exposed as a single vector layer.
#[derive(Debug, Clone)]
pub struct SvgFileLayer {
    root: Element,
    shapes: Vec<ShapeEntry>,
    selection: Option<HashSet<String>>,
    removed: HashSet<ShapeId>,
    added: Vec<Element>,
    defaults: StyleDefaults,
}

impl SvgFileLayer {
    /// Parse an SVG document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not well-formed, its root is not
    /// `<svg>`, or a group or shape carries an unparsable `transform`.
    pub fn parse(svg: &str) -> Result<Self> {
        let root = parse_fragment(svg).context("failed to parse SVG document")?;
        if !root.is("svg") {
            bail!("root element is <{}>, expected <svg>", root.name);
        }

        let mut shapes = Vec::new();
        collect_shapes(&root, &mut Vec::new(), Affine::IDENTITY, &mut shapes)?;
        debug!(shapes = shapes.len(), "loaded SVG document");

        Ok(Self {
            root,
            shapes,
            selection: None,
            removed: HashSet::new(),
            added: Vec::new(),
            defaults: StyleDefaults::default(),
        })
    }

    /// Style defaults used to place the first line of positioned text.
    #[must_use]
    pub fn with_style_defaults(mut self, defaults: StyleDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Restrict the selection to shapes with these `id`s.
    ///
    /// Without a selection every shape is selected.
    pub fn select_ids<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection = Some(ids.into_iter().map(Into::into).collect());
    }

    /// Number of shapes found in the document.
    #[must_use]
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Page size from the root `width`/`height`, falling back to the `viewBox`.
    #[must_use]
    pub fn page_size(&self) -> PageSize {
        let dimension = |name: &str, view_box_idx: usize| {
            self.root
                .attr(name)
                .and_then(length_px)
                .or_else(|| view_box(&self.root).map(|vb| vb[view_box_idx]))
        };

        match (dimension("width", 2), dimension("height", 3)) {
            (Some(width_px), Some(height_px)) => PageSize {
                width_px,
                height_px,
            },
            _ => {
                warn!("document has no usable width/height or viewBox");
                PageSize::default()
            }
        }
    }

    /// Serialize the document with all recorded removals and insertions applied.
    pub fn to_svg(&self) -> Result<String> {
        let mut root = self.rebuild(&self.root, &mut Vec::new());
        if !self.added.is_empty() {
            root.append_text("\n");
        }
        for element in &self.added {
            let mut element = element.clone();
            element.tail = Some("\n".to_string());
            root.children.push(element);
        }
        let body = root.to_markup().context("failed to serialize SVG document")?;
        Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{body}\n"))
    }

    fn element_at(&self, path: &[usize]) -> Option<&Element> {
        path.iter()
            .try_fold(&self.root, |el, &idx| el.children.get(idx))
    }

    fn is_selected(&self, element: &Element) -> bool {
        match &self.selection {
            None => true,
            Some(ids) => element.attr("id").is_some_and(|id| ids.contains(id)),
        }
    }

    fn rebuild(&self, element: &Element, path: &mut Vec<usize>) -> Element {
        let mut copy = Element::new(element.name.as_str());
        for (key, value) in element.attributes() {
            copy.set_attr(key, value);
        }
        copy.text.clone_from(&element.text);
        copy.tail.clone_from(&element.tail);

        for (idx, child) in element.children.iter().enumerate() {
            path.push(idx);
            if self.is_removed(path) {
                // Keep the surrounding whitespace.
                if let Some(tail) = &child.tail {
                    copy.append_text(tail);
                }
            } else {
                copy.children.push(self.rebuild(child, path));
            }
            path.pop();
        }
        copy
    }

    /// Fold a text element's own `x`/`y` into its transform.
    fn anchored_transform(&self, element: &Element, transform: Affine) -> Affine {
        if !element.is("text") || (element.attr("x").is_none() && element.attr("y").is_none()) {
            return transform;
        }
        let x = element.attr("x").and_then(coordinate_px).unwrap_or(0.0);
        let y = element.attr("y").and_then(coordinate_px).unwrap_or(0.0);

        match Splitter::new(self.defaults.clone()).first_line_position(element) {
            Ok(Some((first_x, first_y))) => transform * Affine::translate((x - first_x, y - first_y)),
            Ok(None) => transform * Affine::translate((x, y)),
            // The split itself reports this error.
            Err(_) => transform,
        }
    }

    fn is_removed(&self, path: &[usize]) -> bool {
        self.removed
            .iter()
            .any(|&id| self.shapes.get(id).is_some_and(|s| s.path == path))
    }
}

impl ShapeLayer for SvgFileLayer {
    fn is_vector_layer(&self) -> bool {
        true
    }

    fn selected_shapes(&self) -> Vec<ShapeSnapshot> {
        self.shapes
            .iter()
            .enumerate()
            .filter(|(id, _)| !self.removed.contains(id))
            .filter_map(|(id, entry)| {
                let element = self.element_at(&entry.path)?;
                if !self.is_selected(element) {
                    return None;
                }
                let mut local = element.clone();
                local.remove_attr("transform");
                let svg = match local.to_markup() {
                    Ok(svg) => svg,
                    Err(err) => {
                        warn!(error = %err, "cannot serialize shape");
                        return None;
                    }
                };
                Some(ShapeSnapshot {
                    id,
                    kind: shape_kind(element),
                    name: element
                        .attr("id")
                        .map_or_else(|| format!("{}#{id}", element.local_name()), str::to_string),
                    svg,
                    transform: self.anchored_transform(element, entry.transform),
                })
            })
            .collect()
    }

    fn remove_shape(&mut self, id: ShapeId) -> Result<()> {
        if id >= self.shapes.len() {
            bail!("no shape with id {id}");
        }
        if !self.removed.insert(id) {
            bail!("shape {id} was already removed");
        }
        Ok(())
    }

    fn add_shapes_from_svg(&mut self, svg: &str) -> Result<()> {
        let envelope = parse_fragment(svg).context("invalid SVG passed to the layer")?;
        if !envelope.is("svg") {
            bail!("expected an <svg> document, got <{}>", envelope.name);
        }
        let mut taken = HashSet::new();
        collect_ids(&self.root, &mut taken);
        for element in &self.added {
            collect_ids(element, &mut taken);
        }
        for mut element in envelope.children {
            element.tail = None;
            assign_fresh_ids(&mut element, &mut taken);
            self.added.push(element);
        }
        Ok(())
    }
}

fn collect_shapes(
    element: &Element,
    path: &mut Vec<usize>,
    transform: Affine,
    shapes: &mut Vec<ShapeEntry>,
) -> Result<()> {
    for (idx, child) in element.children.iter().enumerate() {
        let is_group = child.is("g");
        if !is_group && !DRAWABLE.contains(&child.local_name()) {
            continue;
        }

        path.push(idx);
        let own = match child.attr("transform") {
            Some(list) => parse_transform_list(list)
                .with_context(|| format!("invalid transform on <{}>: {list:?}", child.name))?,
            None => Affine::IDENTITY,
        };
        let absolute = transform * own;
        if is_group {
            collect_shapes(child, path, absolute, shapes)?;
        } else {
            shapes.push(ShapeEntry {
                path: path.clone(),
                transform: absolute,
            });
        }
        path.pop();
    }
    Ok(())
}

fn shape_kind(element: &Element) -> String {
    if element.is("text") {
        TEXT_SHAPE_KIND.to_string()
    } else {
        element.local_name().to_string()
    }
}

/// A root dimension in pixels.
fn length_px(raw: &str) -> Option<f64> {
    coordinate_px(raw).filter(|v| *v > 0.0)
}

/// First value of a length or coordinate list, in pixels. Pixels and points
/// coincide in the unit table, so absolute units convert through points;
/// relative units are rejected.
fn coordinate_px(raw: &str) -> Option<f64> {
    let first = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .find(|s| !s.is_empty())?;
    let length = units::parse_length(first).ok()?;
    let unit = if length.unit.is_empty() { "px" } else { length.unit.as_str() };
    units::convert_to_pt(length.value, unit, f64::NAN)
        .ok()
        .filter(|v| v.is_finite())
}

fn collect_ids(element: &Element, ids: &mut HashSet<String>) {
    if let Some(id) = element.attr("id") {
        ids.insert(id.to_string());
    }
    for child in &element.children {
        collect_ids(child, ids);
    }
}

/// Rename `id`s already in `taken` to `{id}-{n}` with the lowest free `n`.
fn assign_fresh_ids(element: &mut Element, taken: &mut HashSet<String>) {
    if let Some(id) = element.attr("id").map(str::to_string) {
        let fresh = if taken.contains(&id) {
            (1..)
                .map(|n| format!("{id}-{n}"))
                .find(|candidate| !taken.contains(candidate))
                .unwrap_or(id)
        } else {
            id
        };
        element.set_attr("id", fresh.as_str());
        taken.insert(fresh);
    }
    for child in &mut element.children {
        assign_fresh_ids(child, taken);
    }
}

fn view_box(root: &Element) -> Option<[f64; 4]> {
    let values: Vec<f64> = root
        .attr("viewBox")?
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    <[f64; 4]>::try_from(values).ok()
}
