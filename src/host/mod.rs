//! Host application adapter.
//!
//! The splitter itself never touches a host document. This module describes
//! the narrow surface it needs from one ([`ShapeLayer`], [`Notifier`]) and
//! runs the menu action over a layer's selection with [`split_selection`].
//!
//! The action computes every replacement before it touches the layer. A shape
//! is removed only once its fragments exist, and a shape that fails to split
//! is skipped and left in place without aborting the rest of the batch.

pub mod svg_file;

use std::time::Duration;

use anyhow::Result;
use kurbo::Affine;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::split::Splitter;
use crate::transform::svg_number;

pub use svg_file::SvgFileLayer;

/// Shape kind reported by the host for vector text shapes.
pub const TEXT_SHAPE_KIND: &str = "KoSvgTextShapeID";

/// A user-triggerable host action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub id: &'static str,
    pub label: &'static str,
    pub menu: &'static str,
}

/// The split action as registered in the host's scripts menu.
pub const SPLIT_ACTION: Action = Action {
    id: "split_text",
    label: "Split the multi line text",
    menu: "tools/scripts",
};

/// Host-side handle of a shape within a layer.
pub type ShapeId = usize;

/// What the host reports about one selected shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeSnapshot {
    pub id: ShapeId,
    pub kind: String,
    pub name: String,
    /// Single-rooted serialized markup of the shape, in local coordinates.
    pub svg: String,
    /// Placement of the shape in the document.
    pub transform: Affine,
}

/// The active layer of the host document.
pub trait ShapeLayer {
    /// Whether the layer holds vector shapes at all.
    fn is_vector_layer(&self) -> bool;

    /// Currently selected shapes, front to back.
    fn selected_shapes(&self) -> Vec<ShapeSnapshot>;

    /// Destroy a shape in the host document.
    fn remove_shape(&mut self, id: ShapeId) -> Result<()>;

    /// Insert the shapes of a full SVG document into the layer.
    fn add_shapes_from_svg(&mut self, svg: &str) -> Result<()>;
}

/// A transient on-screen message.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice<'a> {
    pub message: &'a str,
    pub dismiss_after: Duration,
}

/// Shows user feedback.
pub trait Notifier {
    fn notify(&self, notice: &Notice<'_>);
}

/// Notifier for headless use: notices go to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice<'_>) {
        info!(dismiss_after = ?notice.dismiss_after, "{}", notice.message);
    }
}

/// Size of the host document page in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageSize {
    pub width_px: f64,
    pub height_px: f64,
}

/// Wrap produced fragments in a page-sized SVG document.
///
/// The page is expressed in points by multiplying its pixel size by `scale`.
#[must_use]
pub fn svg_envelope(fragments: &[String], page: PageSize, scale: f64) -> String {
    let w = svg_number(page.width_px * scale);
    let h = svg_number(page.height_px * scale);
    format!(
        r#"<svg width="{w}pt" height="{h}pt" viewBox="0 0 {w} {h}">{}</svg>"#,
        fragments.join("\n")
    )
}

/// A shape replaced by split fragments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitShape {
    pub name: String,
    pub fragments: usize,
}

/// A shape left untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedShape {
    pub name: String,
    pub reason: String,
}

/// Outcome of one run of the split action.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub split: Vec<SplitShape>,
    pub skipped: Vec<SkippedShape>,
    /// Shapes the host refused to remove or whose lines it refused to insert.
    pub failed: Vec<SkippedShape>,
}

impl BatchReport {
    #[must_use]
    pub fn fragment_count(&self) -> usize {
        self.split.iter().map(|s| s.fragments).sum()
    }
}

/// Run the split action over the selection of `layer`.
///
/// Does nothing unless the layer is a vector layer. Only shapes of kind
/// [`TEXT_SHAPE_KIND`] are considered.
///
/// Shapes that fail to split are reported in [`BatchReport::skipped`] and left
/// in place. Host refusals end up in [`BatchReport::failed`]; the remaining
/// shapes are still processed.
pub fn split_selection<L>(
    layer: &mut L,
    page: PageSize,
    notifier: &dyn Notifier,
    config: &Config,
) -> BatchReport
where
    L: ShapeLayer + ?Sized,
{
    let mut report = BatchReport::default();
    if !layer.is_vector_layer() {
        info!("active layer is not a vector layer, nothing to split");
        return report;
    }

    let splitter = Splitter::new(config.style_defaults());
    let mut pending = Vec::new();

    for shape in layer.selected_shapes() {
        if shape.kind != TEXT_SHAPE_KIND {
            debug!(shape = %shape.name, kind = %shape.kind, "not a text shape");
            continue;
        }
        match splitter.split(&shape.svg, &shape.transform) {
            Ok(fragments) if fragments.is_empty() => {
                debug!(shape = %shape.name, "no lines to split");
                report.skipped.push(SkippedShape {
                    name: shape.name,
                    reason: "no lines to split".to_string(),
                });
            }
            Ok(fragments) => pending.push((shape, fragments)),
            Err(err) => {
                warn!(shape = %shape.name, error = %err, "skipping shape");
                report.skipped.push(SkippedShape {
                    name: shape.name,
                    reason: err.to_string(),
                });
            }
        }
    }

    for (shape, fragments) in pending {
        if let Err(err) = layer.remove_shape(shape.id) {
            let reason = format!("{:#}", err.context("failed to remove shape"));
            warn!(shape = %shape.name, error = %reason, "host refused removal, shape kept");
            report.failed.push(SkippedShape {
                name: shape.name,
                reason,
            });
            continue;
        }
        let envelope = svg_envelope(&fragments, page, config.page_scale);
        if let Err(err) = layer.add_shapes_from_svg(&envelope) {
            let reason = format!("{:#}", err.context("failed to insert lines"));
            error!(shape = %shape.name, error = %reason, "shape was removed but its lines were not inserted");
            report.failed.push(SkippedShape {
                name: shape.name,
                reason,
            });
            continue;
        }
        report.split.push(SplitShape {
            name: shape.name,
            fragments: fragments.len(),
        });
    }

    if !report.split.is_empty() {
        notifier.notify(&Notice {
            message: &config.notice.message,
            dismiss_after: config.notice.dismiss_after(),
        });
    }

    info!(
        split = report.split.len(),
        fragments = report.fragment_count(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "split action finished"
    );
    report
}
