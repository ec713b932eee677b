//! `tsplit` - Split multi-line SVG text shapes into single-line shapes
//!
//! # Features
//!
//! - **Line splitting**: one `<text>` per line of direct text or per `<tspan>`
//! - **Baked placement**: every produced line carries the shape's absolute
//!   transform, so it renders where the original line was drawn
//! - **Unit handling**: `pt`, `px`, `mm`, `cm`, `Q`, `in`, `pc`, `em`, `ex`,
//!   `%` and `lines` font sizes and line heights
//! - **Writing modes**: `horizontal-tb`, `vertical-rl`, `vertical-lr`
//! - **Host adapter**: a batch action over any [`host::ShapeLayer`], with a
//!   file-backed layer for standalone SVG documents
//!
//! # Example
//!
//! ```rust
//! use kurbo::Affine;
//! use tsplit::Splitter;
//!
//! let splitter = Splitter::default();
//! let lines = splitter
//!     .split("<text style=\"font-size:10pt\">Hello\nWorld</text>", &Affine::IDENTITY)
//!     .unwrap();
//! assert_eq!(lines.len(), 2);
//! assert!(lines[0].contains("Hello"));
//! ```

pub mod config;
pub mod host;
pub mod markup;
pub mod split;
pub mod transform;
pub mod units;

pub use config::{load_config, Config, NoticeConfig};
pub use host::{split_selection, BatchReport, ShapeLayer, SvgFileLayer, SPLIT_ACTION};
pub use markup::{parse_fragment, Element, MarkupError};
pub use split::{split, ResolvedStyle, SplitError, Splitter, StyleDefaults, WritingMode};
pub use units::{convert_from_pt, convert_to_pt, resolve, Length, Unit, UnitError};

/// Version of tsplit
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
