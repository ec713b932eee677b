use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::debug;

use tsplit::host::LogNotifier;
use tsplit::{split_selection, BatchReport, Config, SvgFileLayer, SPLIT_ACTION};

use crate::OutputFormat;

pub fn cmd_split(
    input: &Path,
    output: Option<&Path>,
    ids: &[String],
    format: OutputFormat,
    config: &Config,
) -> Result<()> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let mut layer = SvgFileLayer::parse(&source)
        .with_context(|| format!("failed to load {}", input.display()))?
        .with_style_defaults(config.style_defaults());
    if !ids.is_empty() {
        layer.select_ids(ids.iter().cloned());
    }

    let page = layer.page_size();
    debug!(action = SPLIT_ACTION.id, shapes = layer.shape_count(), "{}", SPLIT_ACTION.label);
    let report = split_selection(&mut layer, page, &LogNotifier, config);
    let svg = layer.to_svg()?;

    // The document owns stdout unless it goes to a file.
    match output {
        Some(path) => {
            fs::write(path, &svg)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("{}", render_report(&report, format)?);
            if format == OutputFormat::Text {
                println!("💾 Saved {} bytes to {}", svg.len(), path.display());
            }
        }
        None => {
            print!("{svg}");
            eprintln!("{}", render_report(&report, format)?);
        }
    }

    if !report.failed.is_empty() {
        bail!("{} shapes could not be replaced", report.failed.len());
    }
    Ok(())
}

fn render_report(report: &BatchReport, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(report)?);
    }

    let mut lines = Vec::new();
    for shape in &report.split {
        lines.push(format!("✂️  {}: {} lines", shape.name, shape.fragments));
    }
    for shape in &report.skipped {
        lines.push(format!("⚠️  {}: {}", shape.name, shape.reason));
    }
    for shape in &report.failed {
        lines.push(format!("❌ {}: {}", shape.name, shape.reason));
    }
    lines.push(format!(
        "({} shapes split into {} lines, {} skipped)",
        report.split.len(),
        report.fragment_count(),
        report.skipped.len()
    ));
    Ok(lines.join("\n"))
}
