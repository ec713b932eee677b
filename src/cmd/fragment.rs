use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};

use tsplit::transform::parse_transform_list;
use tsplit::{Config, Splitter};

use crate::OutputFormat;

pub fn cmd_fragment(
    input: Option<&Path>,
    transform: &str,
    format: OutputFormat,
    config: &Config,
) -> Result<()> {
    let markup = read_input(input)?;
    let transform = parse_transform_list(transform).context("invalid --transform")?;

    let fragments = Splitter::new(config.style_defaults()).split(markup.trim(), &transform)?;

    match format {
        OutputFormat::Text => {
            for fragment in &fragments {
                println!("{fragment}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&fragments)?),
    }

    Ok(())
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}
