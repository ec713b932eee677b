use anyhow::Result;

use tsplit::transform::svg_number;
use tsplit::units::{self, Unit};

pub fn cmd_convert(length: &str, base: f64, to: &str) -> Result<()> {
    let target: Unit = to.parse()?;
    let pt = units::parse_length(length)?.to_pt(base)?;
    let value = units::convert_from_pt(pt, to, base)?;

    println!("{}{target}", svg_number(value));
    Ok(())
}
