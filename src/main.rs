//! `tsplit` CLI - Split multi-line SVG text shapes into single-line shapes

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "tsplit")]
#[command(about = "Split multi-line SVG text shapes into single-line text shapes")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/tsplit/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// How reports and fragments are printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Split the text shapes of an SVG document
    Split {
        /// SVG document to read
        input: PathBuf,

        /// Write the document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only split shapes with this id (repeatable; default: all text shapes)
        #[arg(long = "id", value_name = "ID")]
        ids: Vec<String>,

        /// Report format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Split a single text fragment and print one fragment per line
    Fragment {
        /// File holding the fragment ("-" or omitted for stdin)
        input: Option<PathBuf>,

        /// Absolute transform of the shape, in SVG transform syntax
        #[arg(short, long, default_value = "matrix(1 0 0 1 0 0)")]
        transform: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Convert a length such as 12mm to points or another unit
    Convert {
        /// Length with unit, e.g. 12mm, 1.5em, 150%
        #[arg(allow_hyphen_values = true)]
        length: String,

        /// Base font size in points for em, ex, % and lines
        #[arg(long, default_value_t = 12.0)]
        base: f64,

        /// Target unit
        #[arg(long, default_value = "pt")]
        to: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = tsplit::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Split {
            input,
            output,
            ids,
            format,
        } => {
            cmd::split::cmd_split(&input, output.as_deref(), &ids, format, &config)?;
        }
        Commands::Fragment {
            input,
            transform,
            format,
        } => {
            cmd::fragment::cmd_fragment(input.as_deref(), &transform, format, &config)?;
        }
        Commands::Convert { length, base, to } => {
            cmd::convert::cmd_convert(&length, base, &to)?;
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the flag-derived level.
fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
