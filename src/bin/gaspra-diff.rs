use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, ValueEnum};
use gaspra::markup::{self, MarkupStyle};
use gaspra::{characters, diff, LineInterner, Segment};
use log::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Print the change stream between two files.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    file1: PathBuf,
    file2: PathBuf,

    /// Strip trailing newlines before comparison
    #[arg(short = 's', long)]
    strip: bool,

    /// Compare line by line rather than character by character
    #[arg(short = 'd', long)]
    line_oriented: bool,

    #[arg(long, value_enum, default_value_t = ColorWhen::Auto)]
    color: ColorWhen,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum ColorWhen {
    Always,
    Auto,
    Never,
}

impl ColorWhen {
    fn use_colors(self) -> bool {
        match self {
            ColorWhen::Always => true,
            ColorWhen::Auto => {
                std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
            }
            ColorWhen::Never => false,
        }
    }
}

impl std::fmt::Display for ColorWhen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_possible_value()
            .expect("no values are skipped")
            .get_name()
            .fmt(f)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialise tracing")?;

    let args = Args::parse();

    let mut original = fs::read_to_string(&args.file1)
        .with_context(|| format!("Failed to read {}", args.file1.display()))?;
    let mut modified = fs::read_to_string(&args.file2)
        .with_context(|| format!("Failed to read {}", args.file2.display()))?;

    if args.strip {
        strip_trailing_newlines(&mut original);
        strip_trailing_newlines(&mut modified);
    }

    let stream: Vec<Segment<char>> = if args.line_oriented {
        let mut interner = LineInterner::new();
        let original_tokens = interner.tokenize(&original);
        let modified_tokens = interner.tokenize(&modified);
        diff(&original_tokens, &modified_tokens)?
            .into_iter()
            .map(|segment| segment.map(|tokens| interner.restore(&tokens).chars().collect()))
            .collect()
    } else {
        diff(&characters(&original), &characters(&modified))?
    };
    debug!("diff produced {} segments", stream.len());

    let style: &MarkupStyle = if args.color.use_colors() {
        &markup::COLOR
    } else {
        &markup::PLAIN
    };
    print!("{}", markup::format_diff(&stream, style));

    Ok(())
}

fn strip_trailing_newlines(text: &mut String) {
    while text.ends_with('\n') || text.ends_with('\r') {
        text.pop();
    }
}
