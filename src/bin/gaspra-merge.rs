use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::{Parser, ValueEnum};
use gaspra::markup::{self, MarkupStyle};
use gaspra::{characters, has_conflict, merge, LineInterner, Segment};
use log::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Merge two descendants of a common ancestor file.
///
/// Prints the merged result; remaining conflicts are wrapped in git-style
/// markers (or highlighted inline when color is on) and make the exit code
/// non-zero.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    ancestor: PathBuf,
    file_a: PathBuf,
    file_b: PathBuf,

    /// Strip trailing newlines before comparison
    #[arg(short = 's', long)]
    strip: bool,

    /// Merge line by line rather than character by character
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

fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialise tracing")?;

    let args = Args::parse();

    let mut ancestor = read(&args.ancestor)?;
    let mut version_a = read(&args.file_a)?;
    let mut version_b = read(&args.file_b)?;

    if args.strip {
        for text in [&mut ancestor, &mut version_a, &mut version_b] {
            strip_trailing_newlines(text);
        }
    }

    let stream: Vec<Segment<char>> = if args.line_oriented {
        let mut interner = LineInterner::new();
        let ancestor_tokens = interner.tokenize(&ancestor);
        let a_tokens = interner.tokenize(&version_a);
        let b_tokens = interner.tokenize(&version_b);
        merge(&ancestor_tokens, &a_tokens, &b_tokens)?
            .into_iter()
            .map(|segment| segment.map(|tokens| interner.restore(&tokens).chars().collect()))
            .collect()
    } else {
        merge(
            &characters(&ancestor),
            &characters(&version_a),
            &characters(&version_b),
        )?
    };
    debug!("merge produced {} segments", stream.len());

    let conflicted = has_conflict(&stream);
    if conflicted {
        info!("merge left unresolved conflicts");
    }

    if args.color.use_colors() {
        let style: &MarkupStyle = &markup::COLOR;
        print!("{}", markup::format_merge_inline(&stream, style));
    } else {
        print!(
            "{}",
            markup::format_merge_marked(
                &stream,
                &args.file_a.display().to_string(),
                &args.file_b.display().to_string(),
            )
        );
    }

    Ok(if conflicted {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn strip_trailing_newlines(text: &mut String) {
    while text.ends_with('\n') || text.ends_with('\r') {
        text.pop();
    }
}
