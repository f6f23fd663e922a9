use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};

use crate::materializer::{MaterializeOptions, DEFAULT_EXTENSION, DEFAULT_PLACEHOLDER};

/// What to do when a row cannot be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ErrorMode {
    /// Stop at the first failing row.
    #[default]
    Strict,
    /// Log the failure, skip the row and keep going.
    Lenient,
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Generate one MDX page per row of a CSV file.")]
pub struct Cli {
    /// CSV file to read; the first line names the columns.
    #[arg(short, long, env = "CSV_TO_MDX_INPUT", default_value = "games.csv")]
    pub input: PathBuf,
    /// Root directory for generated pages.
    #[arg(short, long, env = "CSV_TO_MDX_OUTPUT", default_value = "games")]
    pub output: PathBuf,
    #[arg(long, value_enum, env = "CSV_TO_MDX_MODE", default_value_t = ErrorMode::Strict)]
    pub mode: ErrorMode,
    /// Add a `game:` key to each header block.
    #[arg(long)]
    pub game_field: bool,
    /// Always leave `cover:` empty instead of copying the column.
    #[arg(long)]
    pub no_cover: bool,
    /// Body text for rows without `content`.
    #[arg(long, default_value = DEFAULT_PLACEHOLDER)]
    pub placeholder: String,
    /// Date stamped into every header (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub date: Option<String>,
    /// Resolve and render every row without writing anything.
    #[arg(long)]
    pub dry_run: bool,
    /// Write a JSON summary of the run to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub csv_path: PathBuf,
    pub output_root: PathBuf,
    pub mode: ErrorMode,
    pub dry_run: bool,
    pub report_path: Option<PathBuf>,
    pub options: MaterializeOptions,
}

impl Config {
    pub fn new(csv_path: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: csv_path.into(),
            output_root: output_root.into(),
            mode: ErrorMode::default(),
            dry_run: false,
            report_path: None,
            options: MaterializeOptions::default(),
        }
    }

    pub fn from_cli(cli: Cli) -> Result<Self> {
        let date = cli
            .date
            .as_deref()
            .map(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .with_context(|| format!("Invalid --date {:?}, expected YYYY-MM-DD", d))
            })
            .transpose()?;

        Ok(Self {
            csv_path: cli.input,
            output_root: cli.output,
            mode: cli.mode,
            dry_run: cli.dry_run,
            report_path: cli.report,
            options: MaterializeOptions {
                include_game_field: cli.game_field,
                passthrough_cover: !cli.no_cover,
                placeholder: cli.placeholder,
                extension: DEFAULT_EXTENSION.to_string(),
                date,
            },
        })
    }
}
