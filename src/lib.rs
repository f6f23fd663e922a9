//! Turn the rows of a CSV file into MDX pages, one file per row, grouped
//! into per-category directories.

pub mod config;
pub mod csv_processor;
pub mod error;
pub mod materializer;
pub mod models;
pub mod utils;

pub use config::{Cli, Config, ErrorMode};
pub use csv_processor::CsvProcessor;
pub use error::RowError;
pub use materializer::{MaterializeOptions, Materializer};
pub use models::{CsvRecord, OutputPath, RunReport};
pub use utils::sanitize_filename;
