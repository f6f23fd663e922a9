use anyhow::{bail, Result};
use clap::Parser;
use log::info;

use csv_to_mdx::{Cli, Config, CsvProcessor};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_cli(Cli::parse())?;
    info!("Mode: {:?}", config.mode);

    let report = CsvProcessor::new(config).run()?;
    if !report.is_success() {
        bail!(
            "{} of {} rows failed",
            report.failures.len(),
            report.rows_read
        );
    }
    Ok(())
}
