use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use csv::{ReaderBuilder, StringRecord};
use log::{debug, error, info, warn};

use crate::config::{Config, ErrorMode};
use crate::error::RowError;
use crate::materializer::Materializer;
use crate::models::{Collision, CsvRecord, RowFailure, RunReport};
use crate::utils::ensure_directory_exists;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Maps reader byte offsets back to 1-based physical line numbers. The csv
/// reader skips blank lines without counting them in `Position::line`.
struct LineIndex<'a> {
    data: &'a [u8],
    newlines: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(data: &'a [u8]) -> Self {
        let newlines = data
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == b'\n')
            .map(|(i, _)| i)
            .collect();
        Self { data, newlines }
    }

    /// Line of the next record starting at or after `byte`.
    fn record_line(&self, byte: u64) -> u64 {
        let mut pos = byte as usize;
        while matches!(self.data.get(pos), Some(&(b'\r' | b'\n'))) {
            pos += 1;
        }
        self.newlines.partition_point(|&n| n < pos) as u64 + 1
    }
}

pub struct CsvProcessor {
    config: Config,
    materializer: Materializer,
}

impl CsvProcessor {
    pub fn new(config: Config) -> Self {
        let materializer = Materializer::new(config.options.clone());
        Self {
            config,
            materializer,
        }
    }

    /// Read the configured CSV and emit one file per row.
    ///
    /// Strict mode returns an error at the first bad row. Lenient mode keeps
    /// going and collects every failure in the returned report; the caller
    /// decides what a non-empty failure list means.
    pub fn run(&self) -> Result<RunReport> {
        let csv_path = &self.config.csv_path;
        let output_root = &self.config.output_root;
        let mut report = RunReport::new(csv_path.clone(), output_root.clone(), self.config.dry_run);

        info!(
            "Converting {} into {}{}",
            csv_path.display(),
            output_root.display(),
            if self.config.dry_run { " (dry run)" } else { "" }
        );

        if !self.config.dry_run {
            ensure_directory_exists(output_root).with_context(|| {
                format!("Failed to create output directory {}", output_root.display())
            })?;
        }

        let raw_input = std::fs::read(csv_path)
            .with_context(|| format!("Failed to open CSV at {}", csv_path.display()))?;
        // A leading BOM would otherwise end up in the first column name.
        let data = raw_input.strip_prefix(UTF8_BOM).unwrap_or(&raw_input[..]);
        let lines = LineIndex::new(data);
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data);

        let headers = reader
            .headers()
            .with_context(|| format!("Failed to read CSV header from {}", csv_path.display()))?
            .clone();
        debug!("Columns: {:?}", headers.iter().collect::<Vec<_>>());

        // Keyed on the lowercased path so case-only clashes are caught too.
        let mut written: HashMap<String, (PathBuf, u64)> = HashMap::new();
        let mut raw = StringRecord::new();

        loop {
            let line = lines.record_line(reader.position().byte());
            let record = match reader.read_record(&mut raw) {
                Ok(true) => CsvRecord::from_string_record(&headers, &raw, line),
                Ok(false) => break,
                Err(e) => {
                    report.rows_read += 1;
                    self.handle_failure(&mut report, None, line, RowError::from(e))?;
                    continue;
                }
            };
            report.rows_read += 1;

            match self.process_row(&record, output_root) {
                Ok(path) => {
                    let key = path.to_string_lossy().to_lowercase();
                    if let Some((first_path, first_line)) =
                        written.insert(key, (path.clone(), record.line))
                    {
                        let case_only = first_path != path;
                        if case_only {
                            warn!(
                                "Line {} writes {}, which differs only in case from {} (line {})",
                                record.line,
                                path.display(),
                                first_path.display(),
                                first_line
                            );
                        } else {
                            warn!(
                                "Line {} overwrites {} (first written by line {})",
                                record.line,
                                path.display(),
                                first_line
                            );
                        }
                        report.collisions.push(Collision {
                            path: path.clone(),
                            first_path,
                            first_line,
                            line: record.line,
                            case_only,
                        });
                    }
                    report.files_written += 1;
                }
                Err(e) => self.handle_failure(&mut report, Some(&record), record.line, e)?,
            }
        }

        report.finished_at = Some(Local::now());
        if report.failures.is_empty() {
            info!(
                "Done: {} rows read, {} files {}",
                report.rows_read,
                report.files_written,
                if self.config.dry_run { "planned" } else { "written" }
            );
        } else {
            error!(
                "Finished with {} failed rows out of {} ({} files {})",
                report.failures.len(),
                report.rows_read,
                report.files_written,
                if self.config.dry_run { "planned" } else { "written" }
            );
        }
        if !report.collisions.is_empty() {
            warn!(
                "{} rows overwrote a file written earlier in this run",
                report.collisions.len()
            );
        }

        if let Some(report_path) = &self.config.report_path {
            Self::write_report(&report, report_path)?;
        }

        Ok(report)
    }

    fn process_row(&self, record: &CsvRecord, output_root: &Path) -> Result<PathBuf, RowError> {
        if self.config.dry_run {
            let target = self.materializer.resolve_output_path(record, output_root)?;
            self.materializer.render(record)?;
            let path = target.full_path();
            info!("[dry run] line {} -> {}", record.line, path.display());
            return Ok(path);
        }

        let path = self.materializer.materialize(record, output_root)?;
        debug!("Line {} -> {}", record.line, path.display());
        Ok(path)
    }

    fn handle_failure(
        &self,
        report: &mut RunReport,
        record: Option<&CsvRecord>,
        line: u64,
        err: RowError,
    ) -> Result<()> {
        let failure = RowFailure::new(record, line, &err);
        let title = failure.title.clone().unwrap_or_else(|| "<none>".to_string());
        report.failures.push(failure);

        match self.config.mode {
            ErrorMode::Strict => {
                report.finished_at = Some(Local::now());
                if let Some(report_path) = &self.config.report_path {
                    Self::write_report(report, report_path)?;
                }
                Err(anyhow!(err).context(format!("Line {} (title {:?}) failed", line, title)))
            }
            ErrorMode::Lenient => {
                error!("Skipping line {} (title {:?}): {}", line, title, err);
                Ok(())
            }
        }
    }

    fn write_report(report: &RunReport, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_directory_exists(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(report)?)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Report saved to {}", path.display());
        Ok(())
    }
}
