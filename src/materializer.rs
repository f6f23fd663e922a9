use std::fs::File;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use chrono::{Local, NaiveDate};
use log::debug;

use crate::error::RowError;
use crate::models::{
    CsvRecord, OutputPath, FIELD_CATE, FIELD_CONTENT, FIELD_COVER, FIELD_FILENAME, FIELD_GAME,
};
use crate::utils::{is_blank, sanitize_filename};

pub const DEFAULT_PLACEHOLDER: &str = "Game introduction coming soon...";
pub const DEFAULT_EXTENSION: &str = "mdx";
const HEADER_MARKER: &str = "---";

#[derive(Debug, Clone)]
pub struct MaterializeOptions {
    /// Emit a `game:` line in the header block.
    pub include_game_field: bool,
    /// Copy the row's `cover` into the header; when false the key is always empty.
    pub passthrough_cover: bool,
    /// Body text used when a row has no `content`.
    pub placeholder: String,
    pub extension: String,
    /// Fixed header date. `None` stamps each file with today's date at write time.
    pub date: Option<NaiveDate>,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self {
            include_game_field: false,
            passthrough_cover: true,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            date: None,
        }
    }
}

/// Turns one CSV row into one file on disk.
pub struct Materializer {
    options: MaterializeOptions,
}

impl Materializer {
    pub fn new(options: MaterializeOptions) -> Self {
        Self { options }
    }

    /// Resolve, render and write a row, returning the path of the file written.
    pub fn materialize(&self, record: &CsvRecord, output_root: &Path) -> Result<PathBuf, RowError> {
        let target = self.resolve_output_path(record, output_root)?;
        let contents = self.render(record)?;
        Self::write_file(&target, &contents)?;
        Ok(target.full_path())
    }

    /// Category directory plus file name, without touching the filesystem.
    pub fn resolve_output_path(
        &self,
        record: &CsvRecord,
        output_root: &Path,
    ) -> Result<OutputPath, RowError> {
        let title = record.title()?;

        let directory = match record.get(FIELD_CATE) {
            Some(cate) if !is_blank(cate) => {
                Self::check_category(cate, output_root)?;
                output_root.join(cate)
            }
            _ => output_root.to_path_buf(),
        };

        let stem = match record.get(FIELD_FILENAME) {
            Some(name) if !is_blank(name) => name.to_string(),
            _ => {
                let slug = sanitize_filename(title);
                if slug.is_empty() {
                    return Err(RowError::InvalidOutputPath {
                        path: directory.join(format!(".{}", self.options.extension)),
                        reason: format!(
                            "title {title:?} sanitizes to an empty filename; add a `filename` column value"
                        ),
                    });
                }
                slug
            }
        };

        Ok(OutputPath {
            directory,
            file_name: format!("{}.{}", stem, self.options.extension),
        })
    }

    /// A category must name exactly one directory directly below the root.
    fn check_category(cate: &str, output_root: &Path) -> Result<(), RowError> {
        let mut parts = Path::new(cate).components();
        let single_dir = matches!(
            (parts.next(), parts.next()),
            (Some(Component::Normal(_)), None)
        );
        if single_dir && !cate.contains(|c: char| c == '/' || c == '\\') {
            return Ok(());
        }
        Err(RowError::InvalidOutputPath {
            path: output_root.join(cate),
            reason: format!("category {cate:?} must be a single directory name inside the output root"),
        })
    }

    /// Header block followed by the body, exactly as it lands on disk.
    pub fn render(&self, record: &CsvRecord) -> Result<String, RowError> {
        let title = record.title()?;
        let cover = if self.options.passthrough_cover {
            record.get_or_empty(FIELD_COVER)
        } else {
            ""
        };
        let date = self
            .options
            .date
            .unwrap_or_else(|| Local::now().date_naive());

        let mut entries = vec![("title", title), ("cover", cover)];
        if self.options.include_game_field {
            entries.push(("game", record.get_or_empty(FIELD_GAME)));
        }
        entries.push(("description", ""));

        let mut out = String::new();
        out.push_str(HEADER_MARKER);
        out.push('\n');
        for (key, value) in entries {
            if value.contains(|c: char| c == '\n' || c == '\r') {
                return Err(RowError::MultilineHeaderValue {
                    field: key.to_string(),
                });
            }
            out.push_str(&format!("{key}: {value}\n"));
        }
        out.push_str(&format!("date: {}\n", date.format("%Y-%m-%d")));
        out.push_str(HEADER_MARKER);
        out.push_str("\n\n");

        let content = match record.get_or_empty(FIELD_CONTENT) {
            "" => self.options.placeholder.as_str(),
            text => text,
        };
        out.push_str(&format!("# {title}\n\n{content}"));
        Ok(out)
    }

    fn write_file(target: &OutputPath, contents: &str) -> Result<(), RowError> {
        std::fs::create_dir_all(&target.directory).map_err(|e| RowError::InvalidOutputPath {
            path: target.directory.clone(),
            reason: e.to_string(),
        })?;

        let path = target.full_path();
        let mut file = File::create(&path).map_err(|e| RowError::InvalidOutputPath {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Self::write_contents(&mut file, &path, contents)?;
        debug!("Wrote {} bytes to {}", contents.len(), path.display());
        Ok(())
    }

    fn write_contents<W: Write>(writer: &mut W, path: &Path, contents: &str) -> Result<(), RowError> {
        writer
            .write_all(contents.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|source| RowError::IoWriteFailure {
                path: path.to_path_buf(),
                source,
            })
    }
}
