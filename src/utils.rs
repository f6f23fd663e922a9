use std::path::Path;

use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DISALLOWED_CHARS: Regex = Regex::new(r"[^a-z0-9\-]").unwrap();
    static ref HYPHEN_RUNS: Regex = Regex::new(r"-{2,}").unwrap();
}

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Turn a human-readable title into a lowercase, hyphenated filename stem.
///
/// The steps run in a fixed order: lowercase, spaces to hyphens, every other
/// character outside `[a-z0-9-]` to a hyphen, collapse hyphen runs, then trim
/// hyphens from both ends. A title with no ASCII letters or digits yields an
/// empty string; callers decide what to do with that.
pub fn sanitize_filename(title: &str) -> String {
    let lowered = title.to_lowercase().replace(' ', "-");
    let restricted = DISALLOWED_CHARS.replace_all(&lowered, "-");
    let collapsed = HYPHEN_RUNS.replace_all(&restricted, "-");
    collapsed.trim_matches('-').to_string()
}
