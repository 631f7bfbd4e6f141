//! Finding the scores to process.

use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A score to process and the directory its part files go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub path: PathBuf,
    pub out_dir: PathBuf,
}

impl Source {
    /// Score name used to build output file names.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Turn a `*`/`?` file name glob plus an extension into an anchored regex.
pub fn filter_regex(filter: &str, extension: &str) -> Result<Regex> {
    let mut pattern = String::from("^");
    for c in filter.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            c => pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    pattern.push_str(&regex::escape(extension));
    pattern.push('$');

    Regex::new(&pattern).with_context(|| format!("Invalid filter `{}`", filter))
}

/// Collect sources under `input`.
///
/// A file is taken as-is and written straight to `dest`. A directory is
/// walked recursively for names matching `filter` + `extension`; each
/// file's subdirectory is mirrored under `dest`. Results are sorted.
pub fn collect_sources(
    input: &Path,
    dest: &Path,
    filter: &str,
    extension: &str,
) -> Result<Vec<Source>> {
    if input.is_file() {
        return Ok(vec![Source {
            path: input.to_path_buf(),
            out_dir: dest.to_path_buf(),
        }]);
    }

    let matcher = filter_regex(filter, extension)?;
    let mut sources = Vec::new();

    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", input.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !matcher.is_match(&name) {
            continue;
        }

        let relative = entry
            .path()
            .parent()
            .and_then(|parent| parent.strip_prefix(input).ok())
            .unwrap_or_else(|| Path::new(""));

        debug!(path = %entry.path().display(), "found score");
        sources.push(Source {
            path: entry.path().to_path_buf(),
            out_dir: dest.join(relative),
        });
    }

    sources.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(sources)
}
