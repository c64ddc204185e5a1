// Source discovery: pick the newest dated export for a prefix/extension
//
// Exports are named `<Prefix>_<YYYYMMDD>.<ext>`. Names without a date stamp
// sort as `00000000`, i.e. after every stamped name.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::IoError;

/// Stamp assigned to names that carry no `_DDDDDDDD.<ext>` suffix.
pub const MISSING_STAMP: &str = "00000000";

fn stamp_pattern(extension: &str) -> Option<Regex> {
    Regex::new(&format!(r"_(\d{{8}})\.{}$", regex::escape(extension))).ok()
}

/// The 8-digit date stamp immediately before `.<extension>`, if any.
pub fn date_stamp<'a>(name: &'a str, extension: &str) -> Option<&'a str> {
    let pattern = stamp_pattern(extension)?;
    pattern
        .captures(name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Select the candidate with the greatest date stamp from a directory listing.
///
/// Candidates start with `prefix` and end with `.<extension>`. Equal stamps keep
/// the order of `names`, so the earliest listed wins a tie. [`locate_latest`]
/// passes a name-sorted listing, which makes on-disk ties go to the
/// lexicographically smallest name.
pub fn select_latest<'a>(names: &'a [String], prefix: &str, extension: &str) -> Option<&'a str> {
    let suffix = format!(".{extension}");
    let pattern = stamp_pattern(extension);

    let mut candidates: Vec<(&str, &str)> = names
        .iter()
        .map(String::as_str)
        .filter(|n| n.starts_with(prefix) && n.ends_with(&suffix))
        .map(|n| {
            let stamp = pattern
                .as_ref()
                .and_then(|p| p.captures(n))
                .and_then(|c| c.get(1))
                .map(|m| m.as_str())
                .unwrap_or(MISSING_STAMP);
            (n, stamp)
        })
        .collect();

    // Stable sort: descending stamp, ties in listing order
    candidates.sort_by(|a, b| b.1.cmp(a.1));
    candidates.first().map(|(name, _)| *name)
}

/// List `dir` and select the newest matching file name.
///
/// The listing is sorted by name before selection, so among files with the
/// same stamp the lexicographically smallest name wins, whatever order the
/// platform returns entries in.
pub fn locate_latest(dir: &Path, prefix: &str, extension: &str) -> Result<Option<String>, IoError> {
    let list_err = |e: std::io::Error| IoError::ListDir {
        path: dir.display().to_string(),
        message: e.to_string(),
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();

    Ok(select_latest(&names, prefix, extension).map(str::to_string))
}

/// How a source file name was chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Newest dated file found in the directory.
    Latest,
    /// No candidate found; the preconfigured default name is used.
    Fallback,
    /// The directory could not be listed; the default name is used.
    ListingFailed(IoError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    pub file_name: String,
    pub path: PathBuf,
    pub resolution: Resolution,
}

impl ResolvedSource {
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// Resolve the file to read for one (prefix, extension) pair.
///
/// Never fails: when nothing is found the default `<prefix><fallback_stamp>.<ext>`
/// is returned, which may itself be absent on disk.
pub fn resolve_source(dir: &Path, prefix: &str, extension: &str, fallback_stamp: &str) -> ResolvedSource {
    let fallback = || format!("{prefix}{fallback_stamp}.{extension}");

    let (file_name, resolution) = match locate_latest(dir, prefix, extension) {
        Ok(Some(name)) => (name, Resolution::Latest),
        Ok(None) => (fallback(), Resolution::Fallback),
        Err(e) => {
            log::debug!("source listing failed: {e}");
            (fallback(), Resolution::ListingFailed(e))
        }
    };

    ResolvedSource {
        path: dir.join(&file_name),
        file_name,
        resolution,
    }
}
