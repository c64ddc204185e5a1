// Summary export import (CSV)

use std::fmt;
use std::path::Path;

use devintel_core::table::dedupe_headers;
use devintel_core::{Origin, RawTable};

use crate::error::IoError;

/// Text encoding a summary file was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8, with an optional byte-order mark.
    Utf8,
    /// Windows-1252 (superset of Latin-1), common for Excel-exported CSVs.
    Windows1252,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => write!(f, "utf-8"),
            Self::Windows1252 => write!(f, "windows-1252"),
        }
    }
}

/// A decoded and parsed summary export.
#[derive(Debug, Clone)]
pub struct SummaryRead {
    pub table: RawTable,
    pub encoding: TextEncoding,
}

/// Read a summary export. Every row is tagged [`Origin::Summary`].
pub fn read_summary(path: &Path) -> Result<SummaryRead, IoError> {
    let bytes = std::fs::read(path).map_err(|e| IoError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let (content, encoding) = decode_text(&bytes).ok_or_else(|| IoError::Decode {
        path: path.display().to_string(),
    })?;

    let table = parse_summary(&content).map_err(|message| IoError::Csv {
        path: path.display().to_string(),
        message,
    })?;

    Ok(SummaryRead { table, encoding })
}

/// Decode as UTF-8 (BOM stripped); on failure retry once as Windows-1252.
pub fn decode_text(bytes: &[u8]) -> Option<(String, TextEncoding)> {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Ok(s) = std::str::from_utf8(body) {
        return Some((s.to_string(), TextEncoding::Utf8));
    }

    encoding_rs::WINDOWS_1252
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|decoded| (decoded.into_owned(), TextEncoding::Windows1252))
}

/// Parse CSV text with a header row into a raw table.
///
/// Blank cells become missing. Short rows are padded, long rows truncated.
pub fn parse_summary(content: &str) -> Result<RawTable, String> {
    let delimiter = sniff_delimiter(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err("no columns to parse".to_string());
    }

    let mut table = RawTable::new(dedupe_headers(headers));
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let cells = record
            .iter()
            .map(|field| if field.is_empty() { None } else { Some(field.to_string()) })
            .collect();
        table.push_row(Origin::Summary, cells);
    }

    Ok(table)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (comma, semicolon, tab, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins; comma on a tie.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b',', b';', b'\t', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Score: (lines with the header's field count) * field count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}
