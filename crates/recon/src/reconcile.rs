// Summary/detail reconciliation for one entity
//
// Both tables share a project identity under one of three keys. Rows are
// joined on the trimmed key text with full-outer semantics; with no usable
// key the tables are stacked instead.

use std::collections::{HashMap, HashSet};
use std::fmt;

use devintel_core::table::RawRow;
use devintel_core::{CanonicalField, Origin, RawTable, PROJECT_SHEET_COLUMN};
use serde::Serialize;

pub const SUMMARY_SUFFIX: &str = "_summary";
pub const DETAIL_SUFFIX: &str = "_detail";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKeyKind {
    /// `project_name` present in both tables.
    CanonicalName,
    /// The source project-name label present in both tables.
    SourceLabel,
    /// Summary project name against the detail sheet name.
    SheetName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinKey {
    pub kind: JoinKeyKind,
    pub summary_column: String,
    pub detail_column: String,
}

impl JoinKey {
    /// Name keys are merged into the summary's key column. A sheet-name key
    /// keeps both columns.
    fn coalesces(&self) -> bool {
        self.kind != JoinKeyKind::SheetName
    }
}

/// How the two tables were combined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "strategy")]
pub enum MergeStrategy {
    SummaryOnly,
    DetailOnly,
    Joined(JoinKey),
    /// No join key in common; rows are stacked summary first.
    Stacked,
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SummaryOnly => write!(f, "summary only"),
            Self::DetailOnly => write!(f, "detail only"),
            Self::Joined(key) => write!(
                f,
                "outer join on '{}' = '{}'",
                key.summary_column, key.detail_column
            ),
            Self::Stacked => write!(f, "stacked (no join key)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Reconciled {
    pub table: RawTable,
    pub strategy: MergeStrategy,
}

/// Merge one entity's summary and detail tables.
///
/// `project_label` is the source column label for the project name.
pub fn reconcile(summary: RawTable, detail: RawTable, project_label: &str) -> Reconciled {
    if detail.is_empty() {
        return Reconciled {
            table: summary,
            strategy: MergeStrategy::SummaryOnly,
        };
    }
    if summary.is_empty() {
        return Reconciled {
            table: detail,
            strategy: MergeStrategy::DetailOnly,
        };
    }

    match select_join_key(&summary, &detail, project_label) {
        Some(key) => Reconciled {
            table: outer_join(&summary, &detail, &key),
            strategy: MergeStrategy::Joined(key),
        },
        None => Reconciled {
            table: RawTable::concat([summary, detail]),
            strategy: MergeStrategy::Stacked,
        },
    }
}

/// Pick the join key in priority order: canonical name, source label, sheet name.
pub fn select_join_key(summary: &RawTable, detail: &RawTable, project_label: &str) -> Option<JoinKey> {
    let canonical = CanonicalField::ProjectName.name();
    if summary.has_column(canonical) && detail.has_column(canonical) {
        return Some(JoinKey {
            kind: JoinKeyKind::CanonicalName,
            summary_column: canonical.to_string(),
            detail_column: canonical.to_string(),
        });
    }

    let summary_label = summary.find_column_folded(project_label);
    if let (Some(s), Some(d)) = (summary_label, detail.find_column_folded(project_label)) {
        return Some(JoinKey {
            kind: JoinKeyKind::SourceLabel,
            summary_column: summary.columns[s].clone(),
            detail_column: detail.columns[d].clone(),
        });
    }

    if detail.has_column(PROJECT_SHEET_COLUMN) {
        let summary_col = summary.column_index(canonical).or(summary_label)?;
        return Some(JoinKey {
            kind: JoinKeyKind::SheetName,
            summary_column: summary.columns[summary_col].clone(),
            detail_column: PROJECT_SHEET_COLUMN.to_string(),
        });
    }

    None
}

/// Full outer join. Output rows: every summary row with its detail matches
/// (or alone), then detail rows nothing matched, each group in input order.
fn outer_join(summary: &RawTable, detail: &RawTable, key: &JoinKey) -> RawTable {
    let (Some(s_key), Some(d_key)) = (
        summary.column_index(&key.summary_column),
        detail.column_index(&key.detail_column),
    ) else {
        return RawTable::concat([summary.clone(), detail.clone()]);
    };
    let merge_key = key.coalesces();

    // Detail columns carried into the output (the shared key is not repeated)
    let detail_cols: Vec<usize> = (0..detail.columns.len())
        .filter(|&c| !(merge_key && c == d_key))
        .collect();

    let summary_names: HashSet<&str> = summary.columns.iter().map(String::as_str).collect();
    let collides = |name: &str| summary_names.contains(name) && detail.has_column(name);

    let mut columns = Vec::with_capacity(summary.columns.len() + detail_cols.len());
    for (c, name) in summary.columns.iter().enumerate() {
        if collides(name) && !(merge_key && c == s_key) {
            columns.push(format!("{name}{SUMMARY_SUFFIX}"));
        } else {
            columns.push(name.clone());
        }
    }
    for &c in &detail_cols {
        let name = &detail.columns[c];
        if collides(name) {
            columns.push(format!("{name}{DETAIL_SUFFIX}"));
        } else {
            columns.push(name.clone());
        }
    }

    let mut by_key: HashMap<&str, Vec<usize>> = HashMap::new();
    for (r, row) in detail.rows.iter().enumerate() {
        if let Some(k) = key_text(row, d_key) {
            by_key.entry(k).or_default().push(r);
        }
    }

    let mut out = RawTable::new(columns);
    let mut matched = vec![false; detail.rows.len()];

    let detail_cells = |row: &RawRow| -> Vec<Option<String>> {
        detail_cols.iter().map(|&c| row.cells[c].clone()).collect()
    };

    for s_row in &summary.rows {
        let matches = key_text(s_row, s_key).and_then(|k| by_key.get(k));
        match matches {
            Some(rows) => {
                for &r in rows {
                    matched[r] = true;
                    let mut cells = s_row.cells.clone();
                    cells.extend(detail_cells(&detail.rows[r]));
                    out.push_row(Origin::Merged, cells);
                }
            }
            None => {
                let mut cells = s_row.cells.clone();
                cells.resize(cells.len() + detail_cols.len(), None);
                out.push_row(s_row.origin, cells);
            }
        }
    }

    for (r, d_row) in detail.rows.iter().enumerate() {
        if matched[r] {
            continue;
        }
        let mut cells = vec![None; summary.columns.len()];
        if merge_key {
            cells[s_key] = d_row.cells[d_key].clone();
        }
        cells.extend(detail_cells(d_row));
        out.push_row(d_row.origin, cells);
    }

    out
}

fn key_text(row: &RawRow, col: usize) -> Option<&str> {
    row.cells
        .get(col)?
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
}
