// Untyped tables as read from summary/detail sources

use std::collections::HashMap;

use crate::model::Origin;

/// One source row. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub origin: Origin,
    pub cells: Vec<Option<String>>,
}

/// A table with arbitrary column labels.
///
/// Every row holds exactly `columns.len()` cells; `push_row` pads or truncates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// A table is empty when it has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Exact column lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Case- and surrounding-whitespace-insensitive lookup. The last match wins,
    /// so a later duplicate label shadows an earlier one.
    pub fn find_column_folded(&self, label: &str) -> Option<usize> {
        let wanted = fold_label(label);
        self.columns.iter().rposition(|c| fold_label(c) == wanted)
    }

    pub fn push_row(&mut self, origin: Origin, mut cells: Vec<Option<String>>) {
        cells.resize(self.columns.len(), None);
        self.rows.push(RawRow { origin, cells });
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.cells.get(col)?.as_deref()
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.cell(row, col)
    }

    /// Set `column` to `value` on every row, adding the column if needed.
    pub fn set_column(&mut self, column: &str, value: &str) {
        let col = match self.column_index(column) {
            Some(col) => col,
            None => {
                self.columns.push(column.to_string());
                for row in &mut self.rows {
                    row.cells.push(None);
                }
                self.columns.len() - 1
            }
        };
        for row in &mut self.rows {
            row.cells[col] = Some(value.to_string());
        }
    }

    pub fn rename_column(&mut self, col: usize, name: &str) {
        if let Some(existing) = self.columns.get_mut(col) {
            *existing = name.to_string();
        }
    }

    pub fn trim_column_names(&mut self) {
        for column in &mut self.columns {
            let trimmed = column.trim();
            if trimmed.len() != column.len() {
                *column = trimmed.to_string();
            }
        }
    }

    /// Stack tables vertically. Columns are the union of all inputs in
    /// first-seen order; cells a table does not have are left missing.
    pub fn concat(tables: impl IntoIterator<Item = RawTable>) -> RawTable {
        let mut out = RawTable::default();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for table in tables {
            let mapping: Vec<usize> = table
                .columns
                .iter()
                .map(|name| {
                    *positions.entry(name.clone()).or_insert_with(|| {
                        out.columns.push(name.clone());
                        out.columns.len() - 1
                    })
                })
                .collect();

            for row in table.rows {
                let mut cells = vec![None; out.columns.len()];
                for (src, cell) in row.cells.into_iter().enumerate() {
                    if let Some(&dst) = mapping.get(src) {
                        cells[dst] = cell;
                    }
                }
                out.rows.push(RawRow { origin: row.origin, cells });
            }
        }

        let width = out.columns.len();
        for row in &mut out.rows {
            row.cells.resize(width, None);
        }
        out
    }
}

/// Normalize a column label for matching: trimmed and lowercased.
pub fn fold_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Make header labels unique the way spreadsheet exports usually are read:
/// blank labels become `Unnamed: <index>`, repeats get a `.1`, `.2`, ... suffix.
pub fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(idx, header)| {
            let base = if header.trim().is_empty() {
                format!("Unnamed: {idx}")
            } else {
                header
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let label = if *count == 0 { base.clone() } else { format!("{base}.{count}") };
            *count += 1;
            label
        })
        .collect()
}
