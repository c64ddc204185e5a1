// Detail export import (xlsx, xls, xlsb, ods)
//
// One sheet per project. Each sheet's first row is its header; every data row
// is stamped with the sheet name in `project_sheet_name`.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use devintel_core::table::dedupe_headers;
use devintel_core::{Origin, RawTable, PROJECT_SHEET_COLUMN};

use crate::error::IoError;

/// All sheets of a detail workbook, stacked in sheet order.
#[derive(Debug, Clone)]
pub struct DetailRead {
    pub table: RawTable,
    pub sheet_names: Vec<String>,
}

/// Read every sheet of a detail workbook. Every row is tagged [`Origin::Detail`].
///
/// Any sheet failure fails the whole read; callers treat that as "no detail data".
pub fn read_detail(path: &Path) -> Result<DetailRead, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| IoError::Workbook {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(IoError::Workbook {
            path: path.display().to_string(),
            message: "workbook contains no sheets".to_string(),
        });
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in &sheet_names {
        let range = workbook.worksheet_range(sheet_name).map_err(|e| IoError::Sheet {
            path: path.display().to_string(),
            sheet: sheet_name.clone(),
            message: e.to_string(),
        })?;
        let table = sheet_table(&range, sheet_name);
        log::debug!("sheet '{}': {} rows", sheet_name, table.len());
        sheets.push(table);
    }

    Ok(DetailRead {
        table: RawTable::concat(sheets),
        sheet_names,
    })
}

/// Convert one sheet range into a table with a trailing `project_sheet_name` column.
fn sheet_table(range: &Range<Data>, sheet_name: &str) -> RawTable {
    let mut rows = range.rows();

    let Some(header_row) = rows.next() else {
        return RawTable::new(vec![PROJECT_SHEET_COLUMN.to_string()]);
    };

    let mut headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell_text(cell).unwrap_or_default())
        .collect();
    headers = dedupe_headers(headers);

    let width = headers.len();
    let mut table = RawTable::new(headers);
    table.columns.push(PROJECT_SHEET_COLUMN.to_string());

    for row in rows {
        let mut cells: Vec<Option<String>> = row.iter().take(width).map(cell_text).collect();
        if cells.iter().all(Option::is_none) {
            continue;
        }
        cells.resize(width, None);
        cells.push(Some(sheet_name.to_string()));
        table.push_row(Origin::Detail, cells);
    }

    table
}

/// Text of a cell, `None` for empty cells.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => {
            if s.trim().is_empty() {
                None
            } else {
                Some(s.clone())
            }
        }
        Data::Float(n) => {
            // Integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                Some(format!("{}", *n as i64))
            } else {
                Some(format!("{}", n))
            }
        }
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => Some(format!("{}", dt.as_f64())),
        other => Some(other.to_string()),
    }
}
