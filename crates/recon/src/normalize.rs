// Schema normalization: source labels -> canonical fields -> typed records

use std::collections::BTreeSet;

use chrono::NaiveDate;
use devintel_core::money::parse_amount;
use devintel_core::{
    CanonicalField, CanonicalRecord, ColumnMapping, Diagnostics, Entity, EntityTable, RawTable,
    Tier, PROJECT_SHEET_COLUMN, UNKNOWN,
};

/// Default raw text for a missing unit count.
const DEFAULT_UNITS: &str = "1";
/// Default raw text for a missing monetary value.
const DEFAULT_AMOUNT: &str = "0";

/// Rename source columns whose label matches a canonical field.
///
/// Labels match after trimming and case-folding; no fuzzy matching. A column
/// already carrying the canonical name is left as is. Unmatched fields stay
/// absent here and get their defaults in [`conform`].
pub fn apply_column_mapping(table: &mut RawTable, mapping: &ColumnMapping) {
    for (field, label) in mapping.pairs() {
        if table.has_column(field.name()) {
            continue;
        }
        if let Some(col) = table.find_column_folded(label) {
            table.rename_column(col, field.name());
        }
    }
}

/// Build an [`EntityTable`] from a mapped table.
///
/// Every record gets all guaranteed fields: text fields default to `Unknown`,
/// the unit count to 1 and monetary fields to 0. `scraped_date` is replaced
/// by the tier's synthetic sync date.
pub fn conform(
    table: &RawTable,
    mapping: &ColumnMapping,
    entity: &Entity,
    tier: Tier,
    today: NaiveDate,
    diagnostics: &mut Diagnostics,
) -> EntityTable {
    let mut out = EntityTable::empty(entity.clone(), tier);
    if table.is_empty() {
        return out;
    }

    let col = |field: CanonicalField| table.column_index(field.name());
    for field in CanonicalField::ALL {
        if col(field).is_none() {
            out.schema_gaps.insert(field);
        }
    }
    report_gaps(&out.schema_gaps, mapping, entity, diagnostics);

    let project_col = col(CanonicalField::ProjectName);
    let units_col = col(CanonicalField::NoUnit);
    let jualan_col = col(CanonicalField::HargaJualan);
    let spjb_col = col(CanonicalField::HargaSpjb);
    let status_col = col(CanonicalField::StatusJualan);
    let quota_col = col(CanonicalField::KuotaBumi);
    let pemaju_col = col(CanonicalField::NamaPemaju);
    let date_col = col(CanonicalField::ScrapedDate);
    let sheet_col = table.column_index(PROJECT_SHEET_COLUMN);

    let scraped_date = tier.synthetic_scrape_date(today);

    for (idx, row) in table.rows.iter().enumerate() {
        let cell = move |c: Option<usize>| c.and_then(|c| present(table.cell(idx, c)));

        let project_sheet_name = cell(sheet_col).map(str::to_string);
        let project_name = cell(project_col)
            .map(str::to_string)
            .or_else(|| project_sheet_name.clone())
            .unwrap_or_else(|| UNKNOWN.to_string());

        let no_unit = cell(units_col).unwrap_or(DEFAULT_UNITS).to_string();
        let harga_jualan = cell(jualan_col).unwrap_or(DEFAULT_AMOUNT).to_string();
        let harga_spjb = cell(spjb_col).unwrap_or(DEFAULT_AMOUNT).to_string();

        out.records.push(CanonicalRecord {
            entity: entity.clone(),
            origin: row.origin,
            no_unit_num: parse_units(&no_unit),
            harga_jualan_num: parse_amount(&harga_jualan),
            harga_spjb_num: parse_amount(&harga_spjb),
            project_name,
            no_unit,
            harga_jualan,
            harga_spjb,
            status_jualan: text_or_unknown(cell(status_col)),
            kuota_bumi: text_or_unknown(cell(quota_col)),
            nama_pemaju: text_or_unknown(cell(pemaju_col)),
            scraped_date,
            source_scraped_date: text_or_unknown(cell(date_col)),
            project_sheet_name,
        });
    }

    out
}

fn report_gaps(
    gaps: &BTreeSet<CanonicalField>,
    mapping: &ColumnMapping,
    entity: &Entity,
    diagnostics: &mut Diagnostics,
) {
    for &field in gaps {
        let default = match field {
            CanonicalField::NoUnit => DEFAULT_UNITS,
            CanonicalField::HargaJualan | CanonicalField::HargaSpjb => DEFAULT_AMOUNT,
            _ => UNKNOWN,
        };
        diagnostics.warning(
            Some(entity),
            format!(
                "no column matches '{}' for {field}; using default '{default}'",
                mapping.label(field)
            ),
        );
    }
}

/// Trimmed cell text, `None` when missing or blank.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn text_or_unknown(value: Option<&str>) -> String {
    value.unwrap_or(UNKNOWN).to_string()
}

/// Numeric unit count. Anything that is not a finite number counts as 1.
pub fn parse_units(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(1.0)
}
