use std::collections::BTreeMap;

use chrono::NaiveDate;
use devintel_core::{
    CanonicalField, CanonicalRecord, Diagnostics, Entity, EntityTable, QuotaBucket, StatusBucket,
    SynonymSets, Tier,
};

use crate::model::{Fidelity, ProjectAggregate};

/// Categorical fields the sold/quota breakdowns are computed from.
const BREAKDOWN_FIELDS: [CanonicalField; 2] = [CanonicalField::StatusJualan, CanonicalField::KuotaBumi];

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub projects: Vec<ProjectAggregate>,
    pub fidelity: Fidelity,
}

#[derive(Debug)]
struct Group {
    nama_pemaju: String,
    scraped_date: NaiveDate,
    records: usize,
    units: f64,
    sales: f64,
    spjb: f64,
    sold: u64,
    unsold: u64,
    bumi: u64,
    non_bumi: u64,
}

/// Group records by (entity, project_name) and sum each group.
///
/// Tables are read in order; the first record of a group supplies its
/// `nama_pemaju` and `scraped_date`. Groups come out sorted by entity, then
/// project name. Empty tables are skipped.
///
/// Status and quota values are counted through `synonyms`; a value in neither
/// set, including the `Unknown` default, lands in no bucket. A breakdown field
/// with no value in any record yields [`Fidelity::Reduced`]; sums are kept and
/// only that field's counts are zero.
pub fn aggregate_projects<'a>(
    tables: impl IntoIterator<Item = &'a EntityTable>,
    synonyms: &SynonymSets,
    tier: Tier,
    diagnostics: &mut Diagnostics,
) -> Aggregation {
    let contributing: Vec<&EntityTable> = tables.into_iter().filter(|t| !t.is_empty()).collect();

    let mut absent = Vec::new();
    if !contributing.is_empty() {
        for field in BREAKDOWN_FIELDS {
            let mut records = contributing.iter().flat_map(|t| t.records.iter());
            if records.all(|r| breakdown_value(r, field).trim().is_empty()) {
                diagnostics.warning(
                    None,
                    format!("{} carries no value in any record; its breakdown counts are zero", field.name()),
                );
                absent.push(field);
            } else if contributing.iter().all(|t| !t.has_source_field(field)) {
                diagnostics.info(
                    None,
                    format!("{} absent from every source; defaults count in neither bucket", field.name()),
                );
            }
        }
    }

    let mut groups: BTreeMap<(Entity, String), Group> = BTreeMap::new();
    for record in contributing.iter().flat_map(|t| t.records.iter()) {
        let key = (record.entity.clone(), record.project_name.clone());
        let group = groups.entry(key).or_insert_with(|| Group {
            nama_pemaju: record.nama_pemaju.clone(),
            scraped_date: record.scraped_date,
            records: 0,
            units: 0.0,
            sales: 0.0,
            spjb: 0.0,
            sold: 0,
            unsold: 0,
            bumi: 0,
            non_bumi: 0,
        });
        group.records += 1;
        group.units += record.no_unit_num;
        group.sales += record.harga_jualan_num;
        group.spjb += record.harga_spjb_num;

        match synonyms.status_bucket(&record.status_jualan) {
            Some(StatusBucket::Sold) => group.sold += 1,
            Some(StatusBucket::Unsold) => group.unsold += 1,
            None => {}
        }
        match synonyms.quota_bucket(&record.kuota_bumi) {
            Some(QuotaBucket::Quota) => group.bumi += 1,
            Some(QuotaBucket::NonQuota) => group.non_bumi += 1,
            None => {}
        }
    }

    let projects = groups
        .into_iter()
        .map(|((pemaju, project_name), g)| {
            let (pct_units_sold, pct_bumi_units) = if tier.is_elevated() {
                (
                    Some(percent(g.sold as f64, g.units)),
                    Some(percent(g.bumi as f64, g.units)),
                )
            } else {
                (None, None)
            };
            ProjectAggregate {
                pemaju,
                project_name,
                record_count: g.records,
                total_units_per_project: g.units,
                total_sales_per_project: g.sales,
                total_sales_spjb_per_project: g.spjb,
                units_sold_per_project: g.sold,
                units_unsold_per_project: g.unsold,
                bumi_units_per_project: g.bumi,
                non_bumi_units_per_project: g.non_bumi,
                nama_pemaju: g.nama_pemaju,
                scraped_date: g.scraped_date,
                pct_units_sold,
                pct_bumi_units,
            }
        })
        .collect();

    let fidelity = if contributing.is_empty() {
        Fidelity::NoData
    } else if !absent.is_empty() {
        Fidelity::Reduced { missing: absent }
    } else {
        Fidelity::Full
    };

    Aggregation { projects, fidelity }
}

fn breakdown_value(record: &CanonicalRecord, field: CanonicalField) -> &str {
    match field {
        CanonicalField::KuotaBumi => &record.kuota_bumi,
        _ => &record.status_jualan,
    }
}

/// `part / total * 100`, two decimals, within [0, 100]. A zero total gives 0.
pub fn percent(part: f64, total: f64) -> f64 {
    if total == 0.0 || !total.is_finite() || !part.is_finite() {
        return 0.0;
    }
    round2((part / total * 100.0).clamp(0.0, 100.0))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
