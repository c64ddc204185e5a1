// Property-based tests for source selection, money parsing, reconciliation and aggregation.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::BTreeSet;

use chrono::NaiveDate;
use devintel_core::money::{format_amount, parse_amount};
use devintel_core::{
    CanonicalField, CanonicalRecord, Diagnostics, Entity, EntityTable, Origin, RawTable,
    SynonymSets, Tier, UNKNOWN,
};
use devintel_io::select_latest;
use devintel_recon::aggregate::aggregate_projects;
use devintel_recon::{reconcile, Fidelity};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Export file name: usually stamped, sometimes not, sometimes another extension.
fn arb_file_name() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => (20200101u32..20301231).prop_map(|d| format!("A_{d}.csv")),
        1 => r"[a-z]{1,6}".prop_map(|s| format!("A_{s}.csv")),
        1 => (20200101u32..20301231).prop_map(|d| format!("A_{d}.xlsx")),
    ]
}

fn arb_status() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "sold", "Terjual", "telah dijual", "unsold", "Belum Dijual", "Tempahan", "Unknown",
    ])
    .prop_map(str::to_string)
}

fn arb_quota() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["ya", "Bumi", "no", "Tidak", "Non-Bumi", "Unknown"])
        .prop_map(str::to_string)
}

/// (entity, project, units, status, quota)
fn arb_record() -> impl Strategy<Value = (usize, usize, i32, String, String)> {
    (0usize..3, 0usize..4, -2i32..40, arb_status(), arb_quota())
}

fn record(entity: usize, project: usize, units: i32, status: String, quota: String) -> CanonicalRecord {
    let units = units as f64 / 2.0;
    CanonicalRecord {
        entity: Entity::new(format!("E{entity}")),
        origin: Origin::Summary,
        project_name: format!("P{project}"),
        no_unit: units.to_string(),
        harga_jualan: "0".into(),
        harga_spjb: "0".into(),
        status_jualan: status,
        kuota_bumi: quota,
        nama_pemaju: "Unknown".into(),
        scraped_date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
        source_scraped_date: "Unknown".into(),
        project_sheet_name: None,
        no_unit_num: units,
        harga_jualan_num: 0.0,
        harga_spjb_num: 0.0,
    }
}

fn entity_tables(rows: Vec<(usize, usize, i32, String, String)>) -> Vec<EntityTable> {
    let mut tables: Vec<EntityTable> = (0..3)
        .map(|e| EntityTable::empty(Entity::new(format!("E{e}")), Tier::Elevated))
        .collect();
    for (e, p, u, s, q) in rows {
        tables[e].records.push(record(e, p, u, s, q));
    }
    tables
}

/// Mark (status, quota) gaps per table the way the loader does: the field is
/// recorded as a gap and every record holds the `Unknown` default. With
/// `blank_status` every status value is empty instead.
fn gapped_tables(
    rows: Vec<(usize, usize, i32, String, String)>,
    gaps: &[(bool, bool)],
    blank_status: bool,
) -> Vec<EntityTable> {
    let mut tables = entity_tables(rows);
    for (table, &(status_gap, quota_gap)) in tables.iter_mut().zip(gaps) {
        if status_gap {
            table.schema_gaps.insert(CanonicalField::StatusJualan);
        }
        if quota_gap {
            table.schema_gaps.insert(CanonicalField::KuotaBumi);
        }
        for r in &mut table.records {
            if status_gap {
                r.status_jualan = UNKNOWN.to_string();
            }
            if quota_gap {
                r.kuota_bumi = UNKNOWN.to_string();
            }
            if blank_status {
                r.status_jualan.clear();
            }
        }
    }
    tables
}

fn gap_everywhere(tables: &[EntityTable], field: CanonicalField) -> bool {
    tables
        .iter()
        .filter(|t| !t.is_empty())
        .all(|t| !t.has_source_field(field))
}

fn key_table(keys: &[Option<String>], origin: Origin) -> RawTable {
    let mut t = RawTable::new(vec!["project_name".into(), "v".into()]);
    for k in keys {
        t.push_row(origin, vec![k.clone(), Some("x".into())]);
    }
    t
}

fn arb_keys() -> impl Strategy<Value = Vec<Option<String>>> {
    prop::collection::vec(
        prop_oneof![
            4 => (0u8..6).prop_map(|k| Some(format!("P{k}"))),
            1 => Just(None),
        ],
        1..12,
    )
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn latest_selection_has_greatest_stamp(names in prop::collection::vec(arb_file_name(), 0..12)) {
        let picked = select_latest(&names, "A_", "csv");
        let stamps: Vec<&str> = names
            .iter()
            .filter(|n| n.ends_with(".csv"))
            .filter_map(|n| devintel_io::locate::date_stamp(n, "csv"))
            .collect();

        match picked {
            None => prop_assert!(names.iter().all(|n| !n.ends_with(".csv"))),
            Some(name) => {
                prop_assert!(name.ends_with(".csv"));
                if let Some(max) = stamps.iter().max() {
                    prop_assert_eq!(devintel_io::locate::date_stamp(name, "csv"), Some(*max));
                }
            }
        }
        // Same listing, same answer
        prop_assert_eq!(picked, select_latest(&names, "A_", "csv"));
    }

    #[test]
    fn money_parse_is_stable_through_format(whole in 0u64..1_000_000_000_000) {
        for text in [whole.to_string(), format_amount(whole as f64)] {
            let parsed = parse_amount(&text);
            prop_assert_eq!(parse_amount(&format_amount(parsed)), parsed);
        }
    }

    #[test]
    fn units_are_conserved(rows in prop::collection::vec(arb_record(), 0..60)) {
        let input_total: f64 = rows.iter().map(|r| r.2 as f64 / 2.0).sum();
        let tables = entity_tables(rows);
        let mut diags = Diagnostics::new();
        let agg = aggregate_projects(&tables, &SynonymSets::default(), Tier::Elevated, &mut diags);

        let grouped_total: f64 = agg.projects.iter().map(|p| p.total_units_per_project).sum();
        prop_assert!((grouped_total - input_total).abs() < 1e-9);
    }

    #[test]
    fn bucket_counts_never_exceed_rows(rows in prop::collection::vec(arb_record(), 1..60)) {
        let tables = entity_tables(rows);
        let mut diags = Diagnostics::new();
        let agg = aggregate_projects(&tables, &SynonymSets::default(), Tier::Elevated, &mut diags);
        prop_assert_eq!(&agg.fidelity, &Fidelity::Full);

        for p in &agg.projects {
            let rows = p.record_count as u64;
            prop_assert!(p.units_sold_per_project + p.units_unsold_per_project <= rows);
            prop_assert!(p.bumi_units_per_project + p.non_bumi_units_per_project <= rows);
        }
    }

    #[test]
    fn bucket_counts_stay_within_rows_under_schema_gaps(
        rows in prop::collection::vec(arb_record(), 1..60),
        gaps in prop::collection::vec(any::<(bool, bool)>(), 3),
        blank_status in prop::bool::weighted(0.2),
    ) {
        let tables = gapped_tables(rows, &gaps, blank_status);
        let mut diags = Diagnostics::new();
        let agg = aggregate_projects(&tables, &SynonymSets::default(), Tier::Elevated, &mut diags);

        match &agg.fidelity {
            Fidelity::Full => prop_assert!(!blank_status),
            Fidelity::Reduced { missing } => {
                prop_assert!(blank_status);
                prop_assert_eq!(missing, &vec![CanonicalField::StatusJualan]);
            }
            Fidelity::NoData => prop_assert!(false, "non-empty input reported no data"),
        }

        let no_status = blank_status || gap_everywhere(&tables, CanonicalField::StatusJualan);
        let no_quota = gap_everywhere(&tables, CanonicalField::KuotaBumi);
        for p in &agg.projects {
            let rows = p.record_count as u64;
            let status = p.units_sold_per_project + p.units_unsold_per_project;
            let quota = p.bumi_units_per_project + p.non_bumi_units_per_project;
            prop_assert!(status <= rows);
            prop_assert!(quota <= rows);
            if no_status {
                prop_assert_eq!(status, 0);
            }
            if no_quota {
                prop_assert_eq!(quota, 0);
            }
        }
    }

    #[test]
    fn percentages_are_bounded(rows in prop::collection::vec(arb_record(), 1..60)) {
        let tables = entity_tables(rows);
        let mut diags = Diagnostics::new();
        let agg = aggregate_projects(&tables, &SynonymSets::default(), Tier::Elevated, &mut diags);

        for p in &agg.projects {
            for pct in [p.pct_units_sold, p.pct_bumi_units] {
                let pct = pct.unwrap();
                prop_assert!((0.0..=100.0).contains(&pct));
                if p.total_units_per_project == 0.0 {
                    prop_assert_eq!(pct, 0.0);
                }
            }
        }
    }

    #[test]
    fn outer_join_drops_no_project(summary in arb_keys(), detail in arb_keys()) {
        let expected: BTreeSet<String> = summary.iter().chain(detail.iter()).flatten().cloned().collect();
        let longest = summary.len().max(detail.len());

        let merged = reconcile(
            key_table(&summary, Origin::Summary),
            key_table(&detail, Origin::Detail),
            "Kod Projek & Nama Projek",
        )
        .table;

        let found: BTreeSet<String> = (0..merged.len())
            .filter_map(|r| merged.value(r, "project_name").map(str::to_string))
            .collect();
        prop_assert_eq!(found, expected);
        prop_assert!(merged.len() >= longest);
    }
}
