// End-to-end: files on disk -> Pipeline::run -> AggregateReport

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use devintel_config::{EntitySource, Settings};
use devintel_core::{CanonicalField, Entity, Origin, Severity, Tier};
use devintel_recon::{
    rollup_by_entity, AlertKind, Fidelity, JoinKeyKind, MergeStrategy, Pipeline, ProjectFilter,
};
use rust_xlsxwriter::Workbook;
use tempfile::{tempdir, TempDir};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn settings(dir: &Path, names: &[&str]) -> Settings {
    Settings {
        data_dir: dir.to_path_buf(),
        entities: names
            .iter()
            .map(|n| EntitySource {
                name: n.to_string(),
                prefix: format!("{n}_MELAKA_PROJECT_DETAILS_"),
                fallback_stamp: "20251212".into(),
            })
            .collect(),
        ..Settings::default()
    }
}

fn pipeline(dir: &TempDir, names: &[&str]) -> Pipeline {
    Pipeline::new(settings(dir.path(), names)).with_today(today())
}

fn write_summary(dir: &Path, entity: &str, stamp: &str, content: &str) {
    let path = dir.join(format!("{entity}_MELAKA_PROJECT_DETAILS_{stamp}.csv"));
    fs::write(path, content).unwrap();
}

fn write_detail(dir: &Path, entity: &str, stamp: &str, sheets: Vec<(&str, Vec<&str>, Vec<Vec<&str>>)>) {
    let path = dir.join(format!("{entity}_MELAKA_PROJECT_DETAILS_{stamp}.xlsx"));
    let mut workbook = Workbook::new();
    for (name, headers, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name).unwrap();
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        for (r, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                match value.parse::<f64>() {
                    Ok(n) => sheet.write_number(r as u32 + 1, col as u16, n).unwrap(),
                    Err(_) => sheet.write_string(r as u32 + 1, col as u16, *value).unwrap(),
                };
            }
        }
    }
    workbook.save(path).unwrap();
}

fn a(name: &str) -> Entity {
    Entity::new(name)
}

// -------------------------------------------------------------------------
// Single-source entities
// -------------------------------------------------------------------------

#[test]
fn summary_only_entity() {
    let dir = tempdir().unwrap();
    write_summary(
        dir.path(),
        "A",
        "20251212",
        "Kod Projek & Nama Projek,No PT/Lot/Plot/No Unit,Status Jualan\n\
         P1,10,sold\n\
         P2,5,belum dijual\n",
    );

    let report = pipeline(&dir, &["A"]).run(&[a("A")], Tier::Base);

    assert_eq!(report.projects.len(), 2);
    let p1 = &report.projects[0];
    assert_eq!(p1.project_name, "P1");
    assert_eq!(p1.units_sold_per_project, 1);
    assert_eq!(p1.total_units_per_project, 10.0);
    let p2 = &report.projects[1];
    assert_eq!(p2.project_name, "P2");
    assert_eq!(p2.units_unsold_per_project, 1);
    assert_eq!(p2.total_units_per_project, 5.0);

    assert_eq!(report.summary.total_units, 15.0);
    assert_eq!(report.summary.total_pemajus, 1);
    assert_eq!(report.summary.total_projects, 2);
    assert_eq!(report.fidelity, Fidelity::Full);
}

#[test]
fn detail_only_entity_takes_projects_from_sheet_names() {
    let dir = tempdir().unwrap();
    write_detail(
        dir.path(),
        "B",
        "20251212",
        vec![
            (
                "ProjA",
                vec!["No PT/Lot/Plot/No Unit", "Status Jualan", "Kuota Bumi"],
                vec![vec!["1", "Terjual", "Ya"], vec!["1", "Belum dijual", "Tidak"]],
            ),
            (
                "ProjB",
                vec!["No PT/Lot/Plot/No Unit", "Status Jualan", "Kuota Bumi"],
                vec![vec!["2", "Sold", "No"]],
            ),
        ],
    );

    let p = pipeline(&dir, &["B"]);
    let loaded = p.load_entity(&a("B"), Tier::Base);
    assert!(!loaded.table.is_empty());
    assert_eq!(loaded.strategy, Some(MergeStrategy::DetailOnly));
    assert!(loaded.table.records.iter().all(|r| r.origin == Origin::Detail));
    let synthetic = today() - chrono::Duration::days(7);
    assert!(loaded.table.records.iter().all(|r| r.scraped_date == synthetic));

    let report = p.run(&[a("B")], Tier::Base);
    let names: Vec<&str> = report.projects.iter().map(|g| g.project_name.as_str()).collect();
    assert_eq!(names, vec!["ProjA", "ProjB"]);
    assert_eq!(report.projects[0].units_sold_per_project, 1);
    assert_eq!(report.projects[0].bumi_units_per_project, 1);
    assert_eq!(report.projects[1].total_units_per_project, 2.0);
    assert_eq!(report.summary.scraped_date, Some(synthetic));
}

#[test]
fn entity_without_files_yields_no_data() {
    let dir = tempdir().unwrap();
    let report = pipeline(&dir, &["C"]).run(&[a("C")], Tier::Elevated);

    assert!(report.is_no_data());
    assert!(report.projects.is_empty());
    assert_eq!(report.summary.total_pemajus, 1);
    assert_eq!(report.summary.total_projects, 0);
    assert_eq!(report.summary.total_units, 0.0);
    assert_eq!(report.summary.total_sales, 0.0);
    assert_eq!(report.summary.total_units_sold, 0);
    assert_eq!(report.summary.total_bumi_units, 0);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Warning && d.entity.is_none()));
}

// -------------------------------------------------------------------------
// Reconciliation
// -------------------------------------------------------------------------

#[test]
fn summary_joins_detail_on_sheet_name() {
    let dir = tempdir().unwrap();
    write_summary(
        dir.path(),
        "D",
        "20251212",
        "Kod Projek & Nama Projek,Kod Pemaju & Nama Pemaju\n\
         ProjA,D Holdings\n\
         Lonely,D Holdings\n",
    );
    write_detail(
        dir.path(),
        "D",
        "20251212",
        vec![(
            "ProjA",
            vec!["No PT/Lot/Plot/No Unit", "Harga Jualan (RM)", "Status Jualan", "Kuota Bumi"],
            vec![
                vec!["1", "RM 300,000", "sold", "ya"],
                vec!["1", "RM 320,000", "unsold", "tidak"],
            ],
        )],
    );

    let p = pipeline(&dir, &["D"]);
    let loaded = p.load_entity(&a("D"), Tier::Base);
    match &loaded.strategy {
        Some(MergeStrategy::Joined(key)) => assert_eq!(key.kind, JoinKeyKind::SheetName),
        other => panic!("expected a join, got {other:?}"),
    }

    let origins: Vec<Origin> = loaded.table.records.iter().map(|r| r.origin).collect();
    assert_eq!(origins, vec![Origin::Merged, Origin::Merged, Origin::Summary]);
    assert!(loaded.table.records.iter().all(|r| r.nama_pemaju == "D Holdings"));

    let report = p.run(&[a("D")], Tier::Base);
    let proj_a = report
        .projects
        .iter()
        .find(|g| g.project_name == "ProjA")
        .unwrap();
    assert_eq!(proj_a.total_sales_per_project, 620_000.0);
    assert_eq!(proj_a.units_sold_per_project, 1);
    assert_eq!(proj_a.units_unsold_per_project, 1);
    assert!(report.projects.iter().any(|g| g.project_name == "Lonely"));
}

#[test]
fn newest_dated_export_is_used() {
    let dir = tempdir().unwrap();
    write_summary(dir.path(), "A", "20250101", "Kod Projek & Nama Projek\nOld\n");
    write_summary(dir.path(), "A", "20251130", "Kod Projek & Nama Projek\nNew\n");

    let report = pipeline(&dir, &["A"]).run(&[a("A")], Tier::Base);
    let names: Vec<&str> = report.projects.iter().map(|g| g.project_name.as_str()).collect();
    assert_eq!(names, vec!["New"]);
}

// -------------------------------------------------------------------------
// Degraded paths
// -------------------------------------------------------------------------

#[test]
fn missing_status_column_leaves_status_counts_at_zero() {
    let dir = tempdir().unwrap();
    write_summary(
        dir.path(),
        "A",
        "20251212",
        "Kod Projek & Nama Projek,No PT/Lot/Plot/No Unit,Harga Jualan (RM),Kuota Bumi\n\
         P1,3,\"RM 100,000\",Ya\n\
         P1,2,\"RM 50,000\",Tidak\n",
    );

    let report = pipeline(&dir, &["A"]).run(&[a("A")], Tier::Base);
    assert_eq!(report.fidelity, Fidelity::Full);
    let p1 = &report.projects[0];
    assert_eq!(p1.total_units_per_project, 5.0);
    assert_eq!(p1.total_sales_per_project, 150_000.0);
    assert_eq!(p1.units_sold_per_project, 0);
    assert_eq!(p1.units_unsold_per_project, 0);
    assert_eq!(p1.bumi_units_per_project, 1);
    assert_eq!(p1.non_bumi_units_per_project, 1);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.entity.is_none() && d.message.contains(CanonicalField::StatusJualan.name())));
}

#[test]
fn missing_quota_column_keeps_status_counts() {
    let dir = tempdir().unwrap();
    write_summary(
        dir.path(),
        "A",
        "20251212",
        "Kod Projek & Nama Projek,No PT/Lot/Plot/No Unit,Status Jualan\n\
         P1,4,Telah Dijual\n\
         P1,4,Belum Dijual\n\
         P1,2,Terjual\n\
         P2,6,Tempahan\n",
    );

    let report = pipeline(&dir, &["A"]).run(&[a("A")], Tier::Elevated);
    assert_eq!(report.fidelity, Fidelity::Full);

    let p1 = &report.projects[0];
    assert_eq!(p1.units_sold_per_project, 2);
    assert_eq!(p1.units_unsold_per_project, 1);
    assert_eq!(p1.bumi_units_per_project, 0);
    assert_eq!(p1.non_bumi_units_per_project, 0);
    assert_eq!(p1.pct_units_sold, Some(20.0));

    let p2 = &report.projects[1];
    assert_eq!(p2.units_sold_per_project, 0);
    assert_eq!(p2.units_unsold_per_project, 0);
    assert_eq!(report.summary.total_units_sold, 2);
    assert_eq!(report.summary.total_units_unsold, 1);
}

#[test]
fn one_broken_entity_does_not_stop_the_others() {
    let dir = tempdir().unwrap();
    write_summary(dir.path(), "A", "20251212", "Kod Projek & Nama Projek\nP1\n");
    fs::write(
        dir.path().join("B_MELAKA_PROJECT_DETAILS_20251212.xlsx"),
        b"garbage",
    )
    .unwrap();

    let report = pipeline(&dir, &["A", "B"]).run(&[a("A"), a("B")], Tier::Elevated);
    assert!(!report.is_no_data());
    assert_eq!(report.summary.total_pemajus, 2);
    assert_eq!(report.projects.len(), 1);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Error && d.entity == Some(a("B"))));
}

// -------------------------------------------------------------------------
// Elevated tier, filters, rollups
// -------------------------------------------------------------------------

#[test]
fn elevated_tier_metrics_and_alerts() {
    let dir = tempdir().unwrap();
    let mut csv = String::from(
        "Kod Projek & Nama Projek,No PT/Lot/Plot/No Unit,Harga Jualan (RM),Status Jualan,Kuota Bumi\n",
    );
    for _ in 0..51 {
        csv.push_str("Big,1,\"RM 10,000\",Terjual,Ya\n");
    }
    csv.push_str("Small,4,\"RM 1,000\",Belum dijual,Tidak\n");
    write_summary(dir.path(), "A", "20251212", &csv);

    let p = pipeline(&dir, &["A"]);
    let report = p.run(&[a("A")], Tier::Elevated);

    let big = &report.projects[0];
    assert_eq!(big.project_name, "Big");
    assert_eq!(big.pct_units_sold, Some(100.0));
    assert_eq!(big.pct_bumi_units, Some(100.0));
    let small = &report.projects[1];
    assert_eq!(small.pct_units_sold, Some(0.0));

    let advanced = report.summary.advanced.clone().unwrap();
    assert_eq!(advanced.pct_total_units_sold, 92.73);
    assert_eq!(advanced.average_sale_price, 9_290.91);

    let alerts = p.alerts(&report.projects, Tier::Elevated);
    let kinds: Vec<AlertKind> = alerts.iter().map(|x| x.kind).collect();
    assert_eq!(kinds, vec![AlertKind::HighUnitsSold, AlertKind::HighTotalSales]);
    assert!(alerts.iter().all(|x| x.project_name == "Big"));

    let base = p.run(&[a("A")], Tier::Base);
    assert_eq!(base.projects[0].pct_units_sold, None);
    assert_eq!(base.summary.advanced, None);
    assert!(p.alerts(&base.projects, Tier::Base).is_empty());
}

#[test]
fn filters_do_not_change_the_summary() {
    let dir = tempdir().unwrap();
    write_summary(
        dir.path(),
        "A",
        "20251212",
        "Kod Projek & Nama Projek,Harga Jualan (RM)\nP1,100\nP2,200\nP3,300\n",
    );
    let report = pipeline(&dir, &["A"]).run(&[a("A")], Tier::Elevated);

    let filtered = ProjectFilter::new().with_min_sales(150.0).apply(&report.projects);
    assert_eq!(filtered.len(), 2);
    assert_eq!(report.summary.total_sales, 600.0);
}

#[test]
fn rollups_and_duplicate_selection() {
    let dir = tempdir().unwrap();
    write_summary(dir.path(), "A", "20251212", "Kod Projek & Nama Projek,No PT/Lot/Plot/No Unit\nP1,2\nP2,3\n");
    write_summary(dir.path(), "B", "20251212", "Kod Projek & Nama Projek,No PT/Lot/Plot/No Unit\nP1,7\n");

    let report = pipeline(&dir, &["A", "B"]).run(&[a("B"), a("A"), a("B")], Tier::Elevated);
    assert_eq!(report.summary.total_pemajus, 3);
    assert_eq!(report.summary.total_projects, 2);
    assert_eq!(report.summary.total_units, 12.0);

    let rollups = rollup_by_entity(&report.projects);
    assert_eq!(rollups.len(), 2);
    assert_eq!(rollups[0].pemaju, a("A"));
    assert_eq!(rollups[0].total_units, 5.0);
    assert_eq!(rollups[1].total_units, 7.0);
}

// -------------------------------------------------------------------------
// Cache
// -------------------------------------------------------------------------

#[test]
fn loads_are_memoized_per_entity_and_tier() {
    let dir = tempdir().unwrap();
    write_summary(dir.path(), "A", "20251212", "Kod Projek & Nama Projek\nP1\n");

    let p = pipeline(&dir, &["A"]);
    assert_eq!(p.run(&[a("A")], Tier::Base).projects.len(), 1);
    assert_eq!(p.cache().len(), 1);

    // A file arriving later is not seen until the entry is invalidated
    write_summary(dir.path(), "A", "20251213", "Kod Projek & Nama Projek\nP1\nP2\n");
    assert_eq!(p.run(&[a("A")], Tier::Base).projects.len(), 1);

    p.cache().invalidate(&a("A"));
    assert_eq!(p.run(&[a("A")], Tier::Base).projects.len(), 2);
}
