// Report rendering: human table, JSON document, project CSV

use std::io::{self, Write};

use clap::ValueEnum;
use devintel_core::money::format_amount;
use devintel_core::{Diagnostic, Entity, Tier};
use devintel_recon::{Alert, AlertKind, EntityRollup, Fidelity, GlobalSummary, ProjectAggregate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

/// Everything one `report` run prints.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub tier: Tier,
    pub entities: &'a [Entity],
    #[serde(flatten)]
    pub fidelity: &'a Fidelity,
    pub summary: &'a GlobalSummary,
    /// Project rows after filtering.
    pub projects: &'a [ProjectAggregate],
    /// Unfiltered per-entity totals.
    pub rollups: &'a [EntityRollup],
    pub alerts: &'a [Alert],
    pub diagnostics: &'a [Diagnostic],
    /// Aggregated project rows before filtering.
    #[serde(skip)]
    pub total_projects: usize,
}

pub fn render(doc: &ReportDocument<'_>, format: OutputFormat, w: &mut dyn Write) -> io::Result<()> {
    match format {
        OutputFormat::Table => render_table(doc, w),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *w, doc)?;
            writeln!(w)
        }
        OutputFormat::Csv => render_csv(doc, w),
    }
}

// ---------------------------------------------------------------------------
// Human table
// ---------------------------------------------------------------------------

fn render_table(doc: &ReportDocument<'_>, w: &mut dyn Write) -> io::Result<()> {
    let names: Vec<&str> = doc.entities.iter().map(Entity::as_str).collect();
    let cadence = if doc.tier.is_elevated() { "daily" } else { "weekly" };
    let scraped = match doc.summary.scraped_date {
        Some(date) => format!("{date} (synthetic, {cadence} sync)"),
        None => "-".to_string(),
    };

    writeln!(w, "Tier:      {}", doc.tier)?;
    writeln!(w, "Entities:  {}", names.join(", "))?;
    writeln!(w, "Fidelity:  {}", doc.fidelity)?;
    writeln!(w, "Scraped:   {scraped}")?;
    writeln!(w)?;

    let s = doc.summary;
    let mut kpis = vec![
        ("Pemajus", s.total_pemajus.to_string()),
        ("Projects", s.total_projects.to_string()),
        ("Total units", units(s.total_units)),
        ("Total sales", format_amount(s.total_sales)),
        ("Total SPJB sales", format_amount(s.total_sales_spjb)),
        ("Units sold", s.total_units_sold.to_string()),
        ("Units unsold", s.total_units_unsold.to_string()),
        ("Bumi units", s.total_bumi_units.to_string()),
        ("Non-bumi units", s.total_non_bumi_units.to_string()),
    ];
    if let Some(ref adv) = s.advanced {
        kpis.push(("% units sold", format!("{:.2}%", adv.pct_total_units_sold)));
        kpis.push(("% bumi units", format!("{:.2}%", adv.pct_bumi_units)));
        kpis.push(("Average price", format_amount(adv.average_sale_price)));
    }
    writeln!(w, "SUMMARY")?;
    for (label, value) in &kpis {
        writeln!(w, "  {label:<18}{value}")?;
    }

    writeln!(w)?;
    writeln!(w, "PROJECTS ({} of {})", doc.projects.len(), doc.total_projects)?;
    let mut headers = vec![
        Column::text("PEMAJU"),
        Column::text("PROJECT"),
        Column::num("UNITS"),
        Column::num("SALES"),
        Column::num("SPJB"),
        Column::num("SOLD"),
        Column::num("UNSOLD"),
        Column::num("BUMI"),
        Column::num("NON-BUMI"),
    ];
    if doc.tier.is_elevated() {
        headers.push(Column::num("%SOLD"));
        headers.push(Column::num("%BUMI"));
    }
    let rows: Vec<Vec<String>> = doc.projects.iter().map(project_cells).collect();
    write_grid(w, &headers, &rows)?;

    if doc.rollups.len() > 1 {
        writeln!(w)?;
        writeln!(w, "BY PEMAJU")?;
        let headers = [
            Column::text("PEMAJU"),
            Column::num("PROJECTS"),
            Column::num("UNITS"),
            Column::num("SALES"),
            Column::num("SOLD"),
            Column::num("UNSOLD"),
        ];
        let rows: Vec<Vec<String>> = doc
            .rollups
            .iter()
            .map(|r| {
                vec![
                    r.pemaju.to_string(),
                    r.projects.to_string(),
                    units(r.total_units),
                    format_amount(r.total_sales),
                    r.units_sold.to_string(),
                    r.units_unsold.to_string(),
                ]
            })
            .collect();
        write_grid(w, &headers, &rows)?;
    }

    if !doc.alerts.is_empty() {
        writeln!(w)?;
        writeln!(w, "ALERTS")?;
        for alert in doc.alerts {
            let detail = match alert.kind {
                AlertKind::HighUnitsSold => format!(
                    "{} units sold (above {})",
                    alert.value, alert.threshold
                ),
                AlertKind::HighTotalSales => format!(
                    "{} in sales (above {})",
                    format_amount(alert.value),
                    format_amount(alert.threshold)
                ),
            };
            writeln!(w, "  {} / {}: {}", alert.pemaju, alert.project_name, detail)?;
        }
    }
    Ok(())
}

fn project_cells(p: &ProjectAggregate) -> Vec<String> {
    let mut cells = vec![
        p.pemaju.to_string(),
        p.project_name.clone(),
        units(p.total_units_per_project),
        format_amount(p.total_sales_per_project),
        format_amount(p.total_sales_spjb_per_project),
        p.units_sold_per_project.to_string(),
        p.units_unsold_per_project.to_string(),
        p.bumi_units_per_project.to_string(),
        p.non_bumi_units_per_project.to_string(),
    ];
    for pct in [p.pct_units_sold, p.pct_bumi_units].into_iter().flatten() {
        cells.push(format!("{pct:.2}"));
    }
    cells
}

/// Whole unit counts print without decimals.
fn units(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

pub(crate) struct Column {
    title: &'static str,
    right: bool,
}

impl Column {
    pub(crate) fn text(title: &'static str) -> Self {
        Self { title, right: false }
    }

    pub(crate) fn num(title: &'static str) -> Self {
        Self { title, right: true }
    }
}

/// Aligned columns separated by two spaces.
pub(crate) fn write_grid(w: &mut dyn Write, columns: &[Column], rows: &[Vec<String>]) -> io::Result<()> {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.title.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(columns)
            .zip(&widths)
            .map(|((cell, col), &width)| {
                if col.right {
                    format!("{cell:>width$}")
                } else {
                    format!("{cell:<width$}")
                }
            })
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    writeln!(w, "{}", line(columns.iter().map(|c| c.title).collect()))?;
    for row in rows {
        writeln!(w, "{}", line(row.iter().map(String::as_str).collect()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

const CSV_HEADER: [&str; 12] = [
    "pemaju",
    "project_name",
    "record_count",
    "total_units_per_project",
    "total_sales_per_project",
    "total_sales_spjb_per_project",
    "units_sold_per_project",
    "units_unsold_per_project",
    "bumi_units_per_project",
    "non_bumi_units_per_project",
    "nama_pemaju",
    "scraped_date",
];

/// Filtered project rows; the elevated tier adds the percentage columns.
fn render_csv(doc: &ReportDocument<'_>, w: &mut dyn Write) -> io::Result<()> {
    let mut out = csv::Writer::from_writer(w);

    let mut header: Vec<&str> = CSV_HEADER.to_vec();
    if doc.tier.is_elevated() {
        header.extend(["pct_units_sold", "pct_bumi_units"]);
    }
    out.write_record(&header)?;

    for p in doc.projects {
        let mut record = vec![
            p.pemaju.to_string(),
            p.project_name.clone(),
            p.record_count.to_string(),
            p.total_units_per_project.to_string(),
            p.total_sales_per_project.to_string(),
            p.total_sales_spjb_per_project.to_string(),
            p.units_sold_per_project.to_string(),
            p.units_unsold_per_project.to_string(),
            p.bumi_units_per_project.to_string(),
            p.non_bumi_units_per_project.to_string(),
            p.nama_pemaju.clone(),
            p.scraped_date.to_string(),
        ];
        if doc.tier.is_elevated() {
            for pct in [p.pct_units_sold, p.pct_bumi_units] {
                record.push(pct.map(|v| v.to_string()).unwrap_or_default());
            }
        }
        out.write_record(&record)?;
    }
    out.flush()
}
