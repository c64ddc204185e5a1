use std::fmt;

use chrono::NaiveDate;
use devintel_core::{CanonicalField, Diagnostic, Entity, Tier};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Per-project aggregates
// ---------------------------------------------------------------------------

/// One row per distinct (entity, project_name).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectAggregate {
    pub pemaju: Entity,
    pub project_name: String,
    /// Canonical records folded into this row.
    pub record_count: usize,
    pub total_units_per_project: f64,
    pub total_sales_per_project: f64,
    pub total_sales_spjb_per_project: f64,
    pub units_sold_per_project: u64,
    pub units_unsold_per_project: u64,
    pub bumi_units_per_project: u64,
    pub non_bumi_units_per_project: u64,
    pub nama_pemaju: String,
    pub scraped_date: NaiveDate,
    /// Elevated tier only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pct_units_sold: Option<f64>,
    /// Elevated tier only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pct_bumi_units: Option<f64>,
}

// ---------------------------------------------------------------------------
// Global summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobalSummary {
    /// Size of the requested selection, not of the surviving groups.
    pub total_pemajus: usize,
    pub total_projects: usize,
    pub total_units: f64,
    pub total_sales: f64,
    pub total_sales_spjb: f64,
    pub total_units_sold: u64,
    pub total_units_unsold: u64,
    pub total_bumi_units: u64,
    pub total_non_bumi_units: u64,
    pub scraped_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced: Option<AdvancedMetrics>,
}

/// Elevated-tier KPIs derived from the summary totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdvancedMetrics {
    pub pct_total_units_sold: f64,
    pub pct_bumi_units: f64,
    pub average_sale_price: f64,
}

/// Totals for one entity across its projects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRollup {
    pub pemaju: Entity,
    pub projects: usize,
    pub total_units: f64,
    pub total_sales: f64,
    pub total_sales_spjb: f64,
    pub units_sold: u64,
    pub units_unsold: u64,
    pub bumi_units: u64,
    pub non_bumi_units: u64,
}

// ---------------------------------------------------------------------------
// Run result
// ---------------------------------------------------------------------------

/// How much of the aggregation could be computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "fidelity")]
pub enum Fidelity {
    /// Every breakdown field carried values, injected defaults included.
    Full,
    /// A categorical field carried no value in any record. Sums are exact and
    /// only the named fields' counts are zero.
    Reduced { missing: Vec<CanonicalField> },
    /// Every selected entity came back empty.
    NoData,
}

impl Fidelity {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Fidelity::NoData)
    }
}

impl fmt::Display for Fidelity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Reduced { missing } => {
                let names: Vec<&str> = missing.iter().map(|m| m.name()).collect();
                write!(f, "reduced (missing {})", names.join(", "))
            }
            Self::NoData => write!(f, "no data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub tier: Tier,
    pub fidelity: Fidelity,
    pub projects: Vec<ProjectAggregate>,
    pub summary: GlobalSummary,
    pub diagnostics: Vec<Diagnostic>,
}

impl AggregateReport {
    pub fn is_no_data(&self) -> bool {
        self.fidelity.is_no_data()
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    HighUnitsSold,
    HighTotalSales,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub pemaju: Entity,
    pub project_name: String,
    /// The value that crossed the threshold.
    pub value: f64,
    pub threshold: f64,
}
