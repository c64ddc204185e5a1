// Global and per-entity rollups over project aggregates

use std::collections::{BTreeSet, HashMap};

use devintel_core::Tier;

use crate::aggregate::{percent, round2};
use crate::model::{AdvancedMetrics, EntityRollup, GlobalSummary, ProjectAggregate};

/// Sum every project column. `selected` is the number of entities the caller
/// asked for, which may exceed the entities that produced rows.
pub fn compute_summary(projects: &[ProjectAggregate], selected: usize, tier: Tier) -> GlobalSummary {
    let mut summary = GlobalSummary {
        total_pemajus: selected,
        scraped_date: projects.first().map(|p| p.scraped_date),
        ..GlobalSummary::default()
    };

    let mut names = BTreeSet::new();
    for p in projects {
        names.insert(p.project_name.as_str());
        summary.total_units += p.total_units_per_project;
        summary.total_sales += p.total_sales_per_project;
        summary.total_sales_spjb += p.total_sales_spjb_per_project;
        summary.total_units_sold += p.units_sold_per_project;
        summary.total_units_unsold += p.units_unsold_per_project;
        summary.total_bumi_units += p.bumi_units_per_project;
        summary.total_non_bumi_units += p.non_bumi_units_per_project;
    }
    summary.total_projects = names.len();

    if tier.is_elevated() {
        summary.advanced = Some(advanced_metrics(&summary));
    }
    summary
}

fn advanced_metrics(summary: &GlobalSummary) -> AdvancedMetrics {
    let average_sale_price = if summary.total_units == 0.0 {
        0.0
    } else {
        round2(summary.total_sales / summary.total_units)
    };
    AdvancedMetrics {
        pct_total_units_sold: percent(summary.total_units_sold as f64, summary.total_units),
        pct_bumi_units: percent(summary.total_bumi_units as f64, summary.total_units),
        average_sale_price,
    }
}

/// One rollup per entity, in the order entities first appear.
pub fn rollup_by_entity(projects: &[ProjectAggregate]) -> Vec<EntityRollup> {
    let mut rollups: Vec<EntityRollup> = Vec::new();
    let mut index = HashMap::new();

    for p in projects {
        let idx = *index.entry(p.pemaju.clone()).or_insert_with(|| {
            rollups.push(EntityRollup {
                pemaju: p.pemaju.clone(),
                projects: 0,
                total_units: 0.0,
                total_sales: 0.0,
                total_sales_spjb: 0.0,
                units_sold: 0,
                units_unsold: 0,
                bumi_units: 0,
                non_bumi_units: 0,
            });
            rollups.len() - 1
        });
        let r = &mut rollups[idx];
        r.projects += 1;
        r.total_units += p.total_units_per_project;
        r.total_sales += p.total_sales_per_project;
        r.total_sales_spjb += p.total_sales_spjb_per_project;
        r.units_sold += p.units_sold_per_project;
        r.units_unsold += p.units_unsold_per_project;
        r.bumi_units += p.bumi_units_per_project;
        r.non_bumi_units += p.non_bumi_units_per_project;
    }

    rollups
}
