// Elevated-tier threshold alerts

use devintel_config::AlertThresholds;
use devintel_core::Tier;

use crate::model::{Alert, AlertKind, ProjectAggregate};

/// Alerts for projects strictly above a threshold. The base tier gets none.
pub fn evaluate_alerts(
    projects: &[ProjectAggregate],
    thresholds: &AlertThresholds,
    tier: Tier,
) -> Vec<Alert> {
    if !tier.is_elevated() {
        return Vec::new();
    }

    let mut alerts = Vec::new();
    for p in projects {
        if p.units_sold_per_project > thresholds.units_sold_above {
            alerts.push(Alert {
                kind: AlertKind::HighUnitsSold,
                pemaju: p.pemaju.clone(),
                project_name: p.project_name.clone(),
                value: p.units_sold_per_project as f64,
                threshold: thresholds.units_sold_above as f64,
            });
        }
        if p.total_sales_per_project > thresholds.total_sales_above {
            alerts.push(Alert {
                kind: AlertKind::HighTotalSales,
                pemaju: p.pemaju.clone(),
                project_name: p.project_name.clone(),
                value: p.total_sales_per_project,
                threshold: thresholds.total_sales_above,
            });
        }
    }
    alerts
}
