//! Side-by-side estimates for a set of plans.

use tracing::{debug, warn};

use crate::error::ValidationError;
use crate::estimate::{
    estimate_with_scenario, BaseCosts, CostBreakdown, EmergencyScenario, UsageVector,
};
use crate::plans::Plan;

/// One plan's outcome in a comparison. A failed estimate stays in the table
/// next to the plans that did price.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub insurer: String,
    pub plan: String,
    pub plan_type: String,
    pub monthly_premium: f64,
    pub result: Result<CostBreakdown, ValidationError>,
}

impl ComparisonRow {
    pub fn breakdown(&self) -> Option<&CostBreakdown> {
        self.result.as_ref().ok()
    }

    pub fn total(&self) -> Option<f64> {
        self.breakdown().map(|b| b.total)
    }
}

/// Estimate every plan for the same usage. Rows come back ordered by insurer,
/// then monthly premium, then plan name.
pub fn compare<'a>(
    plans: impl IntoIterator<Item = &'a Plan>,
    usage: &UsageVector,
    scenario: Option<&EmergencyScenario>,
    base_costs: &BaseCosts,
) -> Vec<ComparisonRow> {
    let mut plans: Vec<&Plan> = plans.into_iter().collect();
    plans.sort_by(|a, b| {
        a.insurer
            .cmp(&b.insurer)
            .then_with(|| a.monthly_premium.total_cmp(&b.monthly_premium))
            .then_with(|| a.name.cmp(&b.name))
    });

    let rows: Vec<ComparisonRow> = plans
        .into_iter()
        .map(|plan| {
            let result = estimate_with_scenario(plan, usage, scenario, base_costs);
            if let Err(err) = &result {
                warn!(
                    plan = err.plan(),
                    category = ?err.category(),
                    error = %err,
                    "plan could not be estimated"
                );
            }
            ComparisonRow {
                insurer: plan.insurer.clone(),
                plan: plan.name.clone(),
                plan_type: plan.plan_type.clone(),
                monthly_premium: plan.monthly_premium,
                result,
            }
        })
        .collect();

    debug!(
        plans = rows.len(),
        failed = rows.iter().filter(|r| r.result.is_err()).count(),
        "comparison finished"
    );
    rows
}

/// Row with the lowest grand total among successful estimates. The first row
/// wins a tie.
pub fn cheapest(rows: &[ComparisonRow]) -> Option<&ComparisonRow> {
    rows.iter()
        .filter_map(|row| row.total().map(|total| (row, total)))
        .fold(None, |best: Option<(&ComparisonRow, f64)>, (row, total)| match best {
            Some((_, best_total)) if best_total <= total => best,
            _ => Some((row, total)),
        })
        .map(|(row, _)| row)
}
