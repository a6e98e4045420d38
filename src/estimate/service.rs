use tracing::{debug, trace};

use super::types::{
    BaseCosts, CostBreakdown, EmergencyScenario, LineItem, ServiceCategory, UsageVector,
};
use crate::error::ValidationError;
use crate::plans::Plan;

/// Estimate a year of costs for `usage` under `plan`.
///
/// Categories are settled in [`ServiceCategory::ALL`] order. Each call starts
/// with the full deductible and an empty out-of-pocket total.
pub fn estimate(
    plan: &Plan,
    usage: &UsageVector,
    base_costs: &BaseCosts,
) -> Result<CostBreakdown, ValidationError> {
    validate_plan(plan)?;
    validate_usage(plan, usage)?;

    let mut ledger = Ledger::new(plan);
    let mut lines = Vec::with_capacity(ServiceCategory::ALL.len());
    for category in ServiceCategory::ALL {
        let line = ledger.settle(category, usage.count(category), base_costs)?;
        lines.push(line);
    }

    let allowed_total = lines.iter().map(|l| l.allowed).sum();
    let deductible_applied = lines.iter().map(|l| l.deductible).sum();
    let plan_paid = lines.iter().map(|l| l.plan_paid).sum();
    let annual_premium = plan.annual_premium();
    let out_of_pocket = ledger.out_of_pocket;

    debug!(
        plan = %plan.name,
        out_of_pocket,
        annual_premium,
        "estimated annual cost"
    );

    Ok(CostBreakdown {
        plan: plan.name.clone(),
        lines,
        allowed_total,
        deductible_applied,
        out_of_pocket,
        plan_paid,
        annual_premium,
        total: annual_premium + out_of_pocket,
    })
}

/// [`estimate`] with an emergency scenario merged into the usage first.
///
/// Scenario counts are checked on their own so a negative entry cannot cancel
/// routine usage before the merged vector is validated.
pub fn estimate_with_scenario(
    plan: &Plan,
    usage: &UsageVector,
    scenario: Option<&EmergencyScenario>,
    base_costs: &BaseCosts,
) -> Result<CostBreakdown, ValidationError> {
    match scenario {
        Some(s) => {
            validate_scenario(plan, s)?;
            estimate(plan, &usage.merged(s), base_costs)
        }
        None => estimate(plan, usage, base_costs),
    }
}

fn validate_plan(plan: &Plan) -> Result<(), ValidationError> {
    if plan.monthly_premium.is_nan() || plan.monthly_premium < 0.0 {
        return Err(ValidationError::NegativePremium {
            plan: plan.name.clone(),
            premium: plan.monthly_premium,
        });
    }
    let deductible_ok = plan.deductible >= 0.0 && plan.deductible <= plan.out_of_pocket_limit;
    if !deductible_ok {
        return Err(ValidationError::InvalidDeductible {
            plan: plan.name.clone(),
            deductible: plan.deductible,
            limit: plan.out_of_pocket_limit,
        });
    }
    Ok(())
}

fn validate_usage(plan: &Plan, usage: &UsageVector) -> Result<(), ValidationError> {
    for category in ServiceCategory::ALL {
        let count = usage.count(category);
        if count < 0 {
            return Err(ValidationError::NegativeUsage {
                plan: plan.name.clone(),
                category,
                count,
            });
        }
    }
    Ok(())
}

fn validate_scenario(plan: &Plan, scenario: &EmergencyScenario) -> Result<(), ValidationError> {
    match scenario.counts().into_iter().find(|(_, count)| *count < 0) {
        Some((category, count)) => Err(ValidationError::NegativeUsage {
            plan: plan.name.clone(),
            category,
            count,
        }),
        None => Ok(()),
    }
}

/// Per-call deductible and out-of-pocket balances.
struct Ledger<'a> {
    plan: &'a Plan,
    deductible_left: f64,
    out_of_pocket: f64,
}

impl<'a> Ledger<'a> {
    fn new(plan: &'a Plan) -> Self {
        Self {
            plan,
            deductible_left: plan.deductible,
            out_of_pocket: 0.0,
        }
    }

    fn settle(
        &mut self,
        category: ServiceCategory,
        units: i64,
        base_costs: &BaseCosts,
    ) -> Result<LineItem, ValidationError> {
        if units == 0 {
            return Ok(LineItem::zero(category));
        }

        let rule = self
            .plan
            .rule(category)
            .ok_or_else(|| ValidationError::MissingRule {
                plan: self.plan.name.clone(),
                category,
            })?;

        let unit_cost = base_costs.unit_cost(category);
        let allowed = unit_cost * units as f64;

        let bypass = category.is_drug_tier()
            || self.plan.is_pre_deductible(category)
            || !rule.applies_deductible();

        let (toward_deductible, share) = if bypass {
            (0.0, rule.member_share(allowed, units))
        } else {
            let toward_deductible = allowed.min(self.deductible_left);
            self.deductible_left -= toward_deductible;
            let remainder = allowed - toward_deductible;
            let units_left = units_past_deductible(units, unit_cost, toward_deductible);
            (toward_deductible, rule.member_share(remainder, units_left))
        };

        let headroom = (self.plan.out_of_pocket_limit - self.out_of_pocket).max(0.0);
        let member = (toward_deductible + share).min(headroom);
        self.out_of_pocket += member;

        trace!(
            plan = %self.plan.name,
            category = category.key(),
            units,
            allowed,
            toward_deductible,
            member,
            "settled category"
        );

        Ok(LineItem {
            category,
            units,
            allowed,
            deductible: toward_deductible.min(member),
            member,
            plan_paid: allowed - member,
        })
    }
}

/// Units whose cost was not entirely absorbed by the deductible; copays and
/// per-unit caps apply to these.
fn units_past_deductible(units: i64, unit_cost: f64, toward_deductible: f64) -> i64 {
    if unit_cost <= 0.0 {
        return units;
    }
    let absorbed = (toward_deductible / unit_cost).floor() as i64;
    (units - absorbed).clamp(0, units)
}
