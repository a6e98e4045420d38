//! Member cost as a function of total pre-insurance spend.
//!
//! Each spend level is turned into a plausible usage vector (which services a
//! year of that size is made of) and run through the estimator.

use std::iter::FusedIterator;
use std::slice;

use serde::Serialize;

use crate::error::ValidationError;
use crate::estimate::{estimate, BaseCosts, ServiceCategory, UsageVector};
use crate::plans::Plan;

pub const DEFAULT_MAX_SPEND: f64 = 50_000.0;
pub const DEFAULT_POINTS: usize = 100;
/// Upper bound on curve steps from the command line or settings.
pub const MAX_POINTS: usize = 10_000;

const LOW_WEIGHTS: &[(ServiceCategory, f64)] = &[
    (ServiceCategory::PrimaryCare, 0.6),
    (ServiceCategory::GenericDrugs, 0.4),
];

const MEDIUM_WEIGHTS: &[(ServiceCategory, f64)] = &[
    (ServiceCategory::PrimaryCare, 0.3),
    (ServiceCategory::Specialist, 0.3),
    (ServiceCategory::UrgentCare, 0.2),
    (ServiceCategory::LabWork, 0.1),
    (ServiceCategory::GenericDrugs, 0.1),
];

const HIGH_WEIGHTS: &[(ServiceCategory, f64)] = &[
    (ServiceCategory::HospitalStay, 0.4),
    (ServiceCategory::EmergencyRoom, 0.2),
    (ServiceCategory::Specialist, 0.15),
    (ServiceCategory::LabWork, 0.15),
    (ServiceCategory::SpecialtyDrugs, 0.1),
];

/// Spend bracket: below $1,000, $1,000 through $5,000, above $5,000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendBracket {
    Low,
    Medium,
    High,
}

impl SpendBracket {
    pub fn for_spend(spend: f64) -> Self {
        if spend < 1_000.0 {
            SpendBracket::Low
        } else if spend <= 5_000.0 {
            SpendBracket::Medium
        } else {
            SpendBracket::High
        }
    }

    /// Share of spend assigned to each category. Shares sum to 1.
    pub fn weights(&self) -> &'static [(ServiceCategory, f64)] {
        match self {
            SpendBracket::Low => LOW_WEIGHTS,
            SpendBracket::Medium => MEDIUM_WEIGHTS,
            SpendBracket::High => HIGH_WEIGHTS,
        }
    }
}

/// Usage vector whose allowed cost approximates `spend`. Dollar shares are
/// divided by the unit cost and rounded to whole units.
pub fn synthesize_usage(spend: f64, base_costs: &BaseCosts) -> UsageVector {
    let mut usage = UsageVector::default();
    if spend.is_nan() || spend <= 0.0 {
        return usage;
    }
    for &(category, weight) in SpendBracket::for_spend(spend).weights() {
        let units = (spend * weight / base_costs.unit_cost(category)).round();
        usage.set(category, units as i64);
    }
    usage
}

/// `points + 1` spend levels from 0 to `max` inclusive. `points` is capped at
/// [`MAX_POINTS`].
pub fn evenly_spaced(max: f64, points: usize) -> Vec<f64> {
    if points == 0 {
        return vec![0.0];
    }
    let points = points.min(MAX_POINTS);
    (0..=points)
        .map(|i| max * i as f64 / points as f64)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurvePoint {
    pub spend: f64,
    pub bracket: SpendBracket,
    pub out_of_pocket: f64,
    pub total_cost: f64,
}

/// Cost curve for one plan over a fixed set of spend levels. Nothing is
/// computed until iterated, and every iteration starts from scratch.
#[derive(Debug, Clone, Copy)]
pub struct ScalingCurve<'a> {
    plan: &'a Plan,
    cost_points: &'a [f64],
    base_costs: &'a BaseCosts,
}

pub fn scaling_curve<'a>(
    plan: &'a Plan,
    cost_points: &'a [f64],
    base_costs: &'a BaseCosts,
) -> ScalingCurve<'a> {
    ScalingCurve {
        plan,
        cost_points,
        base_costs,
    }
}

impl<'a> ScalingCurve<'a> {
    pub fn plan(&self) -> &'a Plan {
        self.plan
    }

    pub fn len(&self) -> usize {
        self.cost_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cost_points.is_empty()
    }

    pub fn iter(&self) -> CurvePoints<'a> {
        CurvePoints {
            plan: self.plan,
            base_costs: self.base_costs,
            spends: self.cost_points.iter(),
        }
    }
}

impl<'a> IntoIterator for ScalingCurve<'a> {
    type Item = Result<CurvePoint, ValidationError>;
    type IntoIter = CurvePoints<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &ScalingCurve<'a> {
    type Item = Result<CurvePoint, ValidationError>;
    type IntoIter = CurvePoints<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct CurvePoints<'a> {
    plan: &'a Plan,
    base_costs: &'a BaseCosts,
    spends: slice::Iter<'a, f64>,
}

impl Iterator for CurvePoints<'_> {
    type Item = Result<CurvePoint, ValidationError>;

    fn next(&mut self) -> Option<Self::Item> {
        let spend = *self.spends.next()?;
        let usage = synthesize_usage(spend, self.base_costs);
        let point = estimate(self.plan, &usage, self.base_costs).map(|breakdown| CurvePoint {
            spend,
            bracket: SpendBracket::for_spend(spend),
            out_of_pocket: breakdown.out_of_pocket,
            total_cost: breakdown.total,
        });
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.spends.size_hint()
    }
}

impl ExactSizeIterator for CurvePoints<'_> {}

impl FusedIterator for CurvePoints<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plans::CostSharing;

    fn full_plan() -> Plan {
        let mut plan = Plan::new("Curve Plan", "Acme", 200.0, 1000.0, 4000.0);
        for category in ServiceCategory::ALL {
            plan = plan.with_rule(category, CostSharing::Coinsurance { rate: 0.2 });
        }
        plan
    }

    #[test]
    fn bracket_boundaries() {
        assert_eq!(SpendBracket::for_spend(0.0), SpendBracket::Low);
        assert_eq!(SpendBracket::for_spend(999.99), SpendBracket::Low);
        assert_eq!(SpendBracket::for_spend(1_000.0), SpendBracket::Medium);
        assert_eq!(SpendBracket::for_spend(5_000.0), SpendBracket::Medium);
        assert_eq!(SpendBracket::for_spend(5_000.01), SpendBracket::High);
    }

    #[test]
    fn bracket_weights_sum_to_one() {
        for bracket in [SpendBracket::Low, SpendBracket::Medium, SpendBracket::High] {
            let sum: f64 = bracket.weights().iter().map(|(_, w)| w).sum();
            assert!((sum - 1.0).abs() < 1e-9, "{bracket:?} sums to {sum}");
        }
    }

    #[test]
    fn synthesize_low_spend() {
        let usage = synthesize_usage(500.0, &BaseCosts::STANDARD);
        // 300 / 150 and 200 / 30 = 6.67
        assert_eq!(usage.primary_care, 2);
        assert_eq!(usage.generic_drugs, 7);
        assert_eq!(usage.specialist, 0);
    }

    #[test]
    fn synthesize_medium_spend() {
        let usage = synthesize_usage(2_000.0, &BaseCosts::STANDARD);
        assert_eq!(usage.primary_care, 4);
        assert_eq!(usage.specialist, 2);
        assert_eq!(usage.urgent_care, 2);
        assert_eq!(usage.lab_work, 1);
        assert_eq!(usage.generic_drugs, 7);
        assert_eq!(usage.hospital_stay, 0);
    }

    #[test]
    fn synthesize_high_spend() {
        let usage = synthesize_usage(10_000.0, &BaseCosts::STANDARD);
        assert_eq!(usage.hospital_stay, 2);
        assert_eq!(usage.emergency_room, 2);
        assert_eq!(usage.specialist, 6);
        assert_eq!(usage.lab_work, 5);
        assert_eq!(usage.specialty_drugs, 2);
        assert_eq!(usage.primary_care, 0);
    }

    #[test]
    fn synthesize_zero_or_negative_is_empty() {
        assert!(synthesize_usage(0.0, &BaseCosts::STANDARD).is_empty());
        assert!(synthesize_usage(-100.0, &BaseCosts::STANDARD).is_empty());
        assert!(synthesize_usage(f64::NAN, &BaseCosts::STANDARD).is_empty());
    }

    #[test]
    fn synthesize_uses_custom_base_costs() {
        let costs = BaseCosts::STANDARD
            .with_cost(ServiceCategory::PrimaryCare, 300.0)
            .unwrap();
        let usage = synthesize_usage(500.0, &costs);
        assert_eq!(usage.primary_care, 1);
    }

    #[test]
    fn evenly_spaced_caps_steps() {
        let spends = evenly_spaced(1000.0, usize::MAX);
        assert_eq!(spends.len(), MAX_POINTS + 1);
        assert_eq!(spends.last(), Some(&1000.0));
    }

    #[test]
    fn evenly_spaced_default_grid() {
        let spends = evenly_spaced(DEFAULT_MAX_SPEND, DEFAULT_POINTS);
        assert_eq!(spends.len(), 101);
        assert_eq!(spends[0], 0.0);
        assert_eq!(spends[1], 500.0);
        assert_eq!(spends[100], 50_000.0);
    }

    #[test]
    fn evenly_spaced_zero_points() {
        assert_eq!(evenly_spaced(1_000.0, 0), vec![0.0]);
    }

    #[test]
    fn curve_yields_one_point_per_spend() {
        let plan = full_plan();
        let spends = evenly_spaced(20_000.0, 4);
        let curve = scaling_curve(&plan, &spends, &BaseCosts::STANDARD);
        assert_eq!(curve.len(), 5);
        assert_eq!(curve.iter().len(), 5);

        let points: Vec<_> = curve.iter().collect::<Result<_, _>>().unwrap();
        assert_eq!(points.len(), 5);
        assert_eq!(points[0].spend, 0.0);
        assert_eq!(points[0].out_of_pocket, 0.0);
        assert_eq!(points[0].total_cost, 2400.0);
        assert_eq!(points[4].bracket, SpendBracket::High);
    }

    #[test]
    fn curve_is_restartable() {
        let plan = full_plan();
        let spends = evenly_spaced(50_000.0, 10);
        let curve = scaling_curve(&plan, &spends, &BaseCosts::STANDARD);
        let first: Vec<_> = curve.iter().collect();
        let second: Vec<_> = (&curve).into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn curve_respects_out_of_pocket_limit() {
        let plan = full_plan();
        let spends = evenly_spaced(100_000.0, 20);
        for point in scaling_curve(&plan, &spends, &BaseCosts::STANDARD) {
            let point = point.unwrap();
            assert!(point.out_of_pocket <= 4000.0);
            assert_eq!(point.total_cost, point.out_of_pocket + 2400.0);
        }
    }

    #[test]
    fn curve_reports_errors_per_point() {
        // nothing for hospital days, so only high-bracket points fail
        let mut plan = full_plan();
        plan.cost_sharing.remove(&ServiceCategory::HospitalStay);

        let spends = [500.0, 2_000.0, 10_000.0];
        let results: Vec<_> = scaling_curve(&plan, &spends, &BaseCosts::STANDARD)
            .into_iter()
            .collect();
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(matches!(
            results[2],
            Err(ValidationError::MissingRule {
                category: ServiceCategory::HospitalStay,
                ..
            })
        ));
    }

    #[test]
    fn empty_curve() {
        let plan = full_plan();
        let curve = scaling_curve(&plan, &[], &BaseCosts::STANDARD);
        assert!(curve.is_empty());
        assert_eq!(curve.iter().next(), None);
    }
}
