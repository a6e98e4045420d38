use std::path::PathBuf;

use super::*;
use crate::compare::compare;
use crate::curve::{evenly_spaced, scaling_curve};
use crate::plans::CostSharing;

fn plan(name: &str, insurer: &str, premium: f64) -> Plan {
    let mut plan = Plan::new(name, insurer, premium, 1000.0, 5000.0);
    plan.plan_type = "PPO".to_string();
    for category in ServiceCategory::ALL {
        plan = plan.with_rule(category, CostSharing::Coinsurance { rate: 0.2 });
    }
    plan.with_rule(ServiceCategory::PrimaryCare, CostSharing::Copay { amount: 30.0 })
        .with_pre_deductible(ServiceCategory::PrimaryCare)
}

fn specialist_usage() -> UsageVector {
    UsageVector::default().with(ServiceCategory::Specialist, 10)
}

// ==================== format_money ====================

#[test]
fn format_money_small() {
    assert_eq!(format_money(0.0), "$0.00");
    assert_eq!(format_money(7.5), "$7.50");
    assert_eq!(format_money(999.999), "$1,000.00");
}

#[test]
fn format_money_thousands() {
    assert_eq!(format_money(1_300.0), "$1,300.00");
    assert_eq!(format_money(50_000.0), "$50,000.00");
    assert_eq!(format_money(1_234_567.891), "$1,234,567.89");
}

#[test]
fn format_money_negative() {
    assert_eq!(format_money(-12.5), "-$12.50");
    assert_eq!(format_money(-0.001), "$0.00");
}

// ==================== Comparison ====================

#[test]
fn comparison_table_lists_plans_and_totals() {
    let plans = vec![plan("Silver", "Acme", 300.0), plan("Gold", "Beta", 500.0)];
    let rows = compare(&plans, &specialist_usage(), None, &BaseCosts::STANDARD);
    let out = format_comparison(&rows);

    assert!(out.contains("Silver"));
    assert!(out.contains("Gold"));
    assert!(out.contains("$3,600.00"));
    assert!(out.contains("$1,300.00"));
    assert!(out.contains("$4,900.00"));
    assert!(out.contains("Cheapest:"));
}

#[test]
fn comparison_table_shows_errors() {
    let mut broken = plan("Broken", "Acme", 100.0);
    broken.cost_sharing.remove(&ServiceCategory::Specialist);
    let plans = vec![broken, plan("Works", "Acme", 300.0)];
    let rows = compare(&plans, &specialist_usage(), None, &BaseCosts::STANDARD);
    let out = format_comparison(&rows);

    assert!(out.contains("error"));
    assert!(out.contains("Broken: no cost-sharing rule for Specialist"));
    assert!(out.contains("Works"));
}

#[test]
fn comparison_error_row_names_failing_category() {
    let mut broken = plan("Broken", "Acme", 100.0);
    broken.cost_sharing.remove(&ServiceCategory::Specialist);
    let mut capped = plan("Capped", "Acme", 200.0);
    capped.deductible = 9_000.0;
    let plans = vec![broken, capped];
    let rows = compare(&plans, &specialist_usage(), None, &BaseCosts::STANDARD);
    let out = format_comparison(&rows);

    let row = |name: &str| {
        out.lines()
            .find(|l| l.contains('│') && l.contains(name))
            .unwrap()
            .to_string()
    };
    assert!(row("Broken").contains("Specialist"));
    assert!(!row("Capped").contains("Specialist"));
}

#[test]
fn comparison_table_empty() {
    assert_eq!(format_comparison(&[]), "No plans to compare");
}

#[test]
fn comparison_json_has_estimates_and_errors() {
    let mut broken = plan("Broken", "Acme", 100.0);
    broken.deductible = 9_000.0;
    let plans = vec![broken, plan("Silver", "Acme", 300.0)];
    let usage = specialist_usage();
    let rows = compare(&plans, &usage, None, &BaseCosts::STANDARD);

    let json = format_comparison_json(&rows, &usage, None).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["cheapest"], "Silver");
    assert_eq!(value["usage"]["specialist"], 10);
    assert!(value.get("scenario").is_none());

    let plans = value["plans"].as_array().unwrap();
    assert_eq!(plans.len(), 2);
    assert!(plans[0]["error"].as_str().unwrap().starts_with("Broken: deductible"));
    assert!(plans[0].get("estimate").is_none());
    assert_eq!(plans[1]["estimate"]["out_of_pocket"], 1300.0);
    assert_eq!(plans[1]["estimate"]["total"], 4900.0);
}

#[test]
fn comparison_json_includes_scenario() {
    let plans = vec![plan("Silver", "Acme", 300.0)];
    let usage = UsageVector::default();
    let scenario = EmergencyScenario::default();
    let rows = compare(&plans, &usage, Some(&scenario), &BaseCosts::STANDARD);

    let json = format_comparison_json(&rows, &usage, Some(&scenario)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["scenario"]["hospital_days"], 3);
    assert_eq!(value["scenario"]["er_visit"], true);
}

#[test]
fn breakdown_skips_unused_categories() {
    let silver = plan("Silver", "Acme", 300.0);
    let usage = specialist_usage().with(ServiceCategory::PrimaryCare, 2);
    let breakdown = crate::estimate::estimate(&silver, &usage, &BaseCosts::STANDARD).unwrap();
    let out = format_breakdown(&breakdown);

    assert!(out.contains("Specialist"));
    assert!(out.contains("10 visit"));
    assert!(out.contains("Primary Care"));
    assert!(!out.contains("Hospital Stay"));
    assert!(out.contains("$2,500.00"));
}

// ==================== Curve ====================

#[test]
fn curve_table_one_column_per_plan() {
    let a = plan("Silver", "Acme", 300.0);
    let b = plan("Gold", "Beta", 500.0);
    let spends = evenly_spaced(10_000.0, 2);
    let series: Vec<CurveSeries> = [&a, &b]
        .iter()
        .map(|p| CurveSeries {
            plan: p.name.clone(),
            points: scaling_curve(p, &spends, &BaseCosts::STANDARD)
                .into_iter()
                .collect(),
        })
        .collect();

    let out = format_curve(&series, &spends);
    assert!(out.contains("Silver"));
    assert!(out.contains("Gold"));
    assert!(out.contains("$10,000.00"));
    assert!(out.contains("medium"));
    assert!(out.contains("high"));
    // zero spend is premium only
    assert!(out.contains("$3,600.00"));
    assert!(out.contains("$6,000.00"));
}

#[test]
fn curve_table_marks_failed_points() {
    let mut broken = plan("Broken", "Acme", 300.0);
    broken.cost_sharing.remove(&ServiceCategory::HospitalStay);
    let spends = vec![0.0, 20_000.0];
    let series = vec![CurveSeries {
        plan: broken.name.clone(),
        points: scaling_curve(&broken, &spends, &BaseCosts::STANDARD)
            .into_iter()
            .collect(),
    }];

    let out = format_curve(&series, &spends);
    assert!(out.contains("error"));
    assert!(out.contains("no cost-sharing rule for Hospital Stay"));
}

#[test]
fn curve_table_empty() {
    assert_eq!(format_curve(&[], &[0.0]), "No curve points");
}

#[test]
fn curve_json_points_and_errors() {
    let mut broken = plan("Broken", "Acme", 300.0);
    broken.cost_sharing.remove(&ServiceCategory::HospitalStay);
    let spends = vec![0.0, 20_000.0];
    let series = vec![CurveSeries {
        plan: broken.name.clone(),
        points: scaling_curve(&broken, &spends, &BaseCosts::STANDARD)
            .into_iter()
            .collect(),
    }];

    let json = format_curve_json(&series).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let points = value[0]["points"].as_array().unwrap();
    assert_eq!(value[0]["plan"], "Broken");
    assert_eq!(points[0]["spend"], 0.0);
    assert_eq!(points[0]["bracket"], "low");
    assert_eq!(points[0]["total_cost"], 3600.0);
    assert!(points[1]["error"].as_str().is_some());
}

// ==================== Plans ====================

#[test]
fn plans_table_grouped_by_insurer() {
    let catalog = Catalog::from_plans(vec![
        plan("Gold", "Zephyr", 500.0),
        plan("Bronze", "Acme", 200.0),
    ])
    .unwrap();
    let out = format_plans(&catalog);
    assert!(out.find("Bronze").unwrap() < out.find("Gold").unwrap());
    assert!(out.contains("2 plans"));
    assert!(out.contains("$5,000.00"));
}

#[test]
fn plan_rules_describe_every_category() {
    let mut silver = plan("Silver", "Acme", 300.0);
    silver.cost_sharing.remove(&ServiceCategory::Ambulance);
    let out = format_plan_rules(&silver);
    assert!(out.contains("$30 copay"));
    assert!(out.contains("20% coinsurance"));
    assert!(out.contains("no rule"));
    assert!(out.contains("Hospital Stay"));
}

#[test]
fn plan_rules_show_family_tier_when_present() {
    let mut silver = plan("Silver", "Acme", 300.0);
    silver.family_deductible = Some(2000.0);
    silver.family_out_of_pocket_limit = Some(10_000.0);
    let out = format_plan_rules(&silver);
    assert!(out.contains("Family: deductible $2,000.00"));
}

#[test]
fn plans_json_round_trips_fields() {
    let silver = plan("Silver", "Acme", 300.0);
    let json = format_plans_json(&[&silver]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value[0]["name"], "Silver");
    assert_eq!(value[0]["cost_sharing"]["primary_care"]["kind"], "copay");
    assert_eq!(value[0]["cost_sharing"]["primary_care"]["amount"], 30.0);
}

// ==================== Base costs and settings ====================

#[test]
fn base_cost_table_lists_every_category() {
    let out = format_base_costs(&BaseCosts::STANDARD);
    for category in ServiceCategory::ALL {
        assert!(out.contains(category.key()), "missing {category}");
    }
    assert!(out.contains("$2,500.00"));
}

#[test]
fn base_costs_json_keyed_by_category() {
    let json = format_base_costs_json(&BaseCosts::STANDARD).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["hospital_stay"], 2500.0);
    assert_eq!(value["generic_drugs"], 30.0);
}

#[test]
fn settings_text_mentions_missing_file() {
    let settings = Settings::default();
    let path = PathBuf::from("/tmp/plancost/settings.toml");
    let out = format_settings(&settings, &path, false);
    assert!(out.contains("/tmp/plancost/settings.toml (not found, using defaults)"));
    assert!(out.contains("0 to $50,000.00 in 100 steps"));
}

#[test]
fn settings_json_fields() {
    let settings = Settings::default();
    let json = format_settings_json(&settings, &PathBuf::from("/tmp/settings.toml")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["settings_path"], "/tmp/settings.toml");
    assert_eq!(value["curve_points"], 100);
    assert_eq!(value["base_costs"]["specialist"], 250.0);
}
