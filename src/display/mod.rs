//! Tables and JSON for every command.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{
    presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, ContentArrangement,
    Table,
};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::compare::{cheapest, ComparisonRow};
use crate::config::Settings;
use crate::curve::{CurvePoint, SpendBracket};
use crate::error::ValidationError;
use crate::estimate::{BaseCosts, CostBreakdown, EmergencyScenario, ServiceCategory, UsageVector};
use crate::plans::{Catalog, Plan};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// One plan's curve, as handed to the formatters.
#[derive(Debug, Clone)]
pub struct CurveSeries {
    pub plan: String,
    pub points: Vec<Result<CurvePoint, ValidationError>>,
}

// --- Helper formatting ---

/// Dollars with thousands separators: `$12,345.67`.
pub fn format_money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();
    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, digit) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(label).add_attribute(Attribute::Dim))
        .collect()
}

fn money_cell(amount: f64) -> Cell {
    Cell::new(format_money(amount)).set_alignment(CellAlignment::Right)
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

// --- Comparison ---

pub fn format_comparison(rows: &[ComparisonRow]) -> String {
    if rows.is_empty() {
        return String::from("No plans to compare");
    }

    let best = cheapest(rows).map(|row| row.plan.as_str());

    let mut table = new_table();
    table.set_header(header(&[
        "Insurer",
        "Plan",
        "Type",
        "Monthly",
        "Premiums",
        "Medical",
        "Total",
    ]));

    for row in rows {
        let (premiums, medical, total) = match &row.result {
            Ok(breakdown) => {
                let total = money_cell(breakdown.total).add_attribute(Attribute::Bold);
                let total = if best == Some(row.plan.as_str()) {
                    total.fg(Color::Green)
                } else {
                    total
                };
                (
                    money_cell(breakdown.annual_premium),
                    money_cell(breakdown.out_of_pocket).fg(Color::Yellow),
                    total,
                )
            }
            Err(err) => (
                money_cell(row.monthly_premium * 12.0),
                Cell::new(err.category().map_or("-", |c| c.label())).fg(Color::Red),
                Cell::new("error").fg(Color::Red),
            ),
        };
        table.add_row(vec![
            Cell::new(&row.insurer).fg(Color::Cyan),
            Cell::new(&row.plan).add_attribute(Attribute::Bold),
            Cell::new(&row.plan_type).add_attribute(Attribute::Dim),
            money_cell(row.monthly_premium),
            premiums,
            medical,
            total,
        ]);
    }

    let mut out = table.to_string();
    for row in rows {
        if let Err(err) = &row.result {
            out.push_str(&format!("\n{} {err}", "✗".red()));
        }
    }
    if let Some(row) = cheapest(rows) {
        if let Some(total) = row.total() {
            out.push_str(&format!(
                "\n{} {} ({}) at {} per year",
                "Cheapest:".green().bold(),
                row.plan,
                row.insurer,
                format_money(total)
            ));
        }
    }
    out
}

/// Per-category split of one estimate.
pub fn format_breakdown(breakdown: &CostBreakdown) -> String {
    let mut table = new_table();
    table.set_header(header(&[
        "Service",
        "Units",
        "Allowed",
        "Deductible",
        "You pay",
        "Plan pays",
    ]));

    for line in breakdown.lines.iter().filter(|l| l.units > 0) {
        table.add_row(vec![
            Cell::new(line.category.label()),
            Cell::new(format!("{} {}", line.units, line.category.unit()))
                .set_alignment(CellAlignment::Right),
            money_cell(line.allowed),
            money_cell(line.deductible).add_attribute(Attribute::Dim),
            money_cell(line.member).fg(Color::Yellow),
            money_cell(line.plan_paid).fg(Color::Green),
        ]);
    }

    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(""),
        money_cell(breakdown.allowed_total).add_attribute(Attribute::Bold),
        money_cell(breakdown.deductible_applied).add_attribute(Attribute::Dim),
        money_cell(breakdown.out_of_pocket)
            .fg(Color::Yellow)
            .add_attribute(Attribute::Bold),
        money_cell(breakdown.plan_paid)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
    ]);

    format!(
        "{}\n{table}\nPremiums {} + medical {} = {}",
        breakdown.plan.bold(),
        format_money(breakdown.annual_premium),
        format_money(breakdown.out_of_pocket),
        format_money(breakdown.total).bold()
    )
}

#[derive(Serialize)]
struct ComparisonJson<'a> {
    usage: &'a UsageVector,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<&'a EmergencyScenario>,
    cheapest: Option<&'a str>,
    plans: Vec<RowJson<'a>>,
}

#[derive(Serialize)]
struct RowJson<'a> {
    insurer: &'a str,
    plan: &'a str,
    plan_type: &'a str,
    monthly_premium: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimate: Option<&'a CostBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn format_comparison_json(
    rows: &[ComparisonRow],
    usage: &UsageVector,
    scenario: Option<&EmergencyScenario>,
) -> Result<String> {
    let view = ComparisonJson {
        usage,
        scenario,
        cheapest: cheapest(rows).map(|row| row.plan.as_str()),
        plans: rows
            .iter()
            .map(|row| RowJson {
                insurer: &row.insurer,
                plan: &row.plan,
                plan_type: &row.plan_type,
                monthly_premium: row.monthly_premium,
                estimate: row.breakdown(),
                error: row.result.as_ref().err().map(|e| e.to_string()),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&view).context("Failed to serialize comparison")
}

// --- Curve ---

pub fn format_curve(series: &[CurveSeries], spends: &[f64]) -> String {
    if series.is_empty() || spends.is_empty() {
        return String::from("No curve points");
    }

    let mut labels = vec!["Spend", "Bracket"];
    labels.extend(series.iter().map(|s| s.plan.as_str()));

    let mut table = new_table();
    table.set_header(header(&labels));

    for (i, spend) in spends.iter().enumerate() {
        let bracket = match SpendBracket::for_spend(*spend) {
            SpendBracket::Low => "low",
            SpendBracket::Medium => "medium",
            SpendBracket::High => "high",
        };
        let mut cells = vec![
            money_cell(*spend).fg(Color::Cyan),
            Cell::new(bracket).add_attribute(Attribute::Dim),
        ];
        for s in series {
            let cell = match s.points.get(i) {
                Some(Ok(point)) => money_cell(point.total_cost),
                Some(Err(_)) => Cell::new("error").fg(Color::Red),
                None => Cell::new("-"),
            };
            cells.push(cell);
        }
        table.add_row(cells);
    }

    let mut out = table.to_string();
    for s in series {
        if let Some(Err(err)) = s.points.iter().find(|p| p.is_err()) {
            out.push_str(&format!("\n{} {err}", "✗".red()));
        }
    }
    out
}

#[derive(Serialize)]
struct SeriesJson<'a> {
    plan: &'a str,
    points: Vec<PointJson<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum PointJson<'a> {
    Point(&'a CurvePoint),
    Error { error: String },
}

pub fn format_curve_json(series: &[CurveSeries]) -> Result<String> {
    let view: Vec<SeriesJson> = series
        .iter()
        .map(|s| SeriesJson {
            plan: &s.plan,
            points: s
                .points
                .iter()
                .map(|p| match p {
                    Ok(point) => PointJson::Point(point),
                    Err(err) => PointJson::Error {
                        error: err.to_string(),
                    },
                })
                .collect(),
        })
        .collect();
    serde_json::to_string_pretty(&view).context("Failed to serialize curve")
}

// --- Plans ---

pub fn format_plans(catalog: &Catalog) -> String {
    if catalog.is_empty() {
        return String::from("No plans found");
    }

    let mut table = new_table();
    table.set_header(header(&[
        "Insurer",
        "Plan",
        "Type",
        "Monthly",
        "Deductible",
        "OOP limit",
        "Referral",
    ]));

    for (insurer, plans) in catalog.by_insurer() {
        for plan in plans {
            table.add_row(vec![
                Cell::new(insurer).fg(Color::Cyan),
                Cell::new(&plan.name).add_attribute(Attribute::Bold),
                Cell::new(&plan.plan_type).add_attribute(Attribute::Dim),
                money_cell(plan.monthly_premium),
                money_cell(plan.deductible),
                money_cell(plan.out_of_pocket_limit),
                Cell::new(yes_no(plan.referral_required)),
            ]);
        }
    }

    format!("{table}\n\n{} plans", catalog.len())
}

/// In-network rule for every category of one plan.
pub fn format_plan_rules(plan: &Plan) -> String {
    let mut table = new_table();
    table.set_header(header(&["Service", "In network", "Before deductible"]));

    for category in ServiceCategory::ALL {
        let rule = match plan.rule(category) {
            Some(rule) => Cell::new(rule.describe()),
            None => Cell::new("no rule").fg(Color::Red),
        };
        let before = category.is_drug_tier() || plan.is_pre_deductible(category);
        table.add_row(vec![
            Cell::new(category.label()),
            rule,
            Cell::new(yes_no(before)).add_attribute(Attribute::Dim),
        ]);
    }

    let mut out = format!("{} ({})\n", plan.name.bold(), plan.insurer);
    out.push_str(&format!(
        "Premium {}/mo  Deductible {}  Out-of-pocket limit {}\n",
        format_money(plan.monthly_premium),
        format_money(plan.deductible),
        format_money(plan.out_of_pocket_limit)
    ));
    if let (Some(deductible), Some(limit)) =
        (plan.family_deductible, plan.family_out_of_pocket_limit)
    {
        out.push_str(&format!(
            "Family: deductible {}  out-of-pocket limit {}\n",
            format_money(deductible),
            format_money(limit)
        ));
    }
    out.push_str(&table.to_string());
    out
}

pub fn format_plans_json(plans: &[&Plan]) -> Result<String> {
    serde_json::to_string_pretty(plans).context("Failed to serialize plans")
}

// --- Base costs and settings ---

pub fn format_base_costs(base_costs: &BaseCosts) -> String {
    let mut table = new_table();
    table.set_header(header(&["Service", "Key", "Per", "Cost"]));
    for (category, cost) in base_costs.iter() {
        table.add_row(vec![
            Cell::new(category.label()),
            Cell::new(category.key()).add_attribute(Attribute::Dim),
            Cell::new(category.unit()),
            money_cell(cost).fg(Color::Cyan),
        ]);
    }
    table.to_string()
}

pub fn format_base_costs_json(base_costs: &BaseCosts) -> Result<String> {
    serde_json::to_string_pretty(base_costs).context("Failed to serialize base costs")
}

pub fn format_settings(settings: &Settings, path: &Path, exists: bool) -> String {
    let state = if exists { "" } else { " (not found, using defaults)" };
    format!(
        "Settings:   {}{state}\nCatalog:    {}\nCurve:      0 to {} in {} steps",
        path.display(),
        settings.catalog_path.display(),
        format_money(settings.max_spend),
        settings.curve_points
    )
}

pub fn format_settings_json(settings: &Settings, path: &Path) -> Result<String> {
    let json = serde_json::json!({
        "settings_path": path.display().to_string(),
        "catalog_path": settings.catalog_path.display().to_string(),
        "max_spend": settings.max_spend,
        "curve_points": settings.curve_points,
        "base_costs": settings.base_costs,
    });
    serde_json::to_string_pretty(&json).context("Failed to serialize settings")
}
