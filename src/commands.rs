use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use plancost::config::{self, Settings};
use plancost::curve::evenly_spaced;
use plancost::display::{self, CurveSeries, OutputFormat};
use plancost::{compare, scaling_curve, Catalog, EmergencyScenario, Plan};

use crate::cli::{CatalogArg, Command, CompareArgs, CurveArgs, PlansArgs};

pub fn run_command(cmd: Command) -> Result<()> {
    match cmd {
        Command::Compare(args) => cmd_compare(&args),
        Command::Curve(args) => cmd_curve(&args),
        Command::Plans(args) => cmd_plans(&args),
        Command::Costs { json } => cmd_costs(json),
        Command::Config { init, json } => cmd_config(init, json),
    }
}

fn get_format(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    }
}

fn load_settings() -> Result<Settings> {
    config::load_settings().context("Failed to load settings")
}

fn catalog_path(arg: &CatalogArg, settings: &Settings) -> PathBuf {
    arg.catalog
        .clone()
        .unwrap_or_else(|| settings.catalog_path.clone())
}

fn load_catalog(arg: &CatalogArg, settings: &Settings) -> Result<Catalog> {
    let path = catalog_path(arg, settings);
    Catalog::load(&path)
        .with_context(|| format!("Failed to load plan catalog {}", path.display()))
}

/// Every plan in comparison order, or just the named ones.
fn select_plans<'a>(catalog: &'a Catalog, names: &[String]) -> Result<Vec<&'a Plan>> {
    if names.is_empty() {
        return Ok(catalog.ordered());
    }
    names
        .iter()
        .map(|name| {
            catalog
                .find(name)
                .with_context(|| format!("Unknown plan: {name}"))
        })
        .collect()
}

fn cmd_compare(args: &CompareArgs) -> Result<()> {
    let settings = load_settings()?;
    let catalog = load_catalog(&args.catalog, &settings)?;
    let plans = select_plans(&catalog, &args.plans)?;
    let usage = args.usage.to_usage()?;
    let scenario = args
        .emergency
        .then(|| EmergencyScenario::with_hospital_days(args.emergency_days));

    let rows = compare(plans, &usage, scenario.as_ref(), &settings.base_costs);

    match get_format(args.json) {
        OutputFormat::Json => {
            println!(
                "{}",
                display::format_comparison_json(&rows, &usage, scenario.as_ref())?
            );
        }
        OutputFormat::Table => {
            println!("{}", display::format_comparison(&rows));
            if args.breakdown {
                for breakdown in rows.iter().filter_map(|row| row.breakdown()) {
                    println!("\n{}", display::format_breakdown(breakdown));
                }
            }
        }
    }

    if rows.iter().all(|row| row.result.is_err()) {
        bail!("No plan could be estimated");
    }
    Ok(())
}

fn cmd_curve(args: &CurveArgs) -> Result<()> {
    let settings = load_settings()?;
    let catalog = load_catalog(&args.catalog, &settings)?;
    let plans = select_plans(&catalog, &args.plans)?;

    let max_spend = args.max_spend.unwrap_or(settings.max_spend);
    if !(max_spend.is_finite() && max_spend > 0.0) {
        bail!("--max-spend must be positive (got {max_spend})");
    }
    let points = args.points.map_or(settings.curve_points, usize::from);
    let spends = evenly_spaced(max_spend, points);

    let series: Vec<CurveSeries> = plans
        .iter()
        .map(|plan| CurveSeries {
            plan: plan.name.clone(),
            points: scaling_curve(plan, &spends, &settings.base_costs)
                .into_iter()
                .collect(),
        })
        .collect();

    match get_format(args.json) {
        OutputFormat::Json => println!("{}", display::format_curve_json(&series)?),
        OutputFormat::Table => println!("{}", display::format_curve(&series, &spends)),
    }
    Ok(())
}

fn cmd_plans(args: &PlansArgs) -> Result<()> {
    let settings = load_settings()?;
    let catalog = load_catalog(&args.catalog, &settings)?;

    if let Some(name) = &args.name {
        let Some(plan) = catalog.find(name) else {
            bail!("Unknown plan: {name}");
        };
        match get_format(args.json) {
            OutputFormat::Json => println!("{}", display::format_plans_json(&[plan])?),
            OutputFormat::Table => println!("{}", display::format_plan_rules(plan)),
        }
        return Ok(());
    }

    match get_format(args.json) {
        OutputFormat::Json => println!("{}", display::format_plans_json(&catalog.ordered())?),
        OutputFormat::Table => println!("{}", display::format_plans(&catalog)),
    }
    Ok(())
}

fn cmd_costs(json: bool) -> Result<()> {
    let settings = load_settings()?;
    match get_format(json) {
        OutputFormat::Json => {
            println!("{}", display::format_base_costs_json(&settings.base_costs)?)
        }
        OutputFormat::Table => println!("{}", display::format_base_costs(&settings.base_costs)),
    }
    Ok(())
}

fn cmd_config(init: bool, json: bool) -> Result<()> {
    let path = config::settings_path();
    if init {
        if config::write_default_settings(&path)? {
            eprintln!("Created {}", path.display());
        } else {
            eprintln!("Settings already exist at {}", path.display());
        }
    }

    let settings = load_settings()?;
    match get_format(json) {
        OutputFormat::Json => println!("{}", display::format_settings_json(&settings, &path)?),
        OutputFormat::Table => {
            println!(
                "{}",
                display::format_settings(&settings, &path, path.exists())
            );
        }
    }
    Ok(())
}
