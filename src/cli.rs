use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use plancost::curve::MAX_POINTS;
use plancost::{estimate::DEFAULT_HOSPITAL_DAYS, ServiceCategory, UsageVector};

#[derive(Parser, Debug)]
#[command(name = "plancost")]
#[command(about = "Compare annual health insurance costs", long_about = None)]
#[command(version)]
#[command(after_help = "\x1b[2mExamples:\x1b[0m
    plancost plans                                   \x1b[2m# List plans by insurer\x1b[0m
    plancost plans \"Gold PPO 500\"                    \x1b[2m# Cost-sharing rules of one plan\x1b[0m
    plancost compare --specialist 10                 \x1b[2m# Ten specialist visits, every plan\x1b[0m
    plancost compare -e --emergency-days 5           \x1b[2m# Add an emergency with a 5 day stay\x1b[0m
    plancost compare -u usage.json -b                \x1b[2m# Usage from a file, with breakdowns\x1b[0m
    plancost curve -p \"Silver HMO 2000\" -n 20        \x1b[2m# Cost at 21 spend levels\x1b[0m
    plancost costs                                   \x1b[2m# Base cost per service\x1b[0m")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Log estimator details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Estimate a year of costs under every plan
    Compare(CompareArgs),

    /// Total annual cost as medical spend grows
    Curve(CurveArgs),

    /// List the plans in the catalog
    Plans(PlansArgs),

    /// Show the base cost of each service
    Costs {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show settings
    Config {
        /// Write a commented settings file if none exists
        #[arg(long)]
        init: bool,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct CatalogArg {
    /// Plan catalog JSON
    #[arg(short, long, env = "PLANCOST_CATALOG", value_name = "FILE")]
    pub catalog: Option<PathBuf>,
}

/// Expected service counts for the year. Flags add to the usage file.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct UsageArgs {
    /// Usage profile JSON (keys: primary_care, specialist, ...)
    #[arg(short, long = "usage", value_name = "FILE")]
    pub usage_file: Option<PathBuf>,

    /// Primary care visits
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub primary_care: i64,

    /// Specialist visits
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub specialist: i64,

    /// Urgent care visits
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub urgent_care: i64,

    /// Emergency room visits
    #[arg(long = "er-visits", default_value_t = 0, allow_negative_numbers = true)]
    pub er_visits: i64,

    /// Ambulance rides
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub ambulance: i64,

    /// Lab tests
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub lab_tests: i64,

    /// Generic drug fills
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub generic_fills: i64,

    /// Specialty drug fills
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub specialty_fills: i64,

    /// Hospital days
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub hospital_days: i64,
}

impl UsageArgs {
    fn counts(&self) -> [(ServiceCategory, i64); 9] {
        [
            (ServiceCategory::PrimaryCare, self.primary_care),
            (ServiceCategory::Specialist, self.specialist),
            (ServiceCategory::UrgentCare, self.urgent_care),
            (ServiceCategory::EmergencyRoom, self.er_visits),
            (ServiceCategory::Ambulance, self.ambulance),
            (ServiceCategory::LabWork, self.lab_tests),
            (ServiceCategory::GenericDrugs, self.generic_fills),
            (ServiceCategory::SpecialtyDrugs, self.specialty_fills),
            (ServiceCategory::HospitalStay, self.hospital_days),
        ]
    }

    pub fn to_usage(&self) -> Result<UsageVector> {
        let mut usage = match &self.usage_file {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read usage file {}", path.display()))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Invalid usage file {}", path.display()))?
            }
            None => UsageVector::default(),
        };
        for (category, count) in self.counts() {
            usage.add(category, count);
        }
        Ok(usage)
    }
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    #[command(flatten)]
    pub catalog: CatalogArg,

    #[command(flatten)]
    pub usage: UsageArgs,

    /// Add an emergency: ambulance, ER visit, hospital stay and follow-up care
    #[arg(short, long)]
    pub emergency: bool,

    /// Hospital days for the emergency
    #[arg(long, default_value_t = DEFAULT_HOSPITAL_DAYS, allow_negative_numbers = true)]
    pub emergency_days: i64,

    /// Only these plans (repeatable)
    #[arg(short, long = "plan", value_name = "NAME")]
    pub plans: Vec<String>,

    /// Per-service breakdown for each plan
    #[arg(short, long)]
    pub breakdown: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CurveArgs {
    #[command(flatten)]
    pub catalog: CatalogArg,

    /// Only these plans (repeatable)
    #[arg(short, long = "plan", value_name = "NAME")]
    pub plans: Vec<String>,

    /// Highest total spend
    #[arg(short, long)]
    pub max_spend: Option<f64>,

    /// Steps between 0 and the highest spend
    #[arg(
        short = 'n',
        long,
        value_parser = clap::value_parser!(u16).range(1..=MAX_POINTS as i64)
    )]
    pub points: Option<u16>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PlansArgs {
    #[command(flatten)]
    pub catalog: CatalogArg,

    /// Show the cost-sharing rules of one plan
    pub name: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}
