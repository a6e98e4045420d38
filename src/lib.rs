//! Annual health insurance cost estimates.
//!
//! [`estimate`](estimate::estimate) prices a year of service usage under one
//! plan. [`compare`](compare::compare) runs it over a catalog and
//! [`scaling_curve`](curve::scaling_curve) shows how a plan's cost grows with
//! total spend.

pub mod compare;
pub mod config;
pub mod curve;
pub mod display;
pub mod error;
pub mod estimate;
pub mod plans;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use compare::{cheapest, compare, ComparisonRow};
pub use curve::{scaling_curve, CurvePoint, ScalingCurve};
pub use error::{ConfigurationError, ValidationError};
pub use estimate::{
    estimate, estimate_with_scenario, BaseCosts, CostBreakdown, EmergencyScenario, LineItem,
    ServiceCategory, UsageVector,
};
pub use plans::{Catalog, CostSharing, Plan};

/// Log to stderr so stdout stays clean for tables and JSON.
///
/// `RUST_LOG` is honored unless `verbose` is set, which forces `debug`.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // a second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
