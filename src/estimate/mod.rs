//! Annual cost estimation for a single plan.

mod service;
mod types;


pub use service::{estimate, estimate_with_scenario};
pub use types::{
    BaseCosts, CostBreakdown, EmergencyScenario, LineItem, ServiceCategory, UsageVector,
    DEFAULT_HOSPITAL_DAYS,
};
