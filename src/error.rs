use std::path::PathBuf;

use thiserror::Error;

use crate::estimate::ServiceCategory;

/// A request-level failure: the plan or usage cannot be priced as given.
///
/// Every variant names the plan so a comparison can report the failure next
/// to the plans that did estimate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{plan}: {category} usage cannot be negative (got {count})")]
    NegativeUsage {
        plan: String,
        category: ServiceCategory,
        count: i64,
    },

    #[error("{plan}: no cost-sharing rule for {category}")]
    MissingRule {
        plan: String,
        category: ServiceCategory,
    },

    #[error("{plan}: monthly premium cannot be negative (got {premium})")]
    NegativePremium { plan: String, premium: f64 },

    #[error("{plan}: deductible {deductible} must be between 0 and the out-of-pocket limit {limit}")]
    InvalidDeductible {
        plan: String,
        deductible: f64,
        limit: f64,
    },
}

impl ValidationError {
    pub fn plan(&self) -> &str {
        match self {
            ValidationError::NegativeUsage { plan, .. }
            | ValidationError::MissingRule { plan, .. }
            | ValidationError::NegativePremium { plan, .. }
            | ValidationError::InvalidDeductible { plan, .. } => plan,
        }
    }

    pub fn category(&self) -> Option<ServiceCategory> {
        match self {
            ValidationError::NegativeUsage { category, .. }
            | ValidationError::MissingRule { category, .. } => Some(*category),
            _ => None,
        }
    }
}

/// Load-time failure of the plan catalog or the settings file.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid plan catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("plan catalog contains no plans")]
    EmptyCatalog,

    #[error("duplicate plan name `{0}`")]
    DuplicatePlan(String),

    #[error("{plan}: {reason}")]
    InvalidPlan { plan: String, reason: String },

    #[error("unknown service category `{0}`")]
    UnknownCategory(String),

    #[error("base cost for {category} must be a positive amount (got {cost})")]
    InvalidBaseCost {
        category: ServiceCategory,
        cost: f64,
    },

    #[error("{setting} must be positive (got {value})")]
    InvalidSetting { setting: &'static str, value: f64 },

    #[error("{setting} cannot exceed {max} (got {value})")]
    SettingTooLarge {
        setting: &'static str,
        value: i64,
        max: usize,
    },
}

impl ConfigurationError {
    pub(crate) fn invalid_plan(plan: &str, reason: impl Into<String>) -> Self {
        ConfigurationError::InvalidPlan {
            plan: plan.to_string(),
            reason: reason.into(),
        }
    }
}
