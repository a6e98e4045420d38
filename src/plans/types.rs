use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::estimate::ServiceCategory;

/// How a plan splits the allowed cost of one service category with the member.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CostSharing {
    /// Flat dollars per encounter (visit, fill, day).
    Copay { amount: f64 },
    /// Fraction of the allowed cost, 0.0..=1.0.
    Coinsurance { rate: f64 },
    /// Coinsurance with a per-unit ceiling (specialty drug tiers).
    CoinsuranceCapped { rate: f64, max_per_unit: f64 },
    /// Plan pays everything; the deductible is untouched.
    NoCharge,
    /// Member pays the full allowed cost without deductible credit.
    NotCovered,
}

impl CostSharing {
    /// Member share of `amount` dollars of allowed cost spread over `units`
    /// encounters. Never more than `amount`.
    pub fn member_share(&self, amount: f64, units: i64) -> f64 {
        if amount <= 0.0 {
            return 0.0;
        }
        let units = units.max(0) as f64;
        let share = match *self {
            CostSharing::Copay { amount: copay } => copay * units,
            CostSharing::Coinsurance { rate } => rate * amount,
            CostSharing::CoinsuranceCapped { rate, max_per_unit } => {
                (rate * amount).min(max_per_unit * units)
            }
            CostSharing::NoCharge => 0.0,
            CostSharing::NotCovered => amount,
        };
        share.clamp(0.0, amount)
    }

    /// Whether allowed cost under this rule is first run through the deductible.
    pub fn applies_deductible(&self) -> bool {
        !matches!(self, CostSharing::NoCharge | CostSharing::NotCovered)
    }

    pub fn describe(&self) -> String {
        match *self {
            CostSharing::Copay { amount } => format!("${amount:.0} copay"),
            CostSharing::Coinsurance { rate } => format!("{:.0}% coinsurance", rate * 100.0),
            CostSharing::CoinsuranceCapped { rate, max_per_unit } => {
                format!("{:.0}% up to ${max_per_unit:.0}", rate * 100.0)
            }
            CostSharing::NoCharge => "no charge".to_string(),
            CostSharing::NotCovered => "not covered".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub name: String,
    pub insurer: String,
    pub plan_type: String,
    pub monthly_premium: f64,
    pub deductible: f64,
    /// Parsed for display only; family tiers are not modeled.
    pub family_deductible: Option<f64>,
    pub out_of_pocket_limit: f64,
    pub family_out_of_pocket_limit: Option<f64>,
    pub referral_required: bool,
    pub pre_deductible: BTreeSet<ServiceCategory>,
    pub cost_sharing: BTreeMap<ServiceCategory, CostSharing>,
}

impl Plan {
    pub fn new(
        name: impl Into<String>,
        insurer: impl Into<String>,
        monthly_premium: f64,
        deductible: f64,
        out_of_pocket_limit: f64,
    ) -> Self {
        Self {
            name: name.into(),
            insurer: insurer.into(),
            plan_type: String::new(),
            monthly_premium,
            deductible,
            family_deductible: None,
            out_of_pocket_limit,
            family_out_of_pocket_limit: None,
            referral_required: false,
            pre_deductible: BTreeSet::new(),
            cost_sharing: BTreeMap::new(),
        }
    }

    pub fn with_rule(mut self, category: ServiceCategory, rule: CostSharing) -> Self {
        self.cost_sharing.insert(category, rule);
        self
    }

    pub fn with_pre_deductible(mut self, category: ServiceCategory) -> Self {
        self.pre_deductible.insert(category);
        self
    }

    pub fn rule(&self, category: ServiceCategory) -> Option<&CostSharing> {
        self.cost_sharing.get(&category)
    }

    pub fn is_pre_deductible(&self, category: ServiceCategory) -> bool {
        self.pre_deductible.contains(&category)
    }

    pub fn annual_premium(&self) -> f64 {
        self.monthly_premium * 12.0
    }
}
