use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{CostSharing, Plan};
use crate::error::ConfigurationError;
use crate::estimate::ServiceCategory;

// --- catalog document (plans.json) ---

#[derive(Debug, Deserialize)]
struct CatalogFile {
    plans: Vec<PlanEntry>,
}

#[derive(Debug, Deserialize)]
struct PlanEntry {
    plan_name: String,
    #[serde(default)]
    plan_type: String,
    insurer: String,
    premium: f64,
    deductibles: Deductibles,
    out_of_pocket_limit: OutOfPocketLimit,
    #[serde(default)]
    referral_needed: bool,
    #[serde(default)]
    services_covered_before_deductible: Vec<String>,
    #[serde(default)]
    cost_sharing: CostSharingTable,
}

#[derive(Debug, Deserialize)]
struct Deductibles {
    overall: f64,
    #[serde(default)]
    family: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OutOfPocketLimit {
    individual: f64,
    #[serde(default)]
    family: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct CostSharingTable {
    primary_care: Option<ServiceTerms>,
    specialist: Option<ServiceTerms>,
    urgent_care: Option<ServiceTerms>,
    emergency_room: Option<EmergencyTerms>,
    diagnostic_test: Option<DiagnosticTerms>,
    prescription_drugs: Option<DrugTerms>,
    hospital_stay: Option<HospitalTerms>,
}

/// Out-of-network terms are not modeled and are skipped by serde.
#[derive(Debug, Deserialize)]
struct ServiceTerms {
    in_network: Option<NetworkTerms>,
}

#[derive(Debug, Deserialize)]
struct EmergencyTerms {
    care: Option<ServiceTerms>,
    transportation: Option<ServiceTerms>,
}

#[derive(Debug, Deserialize)]
struct DiagnosticTerms {
    lab: Option<ServiceTerms>,
}

#[derive(Debug, Deserialize)]
struct DrugTerms {
    tier_1: Option<ServiceTerms>,
    tier_4: Option<ServiceTerms>,
}

#[derive(Debug, Deserialize)]
struct HospitalTerms {
    facility_fee: Option<ServiceTerms>,
}

/// Every field a plan document uses for in-network cost sharing.
/// Coinsurance figures are percentages.
#[derive(Debug, Default, Deserialize)]
struct NetworkTerms {
    copay: Option<f64>,
    coinsurance: Option<f64>,
    max: Option<f64>,
    retail_copay: Option<f64>,
    retail_coinsurance: Option<f64>,
    retail_max: Option<f64>,
    coverage: Option<String>,
}

impl CostSharingTable {
    fn entries(&self) -> Vec<(ServiceCategory, &ServiceTerms)> {
        let emergency = self.emergency_room.as_ref();
        let drugs = self.prescription_drugs.as_ref();
        let candidates = [
            (ServiceCategory::PrimaryCare, self.primary_care.as_ref()),
            (ServiceCategory::Specialist, self.specialist.as_ref()),
            (ServiceCategory::UrgentCare, self.urgent_care.as_ref()),
            (
                ServiceCategory::EmergencyRoom,
                emergency.and_then(|e| e.care.as_ref()),
            ),
            (
                ServiceCategory::Ambulance,
                emergency.and_then(|e| e.transportation.as_ref()),
            ),
            (
                ServiceCategory::LabWork,
                self.diagnostic_test.as_ref().and_then(|d| d.lab.as_ref()),
            ),
            (
                ServiceCategory::GenericDrugs,
                drugs.and_then(|d| d.tier_1.as_ref()),
            ),
            (
                ServiceCategory::SpecialtyDrugs,
                drugs.and_then(|d| d.tier_4.as_ref()),
            ),
            (
                ServiceCategory::HospitalStay,
                self.hospital_stay
                    .as_ref()
                    .and_then(|h| h.facility_fee.as_ref()),
            ),
        ];
        candidates
            .into_iter()
            .filter_map(|(category, terms)| terms.map(|t| (category, t)))
            .collect()
    }
}

impl NetworkTerms {
    /// Pick the rule a plan document describes. Explicit coverage text wins,
    /// then copays, then coinsurance (capped when a maximum is given).
    fn to_rule(
        &self,
        plan: &str,
        category: ServiceCategory,
    ) -> Result<Option<CostSharing>, ConfigurationError> {
        if let Some(coverage) = &self.coverage {
            return match coverage.trim().to_lowercase().as_str() {
                "no charge" | "covered" | "covered in full" | "no cost" => {
                    Ok(Some(CostSharing::NoCharge))
                }
                "not covered" => Ok(Some(CostSharing::NotCovered)),
                other => Err(ConfigurationError::invalid_plan(
                    plan,
                    format!("unrecognized coverage `{other}` for {category}"),
                )),
            };
        }

        if let Some(amount) = self.copay.or(self.retail_copay) {
            let amount = non_negative(plan, &format!("{category} copay"), amount)?;
            return Ok(Some(CostSharing::Copay { amount }));
        }

        if let Some(percent) = self.coinsurance.or(self.retail_coinsurance) {
            let rate = percent_to_rate(plan, category, percent)?;
            return match self.max.or(self.retail_max) {
                Some(max) => Ok(Some(CostSharing::CoinsuranceCapped {
                    rate,
                    max_per_unit: non_negative(plan, &format!("{category} maximum"), max)?,
                })),
                None => Ok(Some(CostSharing::Coinsurance { rate })),
            };
        }

        Ok(None)
    }
}

fn percent_to_rate(
    plan: &str,
    category: ServiceCategory,
    percent: f64,
) -> Result<f64, ConfigurationError> {
    if (0.0..=100.0).contains(&percent) {
        Ok(percent / 100.0)
    } else {
        Err(ConfigurationError::invalid_plan(
            plan,
            format!("{category} coinsurance must be between 0 and 100 percent (got {percent})"),
        ))
    }
}

fn non_negative(plan: &str, what: &str, value: f64) -> Result<f64, ConfigurationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigurationError::invalid_plan(
            plan,
            format!("{what} must be a non-negative amount (got {value})"),
        ))
    }
}

impl PlanEntry {
    fn into_plan(self) -> Result<Plan, ConfigurationError> {
        let name = self.plan_name.trim().to_string();
        if name.is_empty() {
            return Err(ConfigurationError::invalid_plan(
                "<unnamed>",
                "plan_name cannot be empty",
            ));
        }

        let mut cost_sharing = BTreeMap::new();
        for (category, terms) in self.cost_sharing.entries() {
            let rule = match &terms.in_network {
                Some(network) => network.to_rule(&name, category)?,
                None => None,
            };
            match rule {
                Some(rule) => {
                    cost_sharing.insert(category, rule);
                }
                None => debug!(plan = %name, category = category.key(), "no in-network terms"),
            }
        }

        let mut pre_deductible = BTreeSet::new();
        for service in &self.services_covered_before_deductible {
            match ServiceCategory::from_name(service) {
                Some(category) => {
                    pre_deductible.insert(category);
                }
                None => debug!(
                    plan = %name,
                    service = %service,
                    "ignoring unmodeled pre-deductible service"
                ),
            }
        }

        Ok(Plan {
            monthly_premium: non_negative(&name, "premium", self.premium)?,
            deductible: non_negative(&name, "deductible", self.deductibles.overall)?,
            family_deductible: self
                .deductibles
                .family
                .map(|v| non_negative(&name, "family deductible", v))
                .transpose()?,
            out_of_pocket_limit: non_negative(
                &name,
                "out-of-pocket limit",
                self.out_of_pocket_limit.individual,
            )?,
            family_out_of_pocket_limit: self
                .out_of_pocket_limit
                .family
                .map(|v| non_negative(&name, "family out-of-pocket limit", v))
                .transpose()?,
            insurer: self.insurer.trim().to_string(),
            plan_type: self.plan_type.trim().to_string(),
            referral_required: self.referral_needed,
            pre_deductible,
            cost_sharing,
            name,
        })
    }
}

// --- loaded catalog ---

/// The set of plans a comparison runs over. Plan names are unique.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    plans: Vec<Plan>,
}

impl Catalog {
    pub fn from_plans(plans: Vec<Plan>) -> Result<Self, ConfigurationError> {
        let mut seen = HashSet::new();
        for plan in &plans {
            if !seen.insert(plan.name.to_lowercase()) {
                return Err(ConfigurationError::DuplicatePlan(plan.name.clone()));
            }
        }
        Ok(Self { plans })
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigurationError> {
        let file: CatalogFile = serde_json::from_str(content)?;
        if file.plans.is_empty() {
            return Err(ConfigurationError::EmptyCatalog);
        }
        let plans = file
            .plans
            .into_iter()
            .map(PlanEntry::into_plan)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_plans(plans)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&content)?;
        debug!(path = %path.display(), plans = catalog.len(), "loaded plan catalog");
        Ok(catalog)
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Case-insensitive lookup by plan name.
    pub fn find(&self, name: &str) -> Option<&Plan> {
        let wanted = name.trim().to_lowercase();
        self.plans.iter().find(|p| p.name.to_lowercase() == wanted)
    }

    /// Plans grouped by insurer (alphabetical), each group ordered by monthly
    /// premium and then name.
    pub fn by_insurer(&self) -> Vec<(&str, Vec<&Plan>)> {
        let mut groups: BTreeMap<&str, Vec<&Plan>> = BTreeMap::new();
        for plan in &self.plans {
            groups.entry(plan.insurer.as_str()).or_default().push(plan);
        }
        groups
            .into_iter()
            .map(|(insurer, mut plans)| {
                plans.sort_by(|a, b| {
                    a.monthly_premium
                        .total_cmp(&b.monthly_premium)
                        .then_with(|| a.name.cmp(&b.name))
                });
                (insurer, plans)
            })
            .collect()
    }

    /// Plans in comparison order: insurer, then premium, then name.
    pub fn ordered(&self) -> Vec<&Plan> {
        self.by_insurer()
            .into_iter()
            .flat_map(|(_, plans)| plans)
            .collect()
    }
}
