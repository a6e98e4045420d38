use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ConfigurationError;

/// Service categories, in the order the estimator settles them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    PrimaryCare,
    Specialist,
    UrgentCare,
    EmergencyRoom,
    Ambulance,
    LabWork,
    GenericDrugs,
    SpecialtyDrugs,
    HospitalStay,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 9] = [
        ServiceCategory::PrimaryCare,
        ServiceCategory::Specialist,
        ServiceCategory::UrgentCare,
        ServiceCategory::EmergencyRoom,
        ServiceCategory::Ambulance,
        ServiceCategory::LabWork,
        ServiceCategory::GenericDrugs,
        ServiceCategory::SpecialtyDrugs,
        ServiceCategory::HospitalStay,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ServiceCategory::PrimaryCare => "primary_care",
            ServiceCategory::Specialist => "specialist",
            ServiceCategory::UrgentCare => "urgent_care",
            ServiceCategory::EmergencyRoom => "emergency_room",
            ServiceCategory::Ambulance => "ambulance",
            ServiceCategory::LabWork => "lab_work",
            ServiceCategory::GenericDrugs => "generic_drugs",
            ServiceCategory::SpecialtyDrugs => "specialty_drugs",
            ServiceCategory::HospitalStay => "hospital_stay",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceCategory::PrimaryCare => "Primary Care",
            ServiceCategory::Specialist => "Specialist",
            ServiceCategory::UrgentCare => "Urgent Care",
            ServiceCategory::EmergencyRoom => "Emergency Room",
            ServiceCategory::Ambulance => "Ambulance",
            ServiceCategory::LabWork => "Lab Work",
            ServiceCategory::GenericDrugs => "Generic Drugs",
            ServiceCategory::SpecialtyDrugs => "Specialty Drugs",
            ServiceCategory::HospitalStay => "Hospital Stay",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ServiceCategory::Ambulance => "ride",
            ServiceCategory::LabWork => "test",
            ServiceCategory::GenericDrugs | ServiceCategory::SpecialtyDrugs => "fill",
            ServiceCategory::HospitalStay => "day",
            _ => "visit",
        }
    }

    /// Drug tiers are priced by the plan's prescription rules and sit outside
    /// the medical deductible.
    pub fn is_drug_tier(&self) -> bool {
        matches!(
            self,
            ServiceCategory::GenericDrugs | ServiceCategory::SpecialtyDrugs
        )
    }

    /// Resolve a category from its key or one of the labels plan documents use
    /// ("Specialist Visit", "Diagnostic Tests", "ER", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase().replace([' ', '-', '.'], "_");
        let category = match normalized.as_str() {
            "primary_care" | "primary_care_visit" | "pcp" => ServiceCategory::PrimaryCare,
            "specialist" | "specialist_visit" => ServiceCategory::Specialist,
            "urgent_care" => ServiceCategory::UrgentCare,
            "emergency_room" | "emergency_room_care" | "er" => ServiceCategory::EmergencyRoom,
            "ambulance" | "emergency_room_transportation" | "emergency_transportation" => {
                ServiceCategory::Ambulance
            }
            "lab_work" | "lab" | "diagnostic_test" | "diagnostic_tests" | "diagnostic_test_lab" => {
                ServiceCategory::LabWork
            }
            "generic_drugs" | "tier_1" | "prescription_drugs_tier_1" => {
                ServiceCategory::GenericDrugs
            }
            "specialty_drugs" | "tier_4" | "prescription_drugs_tier_4" => {
                ServiceCategory::SpecialtyDrugs
            }
            "hospital_stay" | "hospital_stay_facility_fee" => ServiceCategory::HospitalStay,
            _ => return None,
        };
        Some(category)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Expected annual service counts. Counts are signed so that bad input can be
/// rejected by the estimator with a proper error instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageVector {
    pub primary_care: i64,
    pub specialist: i64,
    pub urgent_care: i64,
    pub emergency_room: i64,
    pub ambulance: i64,
    pub lab_work: i64,
    pub generic_drugs: i64,
    pub specialty_drugs: i64,
    pub hospital_stay: i64,
}

impl UsageVector {
    pub fn count(&self, category: ServiceCategory) -> i64 {
        match category {
            ServiceCategory::PrimaryCare => self.primary_care,
            ServiceCategory::Specialist => self.specialist,
            ServiceCategory::UrgentCare => self.urgent_care,
            ServiceCategory::EmergencyRoom => self.emergency_room,
            ServiceCategory::Ambulance => self.ambulance,
            ServiceCategory::LabWork => self.lab_work,
            ServiceCategory::GenericDrugs => self.generic_drugs,
            ServiceCategory::SpecialtyDrugs => self.specialty_drugs,
            ServiceCategory::HospitalStay => self.hospital_stay,
        }
    }

    fn slot(&mut self, category: ServiceCategory) -> &mut i64 {
        match category {
            ServiceCategory::PrimaryCare => &mut self.primary_care,
            ServiceCategory::Specialist => &mut self.specialist,
            ServiceCategory::UrgentCare => &mut self.urgent_care,
            ServiceCategory::EmergencyRoom => &mut self.emergency_room,
            ServiceCategory::Ambulance => &mut self.ambulance,
            ServiceCategory::LabWork => &mut self.lab_work,
            ServiceCategory::GenericDrugs => &mut self.generic_drugs,
            ServiceCategory::SpecialtyDrugs => &mut self.specialty_drugs,
            ServiceCategory::HospitalStay => &mut self.hospital_stay,
        }
    }

    pub fn set(&mut self, category: ServiceCategory, count: i64) {
        *self.slot(category) = count;
    }

    pub fn add(&mut self, category: ServiceCategory, count: i64) {
        let slot = self.slot(category);
        *slot = slot.saturating_add(count);
    }

    pub fn with(mut self, category: ServiceCategory, count: i64) -> Self {
        self.set(category, count);
        self
    }

    pub fn is_empty(&self) -> bool {
        ServiceCategory::ALL.iter().all(|c| self.count(*c) == 0)
    }

    /// Copy of this vector with an emergency scenario added on top.
    pub fn merged(&self, scenario: &EmergencyScenario) -> UsageVector {
        let mut merged = *self;
        for (category, count) in scenario.counts() {
            merged.add(category, count);
        }
        merged
    }
}

pub const DEFAULT_HOSPITAL_DAYS: i64 = 3;

/// A serious medical event layered over routine usage for one estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyScenario {
    pub ambulance_rides: i64,
    pub er_visit: bool,
    pub hospital_days: i64,
    pub follow_up_visits: i64,
    pub lab_tests: i64,
    pub prescriptions: i64,
}

impl EmergencyScenario {
    pub fn with_hospital_days(days: i64) -> Self {
        Self {
            hospital_days: days,
            ..Self::default()
        }
    }

    /// Units this scenario adds, per category.
    pub fn counts(&self) -> [(ServiceCategory, i64); 6] {
        [
            (ServiceCategory::Ambulance, self.ambulance_rides),
            (ServiceCategory::EmergencyRoom, i64::from(self.er_visit)),
            (ServiceCategory::HospitalStay, self.hospital_days),
            (ServiceCategory::Specialist, self.follow_up_visits),
            (ServiceCategory::LabWork, self.lab_tests),
            (ServiceCategory::GenericDrugs, self.prescriptions),
        ]
    }
}

impl Default for EmergencyScenario {
    fn default() -> Self {
        Self {
            ambulance_rides: 1,
            er_visit: true,
            hospital_days: DEFAULT_HOSPITAL_DAYS,
            follow_up_visits: 2,
            lab_tests: 3,
            prescriptions: 2,
        }
    }
}

/// Standardized pre-insurance unit cost per category.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseCosts {
    costs: [f64; 9],
}

impl BaseCosts {
    pub const STANDARD: BaseCosts = BaseCosts {
        costs: [
            150.0,  // primary care
            250.0,  // specialist
            200.0,  // urgent care
            1000.0, // emergency room
            1200.0, // ambulance
            300.0,  // lab work
            30.0,   // generic fill
            600.0,  // specialty fill
            2500.0, // hospital day
        ],
    };

    pub fn unit_cost(&self, category: ServiceCategory) -> f64 {
        self.costs[category.index()]
    }

    /// Override one unit cost. Costs must be finite and above zero.
    pub fn with_cost(
        mut self,
        category: ServiceCategory,
        cost: f64,
    ) -> Result<Self, ConfigurationError> {
        if !(cost.is_finite() && cost > 0.0) {
            return Err(ConfigurationError::InvalidBaseCost { category, cost });
        }
        self.costs[category.index()] = cost;
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ServiceCategory, f64)> + '_ {
        ServiceCategory::ALL
            .iter()
            .map(move |c| (*c, self.unit_cost(*c)))
    }
}

impl Default for BaseCosts {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl Serialize for BaseCosts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.costs.len()))?;
        for (category, cost) in self.iter() {
            map.serialize_entry(category.key(), &cost)?;
        }
        map.end()
    }
}

/// What one category cost, split between member and plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub category: ServiceCategory,
    pub units: i64,
    pub allowed: f64,
    /// Portion of the member's payment that counted toward the deductible.
    pub deductible: f64,
    pub member: f64,
    pub plan_paid: f64,
}

impl LineItem {
    pub fn zero(category: ServiceCategory) -> Self {
        Self {
            category,
            units: 0,
            allowed: 0.0,
            deductible: 0.0,
            member: 0.0,
            plan_paid: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub plan: String,
    pub lines: Vec<LineItem>,
    pub allowed_total: f64,
    pub deductible_applied: f64,
    pub out_of_pocket: f64,
    pub plan_paid: f64,
    pub annual_premium: f64,
    pub total: f64,
}

impl CostBreakdown {
    pub fn line(&self, category: ServiceCategory) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.category == category)
    }

}
