use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::curve::{DEFAULT_MAX_SPEND, DEFAULT_POINTS, MAX_POINTS};
use crate::error::ConfigurationError;
use crate::estimate::{BaseCosts, ServiceCategory};

/// Default settings.toml content with all options commented out
pub const DEFAULT_SETTINGS: &str = r#"# plancost settings
# Location: ~/.config/plancost/settings.toml

# ============================================================================
# Plan catalog
# ============================================================================

[catalog]
# Plan catalog JSON (overridden by --catalog / PLANCOST_CATALOG)
# path = "~/.config/plancost/plans.json"

# ============================================================================
# Cost curve
# ============================================================================

[curve]
# Highest total spend on the curve
# max_spend = 50000

# Number of steps between 0 and max_spend
# points = 100

# ============================================================================
# Base costs (dollars per visit, ride, test, fill or hospital day)
# ============================================================================

[base_costs]
# primary_care = 150
# specialist = 250
# urgent_care = 200
# emergency_room = 1000
# ambulance = 1200
# lab_work = 300
# generic_drugs = 30
# specialty_drugs = 600
# hospital_stay = 2500
"#;

/// Effective settings after the file has been applied over the defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub catalog_path: PathBuf,
    pub max_spend: f64,
    pub curve_points: usize,
    pub base_costs: BaseCosts,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_path: config_dir().join("plans.json"),
            max_spend: DEFAULT_MAX_SPEND,
            curve_points: DEFAULT_POINTS,
            base_costs: BaseCosts::STANDARD,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    catalog: CatalogSection,
    curve: CurveSection,
    base_costs: BTreeMap<String, f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogSection {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CurveSection {
    max_spend: Option<f64>,
    points: Option<i64>,
}

pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

pub fn config_dir() -> PathBuf {
    config_dir_with_home(dirs::home_dir())
}

fn config_dir_with_home(home: Option<PathBuf>) -> PathBuf {
    match home {
        Some(h) => h.join(".config").join("plancost"),
        None => PathBuf::from(".config/plancost"),
    }
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.toml")
}

#[cfg(not(tarpaulin_include))]
pub fn load_settings() -> Result<Settings, ConfigurationError> {
    load_settings_from(&settings_path())
}

/// A missing file yields the defaults.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigurationError> {
    if !path.exists() {
        debug!(path = %path.display(), "no settings file, using defaults");
        return Ok(Settings::default());
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded settings");
    load_from_toml(&content)
}

pub fn load_from_toml(content: &str) -> Result<Settings, ConfigurationError> {
    let file: SettingsFile = toml::from_str(content)?;
    let mut settings = Settings::default();

    if let Some(path) = file.catalog.path.as_deref() {
        settings.catalog_path = expand_path(path);
    }

    if let Some(max_spend) = file.curve.max_spend {
        if !(max_spend.is_finite() && max_spend > 0.0) {
            return Err(ConfigurationError::InvalidSetting {
                setting: "curve.max_spend",
                value: max_spend,
            });
        }
        settings.max_spend = max_spend;
    }

    if let Some(points) = file.curve.points {
        if points <= 0 {
            return Err(ConfigurationError::InvalidSetting {
                setting: "curve.points",
                value: points as f64,
            });
        }
        if points > MAX_POINTS as i64 {
            return Err(ConfigurationError::SettingTooLarge {
                setting: "curve.points",
                value: points,
                max: MAX_POINTS,
            });
        }
        settings.curve_points = points as usize;
    }

    for (key, cost) in &file.base_costs {
        let category = ServiceCategory::from_name(key)
            .ok_or_else(|| ConfigurationError::UnknownCategory(key.clone()))?;
        settings.base_costs = settings.base_costs.with_cost(category, *cost)?;
    }

    Ok(settings)
}

/// Write the commented template unless a settings file already exists.
/// Returns whether a file was written.
pub fn write_default_settings(path: &Path) -> Result<bool, ConfigurationError> {
    if path.exists() {
        return Ok(false);
    }
    let io_error = |source| ConfigurationError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, DEFAULT_SETTINGS).map_err(io_error)?;
    Ok(true)
}
