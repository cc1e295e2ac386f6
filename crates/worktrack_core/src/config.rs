//! Static configuration for the attribution engine.
//!
//! # Responsibility
//! - Hold the policy knobs read by context resolution, detection,
//!   validation and employer seeding.
//! - Parse JSON configuration with every field defaulted.
//!
//! # Invariants
//! - A validated config has a positive overtime ratio and contract default.
//! - Configuration is passed explicitly; there is no process-wide instance.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

const DEFAULT_OVERTIME_RATIO_LIMIT: f64 = 1.5;
const DEFAULT_CONTRACT_HOURS_PER_WEEK: f64 = 40.0;
const DEFAULT_IMPORT_SOURCES: &[&str] =
    &["fortnox", "visma", "tripletex", "harvest", "toggl", "clockify"];

/// Attribution engine configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct AttributionConfig {
    /// When true, single-company employees do not need an explicit choice.
    pub hide_selector_when_possible: bool,
    /// Projected week hours above `ratio * contract` raise an advisory issue.
    pub overtime_ratio_limit: f64,
    /// Contract hours applied to employees created without an explicit value.
    pub default_contract_hours_per_week: f64,
    /// External system names recognised by import-source detection.
    pub known_import_sources: Vec<String>,
    pub seed_employer: SeedEmployerSettings,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            hide_selector_when_possible: true,
            overtime_ratio_limit: DEFAULT_OVERTIME_RATIO_LIMIT,
            default_contract_hours_per_week: DEFAULT_CONTRACT_HOURS_PER_WEEK,
            known_import_sources: DEFAULT_IMPORT_SOURCES
                .iter()
                .map(|value| value.to_string())
                .collect(),
            seed_employer: SeedEmployerSettings::default(),
        }
    }
}

/// Starter settings for the canonical employer created on first use.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SeedEmployerSettings {
    pub name: String,
    pub registration_code: String,
}

impl Default for SeedEmployerSettings {
    fn default() -> Self {
        Self {
            name: "Main company".to_string(),
            registration_code: "0000000-0".to_string(),
        }
    }
}

impl AttributionConfig {
    /// Parses and validates configuration from a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.overtime_ratio_limit.is_finite() || self.overtime_ratio_limit <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "overtimeRatioLimit",
                message: format!("must be > 0, got {}", self.overtime_ratio_limit),
            });
        }
        if !self.default_contract_hours_per_week.is_finite()
            || self.default_contract_hours_per_week <= 0.0
        {
            return Err(ConfigError::InvalidValue {
                field: "defaultContractHoursPerWeek",
                message: format!("must be > 0, got {}", self.default_contract_hours_per_week),
            });
        }
        if self
            .known_import_sources
            .iter()
            .any(|value| value.trim().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "knownImportSources",
                message: "entries must not be blank".to_string(),
            });
        }
        if self.seed_employer.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "seedEmployer.name",
                message: "must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

/// Loads configuration from a JSON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<AttributionConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.display().to_string(),
        source: err,
    })?;
    AttributionConfig::from_json_str(&raw)
}

/// Configuration loading errors.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: String,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read config `{path}`: {source}"),
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::InvalidValue { field, message } => {
                write!(f, "invalid config value `{field}`: {message}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}
