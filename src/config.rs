use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::profile::{DEFAULT_AGE, DEFAULT_RESTING_HR};
use crate::constants::recovery::{DEFAULT_BASELINE_DAYS, DEFAULT_SLEEP_TARGET_HOURS};
use crate::constants::strain::DEFAULT_PERSONAL_FACTOR;
use crate::error::PulseError;
use crate::history::HistoryAnalyzer;
use crate::logging::LogConfig;
use crate::recovery::RecoveryConfig;
use crate::strain::{StrainConfig, StrainProfile};

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Personal physiology used by the engines
    pub profile: ProfileSettings,

    /// Strain calibration
    pub strain: StrainConfig,

    /// Recovery weights and saturation
    pub recovery: RecoveryConfig,

    /// Baseline window settings
    pub history: HistorySettings,

    /// Logging output
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Personal physiology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    /// Age in years
    pub age: u8,

    /// Resting heart rate in bpm
    pub resting_hr: u16,

    /// Highest measured heart rate, if known
    pub max_hr: Option<u16>,

    /// Learned intensity factor
    pub personal_factor: f64,

    /// Nightly sleep target in hours
    pub sleep_target_hours: f64,
}

/// Baseline window settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Days before the target date used for HRV and RHR baselines
    pub baseline_days: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            metadata: ConfigMetadata::default(),
            profile: ProfileSettings::default(),
            strain: StrainConfig::default(),
            recovery: RecoveryConfig::default(),
            history: HistorySettings::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            age: DEFAULT_AGE,
            resting_hr: DEFAULT_RESTING_HR,
            max_hr: None,
            personal_factor: DEFAULT_PERSONAL_FACTOR,
            sleep_target_hours: DEFAULT_SLEEP_TARGET_HOURS,
        }
    }
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            baseline_days: DEFAULT_BASELINE_DAYS,
        }
    }
}

impl ProfileSettings {
    /// Strain profile for this person
    pub fn strain_profile(&self) -> StrainProfile {
        let profile = StrainProfile::new(self.age, self.resting_hr)
            .with_personal_factor(self.personal_factor);
        match self.max_hr {
            Some(max_hr) => profile.with_max_hr(max_hr),
            None => profile,
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pulsetrack")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(_) => {
                tracing::debug!(path = %config_path.display(), "Config file not found, using defaults");
                Self::default()
            }
        }
    }

    /// History analyzer wired to the configured weights, window and sleep target
    pub fn history_analyzer(&self) -> HistoryAnalyzer {
        HistoryAnalyzer::with_config(
            self.recovery.clone(),
            self.history.baseline_days,
            self.profile.sleep_target_hours,
        )
    }

    /// Look up a dotted key such as `profile.age` or `recovery.weights.hrv`
    pub fn get(&self, key: &str) -> Result<toml::Value> {
        let root = toml::Value::try_from(self)
            .with_context(|| "Failed to serialize configuration")?;

        key.split('.')
            .try_fold(&root, |value, part| value.get(part))
            .cloned()
            .ok_or_else(|| PulseError::Configuration(format!("Unknown config key: {}", key)).into())
    }

    /// Set a dotted key from its TOML literal. Bare words are taken as strings.
    /// The result must still form a valid configuration.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<()> {
        let mut root = toml::Value::try_from(&*self)
            .with_context(|| "Failed to serialize configuration")?;

        let (parents, leaf) = match key.rsplit_once('.') {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, key),
        };

        let table = parents
            .into_iter()
            .flat_map(|p| p.split('.'))
            .try_fold(&mut root, |value, part| value.get_mut(part))
            .and_then(toml::Value::as_table_mut)
            .ok_or_else(|| PulseError::Configuration(format!("Unknown config key: {}", key)))?;

        if leaf == "metadata" || parents.is_some_and(|p| p.starts_with("metadata")) {
            let message = "Config metadata is read-only".to_string();
            return Err(PulseError::Configuration(message).into());
        }

        table.insert(leaf.to_string(), parse_value(raw));

        let updated: AppConfig = root.try_into().map_err(|err| {
            PulseError::Configuration(format!("Invalid value for {}: {} ({})", key, raw, err))
        })?;
        *self = updated;
        Ok(())
    }
}

/// Parse a TOML literal, falling back to a plain string
fn parse_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("value = {}", raw))
        .ok()
        .and_then(|mut table| table.remove("value"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}
