// Pipeline settings
// Loaded from ~/.config/devintel/devintel.toml, or an explicit --config path

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use devintel_core::{ColumnMapping, Entity, SynonymSets};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    Read { path: String, message: String },
    /// TOML parse / deserialization error.
    Parse(String),
    /// Semantically invalid settings.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "cannot read config {path}: {message}"),
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::Validation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Entity registry
// ---------------------------------------------------------------------------

/// Where one competitor's exports live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySource {
    pub name: String,
    /// File name prefix shared by the summary and detail exports.
    pub prefix: String,
    /// Date stamp of the default file name used when no dated export is found.
    #[serde(default = "default_fallback_stamp")]
    pub fallback_stamp: String,
}

impl EntitySource {
    fn builtin(name: &str) -> Self {
        Self {
            name: name.to_string(),
            prefix: format!("{name}_MELAKA_PROJECT_DETAILS_"),
            fallback_stamp: default_fallback_stamp(),
        }
    }

    pub fn entity(&self) -> Entity {
        Entity::new(self.name.clone())
    }
}

fn default_fallback_stamp() -> String {
    "20251212".to_string()
}

// ---------------------------------------------------------------------------
// Alerts + Cache
// ---------------------------------------------------------------------------

/// Elevated-tier alert thresholds (strictly greater-than).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub units_sold_above: u64,
    pub total_sales_above: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            units_sold_above: 50,
            total_sales_above: 500_000.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Seconds a loaded entity stays cached. Absent = until cleared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
}

impl CacheSettings {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

// ---------------------------------------------------------------------------
// Top-level settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding every entity's exports.
    pub data_dir: PathBuf,
    pub summary_extension: String,
    pub detail_extension: String,
    pub columns: ColumnMapping,
    pub synonyms: SynonymSets,
    pub alerts: AlertThresholds,
    pub cache: CacheSettings,
    pub entities: Vec<EntitySource>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            summary_extension: "csv".to_string(),
            detail_extension: "xlsx".to_string(),
            columns: ColumnMapping::default(),
            synonyms: SynonymSets::default(),
            alerts: AlertThresholds::default(),
            cache: CacheSettings::default(),
            entities: ["Teladan", "NKS", "SCIENTEX"]
                .iter()
                .map(|name| EntitySource::builtin(name))
                .collect(),
        }
    }
}

impl Settings {
    /// Default settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("devintel")
            .join("devintel.toml")
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let settings: Settings =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&contents)
    }

    /// Load an explicit config file, or the default file if it exists, or
    /// built-in defaults. An explicit path must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        let path = Self::config_path();
        if path.is_file() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.summary_extension.trim().is_empty() || self.detail_extension.trim().is_empty() {
            return Err(ConfigError::Validation(
                "summary_extension and detail_extension must be non-empty".into(),
            ));
        }

        let mut names = HashSet::new();
        for source in &self.entities {
            if source.name.trim().is_empty() {
                return Err(ConfigError::Validation("entity name must be non-empty".into()));
            }
            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate entity: {}",
                    source.name
                )));
            }
            if source.prefix.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "entity '{}': prefix must be non-empty",
                    source.name
                )));
            }
            if source.fallback_stamp.len() != 8
                || !source.fallback_stamp.chars().all(|c| c.is_ascii_digit())
            {
                return Err(ConfigError::Validation(format!(
                    "entity '{}': fallback_stamp must be 8 digits (YYYYMMDD), got '{}'",
                    source.name, source.fallback_stamp
                )));
            }
        }

        let s = &self.synonyms;
        for (set, values) in [
            ("sold", &s.sold),
            ("unsold", &s.unsold),
            ("quota", &s.quota),
            ("non_quota", &s.non_quota),
        ] {
            if values.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "synonyms.{set} must list at least one value"
                )));
            }
        }

        Ok(())
    }

    pub fn entity_source(&self, entity: &Entity) -> Option<&EntitySource> {
        self.entities.iter().find(|s| s.name == entity.as_str())
    }

    /// Registered entities in configuration order.
    pub fn entities(&self) -> Vec<Entity> {
        self.entities.iter().map(EntitySource::entity).collect()
    }
}
