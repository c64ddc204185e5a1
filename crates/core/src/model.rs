use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Entity + Tier
// ---------------------------------------------------------------------------

/// A tracked competitor (pemaju), identified by its registry name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(String);

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Service level. Gates the derived percentage metrics and the synthetic
/// sync cadence stamped on loaded records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Base,
    Elevated,
}

impl Tier {
    pub fn is_elevated(self) -> bool {
        matches!(self, Tier::Elevated)
    }

    /// How many entities the presentation layer lets a caller select.
    /// Not enforced by the pipeline.
    pub fn entity_limit(self) -> usize {
        match self {
            Tier::Base => 1,
            Tier::Elevated => 5,
        }
    }

    /// Days between a sync and the day it is reported for: weekly sync for
    /// the base tier, daily for elevated.
    pub fn sync_lag_days(self) -> i64 {
        match self {
            Tier::Base => 7,
            Tier::Elevated => 0,
        }
    }

    /// The scrape date reported for every record loaded under this tier.
    ///
    /// Models sync cadence only; it is not a measured timestamp.
    pub fn synthetic_scrape_date(self, today: NaiveDate) -> NaiveDate {
        today - Duration::days(self.sync_lag_days())
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => write!(f, "base"),
            Self::Elevated => write!(f, "elevated"),
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base" | "basic" => Ok(Tier::Base),
            "elevated" | "pro" => Ok(Tier::Elevated),
            other => Err(format!("unknown tier: {other} (expected base or elevated)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// Which source file(s) a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Summary,
    Detail,
    Merged,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summary => write!(f, "summary"),
            Self::Detail => write!(f, "detail"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

/// The two file kinds exported per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Periodic summary export (one table).
    Summary,
    /// Multi-sheet detail export, one sheet per project.
    Detail,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summary => write!(f, "summary"),
            Self::Detail => write!(f, "detail"),
        }
    }
}

// ---------------------------------------------------------------------------
// Canonical schema
// ---------------------------------------------------------------------------

/// Fields every canonical record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    ProjectName,
    NoUnit,
    HargaJualan,
    HargaSpjb,
    StatusJualan,
    KuotaBumi,
    NamaPemaju,
    ScrapedDate,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 8] = [
        CanonicalField::ProjectName,
        CanonicalField::NoUnit,
        CanonicalField::HargaJualan,
        CanonicalField::HargaSpjb,
        CanonicalField::StatusJualan,
        CanonicalField::KuotaBumi,
        CanonicalField::NamaPemaju,
        CanonicalField::ScrapedDate,
    ];

    /// Text fields that receive the `Unknown` default when absent.
    pub const TEXT: [CanonicalField; 5] = [
        CanonicalField::ProjectName,
        CanonicalField::NamaPemaju,
        CanonicalField::StatusJualan,
        CanonicalField::KuotaBumi,
        CanonicalField::ScrapedDate,
    ];

    /// Canonical column name.
    pub fn name(self) -> &'static str {
        match self {
            Self::ProjectName => "project_name",
            Self::NoUnit => "no_unit",
            Self::HargaJualan => "harga_jualan",
            Self::HargaSpjb => "harga_spjb",
            Self::StatusJualan => "status_jualan",
            Self::KuotaBumi => "kuota_bumi",
            Self::NamaPemaju => "nama_pemaju",
            Self::ScrapedDate => "scraped_date",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A source row after normalization. Every field holds a defined value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub entity: Entity,
    pub origin: Origin,
    pub project_name: String,
    pub no_unit: String,
    pub harga_jualan: String,
    pub harga_spjb: String,
    pub status_jualan: String,
    pub kuota_bumi: String,
    pub nama_pemaju: String,
    /// Tier-dependent sync date (see [`Tier::synthetic_scrape_date`]).
    pub scraped_date: NaiveDate,
    /// The scrape timestamp text as exported, trimmed.
    pub source_scraped_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_sheet_name: Option<String>,
    pub no_unit_num: f64,
    pub harga_jualan_num: f64,
    pub harga_spjb_num: f64,
}

/// All normalized records for one entity under one tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityTable {
    pub entity: Entity,
    pub tier: Tier,
    pub records: Vec<CanonicalRecord>,
    /// Canonical fields that no source column mapped to; their values are defaults.
    pub schema_gaps: BTreeSet<CanonicalField>,
}

impl EntityTable {
    pub fn empty(entity: Entity, tier: Tier) -> Self {
        Self {
            entity,
            tier,
            records: Vec::new(),
            schema_gaps: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the field came from the source rather than from defaults.
    pub fn has_source_field(&self, field: CanonicalField) -> bool {
        !self.schema_gaps.contains(&field)
    }
}
