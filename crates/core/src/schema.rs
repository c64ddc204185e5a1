use serde::{Deserialize, Serialize};

use crate::model::CanonicalField;

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Source column label expected for each canonical field.
///
/// Labels are matched against source headers after trimming and case-folding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub project_name: String,
    pub no_unit: String,
    pub harga_jualan: String,
    pub harga_spjb: String,
    pub status_jualan: String,
    pub kuota_bumi: String,
    pub nama_pemaju: String,
    pub scraped_date: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            project_name: "Kod Projek & Nama Projek".into(),
            no_unit: "No PT/Lot/Plot/No Unit".into(),
            harga_jualan: "Harga Jualan (RM)".into(),
            harga_spjb: "Harga SPJ (RM)".into(),
            status_jualan: "Status Jualan".into(),
            kuota_bumi: "Kuota Bumi".into(),
            nama_pemaju: "Kod Pemaju & Nama Pemaju".into(),
            scraped_date: "Scraped_Date".into(),
        }
    }
}

impl ColumnMapping {
    pub fn label(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::ProjectName => &self.project_name,
            CanonicalField::NoUnit => &self.no_unit,
            CanonicalField::HargaJualan => &self.harga_jualan,
            CanonicalField::HargaSpjb => &self.harga_spjb,
            CanonicalField::StatusJualan => &self.status_jualan,
            CanonicalField::KuotaBumi => &self.kuota_bumi,
            CanonicalField::NamaPemaju => &self.nama_pemaju,
            CanonicalField::ScrapedDate => &self.scraped_date,
        }
    }

    /// (field, label) pairs in canonical field order.
    pub fn pairs(&self) -> impl Iterator<Item = (CanonicalField, &str)> + '_ {
        CanonicalField::ALL.into_iter().map(move |f| (f, self.label(f)))
    }
}

// ---------------------------------------------------------------------------
// Category synonyms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBucket {
    Sold,
    Unsold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaBucket {
    Quota,
    NonQuota,
}

/// Bilingual synonym sets for the sale-status and quota categories.
///
/// A value matching no set belongs to no bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynonymSets {
    pub sold: Vec<String>,
    pub unsold: Vec<String>,
    pub quota: Vec<String>,
    pub non_quota: Vec<String>,
}

impl Default for SynonymSets {
    fn default() -> Self {
        fn set(values: &[&str]) -> Vec<String> {
            values.iter().map(|v| v.to_string()).collect()
        }
        Self {
            sold: set(&["telah dijual", "terjual", "sold"]),
            unsold: set(&["belum dijual", "belum terjual", "unsold"]),
            quota: set(&["ya", "bumi", "yes"]),
            non_quota: set(&["tidak", "non-bumi", "no"]),
        }
    }
}

impl SynonymSets {
    pub fn status_bucket(&self, value: &str) -> Option<StatusBucket> {
        let folded = value.to_lowercase();
        if contains_folded(&self.sold, &folded) {
            Some(StatusBucket::Sold)
        } else if contains_folded(&self.unsold, &folded) {
            Some(StatusBucket::Unsold)
        } else {
            None
        }
    }

    pub fn quota_bucket(&self, value: &str) -> Option<QuotaBucket> {
        let folded = value.to_lowercase();
        if contains_folded(&self.quota, &folded) {
            Some(QuotaBucket::Quota)
        } else if contains_folded(&self.non_quota, &folded) {
            Some(QuotaBucket::NonQuota)
        } else {
            None
        }
    }
}

fn contains_folded(set: &[String], folded: &str) -> bool {
    set.iter().any(|s| s.to_lowercase() == folded)
}
