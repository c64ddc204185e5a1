//! `devintel-core`: shared types for the competitor ingestion pipeline.
//!
//! Raw tables as read from source files, the canonical record schema they are
//! normalized into, service tiers, money parsing and diagnostics.

pub mod diagnostic;
pub mod model;
pub mod money;
pub mod schema;
pub mod table;

pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use model::{CanonicalField, CanonicalRecord, Entity, EntityTable, Origin, SourceKind, Tier};
pub use schema::{ColumnMapping, QuotaBucket, StatusBucket, SynonymSets};
pub use table::{RawRow, RawTable};

/// Placeholder written into text fields that have no source value.
pub const UNKNOWN: &str = "Unknown";

/// Column stamped on every detail row with the sheet (project) it came from.
pub const PROJECT_SHEET_COLUMN: &str = "project_sheet_name";
