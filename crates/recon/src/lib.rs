//! `devintel-recon`: turns one entity's summary and detail exports into a
//! canonical table, then rolls selected entities up per project.
//!
//! Nothing in here fails a run: missing files, decode errors and schema gaps
//! degrade to defaults and come back as diagnostics.

pub mod aggregate;
pub mod alert;
pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;
pub mod summary;

pub use alert::evaluate_alerts;
pub use cache::{CachePolicy, EntityCache};
pub use filter::ProjectFilter;
pub use loader::{LoadedEntity, RecordLoader};
pub use model::{
    AdvancedMetrics, AggregateReport, Alert, AlertKind, EntityRollup, Fidelity, GlobalSummary,
    ProjectAggregate,
};
pub use pipeline::Pipeline;
pub use reconcile::{reconcile, JoinKey, JoinKeyKind, MergeStrategy, Reconciled};
pub use summary::{compute_summary, rollup_by_entity};
