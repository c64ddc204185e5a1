// Record Loader: one entity's exports -> one canonical EntityTable
//
// Nothing here returns an error. Every failure becomes a diagnostic and the
// entity contributes whatever it could read.

use chrono::{Local, NaiveDate};
use devintel_config::{EntitySource, Settings};
use devintel_core::{Diagnostic, Diagnostics, Entity, EntityTable, RawTable, SourceKind, Tier};
use devintel_io::csv::read_summary;
use devintel_io::xlsx::read_detail;
use devintel_io::{resolve_source, Resolution, ResolvedSource};

use crate::normalize::{apply_column_mapping, conform};
use crate::reconcile::{reconcile, MergeStrategy};

/// Result of loading one entity under one tier.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedEntity {
    pub table: EntityTable,
    /// `None` when neither source produced rows.
    pub strategy: Option<MergeStrategy>,
    pub diagnostics: Vec<Diagnostic>,
}

impl LoadedEntity {
    pub fn empty(entity: Entity, tier: Tier) -> Self {
        Self {
            table: EntityTable::empty(entity, tier),
            strategy: None,
            diagnostics: Vec::new(),
        }
    }
}

pub struct RecordLoader {
    settings: Settings,
    today: NaiveDate,
}

impl RecordLoader {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            today: Local::now().date_naive(),
        }
    }

    /// Fix the date the synthetic scrape dates are derived from.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Where the summary and detail exports for `source` would be read from.
    pub fn resolve(&self, source: &EntitySource, kind: SourceKind) -> ResolvedSource {
        let extension = match kind {
            SourceKind::Summary => &self.settings.summary_extension,
            SourceKind::Detail => &self.settings.detail_extension,
        };
        resolve_source(
            &self.settings.data_dir,
            &source.prefix,
            extension,
            &source.fallback_stamp,
        )
    }

    pub fn load(&self, entity: &Entity, tier: Tier) -> LoadedEntity {
        let mut diags = Diagnostics::new();

        let Some(source) = self.settings.entity_source(entity) else {
            diags.error(Some(entity), "not in the entity registry");
            return LoadedEntity {
                diagnostics: diags.into_vec(),
                ..LoadedEntity::empty(entity.clone(), tier)
            };
        };

        let mut summary = self.read_source(entity, source, SourceKind::Summary, &mut diags);
        let mut detail = self.read_source(entity, source, SourceKind::Detail, &mut diags);

        if summary.is_empty() && detail.is_empty() {
            diags.warning(Some(entity), "no summary or detail rows; entity contributes nothing");
            return LoadedEntity {
                diagnostics: diags.into_vec(),
                ..LoadedEntity::empty(entity.clone(), tier)
            };
        }

        summary.trim_column_names();
        detail.trim_column_names();

        let reconciled = reconcile(summary, detail, &self.settings.columns.project_name);
        if reconciled.strategy == MergeStrategy::Stacked {
            diags.warning(
                Some(entity),
                "summary and detail share no project key; rows stacked without joining",
            );
        } else {
            log::debug!("{entity}: {}", reconciled.strategy);
        }

        let mut table = reconciled.table;
        apply_column_mapping(&mut table, &self.settings.columns);
        let table = conform(
            &table,
            &self.settings.columns,
            entity,
            tier,
            self.today,
            &mut diags,
        );
        diags.info(
            Some(entity),
            format!("{} records ({})", table.len(), reconciled.strategy),
        );

        LoadedEntity {
            table,
            strategy: Some(reconciled.strategy),
            diagnostics: diags.into_vec(),
        }
    }

    /// Read one export, or an empty table with a diagnostic explaining why.
    fn read_source(
        &self,
        entity: &Entity,
        source: &EntitySource,
        kind: SourceKind,
        diags: &mut Diagnostics,
    ) -> RawTable {
        let resolved = self.resolve(source, kind);
        match &resolved.resolution {
            Resolution::Latest => {}
            Resolution::Fallback => diags.info(
                Some(entity),
                format!("no dated {kind} export found; trying {}", resolved.file_name),
            ),
            Resolution::ListingFailed(e) => diags.warning(
                Some(entity),
                format!("{e}; trying {}", resolved.file_name),
            ),
        }

        if !resolved.exists() {
            diags.warning(
                Some(entity),
                format!("{kind} file {} not found", resolved.file_name),
            );
            return RawTable::default();
        }

        match kind {
            SourceKind::Summary => match read_summary(&resolved.path) {
                Ok(read) => {
                    diags.info(
                        Some(entity),
                        format!(
                            "summary {}: {} rows ({})",
                            resolved.file_name,
                            read.table.len(),
                            read.encoding
                        ),
                    );
                    read.table
                }
                Err(e) => {
                    diags.error(Some(entity), e.to_string());
                    RawTable::default()
                }
            },
            SourceKind::Detail => match read_detail(&resolved.path) {
                Ok(read) => {
                    diags.info(
                        Some(entity),
                        format!(
                            "detail {}: {} rows from sheets {}",
                            resolved.file_name,
                            read.table.len(),
                            read.sheet_names.join(", ")
                        ),
                    );
                    read.table
                }
                Err(e) => {
                    diags.error(Some(entity), e.to_string());
                    RawTable::default()
                }
            },
        }
    }
}
