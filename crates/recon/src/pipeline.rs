// Pipeline driver: selection + tier -> aggregate report

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use devintel_config::Settings;
use devintel_core::{Diagnostics, Entity, Tier};

use crate::aggregate::aggregate_projects;
use crate::alert::evaluate_alerts;
use crate::cache::{CachePolicy, EntityCache};
use crate::loader::{LoadedEntity, RecordLoader};
use crate::model::{AggregateReport, Alert, ProjectAggregate};
use crate::summary::compute_summary;

pub struct Pipeline {
    loader: RecordLoader,
    cache: Arc<EntityCache>,
}

impl Pipeline {
    /// Pipeline with its own cache, expiring per `settings.cache`.
    pub fn new(settings: Settings) -> Self {
        let cache = EntityCache::new(CachePolicy {
            ttl: settings.cache.ttl(),
        });
        Self {
            loader: RecordLoader::new(settings),
            cache: Arc::new(cache),
        }
    }

    /// Share a cache with other pipelines.
    pub fn with_cache(mut self, cache: Arc<EntityCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.loader = self.loader.with_today(today);
        self
    }

    pub fn settings(&self) -> &Settings {
        self.loader.settings()
    }

    pub fn loader(&self) -> &RecordLoader {
        &self.loader
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    /// Load one entity through the cache.
    pub fn load_entity(&self, entity: &Entity, tier: Tier) -> Arc<LoadedEntity> {
        self.cache
            .get_or_load(entity, tier, || self.loader.load(entity, tier))
    }

    /// Load every selected entity and aggregate per project.
    ///
    /// Repeated entities in `selection` are loaded and aggregated once, but
    /// `total_pemajus` is the length of `selection` as given. When nothing
    /// loads the report is `Fidelity::NoData` with a zeroed summary that still
    /// counts the selection.
    pub fn run(&self, selection: &[Entity], tier: Tier) -> AggregateReport {
        let mut seen = HashSet::new();
        let distinct: Vec<&Entity> = selection.iter().filter(|e| seen.insert(*e)).collect();

        let mut diags = Diagnostics::new();
        let loaded: Vec<Arc<LoadedEntity>> = distinct
            .iter()
            .map(|entity| {
                let l = self.load_entity(entity, tier);
                diags.extend(l.diagnostics.iter().cloned());
                l
            })
            .collect();

        let aggregation = aggregate_projects(
            loaded.iter().map(|l| &l.table),
            &self.settings().synonyms,
            tier,
            &mut diags,
        );
        if aggregation.fidelity.is_no_data() {
            diags.warning(None, "no data loaded for the selected entities");
        }

        let summary = compute_summary(&aggregation.projects, selection.len(), tier);
        log::info!(
            "{} entities, {} projects, fidelity {}",
            distinct.len(),
            aggregation.projects.len(),
            aggregation.fidelity
        );

        AggregateReport {
            tier,
            fidelity: aggregation.fidelity,
            projects: aggregation.projects,
            summary,
            diagnostics: diags.into_vec(),
        }
    }

    /// Threshold alerts for (typically filtered) project rows.
    pub fn alerts(&self, projects: &[ProjectAggregate], tier: Tier) -> Vec<Alert> {
        evaluate_alerts(projects, &self.settings().alerts, tier)
    }
}
