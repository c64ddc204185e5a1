// Project-level filters applied after aggregation

use std::collections::BTreeSet;

use crate::model::ProjectAggregate;

/// Narrows the project table. Bounds are inclusive; `projects: None` keeps
/// every project. Filtering never touches the global summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFilter {
    pub projects: Option<BTreeSet<String>>,
    pub min_total_sales: Option<f64>,
    pub max_total_sales: Option<f64>,
}

impl ProjectFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projects<I, S>(mut self, projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = projects.into_iter().map(Into::into).collect();
        self.projects = if set.is_empty() { None } else { Some(set) };
        self
    }

    pub fn with_min_sales(mut self, min: f64) -> Self {
        self.min_total_sales = Some(min);
        self
    }

    pub fn with_max_sales(mut self, max: f64) -> Self {
        self.max_total_sales = Some(max);
        self
    }

    pub fn is_unfiltered(&self) -> bool {
        self.projects.is_none() && self.min_total_sales.is_none() && self.max_total_sales.is_none()
    }

    pub fn matches(&self, project: &ProjectAggregate) -> bool {
        if let Some(ref names) = self.projects {
            if !names.contains(&project.project_name) {
                return false;
            }
        }
        let sales = project.total_sales_per_project;
        if self.min_total_sales.is_some_and(|min| sales < min) {
            return false;
        }
        if self.max_total_sales.is_some_and(|max| sales > max) {
            return false;
        }
        true
    }

    pub fn apply(&self, projects: &[ProjectAggregate]) -> Vec<ProjectAggregate> {
        projects.iter().filter(|p| self.matches(p)).cloned().collect()
    }
}
