//! Analysis session: the inputs and settings every report is computed from.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::analyzers::aggregate::{
    ComparisonOptions, all_labels, compare, processed_datasets, summarize,
};
use crate::analyzers::classify::{DEFAULT_KEYWORDS, KeywordSet};
use crate::analyzers::sort::{ComparisonSort, SummarySort, sort_summary};
use crate::analyzers::suggest::suggest_keywords;
use crate::analyzers::types::{ComparisonReport, SummaryRow, UnpopularReport};
use crate::analyzers::unpopular::find_unpopular;
use crate::columns::ColumnRoles;
use crate::parser::Dataset;

/// Loaded datasets plus the user's settings.
///
/// Each report takes a snapshot of the keyword list when it starts and
/// recomputes everything from the current datasets.
#[derive(Debug, Clone)]
pub struct Session {
    pub datasets: Vec<Dataset>,
    pub keywords: Vec<String>,
    pub roles: ColumnRoles,
    /// Explicit column names that win over detection.
    pub overrides: ColumnRoles,
    /// Treat all sources as one dataset in the summary view.
    pub merge: bool,
    /// Source compared against all others pooled together.
    pub baseline: Option<String>,
    /// Labels included in the comparison; `None` means all.
    pub selected: Option<HashSet<String>>,
    pub summary_sort: SummarySort,
    pub comparison_sort: ComparisonSort,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            datasets: Vec::new(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            roles: ColumnRoles::default(),
            overrides: ColumnRoles::default(),
            merge: true,
            baseline: None,
            selected: None,
            summary_sort: SummarySort::default(),
            comparison_sort: ComparisonSort::default(),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Replaces the datasets and re-detects column roles from the first one.
    ///
    /// Returns a warning naming any required role that could not be found.
    pub fn load(&mut self, datasets: Vec<Dataset>) -> Option<String> {
        self.datasets = datasets;
        self.selected = None;

        let Some(first) = self.datasets.first() else {
            self.roles = self.overrides.clone();
            return Some("No CSV data loaded.".to_string());
        };
        if first.headers.is_empty() {
            self.roles = self.overrides.clone();
            return Some("CSV file is empty or has no valid header.".to_string());
        }

        self.roles = ColumnRoles::detect(&first.headers).with_overrides(&self.overrides);
        debug!(roles = ?self.roles, "Column roles resolved");

        let warning = self.roles.warning();
        if let Some(w) = &warning {
            warn!(warning = %w, "Required columns missing");
        }
        warning
    }

    /// Adds a keyword unless it is blank or already present. Returns whether it was added.
    pub fn add_keyword(&mut self, keyword: &str) -> bool {
        let keyword = keyword.trim();
        if keyword.is_empty() || self.keywords.iter().any(|k| k == keyword) {
            return false;
        }
        self.keywords.push(keyword.to_string());
        true
    }

    /// Removes every occurrence of `keyword`. Returns whether anything was removed.
    pub fn remove_keyword(&mut self, keyword: &str) -> bool {
        let before = self.keywords.len();
        self.keywords.retain(|k| k != keyword);
        self.keywords.len() != before
    }

    fn keyword_set(&self) -> KeywordSet {
        KeywordSet::new(&self.keywords)
    }

    pub fn summary(&self) -> Vec<SummaryRow> {
        let processed = processed_datasets(&self.datasets, self.merge);
        let mut rows = summarize(&processed, &self.roles, &self.keyword_set());
        sort_summary(&mut rows, self.summary_sort);
        rows
    }

    /// Per-source comparison. Always uses the separate sources; the baseline
    /// only applies while merge mode is off.
    pub fn comparison(&self) -> ComparisonReport {
        let options = ComparisonOptions {
            baseline: if self.merge {
                None
            } else {
                self.baseline.clone()
            },
            selected: self.selected.clone(),
            sort: self.comparison_sort,
        };
        compare(&self.datasets, &self.roles, &self.keyword_set(), &options)
    }

    pub fn unpopular(&self) -> UnpopularReport {
        find_unpopular(&self.datasets, &self.roles, &self.keyword_set())
    }

    /// Every label in the (possibly merged) data, sorted.
    pub fn labels(&self) -> Vec<String> {
        let processed = processed_datasets(&self.datasets, self.merge);
        all_labels(&processed, &self.roles, &self.keyword_set())
    }

    pub fn suggest_keywords(&self) -> Vec<String> {
        let processed = processed_datasets(&self.datasets, self.merge);
        let summary = summarize(&processed, &self.roles, &self.keyword_set());
        suggest_keywords(&summary, &self.keywords)
    }
}
