//! Data types produced by the analysis pipeline.

use serde::Serialize;
use std::collections::BTreeMap;

/// A distinct `(title, url)` pair seen within a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Item {
    pub title: String,
    pub url: Option<String>,
}

/// One label in the single-dataset summary view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub label: String,
    pub item_count: usize,
    pub total_value: f64,
    pub average_value: f64,
    pub items: Vec<Item>,
}

/// Figures for one label within one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFigures {
    pub total: f64,
    pub count: usize,
    pub average: f64,
    pub items: Vec<Item>,
}

/// One label across all compared sources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub label: String,
    pub sources: BTreeMap<String, SourceFigures>,
}

/// Grand totals for one source over every compared label.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceTotals {
    pub total: f64,
    pub count: usize,
    pub average: f64,
    pub after_tax: f64,
}

/// Result of the per-source comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub rows: Vec<ComparisonRow>,
    /// Source names in order of first appearance.
    pub source_names: Vec<String>,
    pub totals: BTreeMap<String, SourceTotals>,
}

/// An item whose accumulated value is exactly zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnpopularItem {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub category: String,
    pub label: String,
}

/// A name with the number of unpopular items carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCount {
    pub name: String,
    pub count: usize,
}

/// Result of the unpopular-item scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnpopularReport {
    pub items: Vec<UnpopularItem>,
    pub by_category: Vec<NameCount>,
    pub by_label: Vec<NameCount>,
}
