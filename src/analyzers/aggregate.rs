use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::analyzers::classify::{KeywordSet, cell, classify};
use crate::analyzers::sort::{ComparisonSort, sort_comparison};
use crate::analyzers::types::{
    ComparisonReport, ComparisonRow, Item, SourceFigures, SourceTotals, SummaryRow,
};
use crate::analyzers::utility::{after_tax, average, parse_value};
use crate::columns::ColumnRoles;
use crate::parser::{Dataset, Row};

/// Name of the synthetic dataset produced by merge mode.
pub const MERGED_SOURCE_NAME: &str = "All files combined";

/// Name of the pooled source in "one vs. others" comparisons.
pub const OTHERS_SOURCE_NAME: &str = "Others (combined)";

/// Running totals for one group.
#[derive(Debug, Default)]
pub struct Bucket {
    total: f64,
    ids: HashSet<String>,
    items: Vec<Item>,
    seen: HashSet<Item>,
}

impl Bucket {
    /// Folds one numeric row into the bucket. Rows without an id still count
    /// towards the total; rows without a title add no item.
    pub fn add(&mut self, value: f64, row: &Row, roles: &ColumnRoles) {
        self.total += value;

        let id = cell(row, roles.id.as_deref());
        if !id.is_empty() {
            self.ids.insert(id.to_string());
        }

        let title = cell(row, roles.title.as_deref());
        if !title.is_empty() {
            let url = cell(row, roles.url.as_deref());
            let item = Item {
                title: title.to_string(),
                url: (!url.is_empty()).then(|| url.to_string()),
            };
            if self.seen.insert(item.clone()) {
                self.items.push(item);
            }
        }
    }

    pub fn item_count(&self) -> usize {
        self.ids.len()
    }

    pub fn average(&self) -> f64 {
        average(self.total, self.item_count())
    }

    fn into_summary(self, label: String) -> SummaryRow {
        SummaryRow {
            label,
            item_count: self.item_count(),
            total_value: self.total,
            average_value: self.average(),
            items: self.items,
        }
    }

    fn into_figures(self) -> SourceFigures {
        SourceFigures {
            total: self.total,
            count: self.item_count(),
            average: self.average(),
            items: self.items,
        }
    }
}

/// String-keyed map that remembers first insertion order.
#[derive(Debug)]
struct Ordered<V> {
    index: HashMap<String, usize>,
    entries: Vec<(String, V)>,
}

impl<V> Default for Ordered<V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<V: Default> Ordered<V> {
    fn entry(&mut self, key: &str) -> &mut V {
        let i = match self.index.get(key) {
            Some(&i) => i,
            None => {
                self.entries.push((key.to_string(), V::default()));
                self.index.insert(key.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[i].1
    }
}

/// Returns the datasets to analyse: a single merged dataset when `merge` is set
/// and there is more than one source, otherwise the datasets as given.
pub fn processed_datasets(datasets: &[Dataset], merge: bool) -> Cow<'_, [Dataset]> {
    if !merge || datasets.len() < 2 {
        return Cow::Borrowed(datasets);
    }

    let headers = datasets
        .first()
        .map(|ds| ds.headers.clone())
        .unwrap_or_default();
    let rows = datasets
        .iter()
        .flat_map(|ds| ds.rows.iter().cloned())
        .collect();

    Cow::Owned(vec![Dataset::new(MERGED_SOURCE_NAME, headers, rows)])
}

fn has_required_roles(roles: &ColumnRoles) -> bool {
    roles.missing_required().is_empty()
}

/// Groups every numeric row of `datasets` by label, in first-seen label order.
pub fn summarize(datasets: &[Dataset], roles: &ColumnRoles, keywords: &KeywordSet) -> Vec<SummaryRow> {
    if !has_required_roles(roles) {
        return Vec::new();
    }

    let mut groups: Ordered<Bucket> = Ordered::default();

    for row in datasets.iter().flat_map(|ds| &ds.rows) {
        let Some(value) = parse_value(cell(row, roles.value.as_deref())) else {
            continue;
        };
        let label = classify(
            row,
            roles.title.as_deref(),
            roles.category.as_deref(),
            keywords,
        );
        groups.entry(&label).add(value, row, roles);
    }

    groups
        .entries
        .into_iter()
        .map(|(label, bucket)| bucket.into_summary(label))
        .collect()
}

/// Options for [`compare`].
#[derive(Debug, Clone, Default)]
pub struct ComparisonOptions {
    /// Compare this source against every other source pooled together.
    pub baseline: Option<String>,
    /// Only these labels contribute; `None` means all labels.
    pub selected: Option<HashSet<String>>,
    pub sort: ComparisonSort,
}

struct Source<'a> {
    name: String,
    parts: Vec<&'a Dataset>,
}

impl<'a> Source<'a> {
    fn single(dataset: &'a Dataset) -> Self {
        Self {
            name: dataset.name.clone(),
            parts: vec![dataset],
        }
    }

    fn rows(&self) -> impl Iterator<Item = &'a Row> + '_ {
        self.parts.iter().flat_map(|ds| ds.rows.iter())
    }
}

fn comparison_sources<'a>(datasets: &'a [Dataset], baseline: Option<&str>) -> Vec<Source<'a>> {
    match baseline {
        Some(base) if datasets.len() > 1 => {
            let mut sources = Vec::new();
            if let Some(ds) = datasets.iter().find(|ds| ds.name == base) {
                sources.push(Source::single(ds));
            }
            sources.push(Source {
                name: OTHERS_SOURCE_NAME.to_string(),
                parts: datasets.iter().filter(|ds| ds.name != base).collect(),
            });
            sources
        }
        _ => datasets.iter().map(Source::single).collect(),
    }
}

/// Groups rows by (label, source) and computes per-source grand totals.
///
/// Ids are counted per source; the same id in two sources counts once in each.
pub fn compare(
    datasets: &[Dataset],
    roles: &ColumnRoles,
    keywords: &KeywordSet,
    options: &ComparisonOptions,
) -> ComparisonReport {
    if !has_required_roles(roles) || datasets.is_empty() {
        return ComparisonReport::default();
    }

    let mut groups: Ordered<Ordered<Bucket>> = Ordered::default();

    for source in comparison_sources(datasets, options.baseline.as_deref()) {
        for row in source.rows() {
            let label = classify(
                row,
                roles.title.as_deref(),
                roles.category.as_deref(),
                keywords,
            );
            if let Some(selected) = &options.selected {
                if !selected.contains(&label) {
                    continue;
                }
            }
            let Some(value) = parse_value(cell(row, roles.value.as_deref())) else {
                continue;
            };
            groups.entry(&label).entry(&source.name).add(value, row, roles);
        }
    }

    let mut source_names: Vec<String> = Vec::new();
    for (_, per_source) in &groups.entries {
        for (name, _) in &per_source.entries {
            if !source_names.contains(name) {
                source_names.push(name.clone());
            }
        }
    }

    let mut rows: Vec<ComparisonRow> = groups
        .entries
        .into_iter()
        .map(|(label, per_source)| ComparisonRow {
            label,
            sources: per_source
                .entries
                .into_iter()
                .map(|(name, bucket)| (name, bucket.into_figures()))
                .collect(),
        })
        .collect();

    sort_comparison(&mut rows, &source_names, options.sort);

    let mut totals = std::collections::BTreeMap::new();
    for name in &source_names {
        let mut t = SourceTotals::default();
        for figures in rows.iter().filter_map(|r| r.sources.get(name)) {
            t.total += figures.total;
            t.count += figures.count;
        }
        t.average = average(t.total, t.count);
        t.after_tax = after_tax(t.total);
        totals.insert(name.clone(), t);
    }

    ComparisonReport {
        rows,
        source_names,
        totals,
    }
}

/// Every distinct label present in `datasets`, sorted.
pub fn all_labels(datasets: &[Dataset], roles: &ColumnRoles, keywords: &KeywordSet) -> Vec<String> {
    if roles.title.is_none() {
        return Vec::new();
    }

    datasets
        .iter()
        .flat_map(|ds| &ds.rows)
        .map(|row| {
            classify(
                row,
                roles.title.as_deref(),
                roles.category.as_deref(),
                keywords,
            )
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
