//! Detection of items that earned nothing.

use crate::analyzers::classify::{KeywordSet, cell, classify};
use crate::analyzers::types::{NameCount, UnpopularItem, UnpopularReport};
use crate::analyzers::utility::parse_value;
use crate::columns::ColumnRoles;
use crate::parser::Dataset;
use std::collections::HashMap;

const UNTITLED: &str = "Untitled";
const UNKNOWN_CATEGORY: &str = "Unknown";

struct Tally {
    item: UnpopularItem,
    total: f64,
}

/// Scans every dataset for ids whose summed value is exactly zero.
///
/// The first row of an id supplies its title, url, category and label; later
/// rows only add to its total. Non-numeric values count as zero. This always
/// looks at every source, whatever the merge setting.
pub fn find_unpopular(
    datasets: &[Dataset],
    roles: &ColumnRoles,
    keywords: &KeywordSet,
) -> UnpopularReport {
    if roles.id.is_none() || roles.value.is_none() {
        return UnpopularReport::default();
    }

    let mut order: Vec<String> = Vec::new();
    let mut tallies: HashMap<String, Tally> = HashMap::new();

    for row in datasets.iter().flat_map(|ds| &ds.rows) {
        let id = cell(row, roles.id.as_deref());
        if id.is_empty() {
            continue;
        }
        let value = parse_value(cell(row, roles.value.as_deref())).unwrap_or(0.0);

        let tally = tallies.entry(id.to_string()).or_insert_with(|| {
            order.push(id.to_string());

            let title = cell(row, roles.title.as_deref());
            let url = cell(row, roles.url.as_deref());
            let category = cell(row, roles.category.as_deref());
            Tally {
                item: UnpopularItem {
                    id: id.to_string(),
                    title: non_empty_or(title, UNTITLED),
                    url: (!url.is_empty()).then(|| url.to_string()),
                    category: non_empty_or(category, UNKNOWN_CATEGORY),
                    label: classify(
                        row,
                        roles.title.as_deref(),
                        roles.category.as_deref(),
                        keywords,
                    ),
                },
                total: 0.0,
            }
        });
        tally.total += value;
    }

    let items: Vec<UnpopularItem> = order
        .iter()
        .filter_map(|id| tallies.remove(id))
        .filter(|t| t.total == 0.0)
        .map(|t| t.item)
        .collect();

    UnpopularReport {
        by_category: count_by(&items, |i| &i.category),
        by_label: count_by(&items, |i| &i.label),
        items,
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Counts items per name, most frequent first; ties keep first-seen order.
fn count_by(items: &[UnpopularItem], name: impl Fn(&UnpopularItem) -> &String) -> Vec<NameCount> {
    let mut counts: Vec<NameCount> = Vec::new();
    for item in items {
        let name = name(item);
        match counts.iter_mut().find(|c| &c.name == name) {
            Some(c) => c.count += 1,
            None => counts.push(NameCount {
                name: name.clone(),
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}
