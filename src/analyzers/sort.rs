//! Ordering of summary and comparison output.
//!
//! All sorts are stable: rows that compare equal keep their prior order.

use std::cmp::Ordering;

use clap::ValueEnum;
use serde::Serialize;

use crate::analyzers::types::{ComparisonRow, SummaryRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[value(alias = "asc")]
    Ascending,
    #[default]
    #[value(alias = "desc")]
    Descending,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Field of a [`SummaryRow`] to order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKey {
    Label,
    #[value(name = "item_count", aliases = ["item-count", "count"])]
    ItemCount,
    #[default]
    #[value(name = "total_value", aliases = ["total-value", "total"])]
    TotalValue,
    #[value(name = "average_value", aliases = ["average-value", "average"])]
    AverageValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SummarySort {
    pub key: SummaryKey,
    pub direction: SortDirection,
}

/// Per-source metric used to order comparison rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonColumn {
    #[default]
    Total,
    Average,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ComparisonSort {
    /// Index into the report's source names; out of range falls back to the first source.
    pub source_index: usize,
    pub column: ComparisonColumn,
    pub direction: SortDirection,
}

pub fn sort_summary(rows: &mut [SummaryRow], sort: SummarySort) {
    rows.sort_by(|a, b| {
        let ordering = match sort.key {
            SummaryKey::Label => a.label.cmp(&b.label),
            SummaryKey::ItemCount => a.item_count.cmp(&b.item_count),
            SummaryKey::TotalValue => cmp_f64(a.total_value, b.total_value),
            SummaryKey::AverageValue => cmp_f64(a.average_value, b.average_value),
        };
        sort.direction.apply(ordering)
    });
}

/// Orders rows by the chosen source's metric, or alphabetically by label when
/// there are no sources at all. A row without figures for the source counts as 0.
pub fn sort_comparison(rows: &mut [ComparisonRow], source_names: &[String], sort: ComparisonSort) {
    let Some(source) = source_names
        .get(sort.source_index)
        .or_else(|| source_names.first())
    else {
        rows.sort_by(|a, b| a.label.cmp(&b.label));
        return;
    };

    let metric = |row: &ComparisonRow| {
        row.sources
            .get(source)
            .map(|figures| match sort.column {
                ComparisonColumn::Total => figures.total,
                ComparisonColumn::Average => figures.average,
            })
            .unwrap_or(0.0)
    };

    rows.sort_by(|a, b| sort.direction.apply(cmp_f64(metric(a), metric(b))));
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::SourceFigures;
    use std::collections::BTreeMap;

    fn summary(label: &str, count: usize, total: f64) -> SummaryRow {
        SummaryRow {
            label: label.to_string(),
            item_count: count,
            total_value: total,
            average_value: if count == 0 { 0.0 } else { total / count as f64 },
            items: vec![],
        }
    }

    fn comparison(label: &str, figures: &[(&str, f64, f64)]) -> ComparisonRow {
        let sources: BTreeMap<String, SourceFigures> = figures
            .iter()
            .map(|(name, total, average)| {
                (
                    name.to_string(),
                    SourceFigures {
                        total: *total,
                        count: 1,
                        average: *average,
                        items: vec![],
                    },
                )
            })
            .collect();
        ComparisonRow {
            label: label.to_string(),
            sources,
        }
    }

    fn labels_of_summary(rows: &[SummaryRow]) -> Vec<&str> {
        rows.iter().map(|r| r.label.as_str()).collect()
    }

    fn labels_of_comparison(rows: &[ComparisonRow]) -> Vec<&str> {
        rows.iter().map(|r| r.label.as_str()).collect()
    }

    #[test]
    fn test_summary_default_is_total_descending() {
        let mut rows = vec![summary("A", 1, 5.0), summary("B", 1, 20.0), summary("C", 1, 10.0)];
        sort_summary(&mut rows, SummarySort::default());
        assert_eq!(labels_of_summary(&rows), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_summary_ties_keep_prior_order() {
        let mut rows = vec![
            summary("Zeta", 1, 10.0),
            summary("Alpha", 1, 10.0),
            summary("Mid", 1, 30.0),
        ];
        sort_summary(&mut rows, SummarySort::default());
        assert_eq!(labels_of_summary(&rows), vec!["Mid", "Zeta", "Alpha"]);

        sort_summary(
            &mut rows,
            SummarySort {
                key: SummaryKey::TotalValue,
                direction: SortDirection::Ascending,
            },
        );
        assert_eq!(labels_of_summary(&rows), vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_summary_by_label_ascending() {
        let mut rows = vec![summary("b", 1, 1.0), summary("B", 1, 1.0), summary("a", 1, 1.0)];
        sort_summary(
            &mut rows,
            SummarySort {
                key: SummaryKey::Label,
                direction: SortDirection::Ascending,
            },
        );
        assert_eq!(labels_of_summary(&rows), vec!["B", "a", "b"]);
    }

    #[test]
    fn test_summary_by_item_count_descending() {
        let mut rows = vec![summary("A", 1, 1.0), summary("B", 3, 1.0), summary("C", 2, 1.0)];
        sort_summary(
            &mut rows,
            SummarySort {
                key: SummaryKey::ItemCount,
                direction: SortDirection::Descending,
            },
        );
        assert_eq!(labels_of_summary(&rows), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_comparison_by_selected_source() {
        let mut rows = vec![
            comparison("Flyer", &[("jan.csv", 10.0, 5.0), ("feb.csv", 1.0, 1.0)]),
            comparison("Mockup", &[("jan.csv", 2.0, 2.0), ("feb.csv", 30.0, 3.0)]),
            comparison("Font", &[("jan.csv", 5.0, 9.0)]),
        ];
        let names = vec!["jan.csv".to_string(), "feb.csv".to_string()];

        let sort = ComparisonSort {
            source_index: 1,
            ..Default::default()
        };
        sort_comparison(&mut rows, &names, sort);
        assert_eq!(labels_of_comparison(&rows), vec!["Mockup", "Flyer", "Font"]);

        let sort = ComparisonSort {
            source_index: 0,
            column: ComparisonColumn::Average,
            direction: SortDirection::Ascending,
        };
        sort_comparison(&mut rows, &names, sort);
        assert_eq!(labels_of_comparison(&rows), vec!["Mockup", "Flyer", "Font"]);
    }

    #[test]
    fn test_comparison_index_out_of_range_uses_first_source() {
        let mut rows = vec![
            comparison("A", &[("one", 1.0, 1.0)]),
            comparison("B", &[("one", 2.0, 2.0)]),
        ];
        let names = vec!["one".to_string()];
        let sort = ComparisonSort {
            source_index: 7,
            ..Default::default()
        };
        sort_comparison(&mut rows, &names, sort);
        assert_eq!(labels_of_comparison(&rows), vec!["B", "A"]);
    }

    #[test]
    fn test_comparison_without_sources_sorts_by_label() {
        let mut rows = vec![comparison("Mockup", &[]), comparison("Flyer", &[])];
        sort_comparison(&mut rows, &[], ComparisonSort::default());
        assert_eq!(labels_of_comparison(&rows), vec!["Flyer", "Mockup"]);
    }

    #[test]
    fn test_parse_sort_settings() {
        assert_eq!(
            SortDirection::from_str("asc", true),
            Ok(SortDirection::Ascending)
        );
        assert_eq!(
            SortDirection::from_str("Descending", true),
            Ok(SortDirection::Descending)
        );
        assert_eq!(
            SummaryKey::from_str("total-value", true),
            Ok(SummaryKey::TotalValue)
        );
        assert_eq!(SummaryKey::from_str("count", true), Ok(SummaryKey::ItemCount));
        assert_eq!(
            ComparisonColumn::from_str("average", true),
            Ok(ComparisonColumn::Average)
        );
        assert!(SortDirection::from_str("sideways", true).is_err());
    }

    #[test]
    fn test_sort_settings_list_canonical_names() {
        let names: Vec<String> = SummaryKey::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(names, vec!["label", "item_count", "total_value", "average_value"]);

        let directions: Vec<String> = SortDirection::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(directions, vec!["ascending", "descending"]);
    }
}
