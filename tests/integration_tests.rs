use artboard_report::analyzers::aggregate::MERGED_SOURCE_NAME;
use artboard_report::analyzers::sort::{SortDirection, SummaryKey, SummarySort};
use artboard_report::output::{summary_records, write_comparison_table, write_csv, write_summary_table};
use artboard_report::parser::parse_csv;
use artboard_report::session::Session;

fn fixture_session() -> Session {
    let jan = parse_csv("jan.csv", include_str!("fixtures/jan.csv"));
    let feb = parse_csv("feb.csv", include_str!("fixtures/feb.csv"));
    assert_eq!(jan.rows.len(), 6);
    assert_eq!(feb.rows.len(), 4);

    let mut session = Session::new();
    let warning = session.load(vec![jan, feb]);
    assert!(warning.is_none(), "unexpected warning: {warning:?}");
    session
}

#[test]
fn test_full_pipeline_summary() {
    let session = fixture_session();
    let summary = session.summary();

    let labels: Vec<&str> = summary.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["Bifold Brochure", "Presentation", "Invoice", "Business Card", "Graphic"]
    );

    let brochure = &summary[0];
    assert_eq!(brochure.total_value, 50.0);
    assert_eq!(brochure.item_count, 1);
    assert_eq!(brochure.items.len(), 1);
    assert_eq!(brochure.items[0].title, "Bifold Brochure, Corporate");

    let graphic = &summary[4];
    assert_eq!(graphic.total_value, 3.0);
    assert_eq!(graphic.item_count, 2);
    assert_eq!(graphic.average_value, 1.5);
    assert_eq!(graphic.items[1].url, None);

    let grand_total: f64 = summary.iter().map(|r| r.total_value).sum();
    assert_eq!(grand_total, 83.0);
}

#[test]
fn test_summary_sorted_by_label() {
    let mut session = fixture_session();
    session.summary_sort = SummarySort {
        key: SummaryKey::Label,
        direction: SortDirection::Ascending,
    };
    let labels: Vec<String> = session.summary().into_iter().map(|r| r.label).collect();
    assert_eq!(
        labels,
        vec!["Bifold Brochure", "Business Card", "Graphic", "Invoice", "Presentation"]
    );
}

#[test]
fn test_full_pipeline_comparison() {
    let session = fixture_session();
    let report = session.comparison();

    assert_eq!(report.source_names, vec!["jan.csv", "feb.csv"]);
    let labels: Vec<&str> = report.rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["Bifold Brochure", "Presentation", "Business Card", "Graphic", "Invoice"]
    );

    let jan = &report.totals["jan.csv"];
    assert_eq!(jan.total, 44.0);
    assert_eq!(jan.count, 4);
    assert!((jan.after_tax - 37.4).abs() < 1e-9);

    let feb = &report.totals["feb.csv"];
    assert_eq!(feb.total, 39.0);
    assert_eq!(feb.count, 4);
    assert!((feb.after_tax - 33.15).abs() < 1e-9);
}

#[test]
fn test_comparison_against_baseline() {
    let mut session = fixture_session();
    session.merge = false;
    session.baseline = Some("feb.csv".to_string());

    let report = session.comparison();
    assert_eq!(report.source_names, vec!["feb.csv", "Others (combined)"]);
    assert_eq!(report.totals["feb.csv"].total, 39.0);
    assert_eq!(report.totals["Others (combined)"].total, 44.0);
}

#[test]
fn test_full_pipeline_unpopular() {
    let session = fixture_session();
    let report = session.unpopular();

    let ids: Vec<&str> = report.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["104", "105"]);
    assert_eq!(report.items[0].label, "Graphic");
    assert_eq!(report.items[1].label, "Flyer");
    assert_eq!(report.items[1].category, "print-templates");

    let categories: Vec<(&str, usize)> = report
        .by_category
        .iter()
        .map(|c| (c.name.as_str(), c.count))
        .collect();
    assert_eq!(categories, vec![("graphic-templates", 1), ("print-templates", 1)]);
}

#[test]
fn test_labels_include_non_numeric_rows() {
    let session = fixture_session();
    assert_eq!(
        session.labels(),
        vec!["Bifold Brochure", "Business Card", "Flyer", "Graphic", "Invoice", "Presentation"]
    );
}

#[test]
fn test_single_source_is_not_renamed() {
    let mut session = Session::new();
    session.load(vec![parse_csv("jan.csv", include_str!("fixtures/jan.csv"))]);
    assert_eq!(session.comparison().source_names, vec!["jan.csv"]);
    assert_ne!(session.comparison().source_names[0], MERGED_SOURCE_NAME);
}

#[test]
fn test_rendered_outputs() {
    let session = fixture_session();
    let summary = session.summary();

    let mut table = Vec::new();
    write_summary_table(&mut table, &summary).unwrap();
    let table = String::from_utf8(table).unwrap();
    assert!(table.contains("Bifold Brochure"));
    assert!(table.contains("$50.00"));
    assert!(table.contains("$83.00"));

    let mut comparison = Vec::new();
    write_comparison_table(&mut comparison, &session.comparison()).unwrap();
    let comparison = String::from_utf8(comparison).unwrap();
    assert!(comparison.contains("== jan.csv =="));
    assert!(comparison.contains("$37.40"));

    let mut csv = Vec::new();
    write_csv(&mut csv, &summary_records(&summary)).unwrap();
    let csv = String::from_utf8(csv).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("label,item_count,total_value,average_value"));
    assert_eq!(lines.count(), 5);
}
