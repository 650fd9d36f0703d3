//! Rendering and persistence of analysis reports.
//!
//! Supports plain-text tables, JSON serialization, and CSV export.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::analyzers::types::{ComparisonReport, Item, SummaryRow, UnpopularItem, UnpopularReport};
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Formats a value as US dollars with thousands separators, e.g. `$1,234.50`.
pub fn format_currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// Serializes any report as pretty-printed JSON.
pub fn to_json(value: &impl Serialize) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Flat CSV shape of a [`SummaryRow`].
#[derive(Debug, Serialize)]
pub struct SummaryRecord<'a> {
    pub label: &'a str,
    pub item_count: usize,
    pub total_value: f64,
    pub average_value: f64,
}

/// One (label, source) cell of a comparison in long format.
#[derive(Debug, Serialize)]
pub struct ComparisonRecord<'a> {
    pub label: &'a str,
    pub source: &'a str,
    pub total: f64,
    pub count: usize,
    pub average: f64,
}

pub fn summary_records(rows: &[SummaryRow]) -> Vec<SummaryRecord<'_>> {
    rows.iter()
        .map(|r| SummaryRecord {
            label: &r.label,
            item_count: r.item_count,
            total_value: r.total_value,
            average_value: r.average_value,
        })
        .collect()
}

pub fn comparison_records(report: &ComparisonReport) -> Vec<ComparisonRecord<'_>> {
    report
        .rows
        .iter()
        .flat_map(|row| {
            report.source_names.iter().filter_map(move |name| {
                row.sources.get(name).map(|f| ComparisonRecord {
                    label: &row.label,
                    source: name,
                    total: f.total,
                    count: f.count,
                    average: f.average,
                })
            })
        })
        .collect()
}

/// Writes `records` as CSV with a header row to `writer`.
pub fn write_csv<W: Write, T: Serialize>(writer: W, records: &[T]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Creates (or truncates) `path`, including missing parent directories, and
/// writes `records` to it as CSV.
pub fn write_csv_file<T: Serialize>(path: &str, records: &[T]) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    debug!(path, records = records.len(), "Writing CSV report");
    let file = File::create(path).with_context(|| format!("failed to create {path}"))?;
    write_csv(file, records)
}

pub fn write_summary_table<W: Write + ?Sized>(out: &mut W, rows: &[SummaryRow]) -> Result<()> {
    let width = label_width(rows.iter().map(|r| r.label.as_str()), "Label");
    writeln!(
        out,
        "{:<width$}  {:>8}  {:>14}  {:>12}",
        "Label", "Items", "Total", "Average"
    )?;
    for r in rows {
        writeln!(
            out,
            "{:<width$}  {:>8}  {:>14}  {:>12}",
            r.label,
            r.item_count,
            format_currency(r.total_value),
            format_currency(r.average_value)
        )?;
    }

    let total: f64 = rows.iter().map(|r| r.total_value).sum();
    let items: usize = rows.iter().map(|r| r.item_count).sum();
    writeln!(
        out,
        "{:<width$}  {:>8}  {:>14}",
        "Total",
        items,
        format_currency(total)
    )?;
    Ok(())
}

pub fn write_comparison_table<W: Write + ?Sized>(out: &mut W, report: &ComparisonReport) -> Result<()> {
    if report.rows.is_empty() {
        writeln!(out, "No data to compare.")?;
        return Ok(());
    }

    let width = label_width(report.rows.iter().map(|r| r.label.as_str()), "Label");
    for name in &report.source_names {
        writeln!(out, "== {name} ==")?;
        writeln!(
            out,
            "{:<width$}  {:>8}  {:>14}  {:>12}",
            "Label", "Items", "Total", "Average"
        )?;
        for row in &report.rows {
            match row.sources.get(name) {
                Some(f) => writeln!(
                    out,
                    "{:<width$}  {:>8}  {:>14}  {:>12}",
                    row.label,
                    f.count,
                    format_currency(f.total),
                    format_currency(f.average)
                )?,
                None => writeln!(out, "{:<width$}  {:>8}  {:>14}  {:>12}", row.label, "-", "-", "-")?,
            }
        }
        if let Some(t) = report.totals.get(name) {
            writeln!(
                out,
                "{:<width$}  {:>8}  {:>14}  {:>12}",
                "Total",
                t.count,
                format_currency(t.total),
                format_currency(t.average)
            )?;
            writeln!(
                out,
                "{:<width$}  {:>8}  {:>14}",
                "After tax (85%)",
                "",
                format_currency(t.after_tax)
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_unpopular_table<W: Write + ?Sized>(out: &mut W, report: &UnpopularReport) -> Result<()> {
    writeln!(out, "By category:")?;
    for c in &report.by_category {
        writeln!(out, "  {:<32} {:>6}", c.name, c.count)?;
    }
    writeln!(out, "By label:")?;
    for c in &report.by_label {
        writeln!(out, "  {:<32} {:>6}", c.name, c.count)?;
    }
    writeln!(out)?;
    writeln!(out, "Unpopular items: {}", report.items.len())?;
    for item in &report.items {
        writeln!(out, "  {}", describe_item(item))?;
    }
    Ok(())
}

/// Lists the distinct `(title, url)` items behind each summary label.
pub fn write_summary_items<W: Write + ?Sized>(out: &mut W, rows: &[SummaryRow]) -> Result<()> {
    for row in rows {
        writeln!(out, "{} ({} items)", row.label, row.items.len())?;
        write_items(out, &row.items)?;
    }
    Ok(())
}

/// Lists each label's items per source, in source order.
pub fn write_comparison_items<W: Write + ?Sized>(out: &mut W, report: &ComparisonReport) -> Result<()> {
    for row in &report.rows {
        writeln!(out, "{}", row.label)?;
        for name in &report.source_names {
            if let Some(figures) = row.sources.get(name) {
                writeln!(out, "  [{name}]")?;
                write_items(out, &figures.items)?;
            }
        }
    }
    Ok(())
}

fn write_items<W: Write + ?Sized>(out: &mut W, items: &[Item]) -> Result<()> {
    for item in items {
        match &item.url {
            Some(url) => writeln!(out, "    {} <{}>", item.title, url)?,
            None => writeln!(out, "    {}", item.title)?,
        }
    }
    Ok(())
}

fn describe_item(item: &UnpopularItem) -> String {
    match &item.url {
        Some(url) => format!("{}  {} <{}>", item.id, item.title, url),
        None => format!("{}  {}", item.id, item.title),
    }
}

fn label_width<'a>(labels: impl Iterator<Item = &'a str>, header: &str) -> usize {
    labels
        .map(|l| l.chars().count())
        .chain(std::iter::once(header.chars().count()))
        .chain(std::iter::once("After tax (85%)".len()))
        .max()
        .unwrap_or(0)
}
