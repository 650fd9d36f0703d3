//! CSV parser for marketplace sales exports.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::{debug, warn};

/// A single data line keyed by header name.
pub type Row = HashMap<String, String>;

/// One parsed input source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// An empty dataset, used when a source could not be read or parsed.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new(), Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parses `text` into a [`Dataset`], never failing.
///
/// Any error is logged and turned into an empty dataset so that a single bad
/// file never aborts a batch.
pub fn parse_csv(name: &str, text: &str) -> Dataset {
    match try_parse_csv(text) {
        Ok((headers, rows)) => {
            debug!(source = name, rows = rows.len(), "CSV parsed");
            Dataset::new(name, headers, rows)
        }
        Err(e) => {
            warn!(source = name, error = %e, "CSV parse failed, using empty dataset");
            Dataset::empty(name)
        }
    }
}

/// Decodes the header and data records of `text`.
///
/// Returns no headers and no rows when fewer than two lines are present.
/// Data records that fail to decode are skipped with a warning; only a broken
/// header record is an error.
///
/// # Errors
///
/// Returns an error if the header record cannot be decoded.
pub fn try_parse_csv(text: &str) -> Result<(Vec<String>, Vec<Row>)> {
    let text = text.trim();
    if text.lines().count() < 2 {
        return Ok((Vec::new(), Vec::new()));
    }
    let text = tighten_quoted_fields(text);

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut records = rdr.records();

    let headers: Vec<String> = match records.next() {
        Some(record) => record
            .context("failed to decode CSV header")?
            .iter()
            .map(|h| h.trim().replace('"', ""))
            .collect(),
        None => return Ok((Vec::new(), Vec::new())),
    };

    let mut rows = Vec::new();
    for (line, record) in records.enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!(line = line + 2, error = %e, "Skipping malformed CSV record");
                continue;
            }
        };

        let row = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = record.get(i).map(strip_quotes).unwrap_or_default();
                (header.clone(), value)
            })
            .collect();
        rows.push(row);
    }

    Ok((headers, rows))
}

/// Drops unquoted blanks between a field boundary and an opening quote.
///
/// The `csv` reader only treats a quote as opening a quoted field when it is
/// the first byte of the field, so `a, "1,200"` would otherwise split on the
/// inner comma. Blanks inside quoted fields are left alone.
fn tighten_quoted_fields(text: &str) -> Cow<'_, str> {
    if !text.contains('"') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_quotes = false;
    let mut field_start = true;

    while let Some(c) = chars.next() {
        if in_quotes {
            out.push(c);
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    // escaped quote
                    out.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }

        match c {
            ',' | '\n' | '\r' => {
                out.push(c);
                field_start = true;
            }
            ' ' | '\t' if field_start => {
                let mut blanks = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next != ' ' && next != '\t' {
                        break;
                    }
                    blanks.push(next);
                    chars.next();
                }
                if chars.peek() != Some(&'"') {
                    out.push_str(&blanks);
                    field_start = false;
                }
            }
            '"' if field_start => {
                out.push(c);
                in_quotes = true;
                field_start = false;
            }
            _ => {
                out.push(c);
                field_start = false;
            }
        }
    }

    Cow::Owned(out)
}

fn strip_quotes(value: &str) -> String {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}
