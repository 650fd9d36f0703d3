//! Loading CSV sources from disk or over HTTP.
//!
//! Every source is read concurrently; the caller gets the datasets only once
//! all reads have finished.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tracing::{Instrument, error, info, warn};

use crate::fetch::{BasicClient, fetch_bytes};
use crate::parser::{Dataset, parse_csv};

/// Reads a local file, or fetches the source when it is an `http(s)://` URL.
pub async fn read_source(source: &str) -> Result<Vec<u8>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let client = BasicClient::new();
        fetch_bytes(&client, source)
            .await
            .with_context(|| format!("failed to fetch {source}"))
    } else {
        tokio::fs::read(source)
            .await
            .with_context(|| format!("failed to read {source}"))
    }
}

/// Dataset name for a source: its last path or URL segment.
pub fn source_name(source: &str) -> String {
    let path = source.split(['?', '#']).next().unwrap_or(source);
    path.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(source)
        .to_string()
}

/// Loads and parses every source, at most `concurrency` at a time.
///
/// Datasets come back in the order of `sources`. A source that cannot be read
/// becomes an empty dataset; it never fails the batch.
#[tracing::instrument(skip(sources), fields(source_count = sources.len()))]
pub async fn load_sources(sources: &[String], concurrency: usize) -> Vec<Dataset> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = Vec::with_capacity(sources.len());

    for source in sources {
        let sem = semaphore.clone();
        let source = source.clone();
        let span = tracing::info_span!("load_source", source = %source);

        let task = tokio::spawn(
            async move {
                let _permit = sem.acquire().await.ok();
                let name = source_name(&source);

                match read_source(&source).await {
                    Ok(bytes) => parse_csv(&name, &String::from_utf8_lossy(&bytes)),
                    Err(e) => {
                        warn!(error = %e, "Source could not be read, using empty dataset");
                        Dataset::empty(name)
                    }
                }
            }
            .instrument(span),
        );

        tasks.push(task);
    }

    // Join barrier: nothing is returned until every read has completed
    let mut datasets = Vec::with_capacity(tasks.len());
    for (task, source) in tasks.into_iter().zip(sources) {
        match task.await {
            Ok(dataset) => datasets.push(dataset),
            Err(e) => {
                error!(source = %source, error = %e, "Load task failed");
                datasets.push(Dataset::empty(source_name(source)));
            }
        }
    }

    for name in duplicate_names(&datasets) {
        warn!(name = %name, "Several sources share this name and will be treated as one source");
    }

    let rows: usize = datasets.iter().map(|ds| ds.rows.len()).sum();
    info!(datasets = datasets.len(), rows, "Sources loaded");
    datasets
}

/// Dataset names that occur more than once, in first-seen order.
fn duplicate_names(datasets: &[Dataset]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for ds in datasets {
        if !seen.insert(ds.name.as_str()) && !duplicates.contains(&ds.name.as_str()) {
            duplicates.push(ds.name.as_str());
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_source_name() {
        assert_eq!(source_name("data/jan.csv"), "jan.csv");
        assert_eq!(source_name("C:\\exports\\feb.csv"), "feb.csv");
        assert_eq!(
            source_name("https://example.com/reports/mar.csv?token=1"),
            "mar.csv"
        );
        assert_eq!(source_name("plain.csv"), "plain.csv");
    }

    #[tokio::test]
    async fn test_load_sources_keeps_input_order() {
        let first = temp_path("artboard_report_load_first.csv");
        let second = temp_path("artboard_report_load_second.csv");
        fs::write(&first, "title,earning,id\nA,1,a\nB,2,b").unwrap();
        fs::write(&second, "title,earning,id\nC,3,c").unwrap();

        let datasets = load_sources(&[second.clone(), first.clone()], 2).await;

        assert_eq!(datasets.len(), 2);
        assert_eq!(datasets[0].name, "artboard_report_load_second.csv");
        assert_eq!(datasets[0].rows.len(), 1);
        assert_eq!(datasets[1].name, "artboard_report_load_first.csv");
        assert_eq!(datasets[1].rows.len(), 2);

        fs::remove_file(&first).unwrap();
        fs::remove_file(&second).unwrap();
    }

    #[tokio::test]
    async fn test_missing_source_yields_empty_dataset() {
        let good = temp_path("artboard_report_load_good.csv");
        fs::write(&good, "title,earning,id\nA,1,a").unwrap();
        let missing = temp_path("artboard_report_load_missing.csv");
        let _ = fs::remove_file(&missing);

        let datasets = load_sources(&[missing, good.clone()], 0).await;

        assert_eq!(datasets.len(), 2);
        assert!(datasets[0].is_empty());
        assert_eq!(datasets[0].name, "artboard_report_load_missing.csv");
        assert_eq!(datasets[1].rows.len(), 1);

        fs::remove_file(&good).unwrap();
    }

    #[test]
    fn test_duplicate_names() {
        let datasets = vec![
            Dataset::empty(source_name("a/jan.csv")),
            Dataset::empty(source_name("feb.csv")),
            Dataset::empty(source_name("b/jan.csv")),
            Dataset::empty(source_name("c/jan.csv")),
        ];
        assert_eq!(duplicate_names(&datasets), vec!["jan.csv"]);
        assert!(duplicate_names(&datasets[..2]).is_empty());
    }

    #[tokio::test]
    async fn test_read_source_missing_file_errors() {
        let missing = temp_path("artboard_report_read_missing.csv");
        let _ = fs::remove_file(&missing);
        assert!(read_source(&missing).await.is_err());
    }
}
