use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::services::theme_store::{NewTheme, Theme, ThemeStore};

/// Keeps keyword-bank records in a JSON array on disk.
///
/// Used when the hosted table is unreachable. New records are prepended, so
/// the file stays in newest-first order.
pub struct LocalStore {
    path: PathBuf,
    // serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Reads every record. A missing file is an empty bank; an unreadable one
    /// is logged and treated as empty.
    async fn read_all(&self) -> Vec<Theme> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read keyword bank");
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(themes) => themes,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Keyword bank file is not valid JSON");
                Vec::new()
            }
        }
    }

    async fn write_all(&self, themes: &[Theme]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let body = serde_json::to_string_pretty(themes)?;
        tokio::fs::write(&self.path, body)
            .await
            .with_context(|| format!("failed to save keyword bank to {}", self.path.display()))?;
        debug!(path = %self.path.display(), records = themes.len(), "Keyword bank saved");
        Ok(())
    }

    /// Overwrites the file with `themes`, keeping their ids and timestamps.
    pub async fn replace_all(&self, themes: &[Theme]) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write_all(themes).await
    }

    fn next_id(themes: &[Theme]) -> i64 {
        themes.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }
}

#[async_trait::async_trait]
impl ThemeStore for LocalStore {
    async fn create(&self, theme: NewTheme) -> Result<Theme> {
        let mut created = self.create_many(vec![theme]).await?;
        created
            .pop()
            .ok_or_else(|| anyhow!("keyword bank did not return the created record"))
    }

    async fn create_many(&self, themes: Vec<NewTheme>) -> Result<Vec<Theme>> {
        let _guard = self.lock.lock().await;
        let existing = self.read_all().await;
        let first_id = Self::next_id(&existing);
        let now = Utc::now();

        let created: Vec<Theme> = themes
            .into_iter()
            .zip(first_id..)
            .map(|(t, id)| Theme {
                id,
                theme: t.theme,
                category: t.category,
                keywords: t.keywords,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let all: Vec<Theme> = created.iter().cloned().chain(existing).collect();
        self.write_all(&all).await?;
        Ok(created)
    }

    async fn list(&self) -> Result<Vec<Theme>> {
        Ok(self.read_all().await)
    }

    async fn get(&self, id: i64) -> Result<Option<Theme>> {
        Ok(self.read_all().await.into_iter().find(|t| t.id == id))
    }

    async fn update(&self, id: i64, theme: NewTheme) -> Result<Theme> {
        let _guard = self.lock.lock().await;
        let mut themes = self.read_all().await;
        let record = themes
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| anyhow!("theme {id} not found"))?;

        record.theme = theme.theme;
        record.category = theme.category;
        record.keywords = theme.keywords;
        record.updated_at = Utc::now();
        let updated = record.clone();

        self.write_all(&themes).await?;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.delete_many(&[id]).await
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut themes = self.read_all().await;
        themes.retain(|t| !ids.contains(&t.id));
        self.write_all(&themes).await
    }

    async fn delete_all(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}
