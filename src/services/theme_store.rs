//! Trait and types for the keyword bank.
//!
//! A theme groups the search keywords used for one design theme. Records are
//! kept either in a hosted table or in a local JSON file; both backends honor
//! the same [`ThemeStore`] contract.

use anyhow::{Result, anyhow};
use artboard_report::analyzers::classify::DEFAULT_LABEL;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored keyword-bank record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub id: i64,
    pub theme: String,
    pub category: String,
    pub keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating or updating a [`Theme`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTheme {
    pub theme: String,
    pub category: String,
    pub keywords: Vec<String>,
}

impl NewTheme {
    /// Trims every field, drops blank keywords, and applies the default category.
    pub fn new(theme: &str, category: &str, keywords: Vec<String>) -> Self {
        let category = category.trim();
        Self {
            theme: theme.trim().to_string(),
            category: if category.is_empty() {
                DEFAULT_LABEL.to_string()
            } else {
                category.to_string()
            },
            keywords: keywords
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }
}

impl From<&Theme> for NewTheme {
    fn from(theme: &Theme) -> Self {
        NewTheme::new(&theme.theme, &theme.category, theme.keywords.clone())
    }
}

/// CRUD over keyword-bank records.
#[async_trait::async_trait]
pub trait ThemeStore: Send + Sync {
    async fn create(&self, theme: NewTheme) -> Result<Theme>;

    async fn create_many(&self, themes: Vec<NewTheme>) -> Result<Vec<Theme>>;

    /// Returns every record, newest first.
    async fn list(&self) -> Result<Vec<Theme>>;

    async fn get(&self, id: i64) -> Result<Option<Theme>>;

    /// Replaces the fields of record `id`. Fails if it does not exist.
    async fn update(&self, id: i64, theme: NewTheme) -> Result<Theme>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn delete_many(&self, ids: &[i64]) -> Result<()>;

    async fn delete_all(&self) -> Result<()>;

    /// Short backend name for log and status output.
    fn backend(&self) -> &'static str;
}

/// Splits free text on commas and newlines into unique lowercase keywords,
/// keeping first-seen order.
pub fn parse_keywords(input: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for k in input.split([',', '\n']) {
        let k = k.trim().to_lowercase();
        if !k.is_empty() && !keywords.contains(&k) {
            keywords.push(k);
        }
    }
    keywords
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeywordsField {
    List(Vec<String>),
    Text(String),
}

#[derive(Deserialize)]
struct ImportItem {
    theme: Option<String>,
    category: Option<String>,
    keywords: Option<KeywordsField>,
}

/// Parses a JSON array of `{theme, category, keywords}` objects for batch
/// import. `keywords` may be an array or a comma-separated string. Items
/// missing any of the three fields are skipped.
///
/// # Errors
///
/// Returns an error if the input is not a JSON array of objects.
pub fn parse_import(json: &str) -> Result<Vec<NewTheme>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if !value.is_array() {
        return Err(anyhow!("import must be a JSON array"));
    }
    let items: Vec<ImportItem> = serde_json::from_value(value)?;

    let themes = items
        .into_iter()
        .filter_map(|item| {
            let theme = item.theme.filter(|t| !t.trim().is_empty())?;
            let category = item.category.filter(|c| !c.trim().is_empty())?;
            let keywords = match item.keywords? {
                KeywordsField::List(list) => parse_keywords(&list.join(",")),
                KeywordsField::Text(text) => parse_keywords(&text),
            };
            Some(NewTheme::new(&theme, &category, keywords))
        })
        .collect();

    Ok(themes)
}

/// Listing filters for the keyword bank.
#[derive(Debug, Clone, Default)]
pub struct ThemeFilter {
    /// Case-insensitive substring of the theme name.
    pub theme: Option<String>,
    /// Case-insensitive substring of any keyword.
    pub keyword: Option<String>,
    pub category: Option<String>,
    /// Newest id first instead of alphabetical by theme.
    pub latest: bool,
}

pub fn filter_themes(themes: Vec<Theme>, filter: &ThemeFilter) -> Vec<Theme> {
    let theme_query = filter.theme.as_deref().map(|q| q.trim().to_lowercase());
    let keyword_query = filter
        .keyword
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let mut themes: Vec<Theme> = themes
        .into_iter()
        .filter(|t| {
            theme_query
                .as_deref()
                .is_none_or(|q| t.theme.to_lowercase().contains(q))
        })
        .filter(|t| {
            keyword_query
                .as_deref()
                .is_none_or(|q| t.keywords.iter().any(|k| k.to_lowercase().contains(q)))
        })
        .filter(|t| filter.category.as_deref().is_none_or(|c| t.category == c))
        .collect();

    if filter.latest {
        themes.sort_by(|a, b| b.id.cmp(&a.id));
    } else {
        themes.sort_by_key(|t| t.theme.to_lowercase());
    }
    themes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme(id: i64, name: &str, category: &str, keywords: &[&str]) -> Theme {
        Theme {
            id,
            theme: name.to_string(),
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_theme_normalizes_fields() {
        let t = NewTheme::new("  Summer ", " ", vec![" beach ".to_string(), "".to_string()]);
        assert_eq!(t.theme, "Summer");
        assert_eq!(t.category, DEFAULT_LABEL);
        assert_eq!(t.keywords, vec!["beach"]);
    }

    #[test]
    fn test_parse_keywords_dedupes_and_lowercases() {
        assert_eq!(
            parse_keywords("Beach, sun\nBEACH,, Waves "),
            vec!["beach", "sun", "waves"]
        );
        assert!(parse_keywords(" , \n").is_empty());
    }

    #[test]
    fn test_parse_import_accepts_list_and_text_keywords() {
        let json = r#"[
            {"theme": "Summer", "category": "Season", "keywords": ["Beach", "sun"]},
            {"theme": "Winter", "category": "Season", "keywords": "snow, ICE"},
            {"theme": "", "category": "Season", "keywords": "x"},
            {"theme": "No keywords", "category": "Season"}
        ]"#;

        let themes = parse_import(json).unwrap();
        assert_eq!(themes.len(), 2);
        assert_eq!(themes[0].keywords, vec!["beach", "sun"]);
        assert_eq!(themes[1].theme, "Winter");
        assert_eq!(themes[1].keywords, vec!["snow", "ice"]);
    }

    #[test]
    fn test_parse_import_rejects_non_array() {
        assert!(parse_import(r#"{"theme": "Summer"}"#).is_err());
        assert!(parse_import("not json").is_err());
    }

    #[test]
    fn test_filter_themes() {
        let themes = vec![
            theme(1, "summer beach", "Season", &["Sand", "waves"]),
            theme(2, "Autumn", "Season", &["leaves"]),
            theme(3, "Business", "Office", &["desk", "beach chair"]),
        ];

        let by_keyword = filter_themes(
            themes.clone(),
            &ThemeFilter {
                keyword: Some("BEACH".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(by_keyword.len(), 1);
        assert_eq!(by_keyword[0].id, 3);

        let alphabetical = filter_themes(
            themes.clone(),
            &ThemeFilter {
                category: Some("Season".to_string()),
                ..Default::default()
            },
        );
        let names: Vec<&str> = alphabetical.iter().map(|t| t.theme.as_str()).collect();
        assert_eq!(names, vec!["Autumn", "summer beach"]);

        let latest = filter_themes(
            themes,
            &ThemeFilter {
                latest: true,
                ..Default::default()
            },
        );
        let ids: Vec<i64> = latest.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}
