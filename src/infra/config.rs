use anyhow::{Context, Result, anyhow};

/// Default location of the local keyword-bank file.
pub const DEFAULT_BANK_PATH: &str = "data/keyword_bank.json";

/// Connection settings for the hosted keyword-bank table.
///
/// Read from `SUPABASE_URL` and `SUPABASE_ANON_KEY`.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

impl SupabaseConfig {
    /// Returns `None` unless both variables are set.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("SUPABASE_URL").ok()?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY").ok()?;
        Some(Self { url, anon_key })
    }

    /// Checks that the URL looks like a hosted project URL and the key is present.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("SUPABASE_URL is empty"));
        }
        if self.anon_key.trim().is_empty() {
            return Err(anyhow!("SUPABASE_ANON_KEY is empty"));
        }
        if !self.url.starts_with("https://") || !self.url.contains(".supabase.co") {
            return Err(anyhow!(
                "SUPABASE_URL '{}' is not a valid project URL (expected https://<project>.supabase.co)",
                self.url
            ));
        }
        Ok(())
    }
}

/// Local keyword-bank path from `KEYWORD_BANK_PATH`, or [`DEFAULT_BANK_PATH`].
pub fn bank_path_from_env() -> String {
    std::env::var("KEYWORD_BANK_PATH").unwrap_or_else(|_| DEFAULT_BANK_PATH.to_string())
}

/// Classification keywords loaded from disk.
///
/// Stored as a plain JSON array:
/// ```json
/// ["Bifold Brochure", "Flyer", "Mockup"]
/// ```
pub struct KeywordConfig {
    keywords: Vec<String>,
}

impl KeywordConfig {
    /// Loads the keyword list from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read keyword file {path}"))?;
        Self::from_json(&content).with_context(|| format!("invalid keyword file {path}"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let keywords: Vec<String> = serde_json::from_str(content)?;
        Ok(Self { keywords })
    }

    pub fn into_keywords(self) -> Vec<String> {
        self.keywords
    }
}
