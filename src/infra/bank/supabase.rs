use anyhow::{Result, anyhow};
use artboard_report::analyzers::classify::DEFAULT_LABEL;
use artboard_report::fetch::auth::ApiKey;
use artboard_report::fetch::{BasicClient, HttpClient};
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request};
use serde::{Deserialize, Serialize};

use crate::infra::config::SupabaseConfig;
use crate::services::theme_store::{NewTheme, Theme, ThemeStore};

/// Client stack used against the hosted table: `apikey` header on top of a bearer token.
pub type AuthedClient = ApiKey<ApiKey<BasicClient>>;

/// A row as returned by the REST endpoint. Nullable columns are filled in by
/// [`ThemeRow::into_theme`].
#[derive(Deserialize)]
struct ThemeRow {
    id: i64,
    theme: String,
    category: Option<String>,
    keywords: Option<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl ThemeRow {
    fn into_theme(self) -> Theme {
        Theme {
            id: self.id,
            theme: self.theme,
            category: self
                .category
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_LABEL.to_string()),
            keywords: self.keywords.unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at.unwrap_or(self.created_at),
        }
    }
}

#[derive(Serialize)]
struct ThemeChanges<'a> {
    theme: &'a str,
    category: &'a str,
    keywords: &'a [String],
    updated_at: DateTime<Utc>,
}

/// Keyword bank stored in the hosted `themes` table, accessed through its
/// PostgREST interface.
pub struct SupabaseStore<C> {
    client: C,
    table_url: String,
}

impl SupabaseStore<AuthedClient> {
    /// Builds an authenticated store from `config` without contacting the server.
    pub fn connect(config: &SupabaseConfig) -> Result<Self> {
        config.validate()?;
        let bearer = ApiKey::bearer(BasicClient::new(), &config.anon_key)?;
        let client = ApiKey::new(bearer, "apikey", &config.anon_key)?;
        Ok(Self::with_client(client, &config.url))
    }
}

impl<C: HttpClient> SupabaseStore<C> {
    pub fn with_client(client: C, base_url: &str) -> Self {
        Self {
            client,
            table_url: format!("{}/rest/v1/themes", base_url.trim_end_matches('/')),
        }
    }

    /// Issues a one-row probe; fails if the table is unreachable or access is denied.
    pub async fn test_connection(&self) -> Result<()> {
        let req = self.request(Method::GET, "select=id&limit=1", None)?;
        self.send(req).await?;
        Ok(())
    }

    fn request(&self, method: Method, query: &str, body: Option<Vec<u8>>) -> Result<Request> {
        let url = format!("{}?{}", self.table_url, query);
        let writes = method == Method::POST || method == Method::PATCH;
        let mut req = Request::new(method, url.parse()?);

        let headers = req.headers_mut();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if writes {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }
        if let Some(body) = body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            *req.body_mut() = Some(body.into());
        }
        Ok(req)
    }

    async fn send(&self, req: Request) -> Result<Vec<u8>> {
        let method = req.method().clone();
        let response = self
            .client
            .execute(req)
            .await
            .map_err(|e| anyhow!("Failed to send {} request: {}", method, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("API returned status {}: {}", status, body));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch_rows(&self, req: Request) -> Result<Vec<Theme>> {
        let body = self.send(req).await?;
        parse_rows(&body)
    }
}

fn parse_rows(body: &[u8]) -> Result<Vec<Theme>> {
    let rows: Vec<ThemeRow> = serde_json::from_slice(body)
        .map_err(|e| anyhow!("Failed to parse response: {}", e))?;
    Ok(rows.into_iter().map(ThemeRow::into_theme).collect())
}

fn id_list(ids: &[i64]) -> String {
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",")
}

#[async_trait::async_trait]
impl<C: HttpClient> ThemeStore for SupabaseStore<C> {
    async fn create(&self, theme: NewTheme) -> Result<Theme> {
        self.create_many(vec![theme])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("insert returned no rows"))
    }

    async fn create_many(&self, themes: Vec<NewTheme>) -> Result<Vec<Theme>> {
        if themes.is_empty() {
            return Ok(Vec::new());
        }
        let body = serde_json::to_vec(&themes)?;
        let req = self.request(Method::POST, "select=*", Some(body))?;
        self.fetch_rows(req).await
    }

    async fn list(&self) -> Result<Vec<Theme>> {
        let req = self.request(Method::GET, "select=*&order=created_at.desc", None)?;
        self.fetch_rows(req).await
    }

    async fn get(&self, id: i64) -> Result<Option<Theme>> {
        let req = self.request(Method::GET, &format!("select=*&id=eq.{id}"), None)?;
        Ok(self.fetch_rows(req).await?.into_iter().next())
    }

    async fn update(&self, id: i64, theme: NewTheme) -> Result<Theme> {
        let changes = ThemeChanges {
            theme: &theme.theme,
            category: &theme.category,
            keywords: &theme.keywords,
            updated_at: Utc::now(),
        };
        let body = serde_json::to_vec(&changes)?;
        let req = self.request(Method::PATCH, &format!("select=*&id=eq.{id}"), Some(body))?;
        self.fetch_rows(req)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("theme {id} not found"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let req = self.request(Method::DELETE, &format!("id=eq.{id}"), None)?;
        self.send(req).await?;
        Ok(())
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let req = self.request(Method::DELETE, &format!("id=in.({})", id_list(ids)), None)?;
        self.send(req).await?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<()> {
        // PostgREST refuses an unfiltered DELETE
        let req = self.request(Method::DELETE, "id=neq.0", None)?;
        self.send(req).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "supabase"
    }
}
