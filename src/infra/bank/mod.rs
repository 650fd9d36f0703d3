//! Keyword-bank storage backends.
//!
//! [`SupabaseStore`] talks to the hosted `themes` table. [`LocalStore`] keeps
//! the same records in a JSON file and stands in whenever the hosted table is
//! not configured or not reachable.

mod local;
mod supabase;

pub use local::LocalStore;
pub use supabase::{AuthedClient, SupabaseStore};

use anyhow::{Result, anyhow};
use tracing::{info, warn};

use crate::infra::config::SupabaseConfig;
use crate::services::theme_store::{NewTheme, ThemeStore};

/// Builds the hosted store and checks that it answers.
pub async fn connect_remote(config: &SupabaseConfig) -> Result<SupabaseStore<AuthedClient>> {
    let store = SupabaseStore::connect(config)?;
    store.test_connection().await?;
    Ok(store)
}

/// Returns the hosted store when it is configured and reachable, otherwise
/// the local file store at `local_path`.
pub async fn connect_store(
    remote: Option<&SupabaseConfig>,
    local_path: &str,
) -> Box<dyn ThemeStore> {
    match remote {
        Some(config) => match connect_remote(config).await {
            Ok(store) => {
                info!(url = %config.url, "Connected to hosted keyword bank");
                return Box::new(store);
            }
            Err(e) => {
                warn!(error = %e, path = local_path, "Hosted keyword bank unavailable, falling back to local file");
            }
        },
        None => info!(path = local_path, "Hosted keyword bank not configured, using local file"),
    }
    Box::new(LocalStore::new(local_path))
}

/// Copies every local record into `remote`. Refuses when `remote` already
/// holds data so records are never duplicated. Returns the number migrated.
pub async fn migrate_from_local(local: &dyn ThemeStore, remote: &dyn ThemeStore) -> Result<usize> {
    let records = local.list().await?;
    if records.is_empty() {
        info!("No local records to migrate");
        return Ok(0);
    }
    if !remote.list().await?.is_empty() {
        return Err(anyhow!(
            "{} store already contains data; migration cancelled to prevent duplicates",
            remote.backend()
        ));
    }

    let created = remote
        .create_many(records.iter().map(NewTheme::from).collect())
        .await?;
    info!(migrated = created.len(), "Local keyword bank migrated");
    Ok(created.len())
}

/// Overwrites the local file with every record of `remote`. Returns the number saved.
pub async fn backup_to_local(remote: &dyn ThemeStore, local: &LocalStore) -> Result<usize> {
    let records = remote.list().await?;
    local.replace_all(&records).await?;
    info!(backed_up = records.len(), "Keyword bank backed up locally");
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_store(name: &str) -> LocalStore {
        let path = env::temp_dir().join(name);
        let _ = fs::remove_file(&path);
        LocalStore::new(path)
    }

    fn theme(name: &str) -> NewTheme {
        NewTheme::new(name, "Season", vec!["sun".to_string()])
    }

    #[tokio::test]
    async fn test_connect_store_without_config_is_local() {
        let path = env::temp_dir().join("artboard_report_connect_local.json");
        let store = connect_store(None, &path.display().to_string()).await;
        assert_eq!(store.backend(), "local");
    }

    #[tokio::test]
    async fn test_connect_store_with_invalid_config_falls_back() {
        let config = SupabaseConfig {
            url: "not-a-url".to_string(),
            anon_key: "key".to_string(),
        };
        let path = env::temp_dir().join("artboard_report_connect_fallback.json");
        let store = connect_store(Some(&config), &path.display().to_string()).await;
        assert_eq!(store.backend(), "local");
    }

    #[tokio::test]
    async fn test_migrate_copies_records() {
        let local = temp_store("artboard_report_migrate_src.json");
        let remote = temp_store("artboard_report_migrate_dst.json");
        local
            .create_many(vec![theme("Summer"), theme("Winter")])
            .await
            .unwrap();

        assert_eq!(migrate_from_local(&local, &remote).await.unwrap(), 2);
        assert_eq!(remote.list().await.unwrap().len(), 2);

        // second run would duplicate
        assert!(migrate_from_local(&local, &remote).await.is_err());

        local.delete_all().await.unwrap();
        remote.delete_all().await.unwrap();
    }

    #[tokio::test]
    async fn test_migrate_nothing_to_do() {
        let local = temp_store("artboard_report_migrate_empty_src.json");
        let remote = temp_store("artboard_report_migrate_empty_dst.json");
        assert_eq!(migrate_from_local(&local, &remote).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_backup_replaces_local_records() {
        let remote = temp_store("artboard_report_backup_src.json");
        let local = temp_store("artboard_report_backup_dst.json");
        remote.create(theme("Summer")).await.unwrap();
        local.create(theme("Stale")).await.unwrap();
        local.create(theme("Stale 2")).await.unwrap();

        assert_eq!(backup_to_local(&remote, &local).await.unwrap(), 1);
        let saved = local.list().await.unwrap();
        assert_eq!(saved, remote.list().await.unwrap());

        local.delete_all().await.unwrap();
        remote.delete_all().await.unwrap();
    }
}
