//! Sync CLI commands for synchronizing with the server.

use clap::{Args, Subcommand};
use std::time::Duration;

use marketlist_core::{
    check_server, CatalogError, FileStore, HttpCollection, LocalStore, ProductCatalog,
    RemoteCollection, RemoteError, SyncEngine, SyncError, SyncOptions, SyncReport,
};

use crate::config::Config;

/// Sync with remote server
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Show sync configuration and server status
    Status,
}

impl SyncCommand {
    pub async fn run(&self, config: &Config) -> Result<(), SyncCommandError> {
        match &self.command {
            None => self.sync(config).await,
            Some(SyncSubcommand::Status) => self.status(config).await,
        }
    }

    async fn sync(&self, config: &Config) -> Result<(), SyncCommandError> {
        let (server_url, api_key) = match (&config.sync.server_url, &config.sync.api_key) {
            (Some(url), Some(key)) => (url, key),
            _ => return Err(SyncCommandError::NotConfigured),
        };

        let remote = HttpCollection::with_timeout(
            server_url.as_str(),
            api_key.as_str(),
            Duration::from_secs(config.sync.timeout_secs),
        )?;

        let user_id = match &config.user_id.value {
            Some(user) => user.clone(),
            None => remote.fetch_identity().await?,
        };

        let catalog = ProductCatalog::new(FileStore::new(&config.data_dir.value));
        let engine = SyncEngine::with_options(
            remote,
            SyncOptions {
                max_in_flight: config.sync.max_in_flight,
            },
        );

        println!("Syncing with {} as {}...", server_url, user_id);
        println!();

        let report = sync_catalog(&catalog, &engine, &user_id).await?;

        println!("  ✓ cleared  {} remote product(s)", report.cleared);
        println!("  ✓ uploaded {} product(s)", report.inserted);
        for dropped in &report.dropped {
            println!("  ✗ {} - {}", dropped.product.nombre, dropped.reason);
        }

        println!();
        if report.is_complete() {
            println!("Sync complete. {} product(s).", report.products.len());
        } else {
            println!(
                "Sync finished with {} product(s) not uploaded; they were kept locally \
                 and will be retried on the next sync.",
                report.dropped.len()
            );
        }

        Ok(())
    }

    async fn status(&self, config: &Config) -> Result<(), SyncCommandError> {
        println!("Sync Configuration");
        println!("==================");
        println!();

        let (server_url, api_key) = match (&config.sync.server_url, &config.sync.api_key) {
            (Some(url), Some(key)) => (url, key),
            _ => {
                println!("Status: Not configured");
                println!();
                println!("To enable sync, add to your config file:");
                println!();
                println!("  sync:");
                println!("    server_url: \"http://localhost:8080\"");
                println!("    api_key: \"your-api-key\"");
                println!();
                println!("Or set environment variables:");
                println!("  MARKETLIST_SYNC_URL");
                println!("  MARKETLIST_SYNC_API_KEY");
                return Ok(());
            }
        };

        println!("Server:        {}", server_url);
        println!("API Key:       {}...", key_prefix(api_key));
        println!(
            "User:          {}",
            config.user_id.value.as_deref().unwrap_or("(from server)")
        );
        println!("Max in flight: {}", config.sync.max_in_flight);
        println!();

        print!("Server status: ");
        if check_server(server_url).await {
            println!("✓ connected");
        } else {
            println!("✗ unreachable");
        }

        Ok(())
    }
}

/// Runs one sync of the catalog's products and stores the outcome locally.
///
/// Products that could not be uploaded stay in the local list under their old
/// ids. On error the local list is left untouched.
pub async fn sync_catalog<S, R>(
    catalog: &ProductCatalog<S>,
    engine: &SyncEngine<R>,
    user_id: &str,
) -> Result<SyncReport, SyncCommandError>
where
    S: LocalStore,
    R: RemoteCollection,
{
    let local = catalog.list();
    tracing::debug!("Uploading {} local product(s)", local.len());

    let report = engine.synchronize(user_id, &local).await?;
    catalog.apply_sync(&report)?;

    Ok(report)
}

fn key_prefix(api_key: &str) -> &str {
    match api_key.char_indices().nth(8) {
        Some((index, _)) => &api_key[..index],
        None => api_key,
    }
}

/// Errors from sync commands
#[derive(Debug)]
pub enum SyncCommandError {
    NotConfigured,
    RemoteError(RemoteError),
    SyncError(SyncError),
    CatalogError(CatalogError),
}

impl std::fmt::Display for SyncCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncCommandError::NotConfigured => write!(
                f,
                "Sync not configured. Set sync.server_url and sync.api_key \
                 (see 'marketlist sync status')"
            ),
            SyncCommandError::RemoteError(e) => write!(f, "{}", e),
            SyncCommandError::SyncError(e) => write!(f, "Sync failed: {}", e),
            SyncCommandError::CatalogError(e) => write!(f, "Failed to save products: {}", e),
        }
    }
}

impl std::error::Error for SyncCommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncCommandError::NotConfigured => None,
            SyncCommandError::RemoteError(e) => Some(e),
            SyncCommandError::SyncError(e) => Some(e),
            SyncCommandError::CatalogError(e) => Some(e),
        }
    }
}

impl From<RemoteError> for SyncCommandError {
    fn from(e: RemoteError) -> Self {
        SyncCommandError::RemoteError(e)
    }
}

impl From<SyncError> for SyncCommandError {
    fn from(e: SyncError) -> Self {
        SyncCommandError::SyncError(e)
    }
}

impl From<CatalogError> for SyncCommandError {
    fn from(e: CatalogError) -> Self {
        SyncCommandError::CatalogError(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketlist_core::{InMemoryCollection, MemoryStore, ProductFields, Unit};

    fn fields(nombre: &str) -> ProductFields {
        ProductFields::new("A", "C1", nombre, "M1", Unit::Kg, 1000.0)
    }

    #[tokio::test]
    async fn test_sync_catalog_replaces_local_ids() {
        let catalog = ProductCatalog::new(MemoryStore::new());
        catalog.create(fields("Papa")).unwrap();
        catalog.create(fields("Yuca")).unwrap();
        let engine = SyncEngine::new(InMemoryCollection::new());

        let report = sync_catalog(&catalog, &engine, "u1").await.unwrap();

        assert!(report.is_complete());
        let stored = catalog.list();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|p| p.id.is_remote()));
    }

    #[tokio::test]
    async fn test_sync_catalog_error_leaves_local_untouched() {
        let catalog = ProductCatalog::new(MemoryStore::new());
        let papa = catalog.create(fields("Papa")).unwrap();
        let engine = SyncEngine::new(InMemoryCollection::new());

        let result = sync_catalog(&catalog, &engine, "").await;

        assert!(matches!(
            result,
            Err(SyncCommandError::SyncError(SyncError::InvalidUser))
        ));
        assert_eq!(catalog.list(), vec![papa]);
    }

    #[tokio::test]
    async fn test_sync_catalog_pulls_remote_when_local_empty() {
        let remote = InMemoryCollection::new();
        remote.insert("u1", &fields("Arroz")).await.unwrap();
        let catalog = ProductCatalog::new(MemoryStore::new());
        let engine = SyncEngine::new(remote);

        sync_catalog(&catalog, &engine, "u1").await.unwrap();

        let stored = catalog.list();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].nombre, "Arroz");
    }

    #[test]
    fn test_key_prefix() {
        assert_eq!(key_prefix("abcdefghijkl"), "abcdefgh");
        assert_eq!(key_prefix("abc"), "abc");
    }
}
