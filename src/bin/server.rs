//! marketlist sync server
//!
//! Stores each user's product collection as one JSON document per item and
//! serves it over HTTP to the `marketlist` CLI.
//!
//! # Configuration
//!
//! Environment variables:
//! - `MARKETLIST_PORT`: Port to listen on (default: 8080)
//! - `MARKETLIST_DATA_DIR`: Directory to store items (default: ~/.local/share/marketlist-server)
//! - `MARKETLIST_CONFIG`: Path to config file (default: ~/.config/marketlist-server/config.yaml)
//!
//! # Config File Format
//!
//! ```yaml
//! api_keys:
//!   - key: "your-secret-key-here"
//!     user_id: "user1"
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketlist::server::{router, ApiKeyStore, AppState, ItemStorage};

/// Server configuration
#[derive(Debug, Clone)]
struct Config {
    /// Port to listen on
    port: u16,
    /// Directory to store item documents
    data_dir: PathBuf,
    /// Path to config file
    config_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let port = std::env::var("MARKETLIST_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = std::env::var("MARKETLIST_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("marketlist-server")
            });

        let config_path = std::env::var("MARKETLIST_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("marketlist-server")
                    .join("config.yaml")
            });

        Self {
            port,
            data_dir,
            config_path,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "marketlist_server=info,marketlist=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        tracing::error!("Failed to create data directory: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("Config file: {}", config.config_path.display());

    let api_keys = ApiKeyStore::load(&config.config_path);
    let state = AppState::new(api_keys, ItemStorage::new(&config.data_dir));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
