use clap::{Parser, Subcommand};
use std::path::PathBuf;

use marketlist::commands::{ConfigCommand, ProductCommand, SyncCommand};
use marketlist::config::Config;
use marketlist_core::{FileStore, ProductCatalog};

#[derive(Parser)]
#[command(name = "marketlist")]
#[command(version)]
#[command(about = "Keep a market product list and sync it with a server", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage products
    Product(ProductCommand),

    /// Sync products with the server
    Sync(SyncCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Product(cmd)) => {
            let catalog = ProductCatalog::new(FileStore::new(&config.data_dir.value));
            cmd.run(&catalog)?;
        }
        Some(Commands::Sync(cmd)) => {
            cmd.run(&config).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
