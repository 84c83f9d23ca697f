use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;
use std::path::Path;

use super::OutputFormat;
use crate::config::Config;

const DEFAULT_CONFIG: &str = r#"# marketlist configuration

# Directory holding products.json (default: platform data dir + /marketlist)
# data_dir: ~/.local/share/marketlist

# User whose remote collection is synced. If unset, the server is asked
# which user the API key belongs to.
# user_id: your-user-id

sync:
  # server_url: "http://localhost:8080"
  # api_key: "your-api-key"
  max_in_flight: 16
  timeout_secs: 30
"#;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("data_dir: {}", config.data_dir.value.display());
                        println!("  source: {}", config.data_dir.source);
                        println!();

                        match &config.user_id.value {
                            Some(user) => println!("user_id: {}", user),
                            None => println!("user_id: (from server)"),
                        }
                        println!("  source: {}", config.user_id.source);
                        println!();

                        println!(
                            "sync.server_url: {}",
                            config.sync.server_url.as_deref().unwrap_or("(not set)")
                        );
                        println!(
                            "sync.api_key: {}",
                            if config.sync.api_key.is_some() {
                                "(set)"
                            } else {
                                "(not set)"
                            }
                        );
                        println!("sync.max_in_flight: {}", config.sync.max_in_flight);
                        println!("sync.timeout_secs: {}", config.sync.timeout_secs);
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = config
                    .config_file
                    .clone()
                    .unwrap_or_else(Config::default_config_path);

                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'marketlist config show' to view current configuration.");
                    return Ok(());
                }

                write_default_config(&config_path)?;

                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to customize your settings.");
                Ok(())
            }
        }
    }
}

fn write_default_config(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(path)?;
    file.write_all(DEFAULT_CONFIG.as_bytes())
}
