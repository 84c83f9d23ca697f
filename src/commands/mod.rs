mod config_cmd;
mod product;
mod sync_cmd;

use clap::ValueEnum;

pub use config_cmd::ConfigCommand;
pub use product::ProductCommand;
pub use sync_cmd::{sync_catalog, SyncCommand, SyncCommandError};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
