use std::path::PathBuf;

use clap::Parser;

pub mod history;
mod page;

pub use history::HistoryCommand;

/// Manage and query a form field history store.
#[derive(Debug, Parser)]
#[command(name = "fhc", version)]
pub struct Cli {
    /// Directory holding the store files (default `./.fhc/history`).
    #[arg(long, global = true, env = "FHC_HOME")]
    pub store_dir: Option<PathBuf>,

    /// TOML config file (default `<store dir>/config.toml`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: HistoryCommand,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let store_dir = match cli.store_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?.join(".fhc").join("history"),
    };
    let config_path = cli.config.unwrap_or_else(|| store_dir.join("config.toml"));
    history::run(cli.cmd, &store_dir, &config_path).await
}
