use anyhow::Result;
use clap::{Parser, Subcommand};
use culler_infrastructure::ConfigService;
use std::path::PathBuf;

mod commands;
mod helper;
mod logging;

#[derive(Parser)]
#[command(name = "culler")]
#[command(about = "culler - tag photos keep/delete, then remove the rejects in one batch", long_about = None)]
struct Cli {
    /// Config file to use instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `culler_application=trace` (overrides RUST_LOG and config)
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Review a photo directory interactively
    Review {
        /// Library directory
        dir: PathBuf,

        /// Start at this item id instead of the last viewed one
        #[arg(long, value_name = "ID")]
        start: Option<String>,

        /// Keep dispositions and position in memory only
        #[arg(long)]
        ephemeral: bool,
    },
    /// Show item and disposition counts for a photo directory
    Status {
        /// Library directory
        dir: PathBuf,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file path
    Path,
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_service = match cli.config {
        Some(path) => ConfigService::new(path),
        None => ConfigService::from_default_location()?,
    };

    // Printing the path must work even when the file does not parse.
    if let Commands::Config {
        action: ConfigAction::Path,
    } = &cli.command
    {
        return commands::config::path(&config_service);
    }

    let config = config_service.load()?;
    let _log_guard = logging::init(cli.log_level.as_deref(), &config.logging.level)?;
    tracing::debug!("[Bootstrap] Loaded config from {}", config_service.path().display());

    match cli.command {
        Commands::Review {
            dir,
            start,
            ephemeral,
        } => commands::review::run(dir, start, ephemeral, &config).await?,
        Commands::Status { dir } => commands::status::run(dir, &config).await?,
        Commands::Config { action } => match action {
            ConfigAction::Path => commands::config::path(&config_service)?,
            ConfigAction::Show => commands::config::show(&config)?,
        },
    }

    Ok(())
}
