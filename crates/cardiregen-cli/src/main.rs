use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use cardiregen_infrastructure::ConfigService;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cardiregen")]
#[command(about = "CardiRegen CLI - automated cardiac MRI analysis", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.config/cardiregen/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit ED and/or ES frames and print the clinical report
    Analyze(commands::analyze::AnalyzeArgs),
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config_service = match &cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new()?,
    };
    let config = config_service.get_config()?;
    init_tracing(&config.log_level, cli.verbose);
    tracing::debug!(path = %config_service.path().display(), ?config, "Configuration loaded");

    match cli.command {
        Commands::Analyze(args) => commands::analyze::run(args, &config).await,
        Commands::Config { action } => {
            match action {
                ConfigAction::Show => commands::config::show(&config)?,
                ConfigAction::Path => commands::config::path(&config_service),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(default_level: &str, verbose: bool) {
    let fallback = if verbose { "debug" } else { default_level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
