//! BioCloudLabs CLI - Main Entry Point

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use biocloud_cli::commands::{auth, credits, profile, vm};
use biocloud_cli::output::OutputFormat;
use biocloud_cli::{notify, App, CliConfig, StorePaths};
use biocloud_common::{Error, Route};

/// BioCloudLabs CLI - BLAST virtual machines on demand
#[derive(Parser)]
#[command(name = "biocloud")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Backend base URL (overrides config.toml)
    #[arg(long, env = "BIOCLOUD_API_URL", global = true)]
    api_url: Option<String>,

    /// Directory holding config.toml and the session
    #[arg(long, env = "BIOCLOUD_HOME", global = true)]
    store: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, register and manage passwords
    #[command(subcommand)]
    Auth(auth::AuthCommands),

    /// Show or update the user profile
    #[command(subcommand)]
    Profile(profile::ProfileCommands),

    /// Launch and manage BLAST virtual machines
    #[command(subcommand)]
    Vm(vm::VmCommands),

    /// Buy credits
    #[command(subcommand)]
    Credits(credits::CreditsCommands),

    /// Show version information
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::debug!("Interrupted");
            notify::warning("Interrupted.");
            return ExitCode::from(130);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = cli.store.map(StorePaths::new).unwrap_or_default();
    let mut config = CliConfig::load(&paths.config())?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    tracing::debug!(api = %config.api_base_url, store = %paths.root.display(), "Starting");

    if let Commands::Version = cli.command {
        println!("BioCloudLabs CLI v{}", biocloud_common::VERSION);
        println!("Backend: {}", config.api_base_url);
        return Ok(());
    }

    let app = App::new(config, &paths)?;
    match cli.command {
        Commands::Auth(cmd) => auth::execute(cmd, &app, cli.format).await,
        Commands::Profile(cmd) => profile::execute(cmd, &app, cli.format).await,
        Commands::Vm(cmd) => vm::execute(cmd, &app, cli.format).await,
        Commands::Credits(cmd) => credits::execute(cmd, &app, cli.format).await,
        Commands::Version => Ok(()),
    }
}

/// Central place where client errors turn into notices
fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<Error>() {
        Some(Error::Validation(reasons)) => {
            notify::error("Please fix the following:");
            notify::error_bullets(reasons.reasons());
        }
        Some(e @ (Error::SessionExpired | Error::NotAuthenticated)) => {
            notify::warning(&e.user_message());
            if e.redirect() == Some(Route::Login) {
                notify::info("Next: biocloud auth login");
            }
        }
        Some(e) => notify::error(&e.user_message()),
        None => notify::error(&format!("{:#}", err)),
    }
}
