//! revwatch CLI - Play Store review notifier
//!
//! Polls the reviews of every tracked app and posts new comments to Slack.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use revwatch_core::{Config, Secrets};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{AppArgs, CheckArgs, ServeArgs, WatchArgs};

/// revwatch: Play Store reviews, delivered to Slack
#[derive(Parser, Debug)]
#[command(name = "revwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.config/revwatch/config.toml)
    #[arg(long, global = true, env = "REVWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Watermark database file (overrides config and env)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Run one review check pass
    #[command(visible_alias = "c")]
    Check(CheckArgs),

    /// Run review checks on a fixed schedule
    Watch(WatchArgs),

    /// Serve an HTTP endpoint that triggers review checks
    Serve(ServeArgs),

    /// Manage tracked apps
    App(AppArgs),

    /// Create a secrets file template
    Init,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let interval = match &cli.command {
        Some(Commands::Watch(args)) => args.interval,
        _ => None,
    };

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.config.as_deref(), cli.db.clone(), interval)?;

    if cli.verbose {
        tracing::info!(
            interval = ?config.check.interval,
            db = ?config.database.path,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("revwatch {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Check(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Watch(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Serve(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::App(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Init) => {
            let path = Secrets::create_template()?;
            println!("Created secrets template at {}", path.display());
            println!("Edit it to add the Slack webhook and Google service account.");
        }
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("revwatch - Play Store review notifier");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn print_config(config: &Config) {
    println!("revwatch Configuration");
    println!("======================");
    println!();
    println!("Check Settings:");
    println!("  interval: {:?}", config.check.interval);
    println!("  delivery_interval: {:?}", config.check.delivery_interval);
    println!("  max_results: {}", config.check.max_results);
    println!();
    println!("Console:");
    println!(
        "  project_id: {}",
        config.console.project_id.as_deref().unwrap_or("(unset)")
    );
    println!("  database_id: {}", config.console.database_id);
    println!();
    println!("Server:");
    println!("  bind: {}", config.server.bind);
    println!();
    println!("Play API:");
    println!("  base_url: {}", config.play.base_url);
    println!();

    match &config.database.path {
        Some(path) => println!("Database: {}", path.display()),
        None => match revwatch_db::Database::default_path() {
            Ok(path) => println!("Database: {} (default)", path.display()),
            Err(e) => println!("Database: unavailable ({})", e),
        },
    }

    if let Some(path) = Config::default_config_path() {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }

    if let Some(path) = Secrets::default_secrets_path() {
        println!("Secrets file: {}", path.display());
        if !path.exists() {
            println!("  (not found - run `revwatch init`)");
        }
    }
}
