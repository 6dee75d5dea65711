use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use lp_core::ViewMode;
use tracing_subscriber::EnvFilter;

use lp_cli::commands::{add, calendar, import, items, status, task};
use lp_cli::{Cli, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(lp_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = lp_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut db, config) = open_database(cli.config.as_deref())?;
    let mut stdout = io::stdout().lock();

    match command {
        Commands::Week(args) => calendar::run(&mut stdout, &db, &config, ViewMode::Week, args)?,
        Commands::Day(args) => calendar::run(&mut stdout, &db, &config, ViewMode::Day, args)?,
        Commands::Month(args) => calendar::run(&mut stdout, &db, &config, ViewMode::Month, args)?,
        Commands::AddEvent(args) => {
            add::run_event(&mut stdout, &mut db, args)?;
        }
        Commands::AddTask(args) => {
            add::run_task(&mut stdout, &mut db, args)?;
        }
        Commands::Import => {
            let stored = import::run(io::stdin().lock(), &mut stdout, &mut db)?;
            tracing::debug!(stored, "import finished");
        }
        Commands::Items(args) => {
            items::run(&mut stdout, &db, args)?;
        }
        Commands::Complete { id, undo } => task::complete(&mut stdout, &mut db, id, *undo)?,
        Commands::Delete { id } => task::delete(&mut stdout, &mut db, id)?,
        Commands::Status => status::run(&mut stdout, &db, &config.database_path)?,
    }

    Ok(())
}
