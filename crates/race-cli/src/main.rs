use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use race_cli::commands::util::PromptConfirm;
use race_cli::commands::{config, import, lanes, new, publish, schedule, scratch, status};
use race_cli::{Cli, Commands, Config, ImportAction, LanesAction, PublishAction};
use race_core::AlwaysConfirm;
use tracing_subscriber::EnvFilter;

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

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    let mut out = io::stdout();

    match command {
        Commands::New { no_create_tables } => {
            let dir = std::env::current_dir().context("failed to read current directory")?;
            new::run(&mut out, &dir, &config, !no_create_tables)?;
        }
        Commands::Config => config::run(&mut out, &config)?,
        Commands::Status => status::run(&mut out, &config)?,
        Commands::Import(action) => match action {
            ImportAction::Entries { file } => {
                import::run_entries(&mut out, &config, file.as_deref())?;
            }
            ImportAction::Results { live: true, .. } => import::run_results_live(&config)?,
            ImportAction::Results { files, live: false } => {
                import::run_results(&mut out, &config, files)?;
            }
        },
        Commands::Schedule { force } => {
            schedule::run(&mut out, &config, *force)?;
        }
        Commands::Lanes(action) => match action {
            LanesAction::Repair { yes: true } => {
                lanes::repair(&mut out, &config, &mut AlwaysConfirm)?;
            }
            LanesAction::Repair { yes: false } => {
                lanes::repair(&mut out, &config, &mut PromptConfirm::stdio())?;
            }
            LanesAction::Place { yes: true } => {
                lanes::place(&mut out, &config, &mut AlwaysConfirm)?;
            }
            LanesAction::Place { yes: false } => {
                lanes::place(&mut out, &config, &mut PromptConfirm::stdio())?;
            }
        },
        Commands::Scratch { bib, undo } => scratch::run(&mut out, &config, *bib, *undo)?,
        Commands::Publish(action) => match action {
            PublishAction::Races => {
                publish::races(&mut out, &config)?;
            }
            PublishAction::Results { live: true, json } => publish::results_live(&config, *json)?,
            PublishAction::Results { live: false, json } => {
                publish::results(&mut out, &config, *json)?;
            }
            PublishAction::Schedule => {
                publish::schedule(&mut out, &config)?;
            }
        },
    }

    Ok(())
}
