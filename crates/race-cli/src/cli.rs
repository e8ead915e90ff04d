//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Regatta race scheduling and results.
///
/// Seeds entries into races, writes race files for the venue racing
/// software, reads its finish results and publishes ranked results.
#[derive(Debug, Parser)]
#[command(name = "race", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Set up a new regatta in the current (empty) directory.
    New {
        /// Don't create the database tables.
        #[arg(long)]
        no_create_tables: bool,
    },

    /// Print the effective configuration as TOML.
    Config,

    /// Show entry, race and result counts.
    Status,

    /// Import entries or finish results.
    #[command(subcommand)]
    Import(ImportAction),

    /// Seed entries into races for every schedule group.
    Schedule {
        /// Delete the existing schedule first.
        #[arg(long)]
        force: bool,
    },

    /// Fix up lanes after late changes.
    #[command(subcommand)]
    Lanes(LanesAction),

    /// Scratch an entry, or restore it with --undo.
    Scratch {
        /// Bib number of the entry.
        bib: u32,

        /// Restore a scratched entry.
        #[arg(long)]
        undo: bool,
    },

    /// Write race files, results or the schedule.
    #[command(subcommand)]
    Publish(PublishAction),
}

#[derive(Debug, Subcommand)]
pub enum ImportAction {
    /// Import entries from JSON lines (stdin when no file is given).
    Entries {
        /// JSON lines file.
        file: Option<PathBuf>,
    },

    /// Import finish-results files (every file in the results folder when none are given).
    Results {
        /// Results files.
        files: Vec<PathBuf>,

        /// Keep watching the results folder and import files as they change.
        #[arg(long, conflicts_with = "files")]
        live: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum LanesAction {
    /// Give a lane to entries that are in a race without one.
    Repair {
        /// Apply every assignment without asking.
        #[arg(short, long)]
        yes: bool,
    },

    /// Move entries without a race into a race of their event.
    Place {
        /// Apply every assignment without asking.
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum PublishAction {
    /// Write one race file per race.
    Races,

    /// Rank every event and write the results.
    Results {
        /// Republish whenever the database changes.
        #[arg(long)]
        live: bool,

        /// Also write results.json.
        #[arg(long)]
        json: bool,
    },

    /// Write the race schedule.
    Schedule,
}
