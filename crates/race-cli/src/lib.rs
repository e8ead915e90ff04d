//! Regatta CLI library.
//!
//! This crate provides the `race` command line on top of `race-core` and
//! `race-db`.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, ImportAction, LanesAction, PublishAction};
pub use config::{Config, ConfigError, EventConfig};
