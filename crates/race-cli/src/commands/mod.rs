//! CLI subcommand implementations.

pub mod config;
pub mod import;
pub mod lanes;
pub mod new;
pub mod publish;
pub mod schedule;
pub mod scratch;
pub mod status;
pub mod util;
