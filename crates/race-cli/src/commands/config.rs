//! Config command: prints the effective configuration.

use std::io::Write;

use anyhow::{Context, Result};

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let text = config.to_toml().context("failed to render configuration")?;
    write!(writer, "{text}")?;
    Ok(())
}
