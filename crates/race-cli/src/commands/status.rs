//! Status command for showing what the regatta database holds.

use std::io::Write;

use anyhow::Result;

use super::util::open_database;
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let counts = db.counts()?;

    writeln!(writer, "Regatta status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;

    if counts.entries == 0 {
        writeln!(writer, "No entries imported.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "Entries: {} ({} scratched, {} scheduled)",
        counts.entries, counts.scratched, counts.scheduled
    )?;
    writeln!(writer, "Races: {}", counts.races)?;
    writeln!(writer, "Results: {}", counts.results)?;

    Ok(())
}
