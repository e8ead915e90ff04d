//! New command: lays out a regatta directory.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use race_db::Database;

use crate::Config;
use crate::config::REGATTA_CONFIG;

/// Creates `race.toml`, the shared folders and (unless told not to) the
/// database in `dir`, which must be empty.
pub fn run<W: Write>(writer: &mut W, dir: &Path, config: &Config, create_tables: bool) -> Result<()> {
    let mut listing =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    if listing.next().is_some() {
        bail!(
            "{} is not empty; a new regatta needs an empty directory",
            dir.display()
        );
    }

    writeln!(writer, "creating default config")?;
    let text = config.to_toml().context("failed to render configuration")?;
    fs::write(dir.join(REGATTA_CONFIG), text).context("failed to write race.toml")?;

    writeln!(writer, "creating shared folders")?;
    for folder in [&config.race_path, &config.results_path, &config.publish_path] {
        let path = dir.join(folder);
        fs::create_dir_all(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
    }

    if create_tables {
        writeln!(writer, "creating database schema")?;
        let path = dir.join(&config.database_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create database directory")?;
        }
        Database::open(&path).with_context(|| format!("failed to create {}", path.display()))?;
    }

    tracing::info!(dir = %dir.display(), "created regatta");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lays_out_an_empty_directory() {
        let temp = tempfile::tempdir().unwrap();
        let mut output = Vec::new();

        run(&mut output, temp.path(), &Config::default(), true).unwrap();

        assert!(temp.path().join("race.toml").is_file());
        assert!(temp.path().join("race.db").is_file());
        for folder in ["shared/races", "shared/results", "shared/html"] {
            assert!(temp.path().join(folder).is_dir(), "{folder} missing");
        }
        let output = String::from_utf8(output).unwrap();
        insta::assert_snapshot!(output, @r"
        creating default config
        creating shared folders
        creating database schema
        ");
    }

    #[test]
    fn skips_database_when_asked() {
        let temp = tempfile::tempdir().unwrap();
        let mut output = Vec::new();

        run(&mut output, temp.path(), &Config::default(), false).unwrap();

        assert!(temp.path().join("race.toml").is_file());
        assert!(!temp.path().join("race.db").exists());
    }

    #[test]
    fn refuses_non_empty_directory() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("notes.txt"), "keep me").unwrap();
        let mut output = Vec::new();

        let err = run(&mut output, temp.path(), &Config::default(), true).unwrap_err();

        assert!(err.to_string().contains("is not empty"));
        assert!(!temp.path().join("race.toml").exists());
    }
}
