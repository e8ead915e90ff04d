//! Import commands for entries and finish results.

use std::collections::hash_map::DefaultHasher;
use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result, bail};
use race_core::live::BoxError;
use race_core::{Entry, RaceResult, Recompute, decode_results, parse_clock};
use race_db::Database;
use serde::Deserialize;

use super::util::{PassLock, open_database, run_live_loop};
use crate::Config;

/// Imports entries from a JSON lines file, or stdin when `file` is `None`.
///
/// Returns the number of new entries; bibs already present are ignored.
pub fn run_entries<W: Write>(writer: &mut W, config: &Config, file: Option<&Path>) -> Result<usize> {
    let entries = match file {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            parse_entries(BufReader::new(file), config)?
        }
        None => parse_entries(io::stdin().lock(), config)?,
    };

    let _lock = PassLock::acquire(&config.lock_path())?;
    let mut db = open_database(config)?;
    let inserted = db.insert_entries(&entries)?;

    writeln!(
        writer,
        "Imported {inserted} entries ({} duplicates ignored)",
        entries.len() - inserted
    )?;
    Ok(inserted)
}

fn parse_entries<R: BufRead>(reader: R, config: &Config) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("failed to read line {line_no}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let parsed: ImportEntry = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid JSON on line {line_no}"))?;
        let entry = parsed
            .into_entry(config)
            .with_context(|| format!("invalid entry on line {line_no}"))?;
        entries.push(entry);
    }
    Ok(entries)
}

#[derive(Debug, Deserialize)]
struct ImportEntry {
    bib: u32,
    boat_name: String,
    #[serde(default)]
    club_name: String,
    #[serde(default)]
    club_abbrev: String,
    #[serde(default)]
    email: String,
    #[serde(default = "default_country")]
    country: String,
    #[serde(default)]
    age: u32,
    /// `m:ss.f`; missing or empty seeds slowest.
    #[serde(default)]
    seed: Option<String>,
    event: u32,
    #[serde(default)]
    lightweight: bool,
}

fn default_country() -> String {
    "USA".to_string()
}

impl ImportEntry {
    fn into_entry(self, config: &Config) -> Result<Entry> {
        if self.bib == 0 {
            bail!("bib must be a positive number");
        }
        if self.boat_name.trim().is_empty() {
            bail!("missing boat_name");
        }
        if config.event(self.event).is_none() {
            bail!("unknown event {}", self.event);
        }
        let seed = match self.seed.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(token) => Some(parse_clock(token).context("invalid seed")?),
        };

        Ok(Entry {
            bib: self.bib,
            boat_name: self.boat_name,
            club_name: self.club_name,
            club_abbrev: self.club_abbrev,
            email: self.email,
            country: self.country,
            age: self.age,
            seed,
            lightweight: self.lightweight,
            event_id: self.event,
            ..Entry::default()
        })
    }
}

/// Imports finish-results files.
///
/// With no `files`, every file in the results folder is read. Each file
/// decodes completely or not at all; results for bibs already stored are
/// ignored.
pub fn run_results<W: Write>(writer: &mut W, config: &Config, files: &[PathBuf]) -> Result<usize> {
    let files = if files.is_empty() {
        results_files(&config.results_path)?
    } else {
        files.to_vec()
    };

    let results = read_results_files(&files)?;

    let _lock = PassLock::acquire(&config.lock_path())?;
    let mut db = open_database(config)?;
    let inserted = db.insert_results(&results)?;

    writeln!(
        writer,
        "Imported {inserted} results from {} files ({} already stored)",
        files.len(),
        results.len() - inserted
    )?;
    Ok(inserted)
}

/// Watches the results folder and imports files as they appear or change.
pub fn run_results_live(config: &Config) -> Result<()> {
    config.validate().context("invalid configuration")?;
    let mut importer = LiveImporter {
        config: config.clone(),
        db: open_database(config)?,
    };

    let dir = config.results_path.clone();
    let stats = run_live_loop(&mut importer, config, move || folder_fingerprint(&dir))?;
    tracing::info!(passes = stats.passes, "stopped watching results");
    Ok(())
}

struct LiveImporter {
    config: Config,
    db: Database,
}

impl Recompute for LiveImporter {
    fn recompute(&mut self) -> Result<(), BoxError> {
        let files = results_files(&self.config.results_path)?;
        let results = read_results_files(&files)?;

        let _lock = PassLock::acquire(&self.config.lock_path())?;
        let inserted = self.db.insert_results(&results)?;
        if inserted > 0 {
            tracing::info!(inserted, "imported results");
        }
        Ok(())
    }

    fn health_check(&mut self) -> Result<(), BoxError> {
        fs::read_dir(&self.config.results_path)?;
        self.db.ping()?;
        Ok(())
    }
}

/// Regular files in `dir`, sorted by name.
fn results_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn read_results_files(files: &[PathBuf]) -> Result<Vec<RaceResult>> {
    let mut results = Vec::new();
    for path in files {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let decoded = decode_results(BufReader::new(file))
            .with_context(|| format!("failed to read results from {}", path.display()))?;
        tracing::debug!(path = %path.display(), results = decoded.len(), "decoded results file");
        results.extend(decoded);
    }
    Ok(results)
}

/// Hash of the names, sizes and modification times of files in `dir`.
fn folder_fingerprint(dir: &Path) -> Option<u64> {
    let mut stamps = Vec::new();
    for entry in fs::read_dir(dir).ok()? {
        let entry = entry.ok()?;
        let meta = entry.metadata().ok()?;
        let modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .unwrap_or_default();
        stamps.push((entry.file_name(), meta.len(), modified));
    }
    stamps.sort();

    let mut hasher = DefaultHasher::new();
    stamps.hash(&mut hasher);
    Some(hasher.finish())
}
