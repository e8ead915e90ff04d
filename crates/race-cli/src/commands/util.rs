//! Shared utilities for CLI commands.

use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use fs2::FileExt;
use race_core::{Confirm, LaneAssignment, LiveStats, Recompute};
use race_db::Database;
use tokio::sync::{mpsc, watch};

use crate::Config;

/// Exclusive lock held for the length of one pass over the regatta.
///
/// Released when dropped.
#[derive(Debug)]
pub struct PassLock {
    _file: File,
}

impl PassLock {
    /// Blocks until no other pass holds the lock at `path`.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("failed to create lock directory")?;
        }
        let file = File::create(path)
            .with_context(|| format!("failed to create lock file {}", path.display()))?;
        file.lock_exclusive().context("failed to acquire lock")?;
        tracing::debug!(path = %path.display(), "acquired pass lock");
        Ok(Self { _file: file })
    }
}

/// Opens the regatta database named by `config`.
pub fn open_database(config: &Config) -> Result<Database> {
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

/// Asks the operator to confirm each lane assignment.
///
/// Anything but `y` or `yes` declines, as does end of input.
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptConfirm<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, proposal: &LaneAssignment) -> bool {
        let asked = write!(
            self.output,
            "Assign {} ({}) to race {}, lane {}? [y/N] ",
            proposal.boat_name, proposal.bib, proposal.race_id, proposal.lane
        )
        .and_then(|()| self.output.flush());
        if asked.is_err() {
            return false;
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        }
    }
}

/// Runs `recompute` in the live loop until Ctrl-C.
///
/// `probe` is polled every `live_poll_seconds`; a change in its value
/// triggers a pass.
pub fn run_live_loop<R, P>(recompute: &mut R, config: &Config, probe: P) -> Result<LiveStats>
where
    R: Recompute + Send,
    P: FnMut() -> Option<u64> + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    runtime.block_on(async {
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let poller = race_core::spawn_poller(
            config.poll_interval(),
            probe,
            trigger_tx,
            shutdown_rx.clone(),
        )?;
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(true);
            }
        });

        let stats = race_core::run_live(recompute, trigger_rx, shutdown_rx, config.live_config())
            .await
            .context("live loop stopped")?;
        poller.abort();
        Ok::<_, anyhow::Error>(stats)
    })
}
