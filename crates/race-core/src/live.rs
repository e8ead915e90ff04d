//! Live recompute loop.
//!
//! Change notifications (a database write, a new results file) trigger one
//! full recompute pass. Notifications that pile up while a pass runs are
//! folded into a single follow-up pass, since every pass rebuilds its output
//! from the current stored state. A health check runs on its own timer so a
//! dead notification source is noticed even when nothing changes.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Error type returned by recompute and health check implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger;

/// Work run by the live loop.
pub trait Recompute {
    /// Rebuilds every output from current state.
    fn recompute(&mut self) -> Result<(), BoxError>;

    /// Checks that the sources feeding the loop are still reachable.
    fn health_check(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveConfig {
    pub health_interval: Duration,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            health_interval: Duration::from_secs(5 * 60),
        }
    }
}

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LiveStats {
    pub passes: u64,
    pub failed_passes: u64,
    pub health_checks: u64,
}

#[derive(Debug, Error)]
pub enum LiveError {
    #[error("change notification channel closed")]
    ChannelClosed,

    #[error("health check failed")]
    HealthCheck(#[source] BoxError),

    #[error("{0} interval must be greater than zero")]
    ZeroInterval(&'static str),
}

/// Runs recompute passes until `shutdown` becomes true.
///
/// One pass runs immediately. A failed pass is logged and the loop keeps
/// waiting; the next notification retries it. A failed health check or a
/// closed notification channel stops the loop with an error, and so does a
/// zero health interval.
pub async fn run_live<R: Recompute + Send>(
    recompute: &mut R,
    mut triggers: mpsc::Receiver<Trigger>,
    mut shutdown: watch::Receiver<bool>,
    config: LiveConfig,
) -> Result<LiveStats, LiveError> {
    if config.health_interval.is_zero() {
        return Err(LiveError::ZeroInterval("health check"));
    }
    let mut stats = LiveStats::default();

    info!(
        health_interval_secs = config.health_interval.as_secs(),
        "Starting live loop"
    );
    run_pass(recompute, &mut stats);

    let mut health = tokio::time::interval_at(
        Instant::now() + config.health_interval,
        config.health_interval,
    );
    health.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!(passes = stats.passes, "Live loop shutting down");
                    break;
                }
            }
            trigger = triggers.recv() => {
                if trigger.is_none() {
                    error!("Change notifications stopped");
                    return Err(LiveError::ChannelClosed);
                }
                let mut coalesced = 0_u32;
                while triggers.try_recv().is_ok() {
                    coalesced += 1;
                }
                debug!(coalesced, "Change notification received");
                run_pass(recompute, &mut stats);
            }
            _ = health.tick() => {
                stats.health_checks += 1;
                match recompute.health_check() {
                    Ok(()) => debug!("Health check passed"),
                    Err(e) => {
                        error!(error = %e, "Health check failed");
                        return Err(LiveError::HealthCheck(e));
                    }
                }
            }
        }
    }

    Ok(stats)
}

fn run_pass<R: Recompute>(recompute: &mut R, stats: &mut LiveStats) {
    stats.passes += 1;
    match recompute.recompute() {
        Ok(()) => debug!(pass = stats.passes, "Recompute pass finished"),
        Err(e) => {
            stats.failed_passes += 1;
            warn!(pass = stats.passes, error = %e, "Recompute pass failed");
        }
    }
}

/// Polls `probe` every `period` and sends a trigger whenever its value changes.
///
/// `probe` returns a fingerprint of the watched state, or `None` when it
/// could not be read; unreadable polls are skipped. The task ends on
/// shutdown or when the receiving side is gone. A zero `period` is an error.
pub fn spawn_poller<P>(
    period: Duration,
    mut probe: P,
    triggers: mpsc::Sender<Trigger>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<JoinHandle<()>, LiveError>
where
    P: FnMut() -> Option<u64> + Send + 'static,
{
    if period.is_zero() {
        return Err(LiveError::ZeroInterval("poll"));
    }
    Ok(tokio::spawn(async move {
        let mut last = probe();
        let mut timer = tokio::time::interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = timer.tick() => {
                    let Some(current) = probe() else {
                        warn!("Change probe failed");
                        continue;
                    };
                    if last == Some(current) {
                        continue;
                    }
                    last = Some(current);
                    match triggers.try_send(Trigger) {
                        Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
                        Err(mpsc::error::TrySendError::Closed(_)) => break,
                    }
                }
            }
        }
    }))
}
