//! Schedule command: seeds every schedule group into races.

use std::collections::{BTreeSet, HashMap};
use std::io::Write;

use anyhow::{Context, Result, bail};
use race_core::{Entry, Event, Race, Scheduler};

use super::util::{PassLock, open_database};
use crate::Config;

/// Schedules every configured group and stores the races.
///
/// Returns the races created. An already scheduled regatta is left alone
/// unless `force` is set, in which case the old schedule is deleted first.
pub fn run<W: Write>(writer: &mut W, config: &Config, force: bool) -> Result<Vec<Race>> {
    config.validate().context("invalid configuration")?;
    let scheduler = Scheduler::new(config.schedule_config()?)?;

    let _lock = PassLock::acquire(&config.lock_path())?;
    let mut db = open_database(config)?;

    if db.counts()?.races > 0 {
        if !force {
            bail!("the regatta is already scheduled; use --force to start over");
        }
        let removed = db.clear_schedule()?;
        writeln!(writer, "Removed {removed} races")?;
    }

    let mut by_event: HashMap<u32, Vec<Entry>> = HashMap::new();
    for entry in db.list_entries()? {
        by_event.entry(entry.event_id).or_default().push(entry);
    }

    let mut next_id = db.next_race_id()?;
    let mut scheduled = Vec::new();
    for group in &config.schedule {
        let mut events = Vec::with_capacity(group.len());
        for &id in group {
            let Some(event) = config.event(id) else {
                bail!("schedule names unknown event {id}");
            };
            events.push(Event {
                id,
                name: event.name.clone(),
                distance: event.distance,
                bank: event.bank.clone(),
                start: event.start,
                boat_type: event.boat_type,
                entries: by_event.remove(&id).unwrap_or_default(),
            });
        }

        let start = events[0].start;
        let races = scheduler.schedule(&mut events, start, next_id)?;
        let entered: usize = races.iter().map(|r| r.entries.len()).sum();
        writeln!(
            writer,
            "Events {}: {} races, {} entries",
            join_ids(group.iter().copied()),
            races.len(),
            entered
        )?;

        db.insert_races(&races)?;
        next_id += u32::try_from(races.len()).context("too many races")?;
        scheduled.extend(races);
    }

    let unscheduled: BTreeSet<u32> = by_event
        .iter()
        .filter(|(_, entries)| entries.iter().any(Entry::is_active))
        .map(|(&id, _)| id)
        .collect();
    if !unscheduled.is_empty() {
        writeln!(
            writer,
            "Warning: events {} have entries but are not in the schedule",
            join_ids(unscheduled)
        )?;
    }

    tracing::info!(races = scheduled.len(), "scheduled regatta");
    Ok(scheduled)
}

fn join_ids(ids: impl IntoIterator<Item = u32>) -> String {
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
