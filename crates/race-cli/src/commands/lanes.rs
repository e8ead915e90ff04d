//! Lane maintenance commands.

use std::collections::HashSet;
use std::io::Write;

use anyhow::Result;
use race_core::{Confirm, Entry, LaneAllocator, LaneAssignment, Race};

use super::util::{PassLock, open_database};
use crate::Config;

/// Gives a free lane to every entry sitting in a race without one.
pub fn repair<W: Write, C: Confirm>(writer: &mut W, config: &Config, confirm: &mut C) -> Result<usize> {
    let schedule = config.schedule_config()?;
    let allocator = LaneAllocator::new(&schedule.seed_order);

    let _lock = PassLock::acquire(&config.lock_path())?;
    let mut db = open_database(config)?;
    let mut races = db.list_races()?;

    let report = allocator.repair_unassigned(&mut races, confirm);
    let updated = db.update_assignments(&assigned_entries(&races, &report.assigned))?;

    for (bib, err) in &report.failed {
        writeln!(writer, "Bib {bib}: {err}")?;
    }
    writeln!(
        writer,
        "Assigned {} lanes ({} declined, {} failed)",
        report.assigned.len(),
        report.declined.len(),
        report.failed.len()
    )?;
    Ok(updated)
}

/// Moves entries without a race into a race of their event with a free lane.
pub fn place<W: Write, C: Confirm>(writer: &mut W, config: &Config, confirm: &mut C) -> Result<usize> {
    let schedule = config.schedule_config()?;
    let allocator = LaneAllocator::new(&schedule.seed_order);

    let _lock = PassLock::acquire(&config.lock_path())?;
    let mut db = open_database(config)?;
    let mut races = db.list_races()?;
    let orphans: Vec<Entry> = db
        .list_entries()?
        .into_iter()
        .filter(|e| e.race_id.is_none() && e.is_active())
        .collect();

    let report = allocator.place_orphans(&mut races, orphans, confirm);
    let updated = db.update_assignments(&assigned_entries(&races, &report.placed))?;

    for entry in &report.unplaced {
        writeln!(
            writer,
            "Bib {} ({}) needs a new race for event {}",
            entry.bib, entry.boat_name, entry.event_id
        )?;
    }
    writeln!(
        writer,
        "Placed {} entries, {} still without a race",
        report.placed.len(),
        report.unplaced.len()
    )?;
    Ok(updated)
}

/// The entries named by `assignments`, as they now sit in `races`.
fn assigned_entries(races: &[Race], assignments: &[LaneAssignment]) -> Vec<Entry> {
    let bibs: HashSet<u32> = assignments.iter().map(|a| a.bib).collect();
    races
        .iter()
        .flat_map(|race| race.entries.iter())
        .filter(|e| bibs.contains(&e.bib))
        .cloned()
        .collect()
}
