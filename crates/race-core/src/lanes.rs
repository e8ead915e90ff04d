//! Lane repair for races that have already been scheduled.
//!
//! Late changes leave two kinds of gaps: entries that were put into a race
//! without a lane, and entries that never made it into a race at all. Both
//! are filled from the free lanes of existing races, in seed-order
//! precedence, after the change has been confirmed.

use thiserror::Error;

use crate::model::{Entry, Race};
use crate::seed_order::SeedOrder;

/// Lane allocation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LaneError {
    /// Every lane of the race is held by an active entry.
    #[error("there are no free lanes in race {race_id}")]
    NoFreeLane { race_id: u32 },
}

/// A proposed lane assignment awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneAssignment {
    pub bib: u32,
    pub boat_name: String,
    pub race_id: u32,
    pub lane: u32,
}

/// Decides whether a proposed assignment should be applied.
///
/// The CLI asks the operator; tests and unattended runs accept everything.
pub trait Confirm {
    fn confirm(&mut self, proposal: &LaneAssignment) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&LaneAssignment) -> bool,
{
    fn confirm(&mut self, proposal: &LaneAssignment) -> bool {
        self(proposal)
    }
}

/// Accepts every proposal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _proposal: &LaneAssignment) -> bool {
        true
    }
}

/// Outcome of a lane repair pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub assigned: Vec<LaneAssignment>,
    pub declined: Vec<LaneAssignment>,
    /// Entries that could not be given a lane, with the reason.
    pub failed: Vec<(u32, LaneError)>,
}

/// Outcome of placing entries that have no race.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementReport {
    pub placed: Vec<LaneAssignment>,
    /// Entries with no race of their event holding a free lane; they need a
    /// new race.
    pub unplaced: Vec<Entry>,
}

/// Finds and fills free lanes using a fixed seed order.
#[derive(Debug, Clone)]
pub struct LaneAllocator<'a> {
    seed_order: &'a SeedOrder,
}

impl<'a> LaneAllocator<'a> {
    #[must_use]
    pub const fn new(seed_order: &'a SeedOrder) -> Self {
        Self { seed_order }
    }

    /// First lane in seed-order precedence not held by an active entry.
    pub fn find_free_lane(&self, race: &Race) -> Result<u32, LaneError> {
        self.seed_order
            .lanes()
            .filter(|&lane| lane <= race.lane_count)
            .find(|&lane| !race.is_lane_occupied(lane))
            .ok_or(LaneError::NoFreeLane { race_id: race.id })
    }

    /// Gives a lane to every active entry that sits in a race without one.
    ///
    /// A full race is reported for that entry and the pass moves on.
    pub fn repair_unassigned<C: Confirm>(
        &self,
        races: &mut [Race],
        confirm: &mut C,
    ) -> RepairReport {
        let mut report = RepairReport::default();

        for race in races.iter_mut() {
            let pending: Vec<usize> = race
                .entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.is_active() && e.lane.is_none())
                .map(|(idx, _)| idx)
                .collect();

            for idx in pending {
                let bib = race.entries[idx].bib;
                let lane = match self.find_free_lane(race) {
                    Ok(lane) => lane,
                    Err(err) => {
                        tracing::warn!(bib, race_id = race.id, "no free lane for entry");
                        report.failed.push((bib, err));
                        continue;
                    }
                };

                let proposal = LaneAssignment {
                    bib,
                    boat_name: race.entries[idx].boat_name.clone(),
                    race_id: race.id,
                    lane,
                };
                if confirm.confirm(&proposal) {
                    race.entries[idx].race_id = Some(race.id);
                    race.entries[idx].lane = Some(lane);
                    tracing::debug!(bib, race_id = race.id, lane, "assigned lane");
                    report.assigned.push(proposal);
                } else {
                    report.declined.push(proposal);
                }
            }
        }

        report
    }

    /// Moves entries without a race into an existing race of their event.
    ///
    /// Races are scanned in order; the first one holding another active entry
    /// of the same event and a free lane is proposed. A declined proposal
    /// moves on to the next such race. Scratched entries are never placed.
    pub fn place_orphans<C: Confirm>(
        &self,
        races: &mut [Race],
        orphans: Vec<Entry>,
        confirm: &mut C,
    ) -> PlacementReport {
        let mut report = PlacementReport::default();

        'orphans: for mut entry in orphans {
            if entry.race_id.is_some() || !entry.is_active() {
                report.unplaced.push(entry);
                continue;
            }

            for race in races.iter_mut() {
                if !race.has_event(entry.event_id) {
                    continue;
                }
                let Ok(lane) = self.find_free_lane(race) else {
                    continue;
                };

                let proposal = LaneAssignment {
                    bib: entry.bib,
                    boat_name: entry.boat_name.clone(),
                    race_id: race.id,
                    lane,
                };
                if !confirm.confirm(&proposal) {
                    continue;
                }

                entry.race_id = Some(race.id);
                entry.lane = Some(lane);
                race.entries.push(entry);
                tracing::debug!(
                    bib = proposal.bib,
                    race_id = proposal.race_id,
                    lane,
                    "placed entry"
                );
                report.placed.push(proposal);
                continue 'orphans;
            }

            report.unplaced.push(entry);
        }

        report
    }
}
