//! Heat scheduling.
//!
//! Events that race together on one bank are merged, seeded fastest first and
//! cut into heats. Lanes within a heat are handed out in [`SeedOrder`]
//! precedence, so the fastest boats land in the lanes the table lists first.
//!
//! # Algorithm Summary
//!
//! 1. Concatenate the active entries of every event, in caller order
//! 2. Stable-sort by seed time, entries without a seed last
//! 3. Heat count = `ceil(entries / (lane_count - reserved_lanes))`
//! 4. Fill each heat in seed-order lane precedence until its lanes or the
//!    entries run out

use std::cmp::Ordering;
use std::time::Duration;

use chrono::NaiveTime;
use thiserror::Error;

use crate::model::{Event, Race};
use crate::seed_order::SeedOrder;
use crate::types::{DurationType, ValidationError};

/// Scheduling errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// No events were supplied to schedule together.
    #[error("no events to schedule")]
    NoEvents,

    /// The scheduling configuration is inconsistent.
    #[error("invalid schedule configuration: {0}")]
    InvalidConfig(#[from] ValidationError),
}

/// Configuration for heat scheduling and lane allocation.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Lane precedence; its length is the lane capacity of every race.
    pub seed_order: SeedOrder,

    /// Lanes per race held back for late additions when counting heats.
    /// Default: 2.
    pub reserved_lanes: u32,

    /// Time between consecutive heat starts.
    /// Default: 8 minutes.
    pub race_interval: chrono::Duration,

    /// Split distance written to race files, in meters. Default: 500.
    pub split_distance: u32,

    /// Split time written to race files, in seconds. Default: 120.
    pub split_time: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            seed_order: SeedOrder::default(),
            reserved_lanes: 2,
            race_interval: chrono::Duration::minutes(8),
            split_distance: 500,
            split_time: 120,
        }
    }
}

impl ScheduleConfig {
    /// Lane capacity of a race.
    #[must_use]
    pub fn lane_count(&self) -> u32 {
        self.seed_order.lane_count()
    }

    /// Checks the reserved-lane margin leaves at least one lane to seed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.reserved_lanes >= self.lane_count() {
            return Err(ValidationError::MarginTooLarge {
                reserved: self.reserved_lanes,
                lane_count: self.lane_count(),
            });
        }
        Ok(())
    }

    fn heat_size(&self) -> usize {
        (self.lane_count() - self.reserved_lanes) as usize
    }
}

/// Partitions seeded entries into heats.
#[derive(Debug, Clone)]
pub struct Scheduler {
    config: ScheduleConfig,
}

impl Scheduler {
    /// Creates a scheduler after validating the configuration.
    pub fn new(config: ScheduleConfig) -> Result<Self, ScheduleError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Schedules `events` to race together starting at `start`.
    ///
    /// Races are numbered from `first_race_id` and inherit distance, bank and
    /// boat type from the first event. Every consumed entry has its `race_id`
    /// and `lane` updated in place; scratched entries are left untouched.
    ///
    /// Returns no races when the events hold no active entries.
    pub fn schedule(
        &self,
        events: &mut [Event],
        start: NaiveTime,
        first_race_id: u32,
    ) -> Result<Vec<Race>, ScheduleError> {
        let Some(first) = events.first() else {
            return Err(ScheduleError::NoEvents);
        };

        let name = race_name(events);
        let distance = first.distance;
        let bank = first.bank.clone();
        let boat_type = first.boat_type;
        let lead_event = first.id;

        // (event index, entry index) of every active entry, fastest first
        let mut seeded: Vec<(usize, usize)> = events
            .iter()
            .enumerate()
            .flat_map(|(ei, event)| {
                event
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(_, entry)| entry.is_active())
                    .map(move |(xi, _)| (ei, xi))
            })
            .collect();
        seeded.sort_by(|&(ea, xa), &(eb, xb)| {
            compare_seeds(events[ea].entries[xa].seed, events[eb].entries[xb].seed)
        });

        let heats = seeded.len().div_ceil(self.config.heat_size());
        tracing::debug!(
            event = lead_event,
            entries = seeded.len(),
            heats,
            "computed heat count"
        );

        let mut queue = seeded.into_iter();
        let mut races = Vec::with_capacity(heats);
        for heat in 0..heats {
            let offset = i32::try_from(heat).unwrap_or(i32::MAX);
            let mut race = Race {
                id: first_race_id + u32::try_from(heat).unwrap_or(u32::MAX),
                name: name.clone(),
                boat_type,
                distance,
                duration_type: DurationType::Distance,
                enable_stroke_data: false,
                split_distance: self.config.split_distance,
                split_time: self.config.split_time,
                lane_count: self.config.lane_count(),
                bank: bank.clone(),
                start_time: start + self.config.race_interval * offset,
                entries: Vec::new(),
            };

            for lane in self.config.seed_order.lanes() {
                let Some((ei, xi)) = queue.next() else {
                    break;
                };
                let entry = &mut events[ei].entries[xi];
                entry.race_id = Some(race.id);
                entry.lane = Some(lane);
                race.entries.push(entry.clone());
            }

            races.push(race);
        }

        tracing::info!(
            event = lead_event,
            races = races.len(),
            bank = %bank,
            "scheduled events"
        );
        Ok(races)
    }
}

/// Orders seeds fastest first; a missing seed is slower than any recorded one.
fn compare_seeds(a: Option<Duration>, b: Option<Duration>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// "Events 1, 3, 5" for combined events, "7 Open Men" for a single event.
fn race_name(events: &[Event]) -> String {
    match events {
        [single] => format!("{} {}", single.id, single.name),
        _ => {
            let ids: Vec<String> = events.iter().map(|e| e.id.to_string()).collect();
            format!("Events {}", ids.join(", "))
        }
    }
}
