//! Regatta domain records: entries, events, races and finish results.

use std::time::Duration;

use chrono::NaiveTime;

use crate::types::{BoatType, DurationType};

/// One boat entered in the regatta.
///
/// The bib number is the join key between entries and the results written
/// by the venue hardware. `race_id` and `lane` are filled in by scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entry {
    pub bib: u32,
    pub boat_name: String,
    pub club_name: String,
    pub club_abbrev: String,
    pub email: String,
    pub country: String,
    pub age: u32,
    /// Pre-race estimated or qualifying time. `None` seeds slowest.
    pub seed: Option<Duration>,
    pub lightweight: bool,
    pub event_id: u32,
    pub race_id: Option<u32>,
    pub lane: Option<u32>,
    pub scratched: bool,
    /// Finish result joined by bib number, when one has been recorded.
    pub result: Option<RaceResult>,
}

impl Entry {
    /// Creates an unscheduled entry with the given identity.
    pub fn new(bib: u32, boat_name: impl Into<String>, event_id: u32) -> Self {
        Self {
            bib,
            boat_name: boat_name.into(),
            event_id,
            ..Self::default()
        }
    }

    /// Whether this entry takes part in scheduling and ranking.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.scratched
    }

    /// Finish time, or zero when the entry did not start.
    #[must_use]
    pub fn finish_time(&self) -> Duration {
        self.result.as_ref().map_or(Duration::ZERO, |r| r.time)
    }

    /// Finishing place assigned by ranking, if any.
    #[must_use]
    pub fn place(&self) -> Option<u32> {
        self.result.as_ref().map(|r| r.place)
    }
}

/// A competitive category, e.g. "Masters Men Age 30-39".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: u32,
    pub name: String,
    /// Target distance in meters.
    pub distance: u32,
    /// Side of the venue the event races on.
    pub bank: String,
    /// Nominal start time of the first heat.
    pub start: NaiveTime,
    pub boat_type: BoatType,
    pub entries: Vec<Entry>,
}

/// One timed run of boats in specific lanes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Race {
    pub id: u32,
    pub name: String,
    pub boat_type: BoatType,
    /// Race distance in meters.
    pub distance: u32,
    pub duration_type: DurationType,
    pub enable_stroke_data: bool,
    /// Split distance in meters.
    pub split_distance: u32,
    /// Split time in seconds.
    pub split_time: u32,
    pub lane_count: u32,
    pub bank: String,
    pub start_time: NaiveTime,
    /// Entries placed in this race, each carrying its own lane.
    pub entries: Vec<Entry>,
}

impl Race {
    /// The non-scratched entry occupying `lane`, if any.
    #[must_use]
    pub fn entry_in_lane(&self, lane: u32) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|e| e.is_active() && e.lane == Some(lane))
    }

    /// Whether `lane` is held by a non-scratched entry.
    #[must_use]
    pub fn is_lane_occupied(&self, lane: u32) -> bool {
        self.entry_in_lane(lane).is_some()
    }

    /// Whether this race holds an active entry of the given event.
    #[must_use]
    pub fn has_event(&self, event_id: u32) -> bool {
        self.entries
            .iter()
            .any(|e| e.is_active() && e.event_id == event_id)
    }
}

/// One boat's row from the venue finish-results file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RaceResult {
    /// Finishing place. Recomputed by ranking; the hardware's value is not trusted.
    pub place: u32,
    /// Finish time; zero means the boat did not start.
    pub time: Duration,
    pub avg_pace: Duration,
    /// Distance rowed in meters.
    pub distance: u32,
    pub name: String,
    pub bib: u32,
    pub class: String,
}

impl RaceResult {
    /// Whether the boat did not start.
    #[must_use]
    pub const fn is_dns(&self) -> bool {
        self.time.is_zero()
    }
}
