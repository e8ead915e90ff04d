//! Core domain logic for running a regatta.
//!
//! This crate contains the fundamental types and logic for:
//! - Scheduling: seeding entries into timed races and lanes
//! - Lane maintenance: repairing and placing entries after the schedule changes
//! - Ranking: finishing places with shared places for ties
//! - Venue files: writing race-control files and reading finish results
//! - Live publishing: the change-driven recompute loop

pub mod clock;
mod lanes;
pub mod live;
mod model;
pub mod race_file;
mod rank;
pub mod results_file;
mod schedule;
mod seed_order;
pub mod types;

pub use clock::{ClockError, format_clock, parse_clock};
pub use lanes::{
    AlwaysConfirm, Confirm, LaneAllocator, LaneAssignment, LaneError, PlacementReport,
    RepairReport,
};
pub use live::{LiveConfig, LiveError, LiveStats, Recompute, Trigger, run_live, spawn_poller};
pub use model::{Entry, Event, Race, RaceResult};
pub use race_file::{Boat, BoatEncoder, IndividualBoat, RaceFileEncoder};
pub use rank::{Finisher, rank};
pub use results_file::{DecodeError, decode_results};
pub use schedule::{ScheduleConfig, ScheduleError, Scheduler};
pub use seed_order::SeedOrder;
pub use types::{BoatType, DurationType, ValidationError};
