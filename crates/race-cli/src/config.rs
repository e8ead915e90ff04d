//! Configuration loading and management.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use race_core::{BoatType, LiveConfig, ScheduleConfig, SeedOrder, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the per-regatta configuration.
pub const REGATTA_CONFIG: &str = "race.toml";

/// Configuration errors found after loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("seed_order has {len} lanes but lane_count is {lane_count}")]
    SeedOrderLength { len: usize, lane_count: u32 },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("schedule group {group} names unknown event {id}")]
    UnknownEvent { group: usize, id: u32 },

    #[error("schedule group {group} is empty")]
    EmptyGroup { group: usize },

    #[error("event {id} appears in more than one schedule group")]
    DuplicateScheduledEvent { id: u32 },

    #[error("{key} must be greater than zero")]
    ZeroInterval { key: &'static str },
}

/// One event of the regatta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventConfig {
    pub id: u32,
    pub name: String,
    /// Nominal start of the first race.
    pub start: NaiveTime,
    /// Meters.
    pub distance: u32,
    pub bank: String,
    #[serde(default)]
    pub boat_type: BoatType,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Lanes (ergs) per bank.
    pub lane_count: u32,

    /// Lane given to the fastest seed, the second fastest, and so on.
    pub seed_order: Vec<u32>,

    /// Lanes per race kept free for late entries when counting races.
    pub reserved_lanes: u32,

    /// Minutes between race starts.
    pub race_interval_minutes: u32,

    /// Meters.
    pub split_distance: u32,

    /// Seconds.
    pub split_time: u32,

    /// Where race-control files are written.
    pub race_path: PathBuf,

    /// Where the venue software drops finish-results files.
    pub results_path: PathBuf,

    /// Where published results and schedules are written.
    pub publish_path: PathBuf,

    pub live_poll_seconds: u64,

    pub health_check_minutes: u64,

    /// Event ids raced together, one group per line of races.
    pub schedule: Vec<Vec<u32>>,

    pub events: Vec<EventConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("race.db"),
            lane_count: 10,
            seed_order: SeedOrder::default().into(),
            reserved_lanes: 2,
            race_interval_minutes: 8,
            split_distance: 500,
            split_time: 120,
            race_path: PathBuf::from("shared/races"),
            results_path: PathBuf::from("shared/results"),
            publish_path: PathBuf::from("shared/html"),
            live_poll_seconds: 2,
            health_check_minutes: 5,
            schedule: default_schedule(),
            events: default_events(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources override earlier ones: defaults, the user config
    /// directory, `race.toml` in the current directory, `config_path`, then
    /// `RACE_*` environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        figment = figment.merge(Toml::file(REGATTA_CONFIG));

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("RACE_"));

        figment.extract()
    }

    /// Checks the settings that the type system cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schedule_config()?;

        if self.live_poll_seconds == 0 {
            return Err(ConfigError::ZeroInterval {
                key: "live_poll_seconds",
            });
        }
        if self.health_check_minutes == 0 {
            return Err(ConfigError::ZeroInterval {
                key: "health_check_minutes",
            });
        }

        let mut seen = HashSet::new();
        for (idx, group) in self.schedule.iter().enumerate() {
            let group_no = idx + 1;
            if group.is_empty() {
                return Err(ConfigError::EmptyGroup { group: group_no });
            }
            for &id in group {
                if self.event(id).is_none() {
                    return Err(ConfigError::UnknownEvent {
                        group: group_no,
                        id,
                    });
                }
                if !seen.insert(id) {
                    return Err(ConfigError::DuplicateScheduledEvent { id });
                }
            }
        }
        Ok(())
    }

    /// Scheduling settings for the core scheduler and lane allocator.
    pub fn schedule_config(&self) -> Result<ScheduleConfig, ConfigError> {
        let seed_order = SeedOrder::new(self.seed_order.clone())?;
        if seed_order.lane_count() != self.lane_count {
            return Err(ConfigError::SeedOrderLength {
                len: self.seed_order.len(),
                lane_count: self.lane_count,
            });
        }

        let config = ScheduleConfig {
            seed_order,
            reserved_lanes: self.reserved_lanes,
            race_interval: chrono::Duration::minutes(i64::from(self.race_interval_minutes)),
            split_distance: self.split_distance,
            split_time: self.split_time,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn event(&self, id: u32) -> Option<&EventConfig> {
        self.events.iter().find(|e| e.id == id)
    }

    pub const fn live_config(&self) -> LiveConfig {
        LiveConfig {
            health_interval: Duration::from_secs(self.health_check_minutes * 60),
        }
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.live_poll_seconds)
    }

    /// Lock file serializing passes over this regatta.
    pub fn lock_path(&self) -> PathBuf {
        self.database_path.with_extension("lock")
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Returns the platform-specific config directory for race.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("race"))
}

fn default_schedule() -> Vec<Vec<u32>> {
    let mut groups = vec![
        vec![1, 3, 5, 7],
        vec![2, 4, 6, 8, 11, 13],
        vec![9],
        vec![10, 12],
        vec![14, 15],
    ];
    groups.extend((16..=22).map(|id| vec![id]));
    groups
}

fn default_events() -> Vec<EventConfig> {
    const EVENTS: [(u32, u32, u32, &str, u32, &str); 22] = [
        (1, 8, 0, "Masters Men Age 30-39", 2000, "A"),
        (2, 8, 15, "Masters Women Age 30-39", 2000, "B"),
        (3, 8, 0, "Senior Men Age 40-49", 2000, "A"),
        (4, 8, 15, "Senior Women Age 40-49", 2000, "B"),
        (5, 8, 0, "Veteran Men Age 50+", 2000, "A"),
        (6, 8, 15, "Veteran Women Age 50+", 2000, "B"),
        (7, 8, 0, "Open Men", 2000, "A"),
        (8, 8, 15, "Open Women", 2000, "B"),
        (9, 8, 30, "Adaptive Men and Women", 1000, "A"),
        (10, 8, 45, "Col. Novice Men", 2000, "A"),
        (11, 8, 53, "Col. Novice Women", 2000, "B"),
        (12, 9, 45, "Col. Varsity Men", 2000, "A"),
        (13, 9, 53, "Col. Varsity Women", 2000, "B"),
        (14, 10, 45, "Col. Coxswain Men", 1000, "A"),
        (15, 10, 53, "Col. Coxswain Women", 1000, "B"),
        (16, 11, 30, "JROW Boys and Girls", 1000, "A"),
        (17, 11, 45, "HS Novice Boys", 2000, "A"),
        (18, 11, 53, "HS Novice Girls", 2000, "B"),
        (19, 12, 30, "HS Varsity Boys", 2000, "A"),
        (20, 12, 38, "HS Varsity Girls", 2000, "B"),
        (21, 13, 30, "HS Coxswain Boys", 1000, "A"),
        (22, 13, 38, "HS Coxswain Girls", 1000, "B"),
    ];

    EVENTS
        .iter()
        .filter_map(|&(id, hour, minute, name, distance, bank)| {
            Some(EventConfig {
                id,
                name: name.to_string(),
                start: NaiveTime::from_hms_opt(hour, minute, 0)?,
                distance,
                bank: bank.to_string(),
                boat_type: BoatType::Singles,
            })
        })
        .collect()
}
