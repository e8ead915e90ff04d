//! Storage layer for the regatta.
//!
//! Provides persistence for entries, races and finish results using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` can be moved into the live publish loop but not shared with
//! another thread without external synchronization.
//!
//! # Schema
//!
//! Bib numbers are the primary key of both `entries` and `results`; a result
//! belongs to the entry with the same bib. Durations are stored as integer
//! milliseconds and race start times as `HH:MM:SS` text.
//!
//! An entry that has not been scheduled has NULL `race_id` and `lane`.

use std::path::Path;
use std::time::Duration;

use chrono::NaiveTime;
use race_core::{BoatType, DurationType, Entry, Race, RaceResult};
use rusqlite::{Connection, OptionalExtension, ToSql, params};
use thiserror::Error;
use tracing::debug;

const TIME_FORMAT: &str = "%H:%M:%S";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored race start time could not be parsed.
    #[error("invalid start time for race {race_id}: {value}")]
    StartTimeParse {
        race_id: u32,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored race has a boat type code outside the known range.
    #[error("invalid boat type code {code} for race {race_id}")]
    InvalidBoatType { race_id: u32, code: i64 },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Row counts shown by `race status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counts {
    pub entries: u64,
    pub scratched: u64,
    pub scheduled: u64,
    pub races: u64,
    pub results: u64,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS races (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL DEFAULT '',
                boat_type INTEGER NOT NULL DEFAULT 0,
                distance INTEGER NOT NULL DEFAULT 2000,
                duration_type INTEGER NOT NULL DEFAULT 0,
                enable_stroke_data INTEGER NOT NULL DEFAULT 0,
                split_distance INTEGER NOT NULL DEFAULT 500,
                split_time INTEGER NOT NULL DEFAULT 120,
                lane_count INTEGER NOT NULL DEFAULT 10,
                bank TEXT NOT NULL DEFAULT '',
                start_time TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_races_start ON races(start_time);

            -- seed_ms: NULL when no seed time was given
            CREATE TABLE IF NOT EXISTS entries (
                bib INTEGER PRIMARY KEY,
                boat_name TEXT NOT NULL DEFAULT ' ',
                club_name TEXT NOT NULL DEFAULT '',
                club_abbrev TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL DEFAULT '',
                country TEXT NOT NULL DEFAULT 'USA',
                age INTEGER NOT NULL DEFAULT 0,
                seed_ms INTEGER,
                lightweight INTEGER NOT NULL DEFAULT 0,
                event_id INTEGER NOT NULL,
                race_id INTEGER,
                lane INTEGER,
                scratched INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (race_id) REFERENCES races(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_entries_race ON entries(race_id);
            CREATE INDEX IF NOT EXISTS idx_entries_event ON entries(event_id);

            -- Finish results as read from the venue results files
            CREATE TABLE IF NOT EXISTS results (
                bib INTEGER PRIMARY KEY,
                place INTEGER NOT NULL DEFAULT 0,
                time_ms INTEGER NOT NULL DEFAULT 0,
                avg_pace_ms INTEGER NOT NULL DEFAULT 0,
                distance INTEGER NOT NULL DEFAULT 0,
                name TEXT NOT NULL DEFAULT '',
                class TEXT NOT NULL DEFAULT ''
            );
            ",
        )?;
        Ok(())
    }

    /// Inserts a batch of entries, ignoring duplicates by bib.
    ///
    /// Returns the number of entries actually inserted.
    pub fn insert_entries(&mut self, entries: &[Entry]) -> Result<usize, DbError> {
        if entries.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO entries
                (bib, boat_name, club_name, club_abbrev, email, country, age, seed_ms, lightweight, event_id, scratched)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for entry in entries {
                inserted += stmt.execute(params![
                    entry.bib,
                    entry.boat_name,
                    entry.club_name,
                    entry.club_abbrev,
                    entry.email,
                    entry.country,
                    entry.age,
                    entry.seed.map(duration_to_ms),
                    entry.lightweight,
                    entry.event_id,
                    entry.scratched,
                ])?;
            }
        }
        tx.commit()?;
        debug!(inserted, total = entries.len(), "Inserted entries");
        Ok(inserted)
    }

    /// Lists every entry ordered by bib, with its result when one is stored.
    pub fn list_entries(&self) -> Result<Vec<Entry>, DbError> {
        self.query_entries("", &[])
    }

    /// Lists entries of one event ordered by bib, with results.
    pub fn entries_for_event(&self, event_id: u32) -> Result<Vec<Entry>, DbError> {
        self.query_entries("WHERE e.event_id = ?", &[&event_id])
    }

    /// Looks up one entry by bib.
    pub fn entry(&self, bib: u32) -> Result<Option<Entry>, DbError> {
        Ok(self.query_entries("WHERE e.bib = ?", &[&bib])?.pop())
    }

    fn query_entries(&self, filter: &str, params: &[&dyn ToSql]) -> Result<Vec<Entry>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT e.bib, e.boat_name, e.club_name, e.club_abbrev, e.email, e.country, e.age,
                   e.seed_ms, e.lightweight, e.event_id, e.race_id, e.lane, e.scratched,
                   r.place, r.time_ms, r.avg_pace_ms, r.distance, r.name, r.class
            FROM entries e
            LEFT JOIN results r ON r.bib = e.bib
            {filter}
            ORDER BY e.bib ASC
            "
        ))?;
        let rows = stmt.query_map(params, |row| {
            let bib: u32 = row.get(0)?;
            let place: Option<u32> = row.get(13)?;
            let result = match place {
                Some(place) => Some(RaceResult {
                    place,
                    time: ms_to_duration(row.get(14)?),
                    avg_pace: ms_to_duration(row.get(15)?),
                    distance: row.get(16)?,
                    name: row.get(17)?,
                    bib,
                    class: row.get(18)?,
                }),
                None => None,
            };
            Ok(Entry {
                bib,
                boat_name: row.get(1)?,
                club_name: row.get(2)?,
                club_abbrev: row.get(3)?,
                email: row.get(4)?,
                country: row.get(5)?,
                age: row.get(6)?,
                seed: row.get::<_, Option<i64>>(7)?.map(ms_to_duration),
                lightweight: row.get(8)?,
                event_id: row.get(9)?,
                race_id: row.get(10)?,
                lane: row.get(11)?,
                scratched: row.get(12)?,
                result,
            })
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Sets or clears the scratched flag. Returns false when no entry has `bib`.
    pub fn set_scratched(&mut self, bib: u32, scratched: bool) -> Result<bool, DbError> {
        let updated = self.conn.execute(
            "UPDATE entries SET scratched = ? WHERE bib = ?",
            params![scratched, bib],
        )?;
        Ok(updated == 1)
    }

    /// Writes the race and lane of each entry.
    ///
    /// Returns the number of entries updated.
    pub fn update_assignments(&mut self, entries: &[Entry]) -> Result<usize, DbError> {
        let tx = self.conn.transaction()?;
        let updated = write_assignments(&tx, entries)?;
        tx.commit()?;
        Ok(updated)
    }

    /// Stores newly scheduled races and the assignments of their entries.
    pub fn insert_races(&mut self, races: &[Race]) -> Result<(), DbError> {
        if races.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO races
                (id, name, boat_type, distance, duration_type, enable_stroke_data,
                 split_distance, split_time, lane_count, bank, start_time)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for race in races {
                stmt.execute(params![
                    race.id,
                    race.name,
                    race.boat_type.code(),
                    race.distance,
                    race.duration_type.code(),
                    race.enable_stroke_data,
                    race.split_distance,
                    race.split_time,
                    race.lane_count,
                    race.bank,
                    race.start_time.format(TIME_FORMAT).to_string(),
                ])?;
            }
        }
        for race in races {
            write_assignments(&tx, &race.entries)?;
        }
        tx.commit()?;
        debug!(races = races.len(), "Inserted races");
        Ok(())
    }

    /// The id the next newly scheduled race should take.
    pub fn next_race_id(&self) -> Result<u32, DbError> {
        let max: Option<u32> = self
            .conn
            .query_row("SELECT MAX(id) FROM races", [], |row| row.get(0))?;
        Ok(max.map_or(1, |id| id + 1))
    }

    /// Lists races ordered by id, each with its entries ordered by lane.
    pub fn list_races(&self) -> Result<Vec<Race>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, name, boat_type, distance, duration_type, enable_stroke_data,
                   split_distance, split_time, lane_count, bank, start_time
            FROM races
            ORDER BY id ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RaceRow {
                id: row.get(0)?,
                name: row.get(1)?,
                boat_type: row.get(2)?,
                distance: row.get(3)?,
                duration_type: row.get(4)?,
                enable_stroke_data: row.get(5)?,
                split_distance: row.get(6)?,
                split_time: row.get(7)?,
                lane_count: row.get(8)?,
                bank: row.get(9)?,
                start_time: row.get(10)?,
            })
        })?;
        let mut race_rows = Vec::new();
        for row in rows {
            race_rows.push(row?);
        }

        let mut entries = self.list_entries()?;
        entries.sort_by_key(|e| (e.race_id, e.lane, e.bib));

        let mut races = Vec::with_capacity(race_rows.len());
        for row in race_rows {
            let mut race = row.into_race()?;
            race.entries = entries
                .iter()
                .filter(|e| e.race_id == Some(race.id))
                .cloned()
                .collect();
            races.push(race);
        }
        Ok(races)
    }

    /// Deletes every race and unassigns every entry.
    ///
    /// Returns the number of races removed.
    pub fn clear_schedule(&mut self) -> Result<usize, DbError> {
        let tx = self.conn.transaction()?;
        tx.execute("UPDATE entries SET race_id = NULL, lane = NULL", [])?;
        let removed = tx.execute("DELETE FROM races", [])?;
        tx.commit()?;
        debug!(removed, "Cleared schedule");
        Ok(removed)
    }

    /// Inserts a batch of results, ignoring duplicates by bib.
    ///
    /// Returns the number of results actually inserted.
    pub fn insert_results(&mut self, results: &[RaceResult]) -> Result<usize, DbError> {
        if results.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO results
                (bib, place, time_ms, avg_pace_ms, distance, name, class)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for result in results {
                inserted += stmt.execute(params![
                    result.bib,
                    result.place,
                    duration_to_ms(result.time),
                    duration_to_ms(result.avg_pace),
                    result.distance,
                    result.name,
                    result.class,
                ])?;
            }
        }
        tx.commit()?;
        debug!(inserted, total = results.len(), "Inserted results");
        Ok(inserted)
    }

    /// Lists stored results ordered by bib.
    pub fn list_results(&self) -> Result<Vec<RaceResult>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT bib, place, time_ms, avg_pace_ms, distance, name, class
            FROM results
            ORDER BY bib ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RaceResult {
                bib: row.get(0)?,
                place: row.get(1)?,
                time: ms_to_duration(row.get(2)?),
                avg_pace: ms_to_duration(row.get(3)?),
                distance: row.get(4)?,
                name: row.get(5)?,
                class: row.get(6)?,
            })
        })?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Row counts for a status summary.
    pub fn counts(&self) -> Result<Counts, DbError> {
        let counts = self.conn.query_row(
            "
            SELECT
                (SELECT COUNT(*) FROM entries),
                (SELECT COUNT(*) FROM entries WHERE scratched = 1),
                (SELECT COUNT(*) FROM entries WHERE race_id IS NOT NULL),
                (SELECT COUNT(*) FROM races),
                (SELECT COUNT(*) FROM results)
            ",
            [],
            |row| {
                Ok(Counts {
                    entries: row.get(0)?,
                    scratched: row.get(1)?,
                    scheduled: row.get(2)?,
                    races: row.get(3)?,
                    results: row.get(4)?,
                })
            },
        )?;
        Ok(counts)
    }

    /// Counter that changes whenever another connection commits.
    ///
    /// Used by the live publish loop to notice writes from other commands.
    pub fn data_version(&self) -> Result<i64, DbError> {
        let version = self
            .conn
            .query_row("PRAGMA data_version", [], |row| row.get(0))?;
        Ok(version)
    }

    /// Round-trips a trivial query to check the database is still usable.
    pub fn ping(&self) -> Result<(), DbError> {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .optional()?;
        Ok(())
    }
}

struct RaceRow {
    id: u32,
    name: String,
    boat_type: i64,
    distance: u32,
    duration_type: i64,
    enable_stroke_data: bool,
    split_distance: u32,
    split_time: u32,
    lane_count: u32,
    bank: String,
    start_time: String,
}

impl RaceRow {
    fn into_race(self) -> Result<Race, DbError> {
        let boat_type =
            BoatType::from_code(self.boat_type).map_err(|_| DbError::InvalidBoatType {
                race_id: self.id,
                code: self.boat_type,
            })?;
        let start_time = NaiveTime::parse_from_str(&self.start_time, TIME_FORMAT).map_err(
            |source| DbError::StartTimeParse {
                race_id: self.id,
                value: self.start_time.clone(),
                source,
            },
        )?;
        Ok(Race {
            id: self.id,
            name: self.name,
            boat_type,
            distance: self.distance,
            duration_type: DurationType::from_code(self.duration_type),
            enable_stroke_data: self.enable_stroke_data,
            split_distance: self.split_distance,
            split_time: self.split_time,
            lane_count: self.lane_count,
            bank: self.bank,
            start_time,
            entries: Vec::new(),
        })
    }
}

fn write_assignments(conn: &Connection, entries: &[Entry]) -> Result<usize, DbError> {
    let mut stmt = conn.prepare("UPDATE entries SET race_id = ?, lane = ? WHERE bib = ?")?;
    let mut updated = 0;
    for entry in entries {
        updated += stmt.execute(params![entry.race_id, entry.lane, entry.bib])?;
    }
    Ok(updated)
}

fn duration_to_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

fn ms_to_duration(ms: i64) -> Duration {
    Duration::from_millis(u64::try_from(ms).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use race_core::{Event, ScheduleConfig, Scheduler};

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        assert_eq!(
            table_columns(&db.conn, "entries"),
            vec![
                "bib",
                "boat_name",
                "club_name",
                "club_abbrev",
                "email",
                "country",
                "age",
                "seed_ms",
                "lightweight",
                "event_id",
                "race_id",
                "lane",
                "scratched",
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "races"),
            vec![
                "id",
                "name",
                "boat_type",
                "distance",
                "duration_type",
                "enable_stroke_data",
                "split_distance",
                "split_time",
                "lane_count",
                "bank",
                "start_time",
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "results"),
            vec![
                "bib",
                "place",
                "time_ms",
                "avg_pace_ms",
                "distance",
                "name",
                "class"
            ]
        );

        let entry_indexes = index_names(&db.conn, "entries");
        let expected: HashSet<String> = ["idx_entries_race", "idx_entries_event"]
            .into_iter()
            .map(String::from)
            .collect();
        assert!(expected.is_subset(&entry_indexes));
        assert!(index_names(&db.conn, "races").contains("idx_races_start"));
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    fn entry(bib: u32, event_id: u32, seed_secs: Option<u64>) -> Entry {
        let mut entry = Entry::new(bib, format!("Boat {bib}"), event_id);
        entry.club_abbrev = "ABC".to_string();
        entry.seed = seed_secs.map(Duration::from_secs);
        entry
    }

    fn event(id: u32, entries: Vec<Entry>) -> Event {
        Event {
            id,
            name: "Open Men".to_string(),
            distance: 2000,
            bank: "A".to_string(),
            start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            boat_type: BoatType::Singles,
            entries,
        }
    }

    #[test]
    fn insert_entries_ignores_duplicate_bibs() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let first = entry(5, 1, Some(420));
        let mut duplicate = entry(5, 2, None);
        duplicate.boat_name = "Other".to_string();

        let inserted = db.insert_entries(&[first, duplicate]).unwrap();
        assert_eq!(inserted, 1);

        let stored = db.entry(5).unwrap().unwrap();
        assert_eq!(stored.boat_name, "Boat 5");
        assert_eq!(stored.event_id, 1);
        assert_eq!(stored.seed, Some(Duration::from_secs(420)));
        assert_eq!(stored.race_id, None);
        assert!(stored.result.is_none());
    }

    #[test]
    fn missing_seed_round_trips_as_none() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        db.insert_entries(&[entry(1, 1, None)]).unwrap();
        assert_eq!(db.entry(1).unwrap().unwrap().seed, None);
        assert!(db.entry(2).unwrap().is_none());
    }

    #[test]
    fn scheduled_races_round_trip_with_entries() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let entries: Vec<Entry> = (1..=4).map(|bib| entry(bib, 1, Some(400 + u64::from(bib)))).collect();
        db.insert_entries(&entries).unwrap();

        let mut events = vec![event(1, db.entries_for_event(1).unwrap())];
        let scheduler = Scheduler::new(ScheduleConfig::default()).unwrap();
        let start = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        let races = scheduler
            .schedule(&mut events, start, db.next_race_id().unwrap())
            .unwrap();
        db.insert_races(&races).unwrap();

        let stored = db.list_races().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, 1);
        assert_eq!(stored[0].start_time, start);
        assert_eq!(stored[0].entries.len(), 4);
        // fastest seed takes the first seed-order lane
        assert_eq!(stored[0].entry_in_lane(5).map(|e| e.bib), Some(1));
        assert_eq!(db.next_race_id().unwrap(), 2);
        assert_eq!(db.counts().unwrap().scheduled, 4);
    }

    #[test]
    fn clear_schedule_unassigns_entries() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let mut scheduled = entry(1, 1, None);
        scheduled.race_id = Some(1);
        scheduled.lane = Some(5);
        db.insert_entries(&[scheduled.clone()]).unwrap();

        let race = Race {
            id: 1,
            name: "1 Open Men".to_string(),
            boat_type: BoatType::Singles,
            distance: 2000,
            duration_type: DurationType::Distance,
            enable_stroke_data: false,
            split_distance: 500,
            split_time: 120,
            lane_count: 10,
            bank: "A".to_string(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            entries: vec![scheduled],
        };
        db.insert_races(&[race]).unwrap();
        assert_eq!(db.entry(1).unwrap().unwrap().lane, Some(5));

        assert_eq!(db.clear_schedule().unwrap(), 1);
        let cleared = db.entry(1).unwrap().unwrap();
        assert_eq!((cleared.race_id, cleared.lane), (None, None));
        assert_eq!(db.next_race_id().unwrap(), 1);
    }

    #[test]
    fn results_join_entries_by_bib() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        db.insert_entries(&[entry(5, 1, None), entry(6, 1, None)])
            .unwrap();

        let result = RaceResult {
            place: 1,
            time: Duration::from_millis(451_400),
            avg_pace: Duration::from_millis(112_800),
            distance: 2000,
            name: "Boat 5".to_string(),
            bib: 5,
            class: String::new(),
        };
        assert_eq!(db.insert_results(&[result.clone(), result.clone()]).unwrap(), 1);

        let entries = db.entries_for_event(1).unwrap();
        assert_eq!(entries[0].result.as_ref(), Some(&result));
        assert!(entries[1].result.is_none());
        assert_eq!(db.list_results().unwrap(), vec![result]);
    }

    #[test]
    fn scratch_and_unscratch() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        db.insert_entries(&[entry(3, 1, None)]).unwrap();

        assert!(db.set_scratched(3, true).unwrap());
        assert!(db.entry(3).unwrap().unwrap().scratched);
        assert_eq!(db.counts().unwrap().scratched, 1);

        assert!(db.set_scratched(3, false).unwrap());
        assert!(!db.entry(3).unwrap().unwrap().scratched);
        assert!(!db.set_scratched(99, true).unwrap());
    }

    #[test]
    fn data_version_tracks_other_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("race.db");
        let watcher = Database::open(&path).unwrap();
        let mut writer = Database::open(&path).unwrap();

        let before = watcher.data_version().unwrap();
        writer.insert_entries(&[entry(1, 1, None)]).unwrap();
        let after = watcher.data_version().unwrap();

        assert_ne!(before, after);
        watcher.ping().unwrap();
    }

    #[test]
    fn unknown_boat_type_is_reported() {
        let db = Database::open_in_memory().expect("open in-memory db");
        db.conn
            .execute(
                "INSERT INTO races (id, boat_type, start_time) VALUES (7, 9, '08:00:00')",
                [],
            )
            .unwrap();

        let err = db.list_races().unwrap_err();
        assert!(matches!(
            err,
            DbError::InvalidBoatType {
                race_id: 7,
                code: 9
            }
        ));
    }
}
