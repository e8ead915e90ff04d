//! Publish commands: race-control files, ranked results and the schedule.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use race_core::live::BoxError;
use race_core::{Entry, IndividualBoat, Race, RaceFileEncoder, Recompute, format_clock, rank};
use race_db::Database;
use serde::Serialize;

use super::util::{PassLock, open_database, run_live_loop};
use crate::Config;

const RESULTS_TXT: &str = "results.txt";
const RESULTS_JSON: &str = "results.json";
const SCHEDULE_TXT: &str = "schedule.txt";

/// Writes one race-control file per scheduled race into `race_path`.
pub fn races<W: Write>(writer: &mut W, config: &Config) -> Result<usize> {
    let _lock = PassLock::acquire(&config.lock_path())?;
    let db = open_database(config)?;
    let races = db.list_races()?;

    fs::create_dir_all(&config.race_path)
        .with_context(|| format!("failed to create {}", config.race_path.display()))?;

    let encoder = RaceFileEncoder::new(IndividualBoat);
    for race in &races {
        let path = config.race_path.join(format!("race-{:03}.rac", race.id));
        let file =
            File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        encoder
            .encode(&mut out, race)
            .and_then(|()| out.flush())
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    writeln!(
        writer,
        "Wrote {} race files to {}",
        races.len(),
        config.race_path.display()
    )?;
    Ok(races.len())
}

/// Ranks every event and writes the results pages into `publish_path`.
///
/// Returns the number of events with at least one active entry.
pub fn results<W: Write>(writer: &mut W, config: &Config, json: bool) -> Result<usize> {
    let _lock = PassLock::acquire(&config.lock_path())?;
    let db = open_database(config)?;
    let published = publish_results(&db, config, json)?;

    writeln!(
        writer,
        "Published results for {published} events to {}",
        config.publish_path.display()
    )?;
    Ok(published)
}

/// Republishes results whenever the database changes, until Ctrl-C.
pub fn results_live(config: &Config, json: bool) -> Result<()> {
    config.validate().context("invalid configuration")?;
    let mut publisher = ResultsPublisher {
        config: config.clone(),
        db: open_database(config)?,
        json,
    };

    // A second connection sees commits made by other connections.
    let probe_db = open_database(config)?;
    let probe = move || {
        probe_db
            .data_version()
            .ok()
            .and_then(|v| u64::try_from(v).ok())
    };

    let stats = run_live_loop(&mut publisher, config, probe)?;
    tracing::info!(
        passes = stats.passes,
        failed = stats.failed_passes,
        "stopped publishing"
    );
    Ok(())
}

struct ResultsPublisher {
    config: Config,
    db: Database,
    json: bool,
}

impl Recompute for ResultsPublisher {
    fn recompute(&mut self) -> Result<(), BoxError> {
        let _lock = PassLock::acquire(&self.config.lock_path())?;
        let published = publish_results(&self.db, &self.config, self.json)?;
        tracing::info!(events = published, "published results");
        Ok(())
    }

    fn health_check(&mut self) -> Result<(), BoxError> {
        self.db.ping()?;
        Ok(())
    }
}

/// An event with its active entries in finishing order.
struct RankedEvent {
    id: u32,
    name: String,
    entries: Vec<Entry>,
}

fn ranked_events(db: &Database, config: &Config) -> Result<Vec<RankedEvent>> {
    let mut events: Vec<_> = config.events.iter().collect();
    events.sort_by_key(|e| e.id);

    let mut ranked = Vec::new();
    for event in events {
        let mut entries: Vec<Entry> = db
            .entries_for_event(event.id)?
            .into_iter()
            .filter(Entry::is_active)
            .collect();
        if entries.is_empty() {
            continue;
        }
        rank(&mut entries);
        ranked.push(RankedEvent {
            id: event.id,
            name: event.name.clone(),
            entries,
        });
    }
    Ok(ranked)
}

fn publish_results(db: &Database, config: &Config, json: bool) -> Result<usize> {
    let events = ranked_events(db, config)?;
    fs::create_dir_all(&config.publish_path)
        .with_context(|| format!("failed to create {}", config.publish_path.display()))?;

    let mut text = Vec::new();
    write_results(&mut text, &events)?;
    write_file(&config.publish_path.join(RESULTS_TXT), &text)?;

    if json {
        let views: Vec<EventView<'_>> = events.iter().map(EventView::from).collect();
        let body = serde_json::to_vec_pretty(&views).context("failed to serialize results")?;
        write_file(&config.publish_path.join(RESULTS_JSON), &body)?;
    }
    Ok(events.len())
}

fn write_results<W: Write>(w: &mut W, events: &[RankedEvent]) -> std::io::Result<()> {
    for (idx, event) in events.iter().enumerate() {
        if idx > 0 {
            writeln!(w)?;
        }
        writeln!(w, "{} {}", event.id, event.name)?;
        writeln!(w, "{:>5}  {:>4}  {:<32}  {:>8}", "Place", "Bib", "Boat", "Time")?;
        for entry in &event.entries {
            let (place, time) = match entry.finish_time() {
                t if t.is_zero() => ("-".to_string(), "-".to_string()),
                t => (
                    entry.place().map_or_else(|| "-".to_string(), |p| p.to_string()),
                    format_clock(t),
                ),
            };
            writeln!(
                w,
                "{place:>5}  {:>4}  {:<32}  {time:>8}",
                entry.bib,
                display_name(entry)
            )?;
        }
    }
    Ok(())
}

fn display_name(entry: &Entry) -> String {
    if entry.lightweight {
        format!("{} (Ltwt)", entry.boat_name)
    } else {
        entry.boat_name.clone()
    }
}

#[derive(Serialize)]
struct EventView<'a> {
    id: u32,
    name: &'a str,
    boats: Vec<BoatView<'a>>,
}

#[derive(Serialize)]
struct BoatView<'a> {
    /// `None` for boats that did not start.
    place: Option<u32>,
    bib: u32,
    name: String,
    club: &'a str,
    time: Option<String>,
    avg_pace: Option<String>,
}

impl<'a> From<&'a RankedEvent> for EventView<'a> {
    fn from(event: &'a RankedEvent) -> Self {
        let boats = event
            .entries
            .iter()
            .map(|entry| {
                let started = !entry.finish_time().is_zero();
                let result = entry.result.as_ref().filter(|_| started);
                BoatView {
                    place: result.map(|r| r.place),
                    bib: entry.bib,
                    name: display_name(entry),
                    club: &entry.club_name,
                    time: result.map(|r| format_clock(r.time)),
                    avg_pace: result
                        .filter(|r| !r.avg_pace.is_zero())
                        .map(|r| format_clock(r.avg_pace)),
                }
            })
            .collect();
        Self {
            id: event.id,
            name: &event.name,
            boats,
        }
    }
}

/// Writes the start list, ordered by start time, into `publish_path`.
pub fn schedule<W: Write>(writer: &mut W, config: &Config) -> Result<usize> {
    let _lock = PassLock::acquire(&config.lock_path())?;
    let db = open_database(config)?;
    let mut races = db.list_races()?;
    races.sort_by_key(|r| (r.start_time, r.id));

    fs::create_dir_all(&config.publish_path)
        .with_context(|| format!("failed to create {}", config.publish_path.display()))?;
    let mut text = Vec::new();
    write_schedule(&mut text, &races)?;
    write_file(&config.publish_path.join(SCHEDULE_TXT), &text)?;

    writeln!(writer, "Published schedule of {} races", races.len())?;
    Ok(races.len())
}

fn write_schedule<W: Write>(w: &mut W, races: &[Race]) -> std::io::Result<()> {
    for race in races {
        writeln!(
            w,
            "{}  Race {:03}  {}  ({}m, bank {})",
            race.start_time.format("%H:%M"),
            race.id,
            race.name,
            race.distance,
            race.bank
        )?;
        let mut entries: Vec<&Entry> = race.entries.iter().filter(|e| e.is_active()).collect();
        entries.sort_by_key(|e| (e.lane.is_none(), e.lane, e.bib));
        for entry in entries {
            let lane = entry.lane.map_or_else(|| "-".to_string(), |l| l.to_string());
            writeln!(
                w,
                "       Lane {lane:>2}  {:>4}  {}",
                entry.bib,
                display_name(entry)
            )?;
        }
    }
    Ok(())
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use chrono::NaiveTime;
    use race_core::{BoatType, DurationType, RaceResult};

    fn config_in(dir: &Path) -> Config {
        Config {
            database_path: dir.join("race.db"),
            race_path: dir.join("races"),
            publish_path: dir.join("html"),
            lane_count: 4,
            seed_order: vec![2, 3, 1, 4],
            ..Config::default()
        }
    }

    fn entry(bib: u32, name: &str, lane: u32) -> Entry {
        let mut entry = Entry::new(bib, name, 7);
        entry.club_name = "Rowing Club".to_string();
        entry.club_abbrev = "RC".to_string();
        entry.race_id = Some(1);
        entry.lane = Some(lane);
        entry
    }

    fn result(bib: u32, secs: u64) -> RaceResult {
        RaceResult {
            place: 9,
            time: Duration::from_secs(secs),
            avg_pace: Duration::from_secs(secs / 4),
            distance: 2000,
            name: String::new(),
            bib,
            class: String::new(),
        }
    }

    fn seeded_db(config: &Config) -> Database {
        let mut db = Database::open(&config.database_path).unwrap();
        let mut light = entry(3, "Light", 1);
        light.lightweight = true;
        let mut gone = entry(4, "Gone", 4);
        gone.scratched = true;
        let entries = vec![entry(1, "Alpha", 2), entry(2, "Bravo", 3), light, gone];
        db.insert_entries(&entries).unwrap();
        db.insert_races(&[Race {
            id: 1,
            name: "7 Open Men".to_string(),
            boat_type: BoatType::Singles,
            distance: 2000,
            duration_type: DurationType::Distance,
            enable_stroke_data: false,
            split_distance: 500,
            split_time: 120,
            lane_count: 4,
            bank: "A".to_string(),
            start_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            entries,
        }])
        .unwrap();
        db
    }

    #[test]
    fn writes_one_race_file_per_race() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        seeded_db(&config);

        let mut output = Vec::new();
        assert_eq!(races(&mut output, &config).unwrap(), 1);

        let text = fs::read_to_string(config.race_path.join("race-001.rac")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(&lines[..2], &["RACE", "107"]);
        assert_eq!(lines[3], "7 Open Men");
        // lane 1 block starts after the 11 header lines
        assert_eq!(&lines[11..15], &["Light", "3", "RC", "L"]);
        // scratched boat in lane 4 is written as an empty lane
        assert_eq!(&lines[23..27], &[" ", "0", "", ""]);
        assert_eq!(lines.last(), Some(&"0"));
    }

    #[test]
    fn results_rank_finishers_and_mark_non_starters() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        let mut db = seeded_db(&config);
        db.insert_results(&[result(2, 455), result(3, 451)]).unwrap();

        let mut output = Vec::new();
        assert_eq!(results(&mut output, &config, true).unwrap(), 1);

        let text = fs::read_to_string(config.publish_path.join(RESULTS_TXT)).unwrap();
        insta::assert_snapshot!(text, @r"
        7 Open Men
        Place   Bib  Boat                                  Time
            1     3  Light (Ltwt)                        7:31.0
            2     2  Bravo                               7:35.0
            -     1  Alpha                                    -
        ");

        let json: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(config.publish_path.join(RESULTS_JSON)).unwrap(),
        )
        .unwrap();
        let boats = json[0]["boats"].as_array().unwrap();
        assert_eq!(boats[0]["place"], 1);
        assert_eq!(boats[0]["avg_pace"], "1:52.0");
        assert!(boats[2]["place"].is_null());
    }

    #[test]
    fn live_publisher_rewrites_results() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        let mut db = seeded_db(&config);
        let mut publisher = ResultsPublisher {
            db: Database::open(&config.database_path).unwrap(),
            config: config.clone(),
            json: false,
        };

        publisher.recompute().unwrap();
        let before = fs::read_to_string(config.publish_path.join(RESULTS_TXT)).unwrap();
        db.insert_results(&[result(1, 440)]).unwrap();
        publisher.recompute().unwrap();
        let after = fs::read_to_string(config.publish_path.join(RESULTS_TXT)).unwrap();

        assert_ne!(before, after);
        assert!(after.contains("7:20.0"));
        publisher.health_check().unwrap();
    }

    #[test]
    fn live_publish_rejects_zero_health_interval() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            health_check_minutes: 0,
            ..config_in(temp.path())
        };

        let err = results_live(&config, false).unwrap_err();
        assert_eq!(err.to_string(), "invalid configuration");
        assert!(!config.publish_path.exists());
    }

    #[test]
    fn schedule_lists_races_by_start_time() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        seeded_db(&config);

        let mut output = Vec::new();
        schedule(&mut output, &config).unwrap();

        let text = fs::read_to_string(config.publish_path.join(SCHEDULE_TXT)).unwrap();
        insta::assert_snapshot!(text, @r"
        09:30  Race 001  7 Open Men  (2000m, bank A)
               Lane  1     3  Light (Ltwt)
               Lane  2     1  Alpha
               Lane  3     2  Bravo
        ");
    }
}
