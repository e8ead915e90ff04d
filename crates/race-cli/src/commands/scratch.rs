//! Scratch command: withdraws an entry or restores it.

use std::io::Write;

use anyhow::{Result, bail};

use super::util::{PassLock, open_database};
use crate::Config;

/// Scratches `bib`, or restores it when `undo` is set.
///
/// A restored entry whose lane was given to another boat in the meantime
/// loses its lane and keeps its race, so `race lanes repair` can place it.
pub fn run<W: Write>(writer: &mut W, config: &Config, bib: u32, undo: bool) -> Result<()> {
    let _lock = PassLock::acquire(&config.lock_path())?;
    let mut db = open_database(config)?;

    let Some(mut entry) = db.entry(bib)? else {
        bail!("no entry with bib {bib}");
    };
    db.set_scratched(bib, !undo)?;

    let verb = if undo { "Restored" } else { "Scratched" };
    writeln!(writer, "{verb} bib {bib} ({})", entry.boat_name)?;

    if let (true, Some(race_id), Some(lane)) = (undo, entry.race_id, entry.lane) {
        let taken = db
            .list_entries()?
            .iter()
            .any(|e| {
                e.bib != bib && e.is_active() && e.race_id == Some(race_id) && e.lane == Some(lane)
            });
        if taken {
            entry.lane = None;
            db.update_assignments(&[entry])?;
            tracing::info!(bib, race_id, lane, "cleared reused lane");
            writeln!(
                writer,
                "Lane {lane} of race {race_id} is taken; \
                 run `race lanes repair` to give bib {bib} a new lane"
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use chrono::NaiveTime;
    use race_core::{AlwaysConfirm, BoatType, DurationType, Entry, Race};
    use race_db::Database;

    use crate::commands::lanes;

    fn race_with(entries: Vec<Entry>) -> Race {
        Race {
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
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            entries,
        }
    }

    #[test]
    fn scratches_and_restores() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("race.db"),
            ..Config::default()
        };
        let mut db = Database::open(&config.database_path).unwrap();
        db.insert_entries(&[Entry::new(4, "Quad", 1)]).unwrap();

        let mut output = Vec::new();
        run(&mut output, &config, 4, false).unwrap();
        assert!(db.entry(4).unwrap().unwrap().scratched);

        run(&mut output, &config, 4, true).unwrap();
        assert!(!db.entry(4).unwrap().unwrap().scratched);

        let output = String::from_utf8(output).unwrap();
        insta::assert_snapshot!(output, @r"
        Scratched bib 4 (Quad)
        Restored bib 4 (Quad)
        ");
    }

    #[test]
    fn restored_entry_gives_up_a_reused_lane() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("race.db"),
            lane_count: 4,
            seed_order: vec![2, 3, 1, 4],
            ..Config::default()
        };
        let mut db = Database::open(&config.database_path).unwrap();
        let mut first = Entry::new(1, "First", 7);
        first.race_id = Some(1);
        first.lane = Some(2);
        let mut second = Entry::new(2, "Second", 7);
        second.race_id = Some(1);
        second.lane = Some(3);
        let scheduled = vec![first, second];
        db.insert_entries(&scheduled).unwrap();
        db.insert_entries(&[Entry::new(3, "Late", 7)]).unwrap();
        db.insert_races(&[race_with(scheduled)]).unwrap();

        let mut output = Vec::new();
        run(&mut output, &config, 1, false).unwrap();
        lanes::place(&mut output, &config, &mut AlwaysConfirm).unwrap();
        assert_eq!(db.entry(3).unwrap().unwrap().lane, Some(2));

        run(&mut output, &config, 1, true).unwrap();
        let restored = db.entry(1).unwrap().unwrap();
        assert_eq!((restored.race_id, restored.lane), (Some(1), None));

        lanes::repair(&mut output, &config, &mut AlwaysConfirm).unwrap();
        let race = db.list_races().unwrap().remove(0);
        let lanes: Vec<Option<u32>> = race
            .entries
            .iter()
            .filter(|e| e.is_active())
            .map(|e| e.lane)
            .collect();
        let distinct: HashSet<Option<u32>> = lanes.iter().copied().collect();
        assert_eq!(lanes.len(), 3);
        assert_eq!(distinct.len(), 3);
        assert!(!lanes.contains(&None));
        assert_eq!(db.entry(1).unwrap().unwrap().lane, Some(1));

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Lane 2 of race 1 is taken"));
    }

    #[test]
    fn restore_keeps_a_free_lane() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("race.db"),
            ..Config::default()
        };
        let mut db = Database::open(&config.database_path).unwrap();
        let mut entry = Entry::new(5, "Solo", 1);
        entry.race_id = Some(1);
        entry.lane = Some(4);
        entry.scratched = true;
        db.insert_entries(&[entry.clone()]).unwrap();
        db.insert_races(&[race_with(vec![entry])]).unwrap();

        let mut output = Vec::new();
        run(&mut output, &config, 5, true).unwrap();
        assert_eq!(db.entry(5).unwrap().unwrap().lane, Some(4));
    }

    #[test]
    fn unknown_bib_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("race.db"),
            ..Config::default()
        };
        let mut output = Vec::new();
        let err = run(&mut output, &config, 99, false).unwrap_err();
        assert_eq!(err.to_string(), "no entry with bib 99");
    }
}
