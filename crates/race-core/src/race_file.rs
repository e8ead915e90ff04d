//! Race-control file writer for the venue racing hardware.
//!
//! # Format
//!
//! One item per line:
//!
//! ```text
//! RACE             signature
//! 107              format version
//! <boat type>      0 singles, 1 doubles, 2 fours, 3 eights
//! <name>           at most 16 characters
//! <distance>       meters
//! <duration type>  0 distance, 1 time
//! 0                reserved
//! <stroke data>    1 or 0
//! <split distance> meters
//! <split time>     seconds
//! <lane count>
//! <boat block>     one per lane, lanes 1..=lane count
//! 0                trailer (team total in team races)
//! ```
//!
//! The hardware refuses to start a race whose name is longer than 16
//! characters, and refuses a boat block with an empty name, so empty lanes
//! are written as a boat named with a single space.

use std::io::{self, Write};

use crate::model::{Entry, Race};

/// File signature line.
pub const SIGNATURE: &str = "RACE";

/// Race-control format version.
pub const VERSION: &str = "107";

/// Longest race name the hardware accepts.
pub const MAX_NAME_LEN: usize = 16;

/// The boat occupying one lane, as seen by a boat block encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boat<'a> {
    pub lane: u32,
    pub bib: u32,
    pub name: &'a str,
    pub club_abbrev: &'a str,
    pub lightweight: bool,
}

impl<'a> Boat<'a> {
    /// Placeholder for an empty lane.
    #[must_use]
    pub const fn empty(lane: u32) -> Self {
        Self {
            lane,
            bib: 0,
            name: " ",
            club_abbrev: "",
            lightweight: false,
        }
    }

    #[must_use]
    pub fn from_entry(lane: u32, entry: &'a Entry) -> Self {
        Self {
            lane,
            bib: entry.bib,
            name: &entry.boat_name,
            club_abbrev: &entry.club_abbrev,
            lightweight: entry.lightweight,
        }
    }
}

/// Writes the block describing one boat in one lane.
///
/// Swapping the encoder changes the per-lane layout without touching the
/// rest of the file.
pub trait BoatEncoder {
    fn write_boat(&self, w: &mut dyn Write, boat: &Boat<'_>) -> io::Result<()>;
}

/// Individual-boat block: name, bib, club abbreviation, class.
///
/// The class line is `L` for lightweight boats and empty otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndividualBoat;

impl BoatEncoder for IndividualBoat {
    fn write_boat(&self, w: &mut dyn Write, boat: &Boat<'_>) -> io::Result<()> {
        let class = if boat.lightweight { "L" } else { "" };
        writeln!(w, "{}", boat.name)?;
        writeln!(w, "{}", boat.bib)?;
        writeln!(w, "{}", boat.club_abbrev)?;
        writeln!(w, "{class}")
    }
}

/// Serializes races into race-control files.
#[derive(Debug, Clone, Default)]
pub struct RaceFileEncoder<B = IndividualBoat> {
    boats: B,
}

impl<B: BoatEncoder> RaceFileEncoder<B> {
    #[must_use]
    pub const fn new(boats: B) -> Self {
        Self { boats }
    }

    /// Writes `race` to `w`.
    ///
    /// Sink errors are returned as they are; nothing is retried.
    pub fn encode<W: Write>(&self, w: &mut W, race: &Race) -> io::Result<()> {
        writeln!(w, "{SIGNATURE}")?;
        writeln!(w, "{VERSION}")?;
        writeln!(w, "{}", race.boat_type.code())?;
        writeln!(w, "{}", truncate_name(&race.name))?;
        writeln!(w, "{}", race.distance)?;
        writeln!(w, "{}", race.duration_type.code())?;
        writeln!(w, "0")?;
        writeln!(w, "{}", u8::from(race.enable_stroke_data))?;
        writeln!(w, "{}", race.split_distance)?;
        writeln!(w, "{}", race.split_time)?;
        writeln!(w, "{}", race.lane_count)?;

        for lane in 1..=race.lane_count {
            let boat = race
                .entry_in_lane(lane)
                .map_or_else(|| Boat::empty(lane), |entry| Boat::from_entry(lane, entry));
            self.boats.write_boat(w, &boat)?;
        }

        writeln!(w, "0")
    }

    /// Encodes `race` into a string.
    pub fn encode_to_string(&self, race: &Race) -> io::Result<String> {
        let mut buf = Vec::new();
        self.encode(&mut buf, race)?;
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Cuts `name` to at most [`MAX_NAME_LEN`] characters.
fn truncate_name(name: &str) -> &str {
    name.char_indices()
        .nth(MAX_NAME_LEN)
        .map_or(name, |(idx, _)| &name[..idx])
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;
    use crate::types::{BoatType, DurationType};

    fn two_lane_race(name: &str) -> Race {
        let mut entry = Entry::new(5, "Test", 1);
        entry.club_abbrev = "ABC".to_string();
        entry.race_id = Some(1);
        entry.lane = Some(1);

        Race {
            id: 1,
            name: name.to_string(),
            boat_type: BoatType::Singles,
            distance: 2000,
            duration_type: DurationType::Distance,
            enable_stroke_data: false,
            split_distance: 500,
            split_time: 120,
            lane_count: 2,
            bank: "A".to_string(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            entries: vec![entry],
        }
    }

    #[test]
    fn two_lane_race_layout() {
        let race = two_lane_race("1 Open Men");
        let text = RaceFileEncoder::<IndividualBoat>::default()
            .encode_to_string(&race)
            .unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            vec![
                "RACE", "107", "0", "1 Open Men", "2000", "0", "0", "0", "500", "120", "2",
                // lane 1
                "Test", "5", "ABC", "",
                // lane 2
                " ", "0", "", "",
                "0",
            ]
        );
        // signature + version, nine metadata lines, two boat blocks, trailer
        assert_eq!(lines.len(), 2 + 9 + 2 * 4 + 1);
        assert!(text.ends_with("0\n"));
    }

    #[test]
    fn long_names_are_truncated_to_sixteen_chars() {
        let race = two_lane_race("Events 1, 3, 5, 7, 9");
        let text = RaceFileEncoder::<IndividualBoat>::default()
            .encode_to_string(&race)
            .unwrap();
        assert_eq!(text.lines().nth(3), Some("Events 1, 3, 5, "));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_name("Ångström Ångström"), "Ångström Ångströ");
        assert_eq!(truncate_name("short"), "short");
    }

    #[test]
    fn lightweight_and_stroke_data_flags() {
        let mut race = two_lane_race("Lwt");
        race.entries[0].lightweight = true;
        race.enable_stroke_data = true;
        race.boat_type = BoatType::Eights;

        let text = RaceFileEncoder::<IndividualBoat>::default()
            .encode_to_string(&race)
            .unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[2], "3");
        assert_eq!(lines[7], "1");
        assert_eq!(lines[14], "L");
    }

    #[test]
    fn scratched_entry_leaves_lane_empty() {
        let mut race = two_lane_race("Scratch");
        race.entries[0].scratched = true;

        let text = RaceFileEncoder::<IndividualBoat>::default()
            .encode_to_string(&race)
            .unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[11], " ");
        assert_eq!(lines[15], " ");
    }

    #[test]
    fn custom_boat_encoder_is_used_per_lane() {
        struct NameOnly;
        impl BoatEncoder for NameOnly {
            fn write_boat(&self, w: &mut dyn Write, boat: &Boat<'_>) -> io::Result<()> {
                writeln!(w, "{}:{}", boat.lane, boat.name)
            }
        }

        let race = two_lane_race("Custom");
        let text = RaceFileEncoder::new(NameOnly).encode_to_string(&race).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(&lines[11..], &["1:Test", "2: ", "0"]);
    }

    #[test]
    fn sink_errors_propagate() {
        struct FailingSink;
        impl Write for FailingSink {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let race = two_lane_race("Fail");
        let err = RaceFileEncoder::<IndividualBoat>::default()
            .encode(&mut FailingSink, &race)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
